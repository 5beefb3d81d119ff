use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use redblack::{Greater, Less, RBTree};

// Heap's algorithm
fn for_each_permutation(items: &mut Vec<u32>, k: usize, f: &mut impl FnMut(&[u32])) {
    if k <= 1 {
        f(items);
        return;
    }
    for i in 0..k - 1 {
        for_each_permutation(items, k - 1, f);
        if k % 2 == 0 {
            items.swap(i, k - 1);
        } else {
            items.swap(0, k - 1);
        }
    }
    for_each_permutation(items, k - 1, f);
}

#[test]
fn every_permutation() {
    for len in 0..=6 {
        let mut items = (0..len).collect::<Vec<u32>>();
        let mut seen = 0;
        for_each_permutation(&mut items, len as usize, &mut |perm| {
            let mut tree = RBTree::new();
            for &x in perm {
                tree.emplace(&Less, x).unwrap();
                tree.verify(&Less);
            }
            assert!(tree.iter().copied().eq(0..len));
            seen += 1;
        });
        assert_eq!(seen, (1..=len as usize).product::<usize>());
    }
}

#[test]
fn next_prev_inverse() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut tree = RBTree::new_multi();
    for _ in 0..500 {
        tree.emplace(&Less, rng.gen_range(0..100u32)).unwrap();
    }

    let mut cursor = tree.begin();
    let mut len = 0;
    while !cursor.is_end() {
        let here = cursor.handle();
        cursor.move_next();
        if !cursor.is_end() {
            let mut back = cursor.clone();
            back.move_prev();
            assert_eq!(back.handle(), here);
        }
        len += 1;
    }
    assert_eq!(len, tree.len());

    let forward = tree.iter().collect::<Vec<_>>();
    let mut backward = tree.iter().rev().collect::<Vec<_>>();
    backward.reverse();
    assert_eq!(forward, backward);
    assert!(forward.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn multi_is_stable() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut tree = RBTree::new_multimap();
    for seq in 0..2_000u32 {
        let key = rng.gen_range(0..20u32);
        let value = (key, seq);
        match seq % 3 {
            0 => tree.emplace(&Less, value),
            1 => tree.emplace_with(&Less, || value),
            _ => {
                let hint = tree.upper_bound(&Less, &key).handle();
                tree.emplace_hint(&Less, hint, value)
            }
        }
        .unwrap();
    }
    tree.verify(&Less);
    for key in 0..20 {
        let (lo, hi) = tree.equal_range(&Less, &key);
        let seqs = lo.iter_until(&hi).map(|&(_, seq)| seq).collect::<Vec<_>>();
        assert_eq!(seqs.len(), tree.count(&Less, &key));
        assert!(seqs.windows(2).all(|w| w[0] < w[1]), "key {} out of order", key);
    }
}

#[test]
fn shuffled() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for &len in [10u32, 100, 1_000, 10_000].iter() {
        let mut items = (0..len).collect::<Vec<_>>();
        items.shuffle(&mut rng);

        let mut tree = RBTree::new();
        assert_eq!(tree.insert_range(&Greater, items.iter().copied()).unwrap(), len as usize);
        assert_eq!(tree.insert_range(&Greater, items.iter().copied()).unwrap(), 0);
        let verify = tree.verify(&Greater);
        assert_eq!(verify.len, len as usize);
        assert!(tree.iter().copied().eq((0..len).rev()));
        assert_eq!(tree.first(), Some(&(len - 1)));
        assert_eq!(tree.last(), Some(&0));
    }
}

#[test]
fn bounds_agree_with_sorted_vec() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut tree = RBTree::new_multi();
    let mut sorted = Vec::new();
    for _ in 0..300 {
        let x = rng.gen_range(0..200i32) * 2;
        tree.emplace(&Less, x).unwrap();
        sorted.push(x);
    }
    sorted.sort();

    for key in -1..402 {
        let lower = sorted.iter().position(|&x| x >= key);
        let upper = sorted.iter().position(|&x| x > key);
        let lower_len = lower.map_or(0, |i| sorted.len() - i);
        let upper_len = upper.map_or(0, |i| sorted.len() - i);
        assert_eq!(
            tree.lower_bound(&Less, &key).iter_until(&tree.end()).count(),
            lower_len
        );
        assert_eq!(
            tree.upper_bound(&Less, &key).iter_until(&tree.end()).count(),
            upper_len
        );
        assert_eq!(tree.count(&Less, &key), lower_len - upper_len);
        assert_eq!(tree.contains(&Less, &key), lower_len != upper_len);
    }
}
