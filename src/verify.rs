use crate::{
    compare::{Compare, KeyOf},
    node::{Link, NodePtr},
};

/// Shape statistics of a verified tree.
///
/// Depths count the null link below a leaf as one level, so an empty tree has depth 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Verify {
    pub black_depth: usize,
    pub min_depth:   usize,
    pub max_depth:   usize,
    pub len:         usize,
}

struct Subtree<T> {
    verify: Verify,
    min:    Link<T>,
    max:    Link<T>,
}

fn ordered<T, X, C>(comp: &C, multi: bool, lhs: NodePtr<T>, rhs: NodePtr<T>) -> bool
where
    X: KeyOf<T>,
    C: Compare<X::Key> + ?Sized,
{
    let (lhs, rhs) = unsafe { (X::key_of(lhs.value()), X::key_of(rhs.value())) };
    if multi {
        !comp.less(rhs, lhs)
    } else {
        comp.less(lhs, rhs)
    }
}

fn check<T, X, C>(p: Link<T>, comp: &C, multi: bool) -> Subtree<T>
where
    X: KeyOf<T>,
    C: Compare<X::Key> + ?Sized,
{
    let p = match p {
        None => {
            return Subtree {
                verify: Verify {
                    black_depth: 1,
                    min_depth:   1,
                    max_depth:   1,
                    len:         0,
                },
                min:    None,
                max:    None,
            }
        }
        Some(p) => p,
    };
    for child in p.left().iter().chain(p.right().iter()) {
        assert_eq!(child.parent(), Some(p), "broken parent link");
        assert!(!(p.is_red() && child.is_red()), "red node with a red child");
    }
    let left = check::<T, X, C>(p.left(), comp, multi);
    let right = check::<T, X, C>(p.right(), comp, multi);
    assert_eq!(
        left.verify.black_depth, right.verify.black_depth,
        "unequal black depth"
    );
    if let Some(max) = left.max {
        assert!(ordered::<T, X, C>(comp, multi, max, p), "left subtree out of order");
    }
    if let Some(min) = right.min {
        assert!(ordered::<T, X, C>(comp, multi, p, min), "right subtree out of order");
    }
    let verify = Verify {
        black_depth: left.verify.black_depth + p.is_black() as usize,
        min_depth:   left.verify.min_depth.min(right.verify.min_depth) + 1,
        max_depth:   left.verify.max_depth.max(right.verify.max_depth) + 1,
        len:         left.verify.len + right.verify.len + 1,
    };
    assert!(verify.min_depth * 2 >= verify.max_depth, "unbalanced");
    Subtree {
        verify,
        min: left.min.or(Some(p)),
        max: right.max.or(Some(p)),
    }
}

/// Recursively checks the subtree at `p`: parent links, red-black coloring, key order (strict for
/// unique trees) and the depth bound.
pub(crate) fn subtree<T, X, C>(p: Link<T>, comp: &C, multi: bool) -> Verify
where
    X: KeyOf<T>,
    C: Compare<X::Key> + ?Sized,
{
    check::<T, X, C>(p, comp, multi).verify
}
