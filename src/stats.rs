//! Statistics collection. Enabled with `--features stats`.

#![cfg_attr(not(feature = "stats"), allow(dead_code))]

use parking_lot::Mutex;
use std::{
    fmt::{self, Debug, Formatter},
    ops::Deref,
};

#[derive(Copy, Clone, Default, Debug)]
struct MinMaxTotal {
    min:   u64,
    max:   u64,
    total: u64,
}

#[doc(hidden)]
#[derive(Default)]
pub struct Size {
    min_max_total: Option<MinMaxTotal>,
    count:         u64,
}

impl Debug for Size {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Size")
            .field("count", &self.count)
            .field("min", &self.min_max_total.map(|x| x.min))
            .field("max", &self.min_max_total.map(|x| x.max))
            .field("total", &self.min_max_total.map(|x| x.total))
            .field(
                "avg",
                &self
                    .min_max_total
                    .map(|x| x.total as f64 / self.count as f64),
            )
            .finish()
    }
}

impl Size {
    /// Number of recorded samples.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of all recorded samples.
    pub fn total(&self) -> u64 {
        self.min_max_total.unwrap_or_default().total
    }

    pub(crate) fn record(&mut self, size: u64) {
        self.count += 1;
        if let Some(ref mut min_max_total) = &mut self.min_max_total {
            min_max_total.min = min_max_total.min.min(size);
            min_max_total.max = min_max_total.max.max(size);
            min_max_total.total += size;
        } else {
            self.min_max_total = Some(MinMaxTotal {
                min:   size,
                max:   size,
                total: size,
            });
        }
    }

    pub(crate) fn merge(&mut self, rhs: &Self) {
        self.count += rhs.count;
        self.min_max_total = match (self.min_max_total, rhs.min_max_total) {
            (Some(a), Some(b)) => Some(MinMaxTotal {
                min:   a.min.min(b.min),
                max:   a.max.max(b.max),
                total: a.total + b.total,
            }),
            (a, b) => a.or(b),
        };
    }
}

#[doc(hidden)]
#[derive(Default, Debug)]
pub struct Event {
    count: u64,
}

impl Event {
    /// Number of times the event happened.
    pub fn count(&self) -> u64 {
        self.count
    }

    fn happened(&mut self) {
        self.count += 1
    }

    fn merge(&mut self, rhs: &Self) {
        self.count += rhs.count
    }
}

macro_rules! stats_func {
    ($(#[$attr:meta])* $name:ident: Event) => {
        #[inline]
        $(#[$attr])*
        pub(crate) fn $name() {
            with_thread_stats(|stats| stats.$name.happened())
        }
    };
    ($(#[$attr:meta])* $name:ident: Size) => {
        #[inline]
        $(#[$attr])*
        pub(crate) fn $name(size: usize) {
            with_thread_stats(|stats| stats.$name.record(size as u64))
        }
    };
}

macro_rules! stats {
    ($($(#[$attr:meta])* $names:ident: $kinds:tt),* $(,)*) => {
        /// A collection of tree statistics.
        #[derive(Default, Debug)]
        pub struct Stats {
            $($(#[$attr])*pub $names: $kinds),*
        }

        impl Stats {
            fn merge(&mut self, rhs: &Self) {
                $(self.$names.merge(&rhs.$names));*
            }
        }

        $(stats_func!{$(#[$attr])* $names: $kinds})*
    };
}

stats! {
    /// A rotation performed while rebalancing after an insert.
    rotation:            Event,

    /// Number of times the fixup moved up to the grandparent (red uncle case) per insert.
    balance_steps:       Size,

    /// A hinted insert whose hint was locally valid.
    hint_accepted:       Event,

    /// A hinted insert that fell back to a full search.
    hint_rejected:       Event,

    /// A speculatively constructed node that was destroyed because its key was already present.
    speculative_discard: Event,

    /// Number of nodes freed per call to `clear` (including drops of non-empty trees).
    cleared_nodes:       Size,
}

impl Stats {
    /// Prints a summary of the stats object.
    pub fn print_summary(&self) {
        println!("{:#?}", self);

        let hinted = self.hint_accepted.count + self.hint_rejected.count;
        println!(
            "{:>12}: {:>12} {:>9}: {:.4}",
            "hinted",
            hinted,
            "hit rate",
            self.hint_accepted.count as f64 / hinted as f64,
        );
        println!(
            "{:>12}: {:>12} {:>9}: {:.4}",
            "inserts",
            self.balance_steps.count,
            "rot avg",
            self.rotation.count as f64 / self.balance_steps.count as f64,
        );
    }
}

/// Thread local statistics.
///
/// To reduce overhead of stats tracking, each thread has it's own `Stats` object which is flushed
/// to the global `Stats` object on thread exit or when manually requested.
#[derive(Default)]
struct ThreadStats(Stats);

impl Drop for ThreadStats {
    fn drop(&mut self) {
        self.flush()
    }
}

impl ThreadStats {
    fn flush(&mut self) {
        GLOBAL.lock().merge(&self.0);
        self.0 = Default::default()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "stats")] {
        use std::cell::RefCell;

        thread_local! {
            static THREAD_STAT: RefCell<ThreadStats> = {
                // initialize global now, so the flush on thread exit never has to.
                lazy_static::initialize(&GLOBAL);
                RefCell::default()
            };
        }

        #[inline]
        fn with_thread_stats<F: FnOnce(&mut Stats)>(f: F) {
            // the thread local may already be destroyed during thread exit; drop the sample.
            let _ = THREAD_STAT.try_with(|thread_stats| f(&mut thread_stats.borrow_mut().0));
        }

        fn flush_thread_stats() {
            let _ = THREAD_STAT.try_with(|thread_stats| thread_stats.borrow_mut().flush());
        }
    } else {
        #[inline(always)]
        fn with_thread_stats<F: FnOnce(&mut Stats)>(_: F) {}

        #[inline(always)]
        fn flush_thread_stats() {}
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL: Mutex<Stats> = Mutex::default();
}

/// Returns the global stats object, or None if the feature is disabled.
pub fn stats() -> Option<impl Deref<Target = Stats>> {
    if cfg!(feature = "stats") {
        Some(GLOBAL.lock())
    } else {
        None
    }
}

/// Flushes the calling thread's stats into the global stats object.
pub fn thread_flush() {
    flush_thread_stats()
}

/// Prints a summary of the global stats object.
///
/// It may be necessary to run `stats::thread_flush()` first.
pub fn print_stats() {
    match self::stats() {
        Some(stats) => stats.print_summary(),
        None => println!("`redblack/stats` feature is not enabled"),
    }
}
