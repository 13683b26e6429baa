//! Calendar source for derived fields such as `Person.age`.

use chrono::{Datelike, Local};
use std::sync::atomic::{AtomicI32, Ordering};

pub trait Clock: Send + Sync {
    fn current_year(&self) -> i32;
}

/// Local wall-clock year
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_year(&self) -> i32 {
        Local::now().year()
    }
}

/// Year pinned by the caller, adjustable at runtime
#[derive(Debug)]
pub struct FixedClock {
    year: AtomicI32,
}

impl FixedClock {
    pub fn new(year: i32) -> Self {
        Self {
            year: AtomicI32::new(year),
        }
    }

    pub fn set_year(&self, year: i32) {
        self.year.store(year, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn current_year(&self) -> i32 {
        self.year.load(Ordering::SeqCst)
    }
}
