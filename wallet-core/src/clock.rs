//! Date source for status derivation
//!
//! Status is always derived against "today", so the date is injected rather
//! than read from the wall clock inside the store.

use chrono::{Local, NaiveDate};
use std::sync::{Arc, Mutex, PoisonError};

pub trait Clock: Send + Sync {
    /// The current calendar date. Time of day is irrelevant to coupons.
    fn today(&self) -> NaiveDate;
}

/// Reads the local calendar date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a settable date
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<Mutex<NaiveDate>>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Arc::new(Mutex::new(date)),
        }
    }

    /// Move the clock; clones observe the new date.
    pub fn set(&self, date: NaiveDate) {
        *self.date.lock().unwrap_or_else(PoisonError::into_inner) = date;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
