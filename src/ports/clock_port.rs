//! Time source port trait.

use chrono::{DateTime, NaiveDate, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used for expiration checks.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
