use chrono::{Days, NaiveDate};

/// Every calendar date from the start date through the end date
/// (inclusive). An end before the start is an empty range.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    /// Number of days the range yields.
    pub fn num_days(&self) -> usize {
        let span = (self.1 - self.0).num_days();
        if span < 0 {
            0
        } else {
            span as usize + 1
        }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.0 <= *date && *date <= self.1
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 > self.1 {
            return None;
        }
        let current = self.0;
        match current.checked_add_days(Days::new(1)) {
            Some(next) => self.0 = next,
            // last representable date: make the range empty
            None => self.1 = current.pred_opt().unwrap_or(current),
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.num_days();
        (n, Some(n))
    }
}

impl ExactSizeIterator for DateRange {}
