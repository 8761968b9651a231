use chrono::{Local, NaiveDate};

/// Source of "today" for default borrow/return dates and the overdue
/// computation. Handlers read it from `AppState`, so tests can pin the date
/// instead of mocking the wall clock.
#[derive(Clone, Copy, Debug)]
pub enum Clock {
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}
