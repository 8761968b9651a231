//! Services Layer
//!
//! Pure business logic without the HTTP layer. Handlers in `api` call into
//! these functions and translate `ServiceError` into status codes.

pub mod loan_service;
pub mod stats_service;
pub mod stock_service;

use std::fmt;

use chrono::NaiveDate;
use sea_orm::DbErr;

/// Materials with less available stock than this show up on the dashboard.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// An open loan older than this many days counts as overdue.
pub const OVERDUE_DAYS: i64 = 7;

pub(crate) const DATE_FMT: &str = "%Y-%m-%d";

/// Error type for service operations
#[derive(Debug)]
pub enum ServiceError {
    Database(String),
    NotFound(String),
    InvalidInput(String),
    InsufficientStock { available: i32, requested: i32 },
    DuplicateOpenLoan,
    NameConflict(String),
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        ServiceError::Database(e.to_string())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Database(detail) => write!(f, "database error: {}", detail),
            ServiceError::NotFound(msg) => write!(f, "{}", msg),
            ServiceError::InvalidInput(msg) => write!(f, "{}", msg),
            ServiceError::InsufficientStock {
                available,
                requested,
            } => write!(
                f,
                "Insufficient stock. Available: {}, Requested: {}",
                available, requested
            ),
            ServiceError::DuplicateOpenLoan => {
                write!(f, "Student already has unreturned items of this material")
            }
            ServiceError::NameConflict(_) => {
                write!(f, "Material with this name already exists")
            }
        }
    }
}

impl std::error::Error for ServiceError {}

/// Loans borrowed strictly before this date are overdue.
pub(crate) fn overdue_cutoff(today: NaiveDate) -> String {
    (today - chrono::Duration::days(OVERDUE_DAYS))
        .format(DATE_FMT)
        .to_string()
}

pub(crate) fn days_since(borrow_date: &str, today: NaiveDate) -> i64 {
    match NaiveDate::parse_from_str(borrow_date, DATE_FMT) {
        Ok(date) => (today - date).num_days(),
        Err(e) => {
            tracing::warn!("unparsable stored borrow_date '{}': {}", borrow_date, e);
            0
        }
    }
}
