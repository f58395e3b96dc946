//! Defines the application level error type.

use crate::database_id::SaleId;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A sale date that is not a real calendar date in `YYYY-MM-DD` format.
    #[error("\"{0}\" is not a valid date in YYYY-MM-DD format")]
    InvalidDate(String),

    /// The member ID or book ID on a new sale does not refer to an existing
    /// row.
    ///
    /// Callers are deliberately not told which of the two IDs was wrong.
    #[error("the member ID or book ID is invalid")]
    InvalidReference,

    /// A sale quantity that is zero or negative.
    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),

    /// The requested quantity exceeds the book's remaining stock.
    #[error("insufficient stock (current stock: {available})")]
    InsufficientStock {
        /// The book's stock at the time of the failed request.
        available: i64,
    },

    /// A negative discount amount.
    #[error("discount must not be negative, got {0}")]
    InvalidDiscount(i64),

    /// Tried to update a sale that is not in the database.
    ///
    /// This can happen when a sale is picked from the selection list and then
    /// deleted before the update runs.
    #[error("tried to update sale {0}, which is not in the database")]
    UpdateMissingSale(SaleId),

    /// The requested record could not be found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested record could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    ///
    /// Mutations surface this only after the enclosing database transaction
    /// has been rolled back.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
