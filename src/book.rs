//! Defines the book reference model and its database queries.
//!
//! Books are lookup data with one exception: creating a sale decrements the
//! book's stock. That decrement lives in the sales engine so it can share a
//! database transaction with the sale row insert; this module only covers
//! the table itself, lookups, seeding inserts, and price changes.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Error;

/// A book that can be sold, with its live price and remaining stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// The book's unique ID, e.g. `"B001"`.
    pub id: String,
    /// The book's title.
    pub title: String,
    /// The price per copy, in the smallest currency unit.
    pub price: i64,
    /// How many copies are left to sell.
    pub stock: i64,
}

/// Create the book table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_book_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS book (
                bid TEXT PRIMARY KEY,
                btitle TEXT NOT NULL,
                bprice INTEGER NOT NULL,
                bstock INTEGER NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Insert `book` into the database unless a book with the same ID already
/// exists, and report whether a row was inserted.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn insert_book(book: &Book, connection: &Connection) -> Result<bool, Error> {
    let inserted = connection.execute(
        "INSERT OR IGNORE INTO book (bid, btitle, bprice, bstock) VALUES (?1, ?2, ?3, ?4)",
        (&book.id, &book.title, book.price, book.stock),
    )?;

    Ok(inserted > 0)
}

/// Retrieve a book from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid book,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_book(id: &str, connection: &Connection) -> Result<Book, Error> {
    let book = connection
        .prepare("SELECT bid, btitle, bprice, bstock FROM book WHERE bid = :id")?
        .query_one(&[(":id", &id)], map_book_row)?;

    Ok(book)
}

/// Change the price of the book with `id`.
///
/// Sale totals are always recomputed from the live book price, so a price
/// change affects every later discount update on sales of this book, but
/// never the stored total of an untouched sale.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid book,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_book_price(id: &str, price: i64, connection: &Connection) -> Result<(), Error> {
    let updated = connection.execute(
        "UPDATE book SET bprice = ?1 WHERE bid = ?2",
        (price, &id),
    )?;

    if updated == 0 {
        return Err(Error::NotFound);
    }

    debug!(book_id = id, price, "updated book price");

    Ok(())
}

fn map_book_row(row: &Row) -> Result<Book, rusqlite::Error> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        price: row.get(2)?,
        stock: row.get(3)?,
    })
}
