//! Read-only reporting projection joining sales with their member and book
//! rows.
//!
//! Formatting and printing belong to the caller; this module only produces
//! the rows.

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{Error, database_id::SaleId};

/// One row of the sales report: a sale joined with its member and book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleReportRow {
    /// The ID of the sale.
    pub id: SaleId,
    /// The date the sale took place.
    pub date: Date,
    /// The name of the member the sale was made to.
    pub member_name: String,
    /// The title of the book that was sold.
    pub book_title: String,
    /// The book's current price per copy, in the smallest currency unit.
    pub unit_price: i64,
    /// How many copies were sold.
    pub quantity: i64,
    /// The discount applied, in the smallest currency unit.
    pub discount: i64,
    /// The total charged when the sale was created or last updated.
    pub total: i64,
}

/// Produce the sales report, ascending by sale ID.
///
/// Each row joins a sale with its member's name and its book's title and
/// current price. Sales whose member or book row has since disappeared are
/// not reported; referential integrity is only enforced at creation time.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn sale_report(connection: &Connection) -> Result<Vec<SaleReportRow>, Error> {
    connection
        .prepare(
            "SELECT s.sid, s.sdate, m.mname, b.btitle, b.bprice, s.sqty, s.sdiscount, s.stotal
             FROM sale s
             JOIN member m ON s.mid = m.mid
             JOIN book b ON s.bid = b.bid
             ORDER BY s.sid",
        )?
        .query_map([], |row| {
            Ok(SaleReportRow {
                id: row.get(0)?,
                date: row.get(1)?,
                member_name: row.get(2)?,
                book_title: row.get(3)?,
                unit_price: row.get(4)?,
                quantity: row.get(5)?,
                discount: row.get(6)?,
                total: row.get(7)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::SqlError))
        .collect()
}
