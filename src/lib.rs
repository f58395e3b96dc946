//! Bookstore manager records retail book sales against member and book
//! reference tables in a local SQLite database.
//!
//! This library is the sales transaction engine: validated, atomic sale
//! creation, discount updates that recompute the total from the book's
//! current price, deletion, and the read-only report projection. Every
//! operation takes an explicit [rusqlite::Connection]; there is no ambient
//! database state, so tests and callers can supply in-memory databases.
//!
//! The interactive menu that drives the engine lives in the `cli` binary.

#![warn(missing_docs)]

mod book;
mod database_id;
mod date;
mod db;
mod error;
mod member;
mod report;
mod sale;

pub use book::{Book, get_book, insert_book, set_book_price};
pub use database_id::SaleId;
pub use date::{is_valid_sale_date, parse_sale_date};
pub use db::{initialize, seed_reference_data};
pub use error::Error;
pub use member::{Member, get_member, insert_member, member_exists};
pub use report::{SaleReportRow, sale_report};
pub use sale::{
    Sale, SaleDraft, SaleListEntry, count_sales, create_sale, delete_sale, get_sale, list_sales,
    update_sale_discount,
};
