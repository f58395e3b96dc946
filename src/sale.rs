//! The sales transaction engine.
//!
//! A sale links one member, one book, a quantity, a discount, and a total
//! computed as `price * quantity - discount`. Creation validates the raw
//! intent, then inserts the sale row and decrements the book's stock as one
//! database transaction. Updates change only the discount and recompute the
//! total from the book's price at that moment, not the price when the sale
//! was created. Deletes never restore stock.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::debug;

use crate::{
    Error,
    book::get_book,
    database_id::SaleId,
    date::parse_sale_date,
    member::member_exists,
};

/// A recorded sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    /// The ID of the sale.
    pub id: SaleId,
    /// The date the sale took place.
    pub date: Date,
    /// The ID of the member the sale was made to.
    pub member_id: String,
    /// The ID of the book that was sold.
    pub book_id: String,
    /// How many copies were sold.
    pub quantity: i64,
    /// The discount applied, in the smallest currency unit.
    pub discount: i64,
    /// The total charged: the book's price at creation time times the
    /// quantity, minus the discount. Not clamped at zero.
    pub total: i64,
}

/// The raw intent for a new sale, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    /// The sale date as entered by the caller, expected in `YYYY-MM-DD`
    /// format.
    pub date: String,
    /// The ID of the member buying the book.
    pub member_id: String,
    /// The ID of the book being bought.
    pub book_id: String,
    /// How many copies to sell. Must be positive.
    pub quantity: i64,
    /// The discount in the smallest currency unit. Must not be negative.
    pub discount: i64,
}

/// A row in the list used to pick a sale to update or delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleListEntry {
    /// The ID of the sale.
    pub id: SaleId,
    /// The name of the member the sale was made to.
    pub member_name: String,
    /// The date the sale took place.
    pub date: Date,
}

/// Create a new sale and decrement the sold book's stock.
///
/// Validation runs in a fixed order and stops at the first failure: the date
/// format, then the member and book references, then the quantity against
/// the book's stock, then the discount. The sale row insert and the stock
/// decrement commit as a single database transaction, so a failure at any
/// point leaves both tables untouched.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDate] if `draft.date` is not a calendar date in
///   `YYYY-MM-DD` format,
/// - [Error::InvalidReference] if the member or book ID does not exist,
/// - [Error::InvalidQuantity] if `draft.quantity` is zero or negative,
/// - [Error::InsufficientStock] if `draft.quantity` exceeds the book's
///   current stock,
/// - [Error::InvalidDiscount] if `draft.discount` is negative,
/// - or [Error::SqlError] if the insert or stock update fails, after the
///   whole operation has been rolled back.
pub fn create_sale(draft: SaleDraft, connection: &Connection) -> Result<Sale, Error> {
    let date = parse_sale_date(&draft.date)?;

    let tx = connection.unchecked_transaction()?;

    if !member_exists(&draft.member_id, &tx)? {
        return Err(Error::InvalidReference);
    }

    let book = match get_book(&draft.book_id, &tx) {
        Ok(book) => book,
        Err(Error::NotFound) => return Err(Error::InvalidReference),
        Err(error) => return Err(error),
    };

    if draft.quantity <= 0 {
        return Err(Error::InvalidQuantity(draft.quantity));
    }

    if draft.quantity > book.stock {
        return Err(Error::InsufficientStock {
            available: book.stock,
        });
    }

    if draft.discount < 0 {
        return Err(Error::InvalidDiscount(draft.discount));
    }

    let total = book.price * draft.quantity - draft.discount;

    let sale = tx
        .prepare(
            "INSERT INTO sale (sdate, mid, bid, sqty, sdiscount, stotal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING sid, sdate, mid, bid, sqty, sdiscount, stotal",
        )?
        .query_one(
            (
                &date,
                &draft.member_id,
                &draft.book_id,
                draft.quantity,
                draft.discount,
                total,
            ),
            map_sale_row,
        )?;

    // The conditional update keeps a concurrent writer from overselling,
    // even though the stock was already checked above.
    let updated = tx.execute(
        "UPDATE book SET bstock = bstock - ?1 WHERE bid = ?2 AND bstock >= ?1",
        (draft.quantity, &draft.book_id),
    )?;

    if updated == 0 {
        return Err(Error::InsufficientStock {
            available: book.stock,
        });
    }

    tx.commit()?;

    debug!(sale_id = sale.id, total = sale.total, "created sale");

    Ok(sale)
}

/// Retrieve a sale from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid sale,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_sale(id: SaleId, connection: &Connection) -> Result<Sale, Error> {
    let sale = connection
        .prepare("SELECT sid, sdate, mid, bid, sqty, sdiscount, stotal FROM sale WHERE sid = :id")?
        .query_one(&[(":id", &id)], map_sale_row)?;

    Ok(sale)
}

/// List every sale as (sale ID, member name, date), ascending by sale ID.
///
/// This is the list the update and delete flows present for picking a sale.
/// An empty list is a valid result, not an error.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_sales(connection: &Connection) -> Result<Vec<SaleListEntry>, Error> {
    connection
        .prepare(
            "SELECT s.sid, m.mname, s.sdate
             FROM sale s
             JOIN member m ON s.mid = m.mid
             ORDER BY s.sid",
        )?
        .query_map([], |row| {
            Ok(SaleListEntry {
                id: row.get(0)?,
                member_name: row.get(1)?,
                date: row.get(2)?,
            })
        })?
        .map(|maybe_entry| maybe_entry.map_err(Error::SqlError))
        .collect()
}

/// Get the total number of sales in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_sales(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(sid) FROM sale;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Update a sale's discount and recompute its total, returning the new total.
///
/// The total is recomputed as the book's *current* price times the sale's
/// quantity, minus `new_discount`. The read and the write share one database
/// transaction. The book's stock is not touched.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDiscount] if `new_discount` is negative,
/// - [Error::UpdateMissingSale] if `sale_id` is not in the database,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_sale_discount(
    sale_id: SaleId,
    new_discount: i64,
    connection: &Connection,
) -> Result<i64, Error> {
    if new_discount < 0 {
        return Err(Error::InvalidDiscount(new_discount));
    }

    let tx = connection.unchecked_transaction()?;

    let (quantity, price): (i64, i64) = match tx
        .prepare(
            "SELECT s.sqty, b.bprice
             FROM sale s
             JOIN book b ON s.bid = b.bid
             WHERE s.sid = :id",
        )?
        .query_one(&[(":id", &sale_id)], |row| Ok((row.get(0)?, row.get(1)?)))
    {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(Error::UpdateMissingSale(sale_id));
        }
        Err(error) => return Err(error.into()),
    };

    let total = price * quantity - new_discount;

    tx.execute(
        "UPDATE sale SET sdiscount = ?1, stotal = ?2 WHERE sid = ?3",
        (new_discount, total, sale_id),
    )?;

    tx.commit()?;

    debug!(sale_id, total, "updated sale discount");

    Ok(total)
}

/// Delete a sale.
///
/// Deleting an ID that is not in the database is a no-op that succeeds.
/// The sold book's stock is never restored.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn delete_sale(sale_id: SaleId, connection: &Connection) -> Result<(), Error> {
    connection.execute("DELETE FROM sale WHERE sid = ?1", [sale_id])?;

    debug!(sale_id, "deleted sale");

    Ok(())
}

/// Create the sale table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_sale_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS sale (
                sid INTEGER PRIMARY KEY AUTOINCREMENT,
                sdate TEXT NOT NULL,
                mid TEXT NOT NULL,
                bid TEXT NOT NULL,
                sqty INTEGER NOT NULL,
                sdiscount INTEGER NOT NULL,
                stotal INTEGER NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('sale', 0)",
        (),
    )?;

    Ok(())
}

fn map_sale_row(row: &Row) -> Result<Sale, rusqlite::Error> {
    Ok(Sale {
        id: row.get(0)?,
        date: row.get(1)?,
        member_id: row.get(2)?,
        book_id: row.get(3)?,
        quantity: row.get(4)?,
        discount: row.get(5)?,
        total: row.get(6)?,
    })
}

#[cfg(test)]
mod sale_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        book::{Book, get_book, insert_book, set_book_price},
        db::initialize,
        member::{Member, insert_member},
    };

    use super::{
        SaleDraft, count_sales, create_sale, delete_sale, get_sale, list_sales,
        update_sale_discount,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        insert_member(
            &Member {
                id: "M001".to_owned(),
                name: "Alice".to_owned(),
                phone: "0912-345678".to_owned(),
                email: Some("alice@example.com".to_owned()),
            },
            &conn,
        )
        .unwrap();

        insert_member(
            &Member {
                id: "M002".to_owned(),
                name: "Bob".to_owned(),
                phone: "0923-456789".to_owned(),
                email: None,
            },
            &conn,
        )
        .unwrap();

        insert_book(
            &Book {
                id: "B001".to_owned(),
                title: "Python Programming".to_owned(),
                price: 600,
                stock: 50,
            },
            &conn,
        )
        .unwrap();

        conn
    }

    fn draft() -> SaleDraft {
        SaleDraft {
            date: "2024-02-01".to_owned(),
            member_id: "M001".to_owned(),
            book_id: "B001".to_owned(),
            quantity: 2,
            discount: 100,
        }
    }

    fn stock_of(book_id: &str, conn: &Connection) -> i64 {
        get_book(book_id, conn).unwrap().stock
    }

    #[test]
    fn create_computes_total_and_decrements_stock() {
        let conn = get_test_connection();

        let sale = create_sale(draft(), &conn).expect("Could not create sale");

        assert_eq!(sale.total, 600 * 2 - 100);
        assert_eq!(sale.date, date!(2024 - 02 - 01));
        assert_eq!(sale.member_id, "M001");
        assert_eq!(sale.book_id, "B001");
        assert_eq!(sale.quantity, 2);
        assert_eq!(sale.discount, 100);
        assert_eq!(stock_of("B001", &conn), 48);
        assert_eq!(get_sale(sale.id, &conn), Ok(sale));
    }

    #[test]
    fn create_assigns_ascending_ids_from_one() {
        let conn = get_test_connection();

        let first = create_sale(draft(), &conn).unwrap();
        let second = create_sale(draft(), &conn).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn create_fails_on_invalid_date() {
        let conn = get_test_connection();

        let result = create_sale(
            SaleDraft {
                date: "2024/02/01".to_owned(),
                ..draft()
            },
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidDate("2024/02/01".to_owned())));
        assert_eq!(count_sales(&conn), Ok(0));
        assert_eq!(stock_of("B001", &conn), 50);
    }

    #[test]
    fn create_reports_date_error_before_reference_errors() {
        let conn = get_test_connection();

        // Everything about this draft is wrong; the date check wins.
        let result = create_sale(
            SaleDraft {
                date: "2024-02-30".to_owned(),
                member_id: "M404".to_owned(),
                book_id: "B404".to_owned(),
                quantity: -1,
                discount: -1,
            },
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidDate("2024-02-30".to_owned())));
    }

    #[test]
    fn create_fails_on_unknown_member() {
        let conn = get_test_connection();

        let result = create_sale(
            SaleDraft {
                member_id: "M404".to_owned(),
                ..draft()
            },
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidReference));
        assert_eq!(count_sales(&conn), Ok(0));
        assert_eq!(stock_of("B001", &conn), 50);
    }

    #[test]
    fn create_fails_on_unknown_book() {
        let conn = get_test_connection();

        let result = create_sale(
            SaleDraft {
                book_id: "B404".to_owned(),
                ..draft()
            },
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidReference));
        assert_eq!(count_sales(&conn), Ok(0));
    }

    #[test]
    fn create_fails_on_non_positive_quantity() {
        let conn = get_test_connection();

        for quantity in [0, -3] {
            let result = create_sale(SaleDraft { quantity, ..draft() }, &conn);

            assert_eq!(result, Err(Error::InvalidQuantity(quantity)));
        }

        assert_eq!(count_sales(&conn), Ok(0));
        assert_eq!(stock_of("B001", &conn), 50);
    }

    #[test]
    fn create_fails_when_stock_insufficient() {
        let conn = get_test_connection();

        let result = create_sale(
            SaleDraft {
                quantity: 51,
                ..draft()
            },
            &conn,
        );

        assert_eq!(result, Err(Error::InsufficientStock { available: 50 }));
        assert_eq!(count_sales(&conn), Ok(0));
        assert_eq!(stock_of("B001", &conn), 50);
    }

    #[test]
    fn insufficient_stock_error_reports_current_stock() {
        let conn = get_test_connection();
        create_sale(draft(), &conn).unwrap();

        let result = create_sale(
            SaleDraft {
                quantity: 49,
                ..draft()
            },
            &conn,
        );

        assert_eq!(result, Err(Error::InsufficientStock { available: 48 }));
    }

    #[test]
    fn create_fails_on_negative_discount() {
        let conn = get_test_connection();

        let result = create_sale(
            SaleDraft {
                discount: -50,
                ..draft()
            },
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidDiscount(-50)));
        assert_eq!(count_sales(&conn), Ok(0));
        assert_eq!(stock_of("B001", &conn), 50);
    }

    #[test]
    fn over_discounting_is_allowed_and_can_go_negative() {
        let conn = get_test_connection();

        let sale = create_sale(
            SaleDraft {
                quantity: 1,
                discount: 700,
                ..draft()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(sale.total, -100);
    }

    #[test]
    fn list_sales_is_empty_without_sales() {
        let conn = get_test_connection();

        assert_eq!(list_sales(&conn), Ok(vec![]));
    }

    #[test]
    fn list_sales_orders_by_id_with_member_names() {
        let conn = get_test_connection();
        create_sale(draft(), &conn).unwrap();
        create_sale(
            SaleDraft {
                date: "2024-02-02".to_owned(),
                member_id: "M002".to_owned(),
                quantity: 1,
                discount: 0,
                ..draft()
            },
            &conn,
        )
        .unwrap();

        let entries = list_sales(&conn).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, 1);
        assert_eq!(entries[0].member_name, "Alice");
        assert_eq!(entries[0].date, date!(2024 - 02 - 01));
        assert_eq!(entries[1].id, 2);
        assert_eq!(entries[1].member_name, "Bob");
        assert_eq!(entries[1].date, date!(2024 - 02 - 02));
    }

    #[test]
    fn update_recomputes_total_from_current_price() {
        let conn = get_test_connection();
        let sale = create_sale(draft(), &conn).unwrap();
        assert_eq!(sale.total, 1100);

        set_book_price("B001", 700, &conn).unwrap();

        let total = update_sale_discount(sale.id, 50, &conn).expect("Could not update sale");

        assert_eq!(total, 700 * 2 - 50);

        let updated = get_sale(sale.id, &conn).unwrap();
        assert_eq!(updated.discount, 50);
        assert_eq!(updated.total, 1350);
        // Stock is untouched by updates.
        assert_eq!(stock_of("B001", &conn), 48);
    }

    #[test]
    fn update_rejects_negative_discount() {
        let conn = get_test_connection();
        let sale = create_sale(draft(), &conn).unwrap();

        let result = update_sale_discount(sale.id, -1, &conn);

        assert_eq!(result, Err(Error::InvalidDiscount(-1)));
        assert_eq!(get_sale(sale.id, &conn).unwrap().discount, 100);
    }

    #[test]
    fn update_fails_on_missing_sale() {
        let conn = get_test_connection();

        let result = update_sale_discount(42, 50, &conn);

        assert_eq!(result, Err(Error::UpdateMissingSale(42)));
    }

    #[test]
    fn delete_removes_sale_and_keeps_stock() {
        let conn = get_test_connection();
        let sale = create_sale(draft(), &conn).unwrap();
        assert_eq!(stock_of("B001", &conn), 48);

        delete_sale(sale.id, &conn).expect("Could not delete sale");

        assert_eq!(list_sales(&conn), Ok(vec![]));
        assert_eq!(get_sale(sale.id, &conn), Err(Error::NotFound));
        // Deleting a sale does not return the copies to stock.
        assert_eq!(stock_of("B001", &conn), 48);
    }

    #[test]
    fn delete_missing_sale_is_a_no_op() {
        let conn = get_test_connection();

        assert_eq!(delete_sale(42, &conn), Ok(()));
    }

    #[test]
    fn create_update_delete_round() {
        let conn = get_test_connection();

        let sale = create_sale(draft(), &conn).unwrap();
        assert_eq!(sale.total, 1100);
        assert_eq!(stock_of("B001", &conn), 48);

        let total = update_sale_discount(sale.id, 200, &conn).unwrap();
        assert_eq!(total, 1000);

        delete_sale(sale.id, &conn).unwrap();
        assert_eq!(list_sales(&conn), Ok(vec![]));
        assert_eq!(stock_of("B001", &conn), 48);
    }
}
