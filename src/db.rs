/*! This module defines the database schema setup and reference-data seeding. */

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    book::{Book, create_book_table, insert_book},
    member::{Member, create_member_table, insert_member},
    sale::create_sale_table,
};

/// Create the database tables for the domain models.
///
/// The tables are created inside a single exclusive transaction, and
/// creation is idempotent, so this can run on every startup.
///
/// # Errors
/// Returns an error if the database cannot be initialized.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_member_table(&transaction)?;
    create_book_table(&transaction)?;
    create_sale_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Insert the demo members and books if they are not already present.
///
/// Only reference rows are seeded, and only when absent, so rerunning this
/// on startup never duplicates rows or resets a book's stock. Sales are
/// never seeded.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn seed_reference_data(connection: &Connection) -> Result<(), Error> {
    let members = [
        ("M001", "Alice", "0912-345678", Some("alice@example.com")),
        ("M002", "Bob", "0923-456789", Some("bob@example.com")),
        ("M003", "Cathy", "0934-567890", Some("cathy@example.com")),
    ];

    for (id, name, phone, email) in members {
        insert_member(
            &Member {
                id: id.to_owned(),
                name: name.to_owned(),
                phone: phone.to_owned(),
                email: email.map(str::to_owned),
            },
            connection,
        )?;
    }

    let books = [
        ("B001", "Python Programming", 600, 50),
        ("B002", "Data Science Basics", 800, 30),
        ("B003", "Machine Learning Guide", 1200, 20),
    ];

    for (id, title, price, stock) in books {
        insert_book(
            &Book {
                id: id.to_owned(),
                title: title.to_owned(),
                price,
                stock,
            },
            connection,
        )?;
    }

    Ok(())
}
