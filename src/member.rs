//! Defines the member reference model and its database queries.
//!
//! Members are lookup data: the sales engine checks that a member exists
//! before recording a sale against them, but never mutates a member row.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A store member that sales are recorded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// The member's unique ID, e.g. `"M001"`.
    pub id: String,
    /// The member's display name.
    pub name: String,
    /// The member's phone number.
    pub phone: String,
    /// The member's email address, if one was provided.
    pub email: Option<String>,
}

/// Create the member table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_member_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS member (
                mid TEXT PRIMARY KEY,
                mname TEXT NOT NULL,
                mphone TEXT NOT NULL,
                memail TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Insert `member` into the database unless a member with the same ID already
/// exists, and report whether a row was inserted.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn insert_member(member: &Member, connection: &Connection) -> Result<bool, Error> {
    let inserted = connection.execute(
        "INSERT OR IGNORE INTO member (mid, mname, mphone, memail) VALUES (?1, ?2, ?3, ?4)",
        (&member.id, &member.name, &member.phone, &member.email),
    )?;

    Ok(inserted > 0)
}

/// Check whether a member with `id` exists.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn member_exists(id: &str, connection: &Connection) -> Result<bool, Error> {
    let count: i64 = connection
        .prepare("SELECT COUNT(mid) FROM member WHERE mid = :id")?
        .query_one(&[(":id", &id)], |row| row.get(0))?;

    Ok(count > 0)
}

/// Retrieve a member from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid member,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_member(id: &str, connection: &Connection) -> Result<Member, Error> {
    let member = connection
        .prepare("SELECT mid, mname, mphone, memail FROM member WHERE mid = :id")?
        .query_one(&[(":id", &id)], map_member_row)?;

    Ok(member)
}

fn map_member_row(row: &Row) -> Result<Member, rusqlite::Error> {
    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
    })
}

#[cfg(test)]
mod member_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{Member, get_member, insert_member, member_exists};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn alice() -> Member {
        Member {
            id: "M001".to_owned(),
            name: "Alice".to_owned(),
            phone: "0912-345678".to_owned(),
            email: Some("alice@example.com".to_owned()),
        }
    }

    #[test]
    fn insert_and_get_member() {
        let conn = get_test_connection();
        let member = alice();

        insert_member(&member, &conn).expect("Could not insert member");

        assert_eq!(get_member("M001", &conn), Ok(member));
    }

    #[test]
    fn insert_ignores_existing_id() {
        let conn = get_test_connection();
        let member = alice();
        assert!(insert_member(&member, &conn).unwrap());

        let duplicate = Member {
            name: "Someone Else".to_owned(),
            ..alice()
        };

        assert!(!insert_member(&duplicate, &conn).unwrap());
        assert_eq!(get_member("M001", &conn), Ok(member));
    }

    #[test]
    fn member_without_email() {
        let conn = get_test_connection();
        let member = Member {
            email: None,
            ..alice()
        };

        insert_member(&member, &conn).unwrap();

        assert_eq!(get_member("M001", &conn), Ok(member));
    }

    #[test]
    fn exists_reflects_inserts() {
        let conn = get_test_connection();

        assert_eq!(member_exists("M001", &conn), Ok(false));

        insert_member(&alice(), &conn).unwrap();

        assert_eq!(member_exists("M001", &conn), Ok(true));
        assert_eq!(member_exists("M999", &conn), Ok(false));
    }

    #[test]
    fn get_member_fails_on_unknown_id() {
        let conn = get_test_connection();

        assert_eq!(get_member("M404", &conn), Err(Error::NotFound));
    }
}
