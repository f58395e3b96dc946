//! The interactive menu for the bookstore manager.
//!
//! All prompting, parsing, and retry loops live here; the library validates
//! independently, so every engine operation is safe to call on its own.

use std::{
    fs::OpenOptions,
    io::{self, BufRead, Write},
    sync::Arc,
};

use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use bookstore_manager::{
    SaleDraft, SaleListEntry, create_sale, delete_sale, initialize, list_sales, sale_report,
    seed_reference_data, update_sale_discount,
};

/// The interactive bookstore sales manager.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, default_value = "bookstore.db")]
    db_path: String,

    /// File path for the debug log.
    #[arg(long, default_value = "bookstore.log")]
    log_path: String,
}

fn main() {
    let args = Args::parse();

    setup_logging(&args.log_path);

    let connection = Connection::open(&args.db_path).expect("Could not open the database");
    initialize(&connection).expect("Could not initialize the database");
    seed_reference_data(&connection).expect("Could not seed the reference data");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!();
        println!("*************** Menu ***************");
        println!("1. Record a sale");
        println!("2. Show the sales report");
        println!("3. Update a sale");
        println!("4. Delete a sale");
        println!("5. Quit");
        println!("************************************");

        let Some(choice) = prompt(&mut lines, "Choose an option (Enter to quit): ") else {
            break;
        };

        match choice.as_str() {
            "" | "5" => break,
            "1" => add_sale_flow(&connection, &mut lines),
            "2" => print_report(&connection),
            "3" => update_sale_flow(&connection, &mut lines),
            "4" => delete_sale_flow(&connection, &mut lines),
            _ => println!("=> Please choose an option between 1 and 5"),
        }
    }
}

fn add_sale_flow<I>(connection: &Connection, lines: &mut I)
where
    I: Iterator<Item = io::Result<String>>,
{
    let Some(date) = prompt(lines, "Sale date (YYYY-MM-DD): ") else {
        return;
    };
    let Some(member_id) = prompt(lines, "Member ID: ") else {
        return;
    };
    let Some(book_id) = prompt(lines, "Book ID: ") else {
        return;
    };
    let Some(quantity) = prompt_int(lines, "Quantity: ", |quantity| {
        if quantity > 0 {
            Ok(())
        } else {
            Err("Quantity must be a positive integer, please try again".to_owned())
        }
    }) else {
        return;
    };
    let Some(discount) = prompt_int(lines, "Discount: ", |discount| {
        if discount >= 0 {
            Ok(())
        } else {
            Err("Discount must not be negative, please try again".to_owned())
        }
    }) else {
        return;
    };

    match create_sale(
        SaleDraft {
            date,
            member_id,
            book_id,
            quantity,
            discount,
        },
        connection,
    ) {
        Ok(sale) => println!("=> Sale recorded! (total: {})", sale.total),
        Err(error) => println!("=> Error: {error}"),
    }
}

fn print_report(connection: &Connection) {
    let rows = match sale_report(connection) {
        Ok(rows) => rows,
        Err(error) => {
            println!("=> Error: {error}");
            return;
        }
    };

    println!();
    println!("==================== Sales report ====================");
    for (index, row) in rows.iter().enumerate() {
        println!();
        println!("Sale #{}", index + 1);
        println!("Sale ID:   {}", row.id);
        println!("Date:      {}", row.date);
        println!("Member:    {}", row.member_name);
        println!("Book:      {}", row.book_title);
        println!("{}", "-".repeat(54));
        println!("Price\tQty\tDiscount\tSubtotal");
        println!("{}", "-".repeat(54));
        println!(
            "{}\t{}\t{}\t\t{}",
            row.unit_price, row.quantity, row.discount, row.total
        );
        println!("{}", "-".repeat(54));
        println!("Total:     {}", row.total);
        println!("{}", "=".repeat(54));
    }
}

fn update_sale_flow<I>(connection: &Connection, lines: &mut I)
where
    I: Iterator<Item = io::Result<String>>,
{
    let Some(entry) = pick_sale(connection, lines, "update") else {
        return;
    };

    let Some(discount) = prompt_int(lines, "New discount: ", |discount| {
        if discount >= 0 {
            Ok(())
        } else {
            Err("Discount must not be negative, please try again".to_owned())
        }
    }) else {
        return;
    };

    match update_sale_discount(entry.id, discount, connection) {
        Ok(total) => println!("=> Sale {} updated! (total: {total})", entry.id),
        Err(error) => println!("=> Error: {error}"),
    }
}

fn delete_sale_flow<I>(connection: &Connection, lines: &mut I)
where
    I: Iterator<Item = io::Result<String>>,
{
    let Some(entry) = pick_sale(connection, lines, "delete") else {
        return;
    };

    match delete_sale(entry.id, connection) {
        Ok(()) => println!("=> Sale {} deleted", entry.id),
        Err(error) => println!("=> Error: {error}"),
    }
}

/// Show the numbered sale list and let the user pick one, or cancel with an
/// empty line. Returns `None` when there is nothing to pick or on cancel.
fn pick_sale<I>(connection: &Connection, lines: &mut I, action: &str) -> Option<SaleListEntry>
where
    I: Iterator<Item = io::Result<String>>,
{
    let entries = match list_sales(connection) {
        Ok(entries) => entries,
        Err(error) => {
            println!("=> Error: {error}");
            return None;
        }
    };

    if entries.is_empty() {
        println!("No sales to {action}");
        return None;
    }

    println!();
    println!("======== Sales ========");
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "{}. Sale ID: {} - member: {} - date: {}",
            index + 1,
            entry.id,
            entry.member_name,
            entry.date
        );
    }
    println!("{}", "=".repeat(23));

    let choice = prompt(
        lines,
        &format!("Pick a sale to {action} (number, Enter to cancel): "),
    )?;
    if choice.is_empty() {
        return None;
    }

    match choice.parse::<usize>() {
        Ok(number) if (1..=entries.len()).contains(&number) => {
            Some(entries[number - 1].clone())
        }
        _ => {
            println!("=> Please enter a valid number");
            None
        }
    }
}

/// Print `text` and read one trimmed line, or `None` on end of input.
fn prompt<I>(lines: &mut I, text: &str) -> Option<String>
where
    I: Iterator<Item = io::Result<String>>,
{
    print!("{text}");
    io::stdout().flush().ok();

    match lines.next() {
        Some(Ok(line)) => Some(line.trim().to_owned()),
        _ => None,
    }
}

/// Prompt for an integer until `validate` accepts it, or `None` on end of
/// input.
fn prompt_int<I>(
    lines: &mut I,
    text: &str,
    validate: impl Fn(i64) -> Result<(), String>,
) -> Option<i64>
where
    I: Iterator<Item = io::Result<String>>,
{
    loop {
        let line = prompt(lines, text)?;

        match line.parse::<i64>() {
            Ok(value) => match validate(value) {
                Ok(()) => return Some(value),
                Err(message) => println!("=> {message}"),
            },
            Err(_) => println!("=> Please enter a whole number"),
        }
    }
}

fn setup_logging(log_path: &str) {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .expect("Could not create log file");

    // The console is the interactive UI, so logs only go to the file.
    let file_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(file_log.with_filter(filter::LevelFilter::DEBUG))
        .init();
}
