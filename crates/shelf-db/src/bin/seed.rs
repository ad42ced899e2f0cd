//! # Seed Data Generator
//!
//! Populates a database with a demo bookstore catalog and an administrator.
//!
//! ## Usage
//! ```bash
//! # Default catalog into ./shelf_dev.db, admin "admin"
//! cargo run -p shelf-db --bin seed
//!
//! # Custom path and admin
//! cargo run -p shelf-db --bin seed -- --db ./data/shelf.db --admin manager
//!
//! # Three copies of every title instead of one (distinct editions)
//! cargo run -p shelf-db --bin seed -- --editions 3
//! ```
//!
//! Every generated book gets a valid ISBN-13, a price between $7.99 and
//! $29.99 and a stock level between 0 and 24, so the low-stock and
//! out-of-stock views have something to show.

use std::env;

use shelf_core::validation::validate_new_book;
use shelf_core::{NewBook, NewCustomer};
use shelf_db::{Database, DbConfig};

/// (genre, [(title, author)])
const CATALOG: &[(&str, &[(&str, &str)])] = &[
    (
        "Science Fiction",
        &[
            ("Dune", "Frank Herbert"),
            ("The Left Hand of Darkness", "Ursula K. Le Guin"),
            ("Neuromancer", "William Gibson"),
            ("Kindred", "Octavia E. Butler"),
            ("Hyperion", "Dan Simmons"),
            ("The Three-Body Problem", "Liu Cixin"),
            ("Foundation", "Isaac Asimov"),
            ("Solaris", "Stanisław Lem"),
        ],
    ),
    (
        "Fantasy",
        &[
            ("A Wizard of Earthsea", "Ursula K. Le Guin"),
            ("The Hobbit", "J. R. R. Tolkien"),
            ("Piranesi", "Susanna Clarke"),
            ("The Name of the Wind", "Patrick Rothfuss"),
            ("Mistborn", "Brandon Sanderson"),
            ("Howl's Moving Castle", "Diana Wynne Jones"),
        ],
    ),
    (
        "Classics",
        &[
            ("Pride and Prejudice", "Jane Austen"),
            ("Middlemarch", "George Eliot"),
            ("Moby-Dick", "Herman Melville"),
            ("Anna Karenina", "Leo Tolstoy"),
            ("Great Expectations", "Charles Dickens"),
            ("Jane Eyre", "Charlotte Brontë"),
        ],
    ),
    (
        "Literary Fiction",
        &[
            ("Beloved", "Toni Morrison"),
            ("The Remains of the Day", "Kazuo Ishiguro"),
            ("Pachinko", "Min Jin Lee"),
            ("Never Let Me Go", "Kazuo Ishiguro"),
            ("The Overstory", "Richard Powers"),
        ],
    ),
    (
        "History",
        &[
            ("SPQR", "Mary Beard"),
            ("The Guns of August", "Barbara W. Tuchman"),
            ("The Silk Roads", "Peter Frankopan"),
            ("A Distant Mirror", "Barbara W. Tuchman"),
        ],
    ),
    (
        "Poetry",
        &[
            ("Leaves of Grass", "Walt Whitman"),
            ("Ariel", "Sylvia Plath"),
            ("The Odyssey", "Homer"),
        ],
    ),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Ada Lovelace", "ada@example.com"),
    ("Grace Hopper", "grace@example.com"),
    ("Alan Turing", "alan@example.com"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./shelf_dev.db");
    let mut admin = env::var("SHELF_ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
    let mut editions: usize = 1;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" if i + 1 < args.len() => {
                db_path = args[i + 1].clone();
                i += 1;
            }
            "--admin" | "-a" if i + 1 < args.len() => {
                admin = args[i + 1].clone();
                i += 1;
            }
            "--editions" | "-e" if i + 1 < args.len() => {
                editions = args[i + 1].parse().unwrap_or(1).max(1);
                i += 1;
            }
            "--help" | "-h" => {
                println!("Shelf POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: ./shelf_dev.db)");
                println!("  -a, --admin <USER>     Administrator to grant (default: $SHELF_ADMIN_USER or admin)");
                println!("  -e, --editions <N>     Editions generated per title (default: 1)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Shelf POS Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Admin:    {}", admin);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    db.grant_admin(&admin).await?;
    let session = db.session(&admin).await?;

    println!("✓ Connected, migrations applied, admin granted");

    let existing = session.books().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0usize;
    let mut seq = 0u64;

    for (genre, titles) in CATALOG {
        for (title, author) in titles.iter() {
            for edition in 0..editions {
                let book = generate_book(genre, title, author, edition, seq);
                seq += 1;

                if let Err(e) = validate_new_book(&book) {
                    eprintln!("Skipping {}: {}", book.title, e);
                    continue;
                }
                if let Err(e) = session.books().insert(&book).await {
                    eprintln!("Failed to insert {}: {}", book.title, e);
                    continue;
                }
                generated += 1;
            }
        }
    }

    for (name, email) in CUSTOMERS {
        let customer = NewCustomer {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            address: None,
        };
        if let Err(e) = session.customers().insert(&customer).await {
            eprintln!("Failed to insert customer {}: {}", name, e);
        }
    }

    println!();
    println!("✓ Generated {} books in {:?}", generated, start.elapsed());
    println!("✓ {} customers on file", session.customers().count().await?);
    println!("✓ {} sales on file", session.sales().count().await?);

    db.close().await;
    Ok(())
}

fn generate_book(genre: &str, title: &str, author: &str, edition: usize, seq: u64) -> NewBook {
    let title = if edition == 0 {
        title.to_string()
    } else {
        format!("{} (edition {})", title, edition + 1)
    };

    NewBook {
        title,
        author: author.to_string(),
        isbn: Some(isbn13(seq)),
        genre: genre.to_string(),
        price_cents: 799 + ((seq * 373) % 2201) as i64,
        stock: ((seq * 7) % 25) as i64,
    }
}

/// A valid ISBN-13 in the 979-8 range: twelve digits plus check digit.
fn isbn13(seq: u64) -> String {
    let body = format!("9798{:08}", seq % 100_000_000);
    let sum: u32 = body
        .chars()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    let check = (10 - sum % 10) % 10;
    format!("{}{}", body, check)
}
