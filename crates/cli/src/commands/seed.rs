//! Demo data seeding command.
//!
//! Inserts a small catalogue so a fresh install has something to show.
//! Idempotent: refuses to run when books already exist.

use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

use super::CommandError;

struct SeedBook {
    title: &'static str,
    isbn: &'static str,
    page_count: i32,
    year: i32,
    price: &'static str,
    stock: i32,
    copies_printed: i32,
    language: &'static str,
    publisher: &'static str,
    author: (&'static str, &'static str),
    category: &'static str,
}

const SEED_BOOKS: &[SeedBook] = &[
    SeedBook {
        title: "Les Misérables",
        isbn: "978-2253096337",
        page_count: 1664,
        year: 1862,
        price: "12.90",
        stock: 14,
        copies_printed: 65000,
        language: "French",
        publisher: "Le Livre de Poche",
        author: ("Victor", "Hugo"),
        category: "Classics",
    },
    SeedBook {
        title: "Vingt mille lieues sous les mers",
        isbn: "978-2253006329",
        page_count: 640,
        year: 1870,
        price: "8.40",
        stock: 9,
        copies_printed: 42000,
        language: "French",
        publisher: "Le Livre de Poche",
        author: ("Jules", "Verne"),
        category: "Adventure",
    },
    SeedBook {
        title: "L'Étranger",
        isbn: "978-2070360024",
        page_count: 192,
        year: 1942,
        price: "7.50",
        stock: 21,
        copies_printed: 90000,
        language: "French",
        publisher: "Gallimard",
        author: ("Albert", "Camus"),
        category: "Classics",
    },
    SeedBook {
        title: "Dune",
        isbn: "978-0441172719",
        page_count: 412,
        year: 1965,
        price: "9.99",
        stock: 6,
        copies_printed: 30000,
        language: "English",
        publisher: "Ace Books",
        author: ("Frank", "Herbert"),
        category: "Science Fiction",
    },
    SeedBook {
        title: "Le Petit Prince",
        isbn: "978-2070612758",
        page_count: 96,
        year: 1943,
        price: "6.90",
        stock: 30,
        copies_printed: 140000,
        language: "French",
        publisher: "Gallimard",
        author: ("Antoine", "de Saint-Exupéry"),
        category: "Classics",
    },
];

async fn get_or_create_publisher(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<i32, sqlx::Error> {
    let existing: Option<(i32,)> = sqlx::query_as("SELECT id FROM publisher WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }
    let (id,): (i32,) = sqlx::query_as("INSERT INTO publisher (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

async fn get_or_create_author(
    tx: &mut Transaction<'_, Postgres>,
    first_name: &str,
    last_name: &str,
) -> Result<i32, sqlx::Error> {
    let existing: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM author WHERE first_name = $1 AND last_name = $2")
            .bind(first_name)
            .bind(last_name)
            .fetch_optional(&mut **tx)
            .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }
    let (id,): (i32,) =
        sqlx::query_as("INSERT INTO author (first_name, last_name) VALUES ($1, $2) RETURNING id")
            .bind(first_name)
            .bind(last_name)
            .fetch_one(&mut **tx)
            .await?;
    Ok(id)
}

async fn get_or_create_category(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<i32, sqlx::Error> {
    let existing: Option<(i32,)> = sqlx::query_as("SELECT id FROM category WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }
    let (id,): (i32,) = sqlx::query_as("INSERT INTO category (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

/// Seed demo publishers, authors, categories and books.
///
/// # Errors
///
/// Returns `CommandError` if books already exist or any insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book")
        .fetch_one(&pool)
        .await?;
    if existing > 0 {
        return Err(CommandError::Invalid(format!(
            "the catalogue already has {existing} book(s); seeding is for empty databases"
        )));
    }

    let mut tx = pool.begin().await?;

    for book in SEED_BOOKS {
        let publisher_id = get_or_create_publisher(&mut tx, book.publisher).await?;
        let author_id = get_or_create_author(&mut tx, book.author.0, book.author.1).await?;
        let category_id = get_or_create_category(&mut tx, book.category).await?;

        let price: Decimal = book
            .price
            .parse()
            .map_err(|_| CommandError::Invalid(format!("bad seed price: {}", book.price)))?;
        let publication_date = chrono::NaiveDate::from_ymd_opt(book.year, 1, 1);

        let (book_id,): (i32,) = sqlx::query_as(
            "INSERT INTO book (title, isbn, page_count, publication_date, price, stock, \
                               copies_printed, language, publisher_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(book.title)
        .bind(book.isbn)
        .bind(book.page_count)
        .bind(publication_date)
        .bind(price)
        .bind(book.stock)
        .bind(book.copies_printed)
        .bind(book.language)
        .bind(publisher_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO book_author (book_id, author_id) VALUES ($1, $2)")
            .bind(book_id)
            .bind(author_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO book_category (book_id, category_id) VALUES ($1, $2)")
            .bind(book_id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(books = SEED_BOOKS.len(), "demo catalogue seeded");

    #[allow(clippy::print_stdout)]
    {
        println!("Seeded {} demo books.", SEED_BOOKS.len());
    }

    Ok(())
}
