//! Relational persistence for books and authors.
//!
//! The pipeline only sees the [`BookStore`] and [`AuthorStore`] capabilities.
//! [`Catalog`] hands them out either for plain reads or inside a single
//! transaction that commits only when the whole unit of work succeeds.

use std::fs;
use std::sync::{Mutex, MutexGuard};

use camino::Utf8Path;
use rusqlite::{Connection, Row, TransactionBehavior, params};
use tracing::debug;

use crate::domain::{Author, Book, NewAuthor, NewBook, contains_ignore_case};
use crate::error::CatalogError;

pub trait BookStore {
    fn save_book(&self, book: &NewBook) -> Result<Book, CatalogError>;
    /// Case-insensitive substring match on the title.
    fn find_books_by_title(&self, fragment: &str) -> Result<Vec<Book>, CatalogError>;
    fn find_books_by_language(&self, language: &str) -> Result<Vec<Book>, CatalogError>;
    fn list_books(&self) -> Result<Vec<Book>, CatalogError>;
}

pub trait AuthorStore {
    fn save_author(&self, author: &NewAuthor) -> Result<Author, CatalogError>;
    fn find_author_by_name(&self, name: &str) -> Result<Option<Author>, CatalogError>;
    /// Case-insensitive substring match on the name.
    fn find_authors_by_name(&self, fragment: &str) -> Result<Vec<Author>, CatalogError>;
    /// Inclusive on both ends.
    fn find_authors_by_birth_range(&self, start: u32, end: u32)
    -> Result<Vec<Author>, CatalogError>;
    fn list_authors(&self) -> Result<Vec<Author>, CatalogError>;
}

pub trait CatalogTx: BookStore + AuthorStore {}

impl<T: BookStore + AuthorStore> CatalogTx for T {}

pub trait Catalog: Send + Sync {
    fn read<T, F>(&self, work: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&dyn CatalogTx) -> Result<T, CatalogError>;

    /// Runs `work` in one transaction. Any error rolls everything back.
    fn atomically<T, F>(&self, work: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&dyn CatalogTx) -> Result<T, CatalogError>;
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    language TEXT NOT NULL CHECK (length(trim(language)) > 0),
    author TEXT NOT NULL CHECK (length(trim(author)) > 0),
    download_count INTEGER NOT NULL DEFAULT 0 CHECK (download_count >= 0)
);

CREATE INDEX IF NOT EXISTS idx_books_language ON books(language);

CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
    birth_year INTEGER NOT NULL DEFAULT 0 CHECK (birth_year >= 0),
    death_year INTEGER NOT NULL DEFAULT 0 CHECK (death_year >= 0),
    alive BOOLEAN NOT NULL,
    CHECK (death_year = 0 OR death_year >= birth_year),
    CHECK (alive = (death_year = 0))
);

CREATE INDEX IF NOT EXISTS idx_authors_birth_year ON authors(birth_year);
"#;

pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Opens or creates the catalog file, creating parent directories.
    pub fn open(path: &Utf8Path) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| CatalogError::Store(format!("{parent}: {err}")))?;
        }
        let conn = Connection::open(path.as_std_path())?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        debug!(path = %path, "catalog opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Store("catalog connection lock poisoned".to_string()))
    }
}

impl Catalog for SqliteCatalog {
    fn read<T, F>(&self, work: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&dyn CatalogTx) -> Result<T, CatalogError>,
    {
        let conn = self.lock()?;
        work(&SqliteTx { conn: &*conn })
    }

    fn atomically<T, F>(&self, work: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&dyn CatalogTx) -> Result<T, CatalogError>,
    {
        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front so the duplicate check and
        // the inserts cannot interleave with another writer.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = work(&SqliteTx { conn: &*tx })?;
        tx.commit()?;
        Ok(value)
    }
}

struct SqliteTx<'a> {
    conn: &'a Connection,
}

const BOOK_COLUMNS: &str = "id, title, language, author, download_count";
const AUTHOR_COLUMNS: &str = "id, name, birth_year, death_year, alive";

impl SqliteTx<'_> {
    fn query_books(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Book>, CatalogError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books {filter} ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, row_to_book)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn query_authors(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Author>, CatalogError> {
        let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors {filter} ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, row_to_author)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl BookStore for SqliteTx<'_> {
    fn save_book(&self, book: &NewBook) -> Result<Book, CatalogError> {
        let downloads = i64::try_from(book.download_count)
            .map_err(|_| CatalogError::Store("download count out of range".to_string()))?;
        self.conn.execute(
            "INSERT INTO books (title, language, author, download_count) VALUES (?1, ?2, ?3, ?4)",
            params![book.title, book.language, book.author, downloads],
        )?;
        Ok(Book {
            id: self.conn.last_insert_rowid(),
            title: book.title.clone(),
            language: book.language.clone(),
            author: book.author.clone(),
            download_count: book.download_count,
        })
    }

    // SQLite's LOWER() only folds ASCII, so the match runs here instead.
    fn find_books_by_title(&self, fragment: &str) -> Result<Vec<Book>, CatalogError> {
        let books = self.list_books()?;
        Ok(books
            .into_iter()
            .filter(|book| contains_ignore_case(&book.title, fragment))
            .collect())
    }

    fn find_books_by_language(&self, language: &str) -> Result<Vec<Book>, CatalogError> {
        self.query_books("WHERE language = ?1", params![language])
    }

    fn list_books(&self) -> Result<Vec<Book>, CatalogError> {
        self.query_books("", [])
    }
}

impl AuthorStore for SqliteTx<'_> {
    fn save_author(&self, author: &NewAuthor) -> Result<Author, CatalogError> {
        self.conn.execute(
            "INSERT INTO authors (name, birth_year, death_year, alive) VALUES (?1, ?2, ?3, ?4)",
            params![
                author.name(),
                author.birth_year(),
                author.death_year(),
                author.alive()
            ],
        )?;
        Ok(Author {
            id: self.conn.last_insert_rowid(),
            name: author.name().to_string(),
            birth_year: author.birth_year(),
            death_year: author.death_year(),
            alive: author.alive(),
        })
    }

    fn find_author_by_name(&self, name: &str) -> Result<Option<Author>, CatalogError> {
        let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE name = ?1 LIMIT 1");
        let mut stmt = self.conn.prepare(&sql)?;
        match stmt.query_row(params![name], row_to_author) {
            Ok(author) => Ok(Some(author)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_authors_by_name(&self, fragment: &str) -> Result<Vec<Author>, CatalogError> {
        let authors = self.list_authors()?;
        Ok(authors
            .into_iter()
            .filter(|author| contains_ignore_case(&author.name, fragment))
            .collect())
    }

    fn find_authors_by_birth_range(
        &self,
        start: u32,
        end: u32,
    ) -> Result<Vec<Author>, CatalogError> {
        self.query_authors("WHERE birth_year BETWEEN ?1 AND ?2", params![start, end])
    }

    fn list_authors(&self) -> Result<Vec<Author>, CatalogError> {
        self.query_authors("", [])
    }
}

fn row_to_book(row: &Row<'_>) -> rusqlite::Result<Book> {
    let downloads: i64 = row.get(4)?;
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        language: row.get(2)?,
        author: row.get(3)?,
        download_count: u64::try_from(downloads).unwrap_or(0),
    })
}

fn row_to_author(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        name: row.get(1)?,
        birth_year: row.get(2)?,
        death_year: row.get(3)?,
        alive: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_rejects_death_before_birth() {
        let catalog = SqliteCatalog::open_memory().unwrap();
        let conn = catalog.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO authors (name, birth_year, death_year, alive) VALUES ('x', 1980, 1950, 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn schema_is_idempotent() {
        let catalog = SqliteCatalog::open_memory().unwrap();
        let conn = catalog.lock().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
    }
}
