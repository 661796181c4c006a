use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::MappingError;

/// Author name recorded on books whose API entry lists no authors.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Languages the catalog accepts unless the config says otherwise.
pub const DEFAULT_LANGUAGES: [&str; 4] = ["es", "en", "fr", "pt"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub language: String,
    pub author: String,
    pub download_count: u64,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] by {} ({} downloads)",
            self.title, self.language, self.author, self.download_count
        )
    }
}

/// A book that passed validation and is waiting for an id from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub language: String,
    pub author: String,
    pub download_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub birth_year: u32,
    pub death_year: u32,
    pub alive: bool,
}

impl Author {
    /// Kept literally: `death_year >= year` never holds for a living author
    /// (death year 0) once `year > 0`, so this only matches for year 0.
    pub fn lived_in_year(&self, year: u32) -> bool {
        self.alive && self.birth_year <= year && self.death_year >= year
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let birth = year_label(self.birth_year);
        let death = if self.alive {
            "alive".to_string()
        } else {
            year_label(self.death_year)
        };
        write!(f, "{} ({birth} - {death})", self.name)
    }
}

fn year_label(year: u32) -> String {
    if year == 0 {
        "?".to_string()
    } else {
        year.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    name: String,
    birth_year: u32,
    death_year: u32,
}

impl NewAuthor {
    pub fn new(name: &str, birth_year: u32, death_year: u32) -> Result<Self, MappingError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MappingError::InvalidAuthor);
        }
        if death_year > 0 && death_year < birth_year {
            return Err(MappingError::InvalidAuthorDates {
                name: name.to_string(),
                birth_year,
                death_year,
            });
        }
        Ok(Self {
            name: name.to_string(),
            birth_year,
            death_year,
        })
    }

    /// Builds an author from API year text. Unreadable years become 0 instead
    /// of failing the registration; the date ordering check still applies.
    pub fn from_year_text(
        name: &str,
        birth_year: Option<&str>,
        death_year: Option<&str>,
    ) -> Result<Self, MappingError> {
        let birth = parse_year_lenient(name, "birth", birth_year);
        let death = parse_year_lenient(name, "death", death_year);
        Self::new(name, birth, death)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn birth_year(&self) -> u32 {
        self.birth_year
    }

    pub fn death_year(&self) -> u32 {
        self.death_year
    }

    pub fn alive(&self) -> bool {
        self.death_year == 0
    }
}

/// Absent, non-numeric and negative (BCE) years all collapse to 0.
pub fn parse_year_lenient(author: &str, field: &str, text: Option<&str>) -> u32 {
    let Some(text) = text.map(str::trim).filter(|value| !value.is_empty()) else {
        return 0;
    };
    match text.parse::<i64>() {
        Ok(year) => match u32::try_from(year) {
            Ok(year) => year,
            Err(_) => {
                warn!(author, field, value = text, "year out of range; treating as unknown");
                0
            }
        },
        Err(err) => {
            warn!(author, field, value = text, %err, "unparsable year; treating as unknown");
            0
        }
    }
}

/// Empty `allowed` means no restriction.
pub fn language_allowed(allowed: &[String], code: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|lang| lang == code)
}

/// Case-insensitive substring test shared by the duplicate guard and the
/// author search.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_books: u64,
    pub distinct_authors: u64,
    pub books_by_language: BTreeMap<String, u64>,
    pub average_books_per_author: f64,
}

impl Statistics {
    /// Authors are counted by the display name stored on each book, not from
    /// the authors table.
    pub fn from_books(books: &[Book]) -> Self {
        let mut per_author = BTreeMap::<&str, u64>::new();
        let mut books_by_language = BTreeMap::<String, u64>::new();
        for book in books {
            *per_author.entry(book.author.as_str()).or_default() += 1;
            *books_by_language.entry(book.language.clone()).or_default() += 1;
        }
        let distinct_authors = per_author.len() as u64;
        let average_books_per_author = if distinct_authors == 0 {
            0.0
        } else {
            books.len() as f64 / distinct_authors as f64
        };
        Self {
            total_books: books.len() as u64,
            distinct_authors,
            books_by_language,
            average_books_per_author,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularBook {
    pub title: String,
    pub download_count: u64,
    pub author: String,
}

impl fmt::Display for PopularBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} ({} downloads)",
            self.title, self.author, self.download_count
        )
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn book(author: &str, language: &str) -> Book {
        Book {
            id: 0,
            title: format!("{author} {language}"),
            language: language.to_string(),
            author: author.to_string(),
            download_count: 0,
        }
    }

    #[test]
    fn lenient_year_parsing() {
        assert_eq!(parse_year_lenient("x", "birth", Some("1797")), 1797);
        assert_eq!(parse_year_lenient("x", "birth", Some(" 1851 ")), 1851);
        assert_eq!(parse_year_lenient("x", "birth", Some("circa 1800")), 0);
        assert_eq!(parse_year_lenient("x", "birth", Some("-384")), 0);
        assert_eq!(parse_year_lenient("x", "birth", Some("")), 0);
        assert_eq!(parse_year_lenient("x", "birth", None), 0);
    }

    #[test]
    fn author_death_before_birth_rejected() {
        let err = NewAuthor::from_year_text("Someone", Some("1980"), Some("1950")).unwrap_err();
        assert_matches!(
            err,
            MappingError::InvalidAuthorDates {
                birth_year: 1980,
                death_year: 1950,
                ..
            }
        );
    }

    #[test]
    fn unknown_death_year_means_alive() {
        let author = NewAuthor::from_year_text("Someone", Some("1980"), None).unwrap();
        assert_eq!(author.birth_year(), 1980);
        assert_eq!(author.death_year(), 0);
        assert!(author.alive());
    }

    #[test]
    fn blank_author_name_rejected() {
        assert_matches!(NewAuthor::new("  ", 0, 0), Err(MappingError::InvalidAuthor));
    }

    #[test]
    fn statistics_count_display_names() {
        let books = vec![book("A", "en"), book("A", "fr"), book("B", "en")];
        let stats = Statistics::from_books(&books);
        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.distinct_authors, 2);
        assert_eq!(stats.average_books_per_author, 1.5);
        assert_eq!(stats.books_by_language.get("en"), Some(&2));
        assert_eq!(stats.books_by_language.get("fr"), Some(&1));
    }

    #[test]
    fn statistics_empty_catalog() {
        let stats = Statistics::from_books(&[]);
        assert_eq!(stats.total_books, 0);
        assert_eq!(stats.average_books_per_author, 0.0);
        assert!(stats.books_by_language.is_empty());
    }

    #[test]
    fn case_insensitive_contains() {
        assert!(contains_ignore_case("Frankenstein; Or, The Modern Prometheus", "FRANKEN"));
        assert!(contains_ignore_case("Les Misérables", "misérABLES"));
        assert!(!contains_ignore_case("Dracula", "Frankenstein"));
    }
}
