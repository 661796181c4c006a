use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    Author, Book, DEFAULT_LANGUAGES, NewAuthor, PopularBook, Statistics, language_allowed,
};
use crate::error::{CatalogError, MappingError};
use crate::guard::is_duplicate_title;
use crate::gutendex::{CatalogClient, RawAuthor};
use crate::mapper::{map_first, popular};
use crate::store::{Catalog, CatalogTx};

const TOP_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Registration {
    Registered(Book),
    /// The search matched nothing. Not an error.
    NotFound,
}

pub struct App<C: Catalog, G: CatalogClient> {
    catalog: C,
    client: G,
    languages: Vec<String>,
}

impl<C: Catalog, G: CatalogClient> App<C, G> {
    pub fn new(catalog: C, client: G) -> Self {
        Self {
            catalog,
            client,
            languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    /// Searches Gutendex for `title` and stores the first hit.
    ///
    /// The duplicate check, the author lookup/insert and the book insert all
    /// run inside one transaction: on any error nothing is written. The
    /// duplicate check runs before the request, so a duplicate never touches
    /// the network.
    pub fn register_book(&self, title: &str) -> Result<Registration, CatalogError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CatalogError::EmptyTitle);
        }

        self.catalog.atomically(|tx| {
            if is_duplicate_title(tx, title)? {
                info!(title, "register.duplicate");
                return Err(CatalogError::Duplicate(title.to_string()));
            }

            let envelope = self.client.search(title)?;
            debug!(title, count = envelope.count, "register.fetched");

            let Some(candidate) = map_first(&envelope)? else {
                info!(title, "register.not_found");
                return Ok(Registration::NotFound);
            };

            if !language_allowed(&self.languages, &candidate.language) {
                return Err(MappingError::UnsupportedLanguage(candidate.language).into());
            }

            if let Some(raw) = &candidate.author {
                ensure_author(tx, raw)?;
            }

            let book = tx.save_book(&candidate.to_new_book())?;
            info!(
                id = book.id,
                title = %book.title,
                author = %book.author,
                "register.saved"
            );
            Ok(Registration::Registered(book))
        })
    }

    pub fn is_duplicate_title(&self, title: &str) -> Result<bool, CatalogError> {
        self.catalog.read(|tx| is_duplicate_title(tx, title))
    }

    pub fn list_books(&self) -> Result<Vec<Book>, CatalogError> {
        self.catalog.read(|tx| tx.list_books())
    }

    pub fn list_authors(&self) -> Result<Vec<Author>, CatalogError> {
        self.catalog.read(|tx| tx.list_authors())
    }

    pub fn list_books_by_language(&self, language: &str) -> Result<Vec<Book>, CatalogError> {
        self.catalog.read(|tx| tx.find_books_by_language(language))
    }

    /// See [`Author::lived_in_year`] for why this is empty for any year > 0.
    pub fn list_living_authors_in_year(&self, year: u32) -> Result<Vec<Author>, CatalogError> {
        let authors = self.catalog.read(|tx| tx.list_authors())?;
        Ok(authors
            .into_iter()
            .filter(|author| author.lived_in_year(year))
            .collect())
    }

    pub fn search_authors_by_name(&self, fragment: &str) -> Result<Vec<Author>, CatalogError> {
        self.catalog.read(|tx| tx.find_authors_by_name(fragment))
    }

    /// Inclusive. Callers reject `start > end` before getting here.
    pub fn list_authors_by_birth_year_range(
        &self,
        start: u32,
        end: u32,
    ) -> Result<Vec<Author>, CatalogError> {
        self.catalog
            .read(|tx| tx.find_authors_by_birth_range(start, end))
    }

    pub fn compute_statistics(&self) -> Result<Statistics, CatalogError> {
        let books = self.catalog.read(|tx| tx.list_books())?;
        Ok(Statistics::from_books(&books))
    }

    /// Reporting only: failures are logged and yield an empty list.
    pub fn top10_by_downloads(&self) -> Vec<PopularBook> {
        match self.client.search_top_by_downloads() {
            Ok(envelope) => envelope.results.iter().take(TOP_LIMIT).map(popular).collect(),
            Err(err) => {
                warn!(%err, "top10.unavailable");
                Vec::new()
            }
        }
    }
}

fn ensure_author(tx: &dyn CatalogTx, raw: &RawAuthor) -> Result<Author, CatalogError> {
    let name = raw.name.as_deref().unwrap_or_default();
    if let Some(existing) = tx.find_author_by_name(name)? {
        debug!(id = existing.id, name, "register.author_reused");
        return Ok(existing);
    }
    let author = NewAuthor::from_year_text(name, raw.birth_year.as_deref(), raw.death_year.as_deref())?;
    let saved = tx.save_author(&author)?;
    info!(
        id = saved.id,
        name = %saved.name,
        birth_year = saved.birth_year,
        death_year = saved.death_year,
        "register.author_created"
    );
    Ok(saved)
}
