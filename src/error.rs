use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum FetchError {
    #[error("Gutendex answered with a redirect; refusing to follow it")]
    #[diagnostic(help("check `api_base_url` in the config, it probably needs a trailing slash"))]
    Redirect,

    #[error("Gutendex is unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum MappingError {
    #[error("book title is empty")]
    InvalidTitle,

    #[error("book has no language")]
    InvalidLanguage,

    #[error("book author has no name")]
    InvalidAuthor,

    #[error("author {name} died ({death_year}) before being born ({birth_year})")]
    InvalidAuthorDates {
        name: String,
        birth_year: u32,
        death_year: u32,
    },

    #[error("language not accepted by this catalog: {0}")]
    UnsupportedLanguage(String),
}

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("search title is empty")]
    EmptyTitle,

    #[error("a book matching {0:?} is already registered")]
    Duplicate(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mapping(#[from] MappingError),

    #[error("birth year range is reversed: {start} > {end}")]
    InvalidYearRange { start: u32, end: u32 },

    #[error("storage error: {0}")]
    Store(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Store(err.to_string())
    }
}
