//! Turns the loosely typed Gutendex payload into a validated [`Candidate`].

use crate::domain::{NewBook, PopularBook, UNKNOWN_AUTHOR};
use crate::error::MappingError;
use crate::gutendex::{Envelope, RawAuthor, RawBook};

/// A book and, unless the author is unknown, the raw author it came with.
/// Nothing here has been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub language: String,
    pub author_name: String,
    pub download_count: u64,
    pub author: Option<RawAuthor>,
}

impl Candidate {
    pub fn to_new_book(&self) -> NewBook {
        NewBook {
            title: self.title.clone(),
            language: self.language.clone(),
            author: self.author_name.clone(),
            download_count: self.download_count,
        }
    }
}

/// Maps the first result exactly as the API ordered it. `Ok(None)` when the
/// search matched nothing.
pub fn map_first(envelope: &Envelope) -> Result<Option<Candidate>, MappingError> {
    envelope.results.first().map(map_book).transpose()
}

pub fn map_book(raw: &RawBook) -> Result<Candidate, MappingError> {
    let title = raw
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or(MappingError::InvalidTitle)?;

    let language = raw
        .languages
        .first()
        .map(|code| code.trim())
        .filter(|code| !code.is_empty())
        .ok_or(MappingError::InvalidLanguage)?;

    let (author_name, author) = match raw.authors.first() {
        None => (UNKNOWN_AUTHOR.to_string(), None),
        Some(first) => {
            let name = first
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or(MappingError::InvalidAuthor)?;
            // An author literally called "Unknown" is the sentinel too.
            let record = (name != UNKNOWN_AUTHOR).then(|| RawAuthor {
                name: Some(name.to_string()),
                birth_year: first.birth_year.clone(),
                death_year: first.death_year.clone(),
            });
            (name.to_string(), record)
        }
    };

    Ok(Candidate {
        title: title.to_string(),
        language: language.to_string(),
        author_name,
        download_count: raw.download_count.unwrap_or(0),
        author,
    })
}

/// Read-side projection for the download ranking; never fails.
pub fn popular(raw: &RawBook) -> PopularBook {
    PopularBook {
        title: raw.title.clone().unwrap_or_default(),
        download_count: raw.download_count.unwrap_or(0),
        author: raw
            .authors
            .first()
            .and_then(|author| author.name.clone())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
    }
}
