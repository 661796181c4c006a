use crate::error::CatalogError;
use crate::store::BookStore;

/// True when any stored title contains `title`, ignoring case. Deliberately
/// coarse: "Frankenstein" blocks "Frankenstein; Or, The Modern Prometheus".
pub fn is_duplicate_title<S>(books: &S, title: &str) -> Result<bool, CatalogError>
where
    S: BookStore + ?Sized,
{
    Ok(!books.find_books_by_title(title)?.is_empty())
}
