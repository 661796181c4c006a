use std::fs;

use assert_matches::assert_matches;
use reqwest::StatusCode;

use gutenshelf::error::FetchError;
use gutenshelf::gutendex::{Envelope, check_status};

#[test]
fn parse_gutendex_envelope() {
    let raw = fs::read_to_string("tests/fixtures/gutendex_frankenstein.json").unwrap();
    let envelope: Envelope = serde_json::from_str(&raw).unwrap();

    assert_eq!(envelope.count, 3);
    assert_eq!(envelope.next, None);
    assert_eq!(envelope.results.len(), 3);

    let first = &envelope.results[0];
    assert_eq!(first.id, Some(84));
    assert_eq!(
        first.title.as_deref(),
        Some("Frankenstein; Or, The Modern Prometheus")
    );
    assert_eq!(first.languages, vec!["en"]);
    assert_eq!(first.download_count, Some(104413));
    assert_eq!(
        first.authors[0].name.as_deref(),
        Some("Shelley, Mary Wollstonecraft")
    );
    assert_eq!(first.authors[0].birth_year.as_deref(), Some("1797"));
    assert_eq!(first.authors[0].death_year.as_deref(), Some("1851"));
    assert!(envelope.results[2].authors.is_empty());
}

#[test]
fn years_accept_text_numbers_and_null() {
    let raw = r#"{
        "count": 1,
        "results": [{
            "id": 1,
            "title": "Some Book",
            "authors": [
                {"name": "A", "birth_year": "1800", "death_year": null},
                {"name": "B", "birth_year": -384, "death_year": -322},
                {"name": "C"}
            ],
            "languages": ["en"]
        }]
    }"#;
    let envelope: Envelope = serde_json::from_str(raw).unwrap();
    let authors = &envelope.results[0].authors;

    assert_eq!(authors[0].birth_year.as_deref(), Some("1800"));
    assert_eq!(authors[0].death_year, None);
    assert_eq!(authors[1].birth_year.as_deref(), Some("-384"));
    assert_eq!(authors[1].death_year.as_deref(), Some("-322"));
    assert_eq!(authors[2].birth_year, None);
    assert_eq!(envelope.results[0].download_count, None);
}

#[test]
fn missing_collections_default_to_empty() {
    let envelope: Envelope = serde_json::from_str(r#"{"count": 0}"#).unwrap();
    assert!(envelope.results.is_empty());
    assert_eq!(envelope.previous, None);
}

#[test]
fn success_status_accepted() {
    assert_eq!(check_status(StatusCode::OK), Ok(()));
}

#[test]
fn redirect_status_is_not_followed() {
    assert_eq!(
        check_status(StatusCode::MOVED_PERMANENTLY),
        Err(FetchError::Redirect)
    );
    assert_eq!(check_status(StatusCode::FOUND), Err(FetchError::Redirect));
    assert_eq!(
        check_status(StatusCode::PERMANENT_REDIRECT),
        Err(FetchError::Redirect)
    );
}

#[test]
fn error_status_means_unavailable() {
    assert_matches!(
        check_status(StatusCode::NOT_FOUND),
        Err(FetchError::Unavailable(detail)) if detail.contains("404")
    );
    assert_matches!(
        check_status(StatusCode::SERVICE_UNAVAILABLE),
        Err(FetchError::Unavailable(_))
    );
}
