use std::io::Cursor;

use gutenshelf::app::App;
use gutenshelf::error::FetchError;
use gutenshelf::gutendex::{CatalogClient, Envelope, RawAuthor, RawBook};
use gutenshelf::menu::Menu;
use gutenshelf::store::SqliteCatalog;

/// Always finds the same book; the ranking is never available.
struct OneBookClient;

impl CatalogClient for OneBookClient {
    fn search(&self, _title: &str) -> Result<Envelope, FetchError> {
        Ok(Envelope {
            count: 1,
            results: vec![RawBook {
                id: Some(1342),
                title: Some("Pride and Prejudice".to_string()),
                authors: vec![RawAuthor {
                    name: Some("Austen, Jane".to_string()),
                    birth_year: Some("1775".to_string()),
                    death_year: Some("1817".to_string()),
                }],
                languages: vec!["en".to_string()],
                download_count: Some(70000),
            }],
            ..Envelope::default()
        })
    }

    fn search_top_by_downloads(&self) -> Result<Envelope, FetchError> {
        Err(FetchError::Unavailable("offline".to_string()))
    }
}

fn run_session(script: &str) -> String {
    let app = App::new(SqliteCatalog::open_memory().unwrap(), OneBookClient);
    let mut output = Vec::new();
    Menu::new(&app, Cursor::new(script.as_bytes()), &mut output)
        .run()
        .unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn register_then_list() {
    let out = run_session("1\nPride\n2\n3\n0\n");

    assert!(out.contains("Registered: "));
    assert!(out.contains("Pride and Prejudice"));
    assert!(out.contains("Austen, Jane (1775 - 1817)"));
    assert!(out.ends_with("Goodbye\n"));
}

#[test]
fn duplicate_registration_reports_error() {
    let out = run_session("1\nPride\n1\npride and\n0\n");

    assert!(out.contains("Error: "));
    assert_eq!(out.matches("Registered: ").count(), 1);
}

#[test]
fn empty_catalog_messages() {
    let out = run_session("2\n3\n8\nTwain\n0\n");

    assert!(out.contains("No books registered"));
    assert!(out.contains("No authors registered"));
    assert!(out.contains("No authors found with that name"));
}

#[test]
fn invalid_inputs_keep_the_loop_going() {
    let out = run_session("42\nabc\n4\nlast year\n5\n7\n0\n");

    assert_eq!(out.matches("Invalid option").count(), 2);
    assert!(out.contains("Please enter a valid year"));
    assert!(out.contains("Invalid language option"));
    assert!(out.ends_with("Goodbye\n"));
}

#[test]
fn language_picker_filters_books() {
    let out = run_session("1\nPride\n5\n2\n5\n1\n0\n");

    assert!(out.contains("2. English - en"));
    assert!(out.contains("No books in that language"));
    assert_eq!(out.matches("Pride and Prejudice").count(), 2);
}

#[test]
fn reversed_birth_range_is_rejected() {
    let out = run_session("9\n1900\n1800\n9\n1700\n1800\n0\n");

    assert!(out.contains("Error: "));
    assert!(out.contains("No authors found in that range"));
}

#[test]
fn ranking_and_statistics() {
    let out = run_session("7\n6\n0\n");

    assert!(out.contains("=== Top 10 most downloaded ==="));
    assert!(out.contains("Ranking unavailable"));
    assert!(out.contains("=== Statistics ==="));
    assert!(out.contains("Total books: 0"));
}

#[test]
fn end_of_input_exits_quietly() {
    let out = run_session("2\n");

    assert!(out.contains("No books registered"));
    assert!(!out.contains("Goodbye"));
}
