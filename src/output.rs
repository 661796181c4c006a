use std::fmt::Display;
use std::io::{self, Write};

use serde::Serialize;

use crate::app::Registration;
use crate::domain::Statistics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize>(value: &T) -> io::Result<()> {
        Self::write(&mut io::stdout(), value)
    }

    pub fn write<T: Serialize>(out: &mut dyn Write, value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        out.write_all(json.as_bytes())?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn list<T: Display>(out: &mut dyn Write, items: &[T], empty: &str) -> io::Result<()> {
        if items.is_empty() {
            return writeln!(out, "{empty}");
        }
        for item in items {
            writeln!(out, "{item}")?;
        }
        Ok(())
    }

    pub fn registration(out: &mut dyn Write, registration: &Registration) -> io::Result<()> {
        match registration {
            Registration::Registered(book) => writeln!(out, "Registered: {book}"),
            Registration::NotFound => writeln!(out, "No book found for that title"),
        }
    }

    pub fn statistics(out: &mut dyn Write, stats: &Statistics) -> io::Result<()> {
        writeln!(out, "=== Statistics ===")?;
        writeln!(out, "Total books: {}", stats.total_books)?;
        writeln!(out, "Total authors: {}", stats.distinct_authors)?;
        writeln!(
            out,
            "Average books per author: {:.2}",
            stats.average_books_per_author
        )?;
        writeln!(out, "Books by language:")?;
        for (language, count) in &stats.books_by_language {
            writeln!(out, "  {language}: {count}")?;
        }
        Ok(())
    }
}
