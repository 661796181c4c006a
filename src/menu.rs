//! Numbered interactive menu driven from any line reader.

use std::io::{self, BufRead, Write};

use crate::app::App;
use crate::error::CatalogError;
use crate::gutendex::CatalogClient;
use crate::output::TextOutput;
use crate::store::Catalog;

const LANGUAGES: [(&str, &str); 4] = [
    ("Spanish", "es"),
    ("English", "en"),
    ("French", "fr"),
    ("Portuguese", "pt"),
];

pub struct Menu<'a, C: Catalog, G: CatalogClient, R: BufRead, W: Write> {
    app: &'a App<C, G>,
    input: R,
    output: W,
}

impl<'a, C: Catalog, G: CatalogClient, R: BufRead, W: Write> Menu<'a, C, G, R, W> {
    pub fn new(app: &'a App<C, G>, input: R, output: W) -> Self {
        Self { app, input, output }
    }

    /// Loops until option 0 or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_menu()?;
            let Some(line) = self.read_line()? else {
                return Ok(());
            };
            match line.parse::<u32>() {
                Ok(0) => {
                    writeln!(self.output, "Goodbye")?;
                    return Ok(());
                }
                Ok(1) => self.register()?,
                Ok(2) => {
                    let result = self.app.list_books();
                    self.show(result, |out, books| {
                        TextOutput::list(out, &books, "No books registered")
                    })?
                }
                Ok(3) => {
                    let result = self.app.list_authors();
                    self.show(result, |out, authors| {
                        TextOutput::list(out, &authors, "No authors registered")
                    })?
                }
                Ok(4) => self.living_authors()?,
                Ok(5) => self.books_by_language()?,
                Ok(6) => {
                    let result = self.app.compute_statistics();
                    self.show(result, |out, stats| TextOutput::statistics(out, &stats))?
                }
                Ok(7) => {
                    writeln!(self.output, "=== Top 10 most downloaded ===")?;
                    let top = self.app.top10_by_downloads();
                    TextOutput::list(&mut self.output, &top, "Ranking unavailable")?
                }
                Ok(8) => self.search_authors()?,
                Ok(9) => self.authors_by_birth_range()?,
                _ => writeln!(self.output, "Invalid option")?,
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "=== GUTENSHELF ===")?;
        writeln!(self.output, "1. Search and register a book by title")?;
        writeln!(self.output, "2. List registered books")?;
        writeln!(self.output, "3. List registered authors")?;
        writeln!(self.output, "4. List authors alive in a given year")?;
        writeln!(self.output, "5. List books by language")?;
        writeln!(self.output, "6. Show statistics")?;
        writeln!(self.output, "7. Show top 10 most downloaded books")?;
        writeln!(self.output, "8. Search authors by name")?;
        writeln!(self.output, "9. List authors by birth year range")?;
        writeln!(self.output, "0. Exit")?;
        write!(self.output, "Choose an option (0-9): ")?;
        self.output.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        Ok(self.read_line()?.unwrap_or_default())
    }

    fn prompt_year(&mut self, label: &str) -> io::Result<Option<u32>> {
        let answer = self.prompt(label)?;
        match answer.parse::<u32>() {
            Ok(year) => Ok(Some(year)),
            Err(_) => {
                writeln!(self.output, "Please enter a valid year")?;
                Ok(None)
            }
        }
    }

    fn show<T>(
        &mut self,
        result: Result<T, CatalogError>,
        render: impl FnOnce(&mut dyn Write, T) -> io::Result<()>,
    ) -> io::Result<()> {
        match result {
            Ok(value) => render(&mut self.output, value),
            Err(err) => writeln!(self.output, "Error: {err}"),
        }
    }

    fn register(&mut self) -> io::Result<()> {
        let title = self.prompt("Book title: ")?;
        let result = self.app.register_book(&title);
        self.show(result, |out, registration| {
            TextOutput::registration(out, &registration)
        })
    }

    fn living_authors(&mut self) -> io::Result<()> {
        let Some(year) = self.prompt_year("Year: ")? else {
            return Ok(());
        };
        let result = self.app.list_living_authors_in_year(year);
        self.show(result, |out, authors| {
            TextOutput::list(out, &authors, "No authors alive in that year")
        })
    }

    fn books_by_language(&mut self) -> io::Result<()> {
        writeln!(self.output, "Available languages:")?;
        for (index, (name, code)) in LANGUAGES.iter().enumerate() {
            writeln!(self.output, "{}. {name} - {code}", index + 1)?;
        }
        let answer = self.prompt("Pick a language (1-4): ")?;
        let code = answer
            .parse::<usize>()
            .ok()
            .and_then(|choice| choice.checked_sub(1))
            .and_then(|index| LANGUAGES.get(index))
            .map(|(_, code)| *code);
        let Some(code) = code else {
            return writeln!(self.output, "Invalid language option");
        };
        let result = self.app.list_books_by_language(code);
        self.show(result, |out, books| {
            TextOutput::list(out, &books, "No books in that language")
        })
    }

    fn search_authors(&mut self) -> io::Result<()> {
        let name = self.prompt("Author name: ")?;
        let result = self.app.search_authors_by_name(&name);
        self.show(result, |out, authors| {
            TextOutput::list(out, &authors, "No authors found with that name")
        })
    }

    fn authors_by_birth_range(&mut self) -> io::Result<()> {
        let Some(start) = self.prompt_year("Start year: ")? else {
            return Ok(());
        };
        let Some(end) = self.prompt_year("End year: ")? else {
            return Ok(());
        };
        if start > end {
            let err = CatalogError::InvalidYearRange { start, end };
            return writeln!(self.output, "Error: {err}");
        }
        let result = self.app.list_authors_by_birth_year_range(start, end);
        self.show(result, |out, authors| {
            TextOutput::list(out, &authors, "No authors found in that range")
        })
    }
}
