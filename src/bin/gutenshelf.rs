use std::io;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use chrono::Datelike;
use clap::{Args, Parser, Subcommand};
use miette::{Diagnostic, IntoDiagnostic};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use gutenshelf::app::{App, Registration};
use gutenshelf::config::{ConfigLoader, ResolvedConfig};
use gutenshelf::error::CatalogError;
use gutenshelf::gutendex::GutendexHttpClient;
use gutenshelf::menu::Menu;
use gutenshelf::output::{JsonOutput, OutputMode, TextOutput};
use gutenshelf::store::SqliteCatalog;

#[derive(Parser)]
#[command(name = "gutenshelf")]
#[command(about = "Keep a local catalog of Project Gutenberg books found through Gutendex")]
#[command(version, author)]
struct Cli {
    /// Config file (defaults to ./gutenshelf.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// SQLite catalog file, overriding the config
    #[arg(long, global = true)]
    database: Option<Utf8PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Search Gutendex by title and register the first match")]
    Register(RegisterArgs),
    #[command(about = "List registered books")]
    Books(BooksArgs),
    #[command(about = "List or search registered authors")]
    Authors(AuthorsArgs),
    #[command(about = "List authors alive in a given year")]
    Living(LivingArgs),
    #[command(about = "List authors born within a year range")]
    Born(BornArgs),
    #[command(about = "Show catalog statistics")]
    Stats,
    #[command(about = "Show the 10 most downloaded books on Gutendex")]
    Top,
}

#[derive(Args)]
struct RegisterArgs {
    title: String,
}

#[derive(Args)]
struct BooksArgs {
    /// Only books in this language code (es, en, fr, pt, ...)
    #[arg(long)]
    language: Option<String>,
}

#[derive(Args)]
struct AuthorsArgs {
    /// Case-insensitive fragment of the author name
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args)]
struct LivingArgs {
    /// Defaults to the current year
    year: Option<u32>,
}

#[derive(Args)]
struct BornArgs {
    #[arg(long)]
    from: u32,
    #[arg(long)]
    to: u32,
}

#[derive(Debug, Error, Diagnostic)]
#[error("no book on Gutendex matched {0:?}")]
struct NoMatch(String);

type CatalogApp = App<SqliteCatalog, GutendexHttpClient>;

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(err));
        }
        if report.downcast_ref::<NoMatch>().is_some() {
            return ExitCode::from(2);
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::Duplicate(_) => 2,
        CatalogError::Fetch(_) => 3,
        CatalogError::Mapping(_) => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    let app = build_app(&config)?;

    match cli.command {
        Some(command) => run_command(command, &app, output_mode),
        None => {
            let stdin = io::stdin();
            let mut menu = Menu::new(&app, stdin.lock(), io::stdout());
            menu.run().into_diagnostic()
        }
    }
}

fn build_app(config: &ResolvedConfig) -> miette::Result<CatalogApp> {
    let catalog = SqliteCatalog::open(&config.database_path)?;
    let client = GutendexHttpClient::new(&config.api_base_url, config.timeout)?;
    Ok(App::new(catalog, client).with_languages(config.languages.clone()))
}

fn run_command(command: Command, app: &CatalogApp, output_mode: OutputMode) -> miette::Result<()> {
    let mut stdout = io::stdout();
    match command {
        Command::Register(args) => {
            let registration = app.register_book(&args.title)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&registration).into_diagnostic()?,
                OutputMode::Text => {
                    TextOutput::registration(&mut stdout, &registration).into_diagnostic()?
                }
            }
            if registration == Registration::NotFound {
                return Err(NoMatch(args.title).into());
            }
            Ok(())
        }
        Command::Books(args) => {
            let books = match args.language.as_deref() {
                Some(language) => app.list_books_by_language(language)?,
                None => app.list_books()?,
            };
            print_list(output_mode, &books, "No books registered")
        }
        Command::Authors(args) => {
            let authors = match args.name.as_deref() {
                Some(name) => app.search_authors_by_name(name)?,
                None => app.list_authors()?,
            };
            print_list(output_mode, &authors, "No authors found")
        }
        Command::Living(args) => {
            let year = args
                .year
                .unwrap_or_else(|| chrono::Local::now().year().max(0) as u32);
            let authors = app.list_living_authors_in_year(year)?;
            print_list(output_mode, &authors, "No authors alive in that year")
        }
        Command::Born(args) => {
            if args.from > args.to {
                return Err(CatalogError::InvalidYearRange {
                    start: args.from,
                    end: args.to,
                }
                .into());
            }
            let authors = app.list_authors_by_birth_year_range(args.from, args.to)?;
            print_list(output_mode, &authors, "No authors found in that range")
        }
        Command::Stats => {
            let stats = app.compute_statistics()?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&stats).into_diagnostic(),
                OutputMode::Text => TextOutput::statistics(&mut stdout, &stats).into_diagnostic(),
            }
        }
        Command::Top => {
            let top = app.top10_by_downloads();
            print_list(output_mode, &top, "Ranking unavailable")
        }
    }
}

fn print_list<T>(output_mode: OutputMode, items: &[T], empty: &str) -> miette::Result<()>
where
    T: serde::Serialize + std::fmt::Display,
{
    match output_mode {
        OutputMode::Json => JsonOutput::print(&items).into_diagnostic(),
        OutputMode::Text => TextOutput::list(&mut io::stdout(), items, empty).into_diagnostic(),
    }
}
