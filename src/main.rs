//! epubfind - phrase search across EPUB ebooks

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use epubfind::output::{self, RenderOptions};
use epubfind::{PhraseSet, Result, search_path};

#[derive(Parser)]
#[command(name = "epubfind")]
#[command(version, about = "Search for sets of phrases within EPUB ebooks")]
#[command(long_about = "Search for sets of phrases within an EPUB ebook, or within \
every ebook in a directory.

A paragraph from an ebook matches if it contains all the search phrases. \
Matching paragraphs are output grouped under book title and chapter \
headings so that they can be located in the book.

Phrases are case-insensitive and ignore the width of spacing between \
words. A phrase may be a single word, several words in quotes, or a \
regular expression pattern: 'beamish|uffish' finds paragraphs containing \
either word.")]
struct Cli {
    /// An EPUB file or a directory containing EPUB files
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Search phrases
    #[arg(value_name = "PHRASE", required = true, num_args = 1..)]
    phrase: Vec<String>,

    /// Just output the file names of matching books
    #[arg(short, long)]
    bare: bool,

    /// Do not word-wrap paragraph text
    #[arg(short, long)]
    no_wrap: bool,

    /// Width of the output
    #[arg(short, long, default_value_t = 70)]
    width: usize,

    /// Output results as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let phrases = PhraseSet::compile(&cli.phrase)?;
    let outcome = search_path(&cli.path, &phrases)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.json {
        serde_json::to_writer_pretty(&mut out, &outcome.results)?;
        writeln!(out).map_err(epubfind::Error::Io)?;
    } else {
        let opts = RenderOptions {
            bare: cli.bare,
            no_wrap: cli.no_wrap,
            width: cli.width,
        };
        for result in &outcome.results {
            output::print_result(&mut out, result, &opts).map_err(epubfind::Error::Io)?;
        }
    }

    let stderr = io::stderr();
    let mut err_out = stderr.lock();
    output::print_errors(&mut err_out, &outcome.errors).map_err(epubfind::Error::Io)?;

    Ok(ExitCode::SUCCESS)
}
