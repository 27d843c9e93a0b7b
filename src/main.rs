//! pathsift - find content-bearing paths in templated HTML pages

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::{Level, LevelFilter, Log, Metadata, Record};

use pathsift::io::FileSource;
use pathsift::{Config, Detector, ResultSet};

#[derive(Parser)]
#[command(name = "pathsift")]
#[command(version, about = "Find content-bearing paths in templated HTML pages", long_about = None)]
#[command(after_help = "EXAMPLES:
    pathsift a.html b.html                  Compare two saved pages
    pathsift --urls URL1 URL2 URL3          Compare downloaded pages
    pathsift --ignore-tag script a.html b.html --json")]
struct Cli {
    /// Input files, or URLs with --urls
    #[arg(value_name = "INPUT", num_args = 2.., required = true)]
    inputs: Vec<String>,

    /// Treat inputs as URLs and download them
    #[arg(long)]
    urls: bool,

    /// JSON config file with ignore sets
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Drop paths ending on this tag (repeatable)
    #[arg(long, value_name = "TAG")]
    ignore_tag: Vec<String>,

    /// Drop paths anchored on this class (repeatable)
    #[arg(long, value_name = "CLASS")]
    ignore_class: Vec<String>,

    /// Drop paths anchored on this id (repeatable)
    #[arg(long, value_name = "ID")]
    ignore_id: Vec<String>,

    /// Drop this exact selector (repeatable)
    #[arg(long, value_name = "SELECTOR")]
    ignore_path: Vec<String>,

    /// Also compare class-carrying elements by their full text
    #[arg(long)]
    experimental_class_strings: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress warnings
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Plain `level: message` lines on stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let level = match record.level() {
                Level::Error => "error",
                Level::Warn => "warning",
                Level::Info => "info",
                Level::Debug => "debug",
                Level::Trace => "trace",
            };
            eprintln!("{level}: {}", record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = load_config(cli).map_err(|e| e.to_string())?;
    let detector = Detector::new(config);
    let ids: Vec<&str> = cli.inputs.iter().map(String::as_str).collect();

    let result = if cli.urls {
        detect_urls(&detector, &ids)?
    } else {
        detector
            .detect_from(&FileSource::new(), &ids)
            .map_err(|e| e.to_string())?
    };

    print_result(&result, cli.json)
}

fn load_config(cli: &Cli) -> pathsift::Result<Config> {
    let base = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::new(),
    };
    let flags = Config::new()
        .with_ignore_tag(cli.ignore_tag.iter().cloned())
        .with_ignore_class(cli.ignore_class.iter().cloned())
        .with_ignore_id(cli.ignore_id.iter().cloned())
        .with_ignore_simple_path(cli.ignore_path.iter().cloned())
        .with_experimental_class_strings(cli.experimental_class_strings);
    Ok(base.merge(flags))
}

#[cfg(feature = "fetch")]
fn detect_urls(detector: &Detector, urls: &[&str]) -> Result<ResultSet, String> {
    detector.detect_urls(urls).map_err(|e| e.to_string())
}

#[cfg(not(feature = "fetch"))]
fn detect_urls(_detector: &Detector, _urls: &[&str]) -> Result<ResultSet, String> {
    Err("URL inputs need pathsift built with the `fetch` feature".to_string())
}

fn print_result(result: &ResultSet, json: bool) -> Result<(), String> {
    if json {
        let text = serde_json::to_string_pretty(result).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        print!("{result}");
    }
    Ok(())
}
