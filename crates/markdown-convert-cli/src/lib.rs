use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use markdown_convert::{Batch, ConvertError, MarkdownEngine, ProfileSession, RawFlags, Settings};
use markdown_convert_config::{Config, FlagLayer, LoadOptions};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Exit status for every fatal error, including bad flags.
pub const FAILURE_EXIT_CODE: u8 = 1;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Convert Markdown documents to HTML or LaTeX",
    override_usage = "markdown-convert [OPTIONS] [INPUT_PATTERN [OUTPUT_PREFIX]]",
    long_about = None
)]
pub struct Cli {
    /// Generate a standalone HTML page (implies --latex=false)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    page: Option<bool>,

    /// Generate a table of contents (implies --latex=false)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    toc: Option<bool>,

    /// Generate a table of contents only (implies --toc)
    #[arg(
        long = "toconly",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    toc_only: Option<bool>,

    /// Use XHTML-style tags in HTML output [default: true]
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    xhtml: Option<bool>,

    /// Generate LaTeX output instead of HTML
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    latex: Option<bool>,

    /// Apply smartypants-style substitutions [default: true]
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    smartypants: Option<bool>,

    /// Use LaTeX-style dash rules for smartypants [default: true]
    #[arg(
        long = "latexdashes",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    latex_dashes: Option<bool>,

    /// Use improved fraction rules for smartypants [default: true]
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    fractions: Option<bool>,

    /// Link to a CSS stylesheet (implies --page)
    #[arg(long, value_name = "URL")]
    css: Option<String>,

    /// Template file with {{title}}, {{filename}} and {{content}} placeholders
    #[arg(long, value_name = "PATH")]
    template: Option<PathBuf>,

    /// Write a render timing profile to a file
    #[arg(long = "cpuprofile", value_name = "PATH")]
    cpu_profile: Option<PathBuf>,

    /// Process the input multiple times (for benchmarking) [default: 1]
    #[arg(long, value_name = "N")]
    repeat: Option<usize>,

    /// Read flag defaults from this file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log each conversion step to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Input file pattern, optionally followed by an output prefix
    #[arg(value_name = "ARGS")]
    inputs: Vec<String>,
}

impl Cli {
    fn flag_layer(&self) -> FlagLayer {
        FlagLayer {
            page: self.page,
            toc: self.toc,
            toc_only: self.toc_only,
            xhtml: self.xhtml,
            latex: self.latex,
            smartypants: self.smartypants,
            latex_dashes: self.latex_dashes,
            fractions: self.fractions,
            css: self.css.clone(),
            template: self.template.clone(),
            cpu_profile: self.cpu_profile.clone(),
            repeat: self.repeat,
        }
    }
}

/// Entry point for the binary. Returns the process exit status.
pub fn run() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(FAILURE_EXIT_CODE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("markdown-convert: {err:#}");
            if err
                .downcast_ref::<ConvertError>()
                .is_some_and(ConvertError::is_usage)
            {
                eprintln!("\n{}", Cli::command().render_help());
            }
            ExitCode::from(FAILURE_EXIT_CODE)
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let mut load = LoadOptions::default();
    if let Some(path) = &cli.config {
        load = load.with_override_path(path);
    }
    let config = Config::load(load)?;
    for source in &config.sources {
        debug!(kind = %source.kind, path = %source.path.display(), "loaded flag defaults");
    }
    let layer = cli.flag_layer().or(config.flags);

    // Dropped on return, which writes the report on success and failure alike.
    let mut profile = match &layer.cpu_profile {
        Some(path) => match ProfileSession::start(path) {
            Ok(session) => {
                debug!(path = %session.path().display(), "recording render profile");
                Some(session)
            }
            Err(err) => {
                warn!("{err}; continuing without profiling");
                None
            }
        },
        None => None,
    };

    let settings = Settings::load(&RawFlags::from(layer))?;
    let engine = MarkdownEngine;
    Batch::new(&settings, &engine)
        .with_profile(profile.as_mut())
        .run(&cli.inputs, io::stdin().lock(), io::stdout().lock())?;

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bool_flags_accept_bare_and_explicit_values() {
        let cli = Cli::try_parse_from([
            "markdown-convert",
            "--page",
            "--xhtml=false",
            "--latexdashes=true",
            "docs/*.md",
        ])
        .unwrap();

        let layer = cli.flag_layer();
        assert_eq!(layer.page, Some(true));
        assert_eq!(layer.xhtml, Some(false));
        assert_eq!(layer.latex_dashes, Some(true));
        assert_eq!(layer.toc, None);
        assert_eq!(cli.inputs, vec!["docs/*.md".to_string()]);
    }

    #[test]
    fn unset_flags_fall_through_to_defaults() {
        let cli = Cli::try_parse_from(["markdown-convert", "--repeat", "3"]).unwrap();
        let layer = cli.flag_layer().or(FlagLayer {
            latex: Some(true),
            repeat: Some(9),
            ..Default::default()
        });
        let flags = RawFlags::from(layer);
        assert!(flags.latex);
        assert_eq!(flags.repeat, 3);
        assert!(flags.smartypants);
    }
}
