use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bibsalvage_core::{CleanupJobKind, ExtractorKind, Settings, config_file};
use bibsalvage_ingest::extract_entries;

mod output;

use output::ColorMode;

/// Recover BibTeX entries from PDFs and tidy their identifier fields
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract BibTeX entries from a PDF (or read a .bib file)
    Extract {
        /// Path to the PDF or .bib file
        file_path: PathBuf,

        /// Comma-separated strategies to run, in order (verbatim, embedded)
        #[arg(long, value_delimiter = ',', value_parser = parse_strategy)]
        strategies: Vec<ExtractorKind>,

        /// Attachment name to look for; `.ext` matches by extension
        #[arg(long)]
        attachment_hint: Option<String>,

        /// Run the cleanup jobs on every extracted entry
        #[arg(long)]
        cleanup: bool,

        /// Comma-separated cleanup jobs (eprint, doi); implies --cleanup
        #[arg(long, value_delimiter = ',', value_parser = parse_job)]
        jobs: Vec<CleanupJobKind>,

        /// Print JSON instead of BibTeX
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the cleanup jobs over a .bib file and report what changed
    Clean {
        /// Path to the .bib file
        file_path: PathBuf,

        /// Comma-separated cleanup jobs (eprint, doi)
        #[arg(long, value_delimiter = ',', value_parser = parse_job)]
        jobs: Vec<CleanupJobKind>,

        /// Print JSON instead of BibTeX
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_strategy(name: &str) -> Result<ExtractorKind, String> {
    ExtractorKind::from_name(name).ok_or_else(|| {
        format!("unknown strategy `{name}` (expected `verbatim` or `embedded`)")
    })
}

fn parse_job(name: &str) -> Result<CleanupJobKind, String> {
    CleanupJobKind::from_name(name)
        .ok_or_else(|| format!("unknown cleanup job `{name}` (expected `eprint` or `doi`)"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::from_config(&config_file::load_config());

    match cli.command {
        Command::Extract {
            file_path,
            strategies,
            attachment_hint,
            cleanup,
            jobs,
            json,
            no_color,
            output,
        } => {
            let mut settings = settings;
            if !strategies.is_empty() {
                settings.strategies = strategies;
            }
            if let Some(hint) = attachment_hint {
                settings.attachment_hint = hint;
            }
            if !jobs.is_empty() {
                settings.cleanup_jobs = jobs;
            } else if !cleanup {
                settings.cleanup_jobs.clear();
            }
            extract(&file_path, &settings, json, no_color, output)
        }
        Command::Clean {
            file_path,
            jobs,
            json,
            no_color,
            output,
        } => {
            let mut settings = settings;
            if !jobs.is_empty() {
                settings.cleanup_jobs = jobs;
            }
            clean(&file_path, &settings, json, no_color, output)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_writer(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn extract(
    file_path: &Path,
    settings: &Settings,
    json: bool,
    no_color: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    if settings.strategies.is_empty() {
        anyhow::bail!("No extraction strategies enabled");
    }

    let color = ColorMode(!no_color && output.is_none());
    let mut writer = open_writer(output.as_deref())?;

    let candidates = extract_entries(file_path, settings)
        .map_err(|e| anyhow::anyhow!("Extraction failed: {}", e))?;

    if json {
        output::print_json(&mut writer, &candidates)?;
    } else {
        output::print_extraction_summary(&mut writer, &file_name(file_path), &candidates, color)?;
        output::print_candidates(&mut writer, &candidates, color)?;
    }
    writer.flush()?;
    Ok(())
}

fn clean(
    file_path: &Path,
    settings: &Settings,
    json: bool,
    no_color: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let is_bib = file_path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("bib"))
        .unwrap_or(false);
    if !is_bib {
        anyhow::bail!("Expected a .bib file: {}", file_path.display());
    }
    if settings.cleanup_jobs.is_empty() {
        anyhow::bail!("No cleanup jobs enabled");
    }

    let color = ColorMode(!no_color && output.is_none());
    let mut writer = open_writer(output.as_deref())?;

    let candidates = extract_entries(file_path, settings)
        .map_err(|e| anyhow::anyhow!("Reading {} failed: {}", file_path.display(), e))?;

    if json {
        output::print_json(&mut writer, &candidates)?;
    } else {
        output::print_change_report(&mut writer, &candidates, color)?;
    }
    writer.flush()?;
    Ok(())
}
