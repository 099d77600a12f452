use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use readme_extract::PayloadMode;
use readme_gen_config::{Config, LoadOptions, ReadmeSettings};
use readme_gen_core::{generate, ExitCode, GenError, GenerateOutcome, GenerateRequest, Mode};
use serde_json::json;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "readme-gen",
    version,
    about = "Rebuild README.md from the //! doc lines of a source file",
    long_about = None
)]
struct Cli {
    /// Explicit config file (highest precedence)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory used to resolve defaults and config files
    #[arg(short = 'C', long = "working-dir", value_name = "DIR")]
    working_dir: Option<PathBuf>,

    /// Source file to read doc lines from [default: src/lib.rs]
    #[arg(long, value_name = "PATH")]
    source: Option<PathBuf>,

    /// Document to write [default: README.md]
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Title line placed above the extracted text
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    header: Option<String>,

    /// Line prefix that marks doc lines
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    marker: Option<String>,

    /// How captured payloads are emitted
    #[arg(long, value_enum, value_name = "MODE")]
    payload: Option<PayloadArg>,

    /// Shorthand for --payload verbatim
    #[arg(long, conflicts_with = "payload")]
    verbatim: bool,

    /// Exit with status 1 if the output is missing or stale; never writes
    #[arg(long, conflicts_with_all = ["dry_run", "stdout"])]
    check: bool,

    /// Print the diff a write would apply; never writes
    #[arg(long = "dry-run", conflicts_with_all = ["check", "stdout"])]
    dry_run: bool,

    /// Print the document instead of writing it
    #[arg(long, conflicts_with_all = ["check", "dry_run"])]
    stdout: bool,

    /// Copy the previous output to <output>.bak before replacing it
    #[arg(long)]
    backup: bool,

    /// Summary format
    #[arg(long, value_enum, default_value = "plain")]
    format: OutputFormat,

    /// Suppress the summary and diffs
    #[arg(short, long)]
    quiet: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PayloadArg {
    Trimmed,
    Verbatim,
}

impl From<PayloadArg> for PayloadMode {
    fn from(value: PayloadArg) -> Self {
        match value {
            PayloadArg::Trimmed => PayloadMode::Trimmed,
            PayloadArg::Verbatim => PayloadMode::Verbatim,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(exit) | Err(exit) => std::process::ExitCode::from(exit as u8),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "readme_gen=warn",
        1 => "readme_gen=info",
        2 => "readme_gen=debug",
        _ => "readme_gen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, ExitCode> {
    let config = load_config(cli)?;
    let settings = apply_overrides(cli, config.readme, &config.sources.working_directory);
    let mode = selected_mode(cli);

    debug!(
        layers = config.sources.layers.len(),
        mode = mode.as_str(),
        "configuration resolved"
    );

    let request = GenerateRequest::from_settings(&settings, mode);

    match generate(request) {
        Ok(outcome) => {
            if let Err(err) = report(cli, &settings, mode, &outcome) {
                eprintln!("error: {err:#}");
                return Err(ExitCode::Output);
            }
            Ok(outcome.exit_code)
        }
        Err(err) => {
            handle_error(&err);
            Err(err.exit_code())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, ExitCode> {
    let mut options = LoadOptions::default();
    if let Some(dir) = &cli.working_dir {
        options = options.with_working_dir(dir);
    }
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }

    Config::load(options).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::Config
    })
}

fn apply_overrides(cli: &Cli, mut settings: ReadmeSettings, working_dir: &Path) -> ReadmeSettings {
    if let Some(source) = &cli.source {
        settings.source = working_dir.join(source);
    }
    if let Some(output) = &cli.output {
        settings.output = working_dir.join(output);
    }
    if let Some(header) = &cli.header {
        settings.header = header.clone();
    }
    if let Some(marker) = &cli.marker {
        settings.marker = marker.clone();
    }
    if let Some(payload) = cli.payload {
        settings.payload = payload.into();
    }
    if cli.verbatim {
        settings.payload = PayloadMode::Verbatim;
    }
    if cli.backup {
        settings.backup = true;
    }
    settings
}

fn selected_mode(cli: &Cli) -> Mode {
    if cli.check {
        Mode::Check
    } else if cli.dry_run {
        Mode::DryRun
    } else if cli.stdout {
        Mode::Stdout
    } else {
        Mode::Write
    }
}

fn report(
    cli: &Cli,
    settings: &ReadmeSettings,
    mode: Mode,
    outcome: &GenerateOutcome,
) -> Result<()> {
    if cli.format == OutputFormat::Json {
        let mut summary = json!({
            "mode": mode.as_str(),
            "source": settings.source.display().to_string(),
            "output": settings.output.display().to_string(),
            "extracted": outcome.extracted,
            "source_lines": outcome.source_lines,
            "changed": outcome.changed,
            "exit_code": outcome.exit_code as u8,
            "diff": outcome.diff,
        });
        if mode == Mode::Stdout {
            summary["document"] = json!(outcome.document);
        }
        let rendered = serde_json::to_string_pretty(&summary)?;
        return write_stdout(&format!("{rendered}\n"));
    }

    let output = settings.output.display();
    match mode {
        Mode::Stdout => write_stdout(&outcome.document),
        Mode::Write => {
            if cli.quiet {
                return Ok(());
            }
            let status = if outcome.changed { "Wrote" } else { "Unchanged" };
            write_stdout(&format!(
                "{status} {output} ({} doc lines)\n",
                outcome.extracted
            ))
        }
        Mode::Check => {
            if cli.quiet {
                return Ok(());
            }
            if outcome.changed {
                if let Some(diff) = &outcome.diff {
                    write_stdout(diff)?;
                }
                eprintln!("{output} is out of date; run readme-gen to regenerate it");
                Ok(())
            } else {
                write_stdout(&format!("{output} is up to date\n"))
            }
        }
        Mode::DryRun => {
            if cli.quiet {
                return Ok(());
            }
            match &outcome.diff {
                Some(diff) => write_stdout(diff),
                None => write_stdout("No changes (dry run)\n"),
            }
        }
    }
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match handle.write_all(text.as_bytes()) {
        Ok(_) => {}
        Err(err) if should_ignore_pipe_error(&err) => return Ok(()),
        Err(err) => return Err(err).context("Failed to write to stdout"),
    }

    match handle.flush() {
        Ok(_) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(err) => Err(err).context("Failed to flush stdout"),
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}

fn handle_error(err: &GenError) {
    match err {
        GenError::Source { path, .. } if !path.exists() => {
            eprintln!("error: {err}");
            eprintln!(
                "Pass --source or set `source` in .readme-gen.toml to point at the doc source."
            );
        }
        _ => eprintln!("error: {err}"),
    }
}
