use acme_fmt::buffer::{acme, DEFAULT_MOUNT};
use acme_fmt::{config, AcmeWindow, Formatter, Outcome, RunOptions, RunOutcome};
use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "acme-fmt")]
#[command(
    about = "Reformat an acme window through an external command, keeping the selection",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Window to format (acme sets $winid for commands run from a window)
    #[arg(long, env = "winid", value_name = "ID")]
    winid: Option<String>,

    /// Where acme's file tree is mounted
    #[arg(long, env = "ACMEFMT_MOUNT", value_name = "DIR")]
    mount: Option<PathBuf>,

    /// Settings file (defaults to ~/.config/acme-fmt/config.toml when present)
    #[arg(short, long, env = "ACMEFMT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dry run - report whether the window would change without writing it
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show a unified diff of the changes on stderr
    #[arg(short, long)]
    diff: bool,

    /// Formatting command and its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "CMD"
    )]
    command: Vec<OsString>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    match cmd_format(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Resolve the window, run the formatter over it and map the result to an
/// exit status.
///
/// Errors returned from here happen before any staging file exists.
fn cmd_format(cli: Cli) -> Result<ExitCode> {
    let settings = config::load(cli.config.as_deref())?;

    let formatter = Formatter::from_argv(&cli.command).context("no formatting command given")?;

    // Mount priority: --mount / ACMEFMT_MOUNT, then settings, then the default.
    let mount = cli
        .mount
        .or(settings.acme.mount)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MOUNT));

    let raw_id = cli
        .winid
        .context("failed to open win: $winid is not set (run from within acme)")?;
    let id = acme::parse_winid(&raw_id).context("failed to open win")?;
    let mut win = AcmeWindow::open(&mount, id).context("failed to open win")?;
    log::debug!("formatting window {} in {}", win.id(), win.dir().display());

    let options = RunOptions {
        temp: settings.tempfile,
        dry_run: cli.dry_run,
        diff: cli.diff,
    };

    let result = acme_fmt::run(&mut win, &formatter, &options);
    match &result {
        Ok(Outcome::WouldReplace) => eprintln!("window {id}: would reformat"),
        Ok(outcome) => log::debug!("window {id}: {outcome:?}"),
        Err(e) => eprintln!("{e}"),
    }

    Ok(ExitCode::from(RunOutcome::of(&result).exit_code()))
}
