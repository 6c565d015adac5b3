mod cmd;
mod config;
mod devices;
mod error;
mod fstab;
mod host;
mod pipeline;
mod render;
mod ui;
mod util;
mod wizard;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::tty::IsTty;
use std::io;
use std::path::PathBuf;
use tracing::info;

use config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "mountforge",
    version,
    about = "Format a block device, mount it, and persist it in fstab"
)]
struct Cli {
    /// Config file (TOML or YAML). Defaults to /etc/mountforge.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mount table to append to instead of the configured one.
    #[arg(long, global = true)]
    fstab: Option<PathBuf>,

    /// Run format/mount/blkid directly instead of through sudo.
    #[arg(long, global = true)]
    no_sudo: bool,

    /// Spinner refresh interval in milliseconds.
    #[arg(long, global = true)]
    tick_ms: Option<u64>,

    /// Diagnostic log destination.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Launch the interactive wizard (default).
    Wizard,
    /// Print the block devices the wizard would offer, one per line.
    Devices,
}

fn apply_overrides(cfg: &mut Config, cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.fstab {
        cfg.fstab.path = path.clone();
    }
    if cli.no_sudo {
        cfg.commands.sudo = false;
    }
    if let Some(ms) = cli.tick_ms {
        if ms == 0 {
            bail!("--tick-ms must be greater than zero");
        }
        cfg.ui.tick_ms = ms;
    }
    if let Some(path) = &cli.log_file {
        cfg.log.path = path.clone();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = Config::resolve(cli.config.as_deref())?;
    apply_overrides(&mut cfg, &cli)?;

    let level = util::logging::level_for(&cfg.log.level, cli.verbose);
    util::logging::init(&cfg.log.path, &level);
    info!(fstab = %cfg.fstab.path.display(), sudo = cfg.commands.sudo, "mountforge starting");

    let devices = devices::list_devices(&cfg).context("Error fetching disks")?;

    match cli.command.unwrap_or(Command::Wizard) {
        Command::Devices => {
            cmd::devices::run_devices(&mut io::stdout().lock(), &devices)?;
        }
        Command::Wizard => {
            if !io::stdin().is_tty() || !io::stdout().is_tty() {
                bail!("the wizard needs an interactive terminal; try `mountforge devices`");
            }
            let session = cmd::wizard::run_wizard(&cfg, devices)?;
            if let Some(line) = render::summary(&session) {
                let success = session.outcome().map(|o| o.is_success()).unwrap_or(false);
                ui::print_summary(&line, success);
            }
        }
    }

    Ok(())
}
