//! # compat CLI
//!
//! Lists directories through the emulated directory streams and checks
//! their position tokens.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use compat_config::{log_cli_debug, LogLevel};

mod ls;
mod tell;

/// Inspect directories the way the dirent emulation sees them
#[derive(Parser)]
#[command(name = "compat")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory with scandir
    Ls(ls::LsArgs),

    /// Print the stream position before every read, then seek back to each
    /// one and check the same entry comes out
    Tell {
        #[arg(value_name = "DIR")]
        directory: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file locations
    Path,
}

fn main() -> Result<()> {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        compat_config::config().logging.log_level()
    };
    compat_config::init_logging(level);
    log_cli_debug!(
        "Starting",
        level = level.as_filter(),
        name_max = compat_config::config().dirent.name_max
    );

    match cli.command {
        Commands::Ls(args) => ls::run(&args),
        Commands::Tell { directory } => tell::run(&directory),
        Commands::Config { command } => config(command),
    }
}

fn config(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = compat_config::config().clone();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Path => {
            match compat_config::Config::global_config_path() {
                Some(path) => println!("Global:  {}", path.display()),
                None => println!("Global:  (no home directory)"),
            }
            println!("Project: .compat/config.toml");
        }
    }
    Ok(())
}
