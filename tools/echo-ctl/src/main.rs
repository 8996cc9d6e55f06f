//! echo-ctl - drive the echo endpoints from the command line
//!
//! Commands:
//! - `echo-ctl session <op>...` - Run operations against a fresh host
//! - `echo-ctl info` - Show configuration and registered endpoints
//!
//! The host lives only for the duration of one command.

mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use echo_endpoints::{Access, CallerClass, Host, HostConfig};

use crate::script::Op;

#[derive(Parser)]
#[command(name = "echo-ctl")]
#[command(version)]
#[command(about = "Echo device, proc file and sysctl endpoints", long_about = None)]
struct Cli {
    /// Host configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Caller class used when opening endpoints
    #[arg(long = "as", value_enum, default_value_t = Caller::Root, global = true)]
    caller: Caller,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session of operations
    Session {
        /// Operations: write:<path>:<text>, read:<path>[:<len>], sysctl:<value>
        #[arg(required = true)]
        ops: Vec<String>,
    },

    /// Show configuration and registered endpoints
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum Caller {
    Root,
    Owner,
    Group,
    Other,
}

impl From<Caller> for CallerClass {
    fn from(caller: Caller) -> Self {
        match caller {
            Caller::Root => CallerClass::Root,
            Caller::Owner => CallerClass::Owner,
            Caller::Group => CallerClass::Group,
            Caller::Other => CallerClass::Other,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => HostConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HostConfig::default(),
    };

    match cli.command {
        Commands::Session { ops } => {
            let ops = ops
                .iter()
                .map(|arg| Op::parse(arg))
                .collect::<Result<Vec<_>>>()?;
            run_session(&config, &ops, cli.caller.into())?;
        }

        Commands::Info => {
            show_info(&config)?;
        }
    }

    Ok(())
}

fn run_session(config: &HostConfig, ops: &[Op], class: CallerClass) -> Result<()> {
    let host = config.build_host()?;
    let sysctl_path = format!(
        "/proc/sys/{}/{}",
        config.sysctl.directory, config.sysctl.name
    );

    log::debug!("running {} operations as {:?}", ops.len(), class);
    for op in ops {
        match op {
            Op::Write { path, text } => {
                let n = write(&host, path, text.as_bytes(), class)?;
                println!("{} {} bytes to {}", "wrote".green().bold(), n, path);
            }
            Op::Read { path, len } => {
                let data = read(&host, path, read_len(*len, config.capacity), class)?;
                println!(
                    "{} {} bytes from {}: {}",
                    "read".cyan().bold(),
                    data.len(),
                    path,
                    data.escape_ascii()
                );
            }
            Op::Sysctl { value } => {
                write(&host, &sysctl_path, format!("{value}\n").as_bytes(), class)?;
                println!("{} {} = {}", "set".yellow().bold(), sysctl_path, value);
            }
        }
    }

    Ok(())
}

fn write(host: &Host, path: &str, data: &[u8], class: CallerClass) -> Result<usize> {
    let mut file = host
        .open(path, Access::WRITE, class)
        .with_context(|| format!("opening {path} for writing"))?;
    let written = host.write(&mut file, data);
    host.release(file)?;
    Ok(written?)
}

/// Requested read length, never more than the channel can hold
fn read_len(requested: Option<usize>, capacity: usize) -> usize {
    requested.map_or(capacity, |len| len.min(capacity))
}

fn read(host: &Host, path: &str, len: usize, class: CallerClass) -> Result<Vec<u8>> {
    let mut file = host
        .open(path, Access::READ, class)
        .with_context(|| format!("opening {path} for reading"))?;
    let mut buf = vec![0u8; len];
    let produced = host.read(&mut file, &mut buf);
    host.release(file)?;
    buf.truncate(produced?);
    Ok(buf)
}

fn show_info(config: &HostConfig) -> Result<()> {
    println!("{}", "Configuration".bold().underline());
    println!("  capacity:      {} bytes", config.capacity);
    println!("  cursor mode:   {:?}", config.cursor_mode);
    println!("  sysctl value:  {} (default)", config.sysctl.default_value);
    println!();

    let host = config.build_host()?;
    println!("{}", "Modules".bold().underline());
    for name in host.modules() {
        println!("  {}", name);
    }
    println!();

    println!("{}", "Endpoints".bold().underline());
    for (path, entry) in host.registry().iter() {
        match entry.minor {
            Some(minor) => println!("  {} {} (misc minor {})", entry.mode, path.green(), minor),
            None => println!("  {} {}", entry.mode, path.green()),
        }
    }

    Ok(())
}
