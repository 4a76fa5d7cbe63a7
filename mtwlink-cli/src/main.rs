//! mtwlink CLI - Command-line interface
//!
//! This binary drives a wireless master through a recording session and
//! prints tracker orientation to the console.

mod commands;
mod console;
mod error;
mod input;
mod runner;
mod sink;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "mtwlink")]
#[command(version)]
#[command(about = "Record orientation data from wireless motion trackers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the wireless master, record and print tracker orientation
    Run(RunArgs),

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
