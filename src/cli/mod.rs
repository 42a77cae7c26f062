//! CLI module for Stackscan.
//!
//! Subcommands:
//! - `serve`: Run the HTTP API
//! - `analyze`: Analyze one repository and print its technologies
//! - `batch`: Run one batch over the tool catalog and print the report

mod analyze;
mod batch;
mod serve;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use serde::Serialize;

use crate::config::Config;
use crate::context::Context;

/// Stackscan - Repository Stack Analyzer
#[derive(Parser)]
#[command(name = "stackscan")]
#[command(about = "Detects repository technology stacks and reconciles them with a catalog")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Host address to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Analyze a single repository
    Analyze {
        /// Repository URL, e.g. https://github.com/owner/name
        url: String,
    },

    /// Run one batch analysis over the catalog
    Batch,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Serve { ref host, port } => self.run_serve(host, port).await,
            Command::Analyze { ref url } => self.run_analyze(url).await,
            Command::Batch => self.run_batch().await,
        }
    }

    fn context(&self) -> Result<Context> {
        let config = Config::load()?;
        tracing::debug!(mode = ?config.mode, "Loaded configuration");
        Ok(Context::from_config(config)?)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
