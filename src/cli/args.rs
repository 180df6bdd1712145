//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Development orchestrator: live renderer, hot-reloaded worker, respawned main process
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: devwatch.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "devwatch.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands (default: dev)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the dev server and both watch pipelines
    #[command(visible_alias = "d")]
    Dev {
        #[command(flatten)]
        args: DevArgs,
    },

    /// Write a default devwatch.toml into the current directory
    #[command(visible_alias = "i")]
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

/// Dev command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DevArgs {
    /// Rebuild the main bundle but never launch the host process
    /// (for launching it under a debugger).
    #[arg(short, long)]
    pub debug: bool,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Dev server HTTP port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Live reload WebSocket port
    #[arg(long)]
    pub ws_port: Option<u16>,

    /// Watch the renderer root and reload clients on change
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub watch: Option<bool>,
}

impl Cli {
    #[cfg(test)]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Commands::Init { .. }))
    }

    /// Dev arguments, defaulting when no subcommand was given.
    pub fn dev_args(&self) -> DevArgs {
        match &self.command {
            Some(Commands::Dev { args }) => args.clone(),
            _ => DevArgs::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_dev() {
        let cli = Cli::try_parse_from(["devwatch"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.is_init());
        assert!(!cli.dev_args().debug);
    }

    #[test]
    fn test_dev_flags() {
        let cli = Cli::try_parse_from([
            "devwatch", "dev", "--debug", "-p", "4000", "--ws-port", "4001", "-w", "false",
        ])
        .unwrap();
        let args = cli.dev_args();
        assert!(args.debug);
        assert_eq!(args.port, Some(4000));
        assert_eq!(args.ws_port, Some(4001));
        assert_eq!(args.watch, Some(false));
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["devwatch", "init", "-C", "custom.toml"]).unwrap();
        assert!(cli.is_init());
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
    }
}
