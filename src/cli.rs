// CLI module - command-line argument parsing and handlers
//
// Flags adjust the effective configuration for one run; the `config`
// subcommand inspects configuration and exits without touching the terminal.

use crate::config::{Config, VERSION};
use clap::{Parser, Subcommand};

/// agentdeck - a terminal console for coding agents working across git worktrees
#[derive(Parser, Debug)]
#[command(name = "agentdeck")]
#[command(version = VERSION)]
#[command(about = "Terminal console for coding-agent sessions across git worktrees", long_about = None)]
pub struct Cli {
    /// Run against the built-in demo backend (simulated worktrees and sessions)
    #[arg(long)]
    pub demo: bool,

    /// Theme name (overrides config file and AGENTDECK_THEME)
    #[arg(long, value_name = "NAME")]
    pub theme: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

impl Cli {
    /// Fold command-line flags over the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if self.demo {
            config.demo_mode = true;
        }
        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
    }
}

/// Handle CLI subcommands. Returns true if a command was handled (exit after).
pub fn handle_command(cli: &Cli) -> bool {
    match &cli.command {
        Some(Commands::Config { show, path }) => {
            if *path {
                handle_config_path();
            } else if *show {
                handle_config_show(cli);
            } else {
                println!("Usage: agentdeck config [--show|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --path    Show config file path");
            }
            true
        }
        None => false,
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => eprintln!("Error: Could not determine config path"),
    }
}

fn handle_config_show(cli: &Cli) {
    let mut config = Config::from_env();
    cli.apply(&mut config);

    println!("# Effective configuration (flags > env > file > defaults)");
    println!("# demo_mode = {}", config.demo_mode);
    println!();
    print!("{}", config.to_toml());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["agentdeck", "--demo", "--theme", "Nord"]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert!(config.demo_mode);
        assert_eq!(config.theme, "Nord");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_no_flags_leave_config_alone() {
        let cli = Cli::parse_from(["agentdeck"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_subcommand_parses() {
        let cli = Cli::parse_from(["agentdeck", "config", "--path"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                path: true,
                show: false
            })
        ));
    }
}
