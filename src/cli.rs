use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "webrecon")]
#[command(author, version)]
#[command(about = "Web server reconnaissance orchestrator")]
#[command(
    long_about = "Runs a catalog of web server reconnaissance scans (nmap, sslscan, \
sslyze, nikto, dig) against a target domain, writing timestamped artifacts and \
converting XML output to HTML reports."
)]
pub struct Cli {
    /// Target domain to scan
    #[arg(value_name = "DOMAIN")]
    pub domain: Option<String>,

    /// Target port
    #[arg(short, long, default_value_t = 443)]
    pub port: u16,

    /// Scan to run: a task selector or "all"
    #[arg(short, long, default_value = "all", value_name = "TASK")]
    pub task: String,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for scan artifacts (overrides configuration)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check which required tools are installed
    Check,
    /// Install a missing tool
    Install {
        /// Tool name, e.g. nmap, sslscan, nikto, dig, sslyze
        #[arg(value_name = "TOOL")]
        tool: String,
    },
    /// Print per-OS installation instructions for every tool
    Guide,
    /// List scan result files
    Results,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_invocation_parses() {
        let cli = Cli::try_parse_from(["webrecon", "example.com", "-p", "8443", "-t", "nikto"])
            .unwrap();
        assert_eq!(cli.domain.as_deref(), Some("example.com"));
        assert_eq!(cli.port, 8443);
        assert_eq!(cli.task, "nikto");
    }

    #[test]
    fn defaults_apply() {
        let cli = Cli::try_parse_from(["webrecon", "example.com"]).unwrap();
        assert_eq!(cli.port, 443);
        assert_eq!(cli.task, "all");
        assert!(!cli.quiet);
    }

    #[test]
    fn verbose_help_matches_log_level_ladder() {
        use clap::CommandFactory;
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("-v info, -vv debug, -vvv trace"));
    }

    #[test]
    fn install_subcommand_parses() {
        let cli = Cli::try_parse_from(["webrecon", "install", "nmap"]).unwrap();
        match cli.command {
            Some(Commands::Install { tool }) => assert_eq!(tool, "nmap"),
            _ => panic!("expected install subcommand"),
        }
    }
}
