//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Sprintboard - ClickUp sprint reports over HTTP
///
/// Pulls every sprint list from a ClickUp team, computes per-sprint
/// commitment and delivery figures, and serves them as JSON and HTML.
///
/// Examples:
///   sprintboard --team-id 9012345
///   sprintboard --once
///   sprintboard --once --input raw_records.json --data-dir ./out
///   sprintboard --init-config
#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .sprintboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Run a single refresh and exit instead of serving
    #[arg(long)]
    pub once: bool,

    /// Read raw records from a JSON file instead of ClickUp
    ///
    /// Only valid together with --once.
    #[arg(long, value_name = "FILE", requires = "once")]
    pub input: Option<PathBuf>,

    /// Generate a default .sprintboard.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// ClickUp personal API token
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// ClickUp team id
    #[arg(long, env = "TEAM_ID")]
    pub team_id: Option<String>,

    /// ClickUp API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the HTTP server to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Static HTML page to serve at "/"
    #[arg(long, value_name = "FILE")]
    pub report_page: Option<PathBuf>,

    /// Directory for the JSON and CSV artifacts
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Minutes between scheduled refreshes
    #[arg(long, value_name = "MINUTES")]
    pub interval_minutes: Option<u64>,

    /// Disable the periodic refresh
    #[arg(long)]
    pub no_scheduler: bool,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("once", &self.once)
            .field("input", &self.input)
            .field("init_config", &self.init_config)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("team_id", &self.team_id)
            .field("api_url", &self.api_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("report_page", &self.report_page)
            .field("data_dir", &self.data_dir)
            .field("interval_minutes", &self.interval_minutes)
            .field("no_scheduler", &self.no_scheduler)
            .finish()
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.input.is_some() && !self.once {
            return Err("--input can only be used with --once".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.interval_minutes == Some(0) {
            return Err("Refresh interval must be at least 1 minute".to_string());
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            config: None,
            verbose: false,
            quiet: false,
            once: false,
            input: None,
            init_config: false,
            api_token: None,
            team_id: None,
            api_url: None,
            host: None,
            port: None,
            report_page: None,
            data_dir: None,
            interval_minutes: None,
            no_scheduler: false,
        }
    }

    #[test]
    fn test_validation_defaults_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_input_requires_once() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("Cargo.toml"));
        assert!(args.validate().is_err());

        args.once = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.once = true;
        args.input = Some(PathBuf::from("does/not/exist.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_api_url() {
        let mut args = make_args();
        args.api_url = Some("api.clickup.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_interval() {
        let mut args = make_args();
        args.interval_minutes = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut args = make_args();
        args.api_token = Some("pk_secret".to_string());
        assert!(!format!("{:?}", args).contains("pk_secret"));
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "sprintboard",
            "--once",
            "--port",
            "9000",
            "--data-dir",
            "out",
        ])
        .unwrap();

        assert!(args.once);
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.data_dir, Some(PathBuf::from("out")));
    }
}
