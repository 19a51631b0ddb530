//! Command-line options and simulation timings.

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the network lookups and use offline fallbacks
    #[arg(long)]
    pub offline: bool,

    /// Seconds to wait for the server lookup
    #[arg(long, value_name = "SECS", default_value_t = 5.0, value_parser = parse_secs)]
    pub locate_timeout: f64,

    /// Seconds to wait for the ping probe
    #[arg(long, value_name = "SECS", default_value_t = 2.0, value_parser = parse_secs)]
    pub ping_timeout: f64,

    /// Print the final summary as JSON on exit
    #[arg(long)]
    pub json: bool,

    /// Write log output to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,
}

/// Longest accepted collaborator timeout.
const MAX_TIMEOUT_SECS: f64 = 3600.0;

fn parse_secs(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number of seconds"))?;

    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("`{value}` must be a positive number of seconds"));
    }
    if secs > MAX_TIMEOUT_SECS {
        return Err(format!(
            "`{value}` exceeds the {MAX_TIMEOUT_SECS} second limit"
        ));
    }

    Ok(secs)
}

/// Timings of the background chain and the render loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Pause between the server lookup and the ping probe
    pub ping_delay: Duration,
    /// Pause before the download speed settles
    pub download_settle: Duration,
    /// Pause before the upload stage starts
    pub upload_settle: Duration,
    /// Animation frame interval
    pub tick_interval: Duration,
    pub locate_timeout: Duration,
    pub ping_timeout: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ping_delay: Duration::from_secs(1),
            download_settle: Duration::from_secs(5),
            upload_settle: Duration::from_secs(4),
            tick_interval: Duration::from_millis(16),
            locate_timeout: Duration::from_secs(5),
            ping_timeout: Duration::from_secs(2),
        }
    }
}

impl From<&Cli> for SimulationConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            locate_timeout: Duration::from_secs_f64(cli.locate_timeout),
            ping_timeout: Duration::from_secs_f64(cli.ping_timeout),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["fastdial"]).unwrap();
        assert_eq!(cli.seed, None);
        assert!(!cli.offline);
        assert!(!cli.json);
        assert_eq!(SimulationConfig::from(&cli), SimulationConfig::default());
    }

    #[test]
    fn test_parse_all_options() {
        let cli = Cli::try_parse_from([
            "fastdial",
            "--seed",
            "42",
            "--offline",
            "--locate-timeout",
            "1.5",
            "--ping-timeout",
            "0.5",
            "--json",
            "--log-file",
            "fastdial.log",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.seed, Some(42));
        assert!(cli.offline);
        assert!(cli.json);
        assert_eq!(cli.log_file, Some(PathBuf::from("fastdial.log")));

        let config = SimulationConfig::from(&cli);
        assert_eq!(config.locate_timeout, Duration::from_millis(1500));
        assert_eq!(config.ping_timeout, Duration::from_millis(500));
        assert_eq!(config.tick_interval, Duration::from_millis(16));
    }

    #[test]
    fn test_rejects_non_positive_timeouts() {
        assert!(Cli::try_parse_from(["fastdial", "--ping-timeout", "0"]).is_err());
        assert!(Cli::try_parse_from(["fastdial", "--locate-timeout", "-1"]).is_err());
        assert!(Cli::try_parse_from(["fastdial", "--locate-timeout", "soon"]).is_err());
    }

    #[test]
    fn test_rejects_oversized_timeouts() {
        assert!(Cli::try_parse_from(["fastdial", "--locate-timeout", "1e20"]).is_err());
        assert!(Cli::try_parse_from(["fastdial", "--ping-timeout", "3600.5"]).is_err());

        let cli = Cli::try_parse_from(["fastdial", "--ping-timeout", "3600"]).unwrap();
        let config = SimulationConfig::from(&cli);
        assert_eq!(config.ping_timeout, Duration::from_secs(3600));
    }
}
