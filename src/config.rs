use clap::{ArgAction, Parser};

use crate::metrics::ReportFormat;

const AFTER_HELP: &str = "\
Features:
  - Request path containing 'dump' will print request details to console
  - Press Ctrl+C to shutdown and display metrics

Example:
  ding-dong -h 0.0.0.0 -p 8080 -w 50 -q 20000 -b 200";

/// Ding Dong - High-Performance HTTP Server
///
/// Answers every request with 200 OK and tallies traffic in the background.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ding-dong",
    version,
    disable_help_flag = true,
    after_help = AFTER_HELP
)]
pub struct Config {
    /// Host to listen on
    #[arg(short = 'h', long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 61001)]
    pub port: u16,

    /// Number of worker tasks
    #[arg(short, long, default_value_t = 25)]
    pub workers: usize,

    /// Maximum queue size for body processing
    #[arg(short, long = "queue-size", default_value_t = 10_000)]
    pub queue_size: usize,

    /// Maximum request body size in MB
    #[arg(short = 'b', long = "max-body-size", default_value_t = 100)]
    pub max_body_size_mb: usize,

    /// Format of the metrics report printed on shutdown
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 61001,
            workers: 25,
            queue_size: 10_000,
            max_body_size_mb: 100,
            report: ReportFormat::Text,
            help: None,
        }
    }
}

impl Config {
    /// `host:port`, bracketing IPv6 literals.
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_size_mb.saturating_mul(1024 * 1024)
    }
}
