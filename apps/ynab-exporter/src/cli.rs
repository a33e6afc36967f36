//! Command-line argument parsing

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ynab-exporter",
    about = "Exports YNAB budget categories as Prometheus metrics",
    version,
    long_about = "Periodically pulls the categories of one YNAB budget and serves them \
                  as gauges on a Prometheus scrape endpoint. Budget id, token and refresh \
                  interval are read from YNAB_BUDGET_ID, YNAB_API_TOKEN and \
                  YNAB_REFRESH_TIME_SECS."
)]
pub struct Args {
    /// Port of the metrics endpoint
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,

    /// Enable JSON log format (useful for production)
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}
