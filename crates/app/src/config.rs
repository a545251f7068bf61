//! CLI configuration

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use jiff::Timestamp;
use rebate::merge::MergePolicy;

/// Rebate CLI configuration
#[derive(Debug, Parser)]
#[command(name = "rebate-app", about = "Rebate offer engine CLI", long_about = None)]
pub struct AppConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Cart merge settings.
    #[command(flatten)]
    pub merge: MergeConfig,
}

impl AppConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price a fixture cart and print its receipt.
    Price(PriceArgs),

    /// Merge a user's cart into a fixture session cart and print the receipt.
    Merge(MergeArgs),
}

#[derive(Debug, Args)]
pub struct PriceArgs {
    /// Scenario fixture (YAML)
    #[arg(long)]
    pub fixture: PathBuf,

    /// Cart key in the fixture
    #[arg(long)]
    pub session: String,

    /// Voucher codes to redeem, in order
    #[arg(long = "voucher")]
    pub vouchers: Vec<String>,

    /// Count the offers on the priced cart as redeemed by its user
    #[arg(long)]
    pub confirm: bool,

    /// Price as of this instant instead of now
    #[arg(long)]
    pub at: Option<Timestamp>,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Scenario fixture (YAML)
    #[arg(long)]
    pub fixture: PathBuf,

    /// Cart key of the session being signed into
    #[arg(long)]
    pub session: String,

    /// User key in the fixture, or a user UUID
    #[arg(long)]
    pub user: String,

    /// Price as of this instant instead of now
    #[arg(long)]
    pub at: Option<Timestamp>,
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Cart merge settings.
#[derive(Debug, Args)]
pub struct MergeConfig {
    /// Add quantities together when both carts hold a product (otherwise keep the session's)
    #[arg(
        long,
        env = "MERGE_SUM_QUANTITIES",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub sum_quantities_on_merge: bool,
}

impl MergeConfig {
    /// Merge policy selected by these settings.
    #[must_use]
    pub fn policy(&self) -> MergePolicy {
        MergePolicy::from_sum_flag(self.sum_quantities_on_merge)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn merge_policy_defaults_to_summing() -> TestResult {
        let config = AppConfig::try_parse_from([
            "rebate-app",
            "price",
            "--fixture",
            "fixtures/demo.yml",
            "--session",
            "guest",
        ])?;

        assert_eq!(config.merge.policy(), MergePolicy::SumQuantities);

        Ok(())
    }

    #[test]
    fn merge_policy_can_keep_session_quantities() -> TestResult {
        let config = AppConfig::try_parse_from([
            "rebate-app",
            "--sum-quantities-on-merge",
            "false",
            "merge",
            "--fixture",
            "fixtures/demo.yml",
            "--session",
            "guest",
            "--user",
            "alice",
        ])?;

        assert_eq!(config.merge.policy(), MergePolicy::KeepSession);
        assert!(matches!(config.command, Command::Merge(MergeArgs { ref user, .. }) if user == "alice"));

        Ok(())
    }

    #[test]
    fn vouchers_and_instant_are_parsed() -> TestResult {
        let config = AppConfig::try_parse_from([
            "rebate-app",
            "price",
            "--fixture",
            "fixtures/demo.yml",
            "--session",
            "guest",
            "--voucher",
            "SAVE5",
            "--voucher",
            "TEA10",
            "--at",
            "2026-06-01T12:00:00Z",
        ])?;

        let Command::Price(args) = config.command else {
            return Err("expected price command".into());
        };

        assert_eq!(args.vouchers, ["SAVE5", "TEA10"]);
        assert_eq!(args.at, Some("2026-06-01T12:00:00Z".parse()?));

        Ok(())
    }
}
