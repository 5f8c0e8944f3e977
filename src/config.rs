//! Configuration for Questline
//!
//! CLI arguments and environment variable handling using clap.

use chrono::FixedOffset;
use clap::Parser;

/// Questline - quest progress engine
#[derive(Parser, Debug, Clone)]
#[command(name = "questline")]
#[command(about = "Daily and weekly quest progress tracking")]
pub struct Args {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "questline")]
    pub mongodb_db: String,

    /// UTC offset in minutes anchoring quest period boundaries
    /// (e.g. -360 for UTC-6); all tenants share one product timezone
    #[arg(long, env = "QUEST_UTC_OFFSET_MINUTES", default_value = "0")]
    pub utc_offset_minutes: i32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// The fixed offset quest periods are anchored to
    pub fn period_offset(&self) -> Result<FixedOffset, String> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                format!(
                    "UTC offset {} minutes is out of range (must be within a day)",
                    self.utc_offset_minutes
                )
            })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        self.period_offset()?;

        if self.mongodb_uri.is_empty() {
            return Err("MongoDB URI must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with_offset(minutes: i32) -> Args {
        Args {
            mongodb_uri: "mongodb://localhost:27017".into(),
            mongodb_db: "questline".into(),
            utc_offset_minutes: minutes,
            log_level: "info".into(),
        }
    }

    #[test]
    fn test_offset_validation() {
        assert!(args_with_offset(0).validate().is_ok());
        assert!(args_with_offset(-360).validate().is_ok());
        assert!(args_with_offset(24 * 60).validate().is_err());
    }
}
