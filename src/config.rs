use std::path::Path;

use anyhow::{ensure, Context, Result};
use chrono::FixedOffset;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub riot_host: String,     // regional routing host
    pub queue_id: u32,         // match history queue filter
    pub match_count: u32,      // ids per history lookup
    pub rollover_hour: u32,    // local hour the "day" flips
    pub utc_offset_hours: i32, // reference timezone for the day window
    pub command_prefix: String,
    pub mode_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            riot_host: "https://asia.api.riotgames.com".to_string(),
            queue_id: 450, // ARAM
            match_count: 20,
            rollover_hour: 6,
            utc_offset_hours: 9, // KST
            command_prefix: "!금칼".to_string(),
            mode_label: "칼바람".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new("config.toml"));
        match std::fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!("config parse failed ({}), using defaults", e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Reject values the window derivation cannot represent.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.rollover_hour < 24, "rollover_hour must be 0..=23");
        ensure!(
            self.utc_offset_hours.abs() < 24,
            "utc_offset_hours must be -23..=23"
        );
        ensure!(self.match_count > 0, "match_count must be positive");
        Ok(())
    }

    /// The reference timezone for the day window.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).expect("validated offset")
    }
}

/// Credentials come from the environment (or `.env`), never config.toml.
pub struct Secrets {
    pub riot_api_key: String,
    pub discord_token: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            riot_api_key: std::env::var("RIOT_API_KEY").context("RIOT_API_KEY is not set")?,
            discord_token: std::env::var("DISCORD_BOT_TOKEN")
                .context("DISCORD_BOT_TOKEN is not set")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.queue_id, 450);
        assert_eq!(cfg.rollover_hour, 6);
        assert_eq!(cfg.utc_offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn full_toml_parses() {
        let cfg: Config = toml::from_str(
            r#"
            riot_host = "https://americas.api.riotgames.com"
            queue_id = 420
            match_count = 10
            rollover_hour = 4
            utc_offset_hours = -5
            command_prefix = "!daily"
            mode_label = "솔로랭크"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.queue_id, 420);
        assert_eq!(cfg.utc_offset_hours, -5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn out_of_range_hour_rejected() {
        let cfg = Config {
            rollover_hour: 24,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
