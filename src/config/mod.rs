//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::game::GameRules;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS, comma separated; `*` allows any
    pub client_origin: String,

    /// PostgREST backend; in-memory stores when absent
    pub supabase: Option<SupabaseConfig>,

    /// Board and progression tuning
    pub rules: GameRules,
    /// Fixed seed for spawn positions, food and colors
    pub game_seed: Option<u64>,
}

/// Supabase project credentials
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    /// Supabase project URL
    pub url: String,
    /// Service role key (bypasses RLS - server only!)
    pub service_role_key: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Render provides PORT env var, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        let supabase = match (lookup("SUPABASE_URL"), lookup("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(service_role_key)) => Some(SupabaseConfig {
                url,
                service_role_key,
            }),
            (Some(_), None) => return Err(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY")),
            (None, Some(_)) => return Err(ConfigError::Missing("SUPABASE_URL")),
            (None, None) => None,
        };

        let defaults = GameRules::default();
        let rules = GameRules {
            board_width: parse_or(&lookup, "BOARD_WIDTH", defaults.board_width)?,
            board_height: parse_or(&lookup, "BOARD_HEIGHT", defaults.board_height)?,
            base_tick_ms: parse_or(&lookup, "BASE_TICK_MS", defaults.base_tick_ms)?,
            min_tick_ms: parse_or(&lookup, "MIN_TICK_MS", defaults.min_tick_ms)?,
            ..defaults
        };
        if rules.board_width <= rules.initial_length as i32 || rules.board_height <= 0 {
            return Err(ConfigError::Invalid {
                key: "BOARD_WIDTH/BOARD_HEIGHT",
                value: format!("{}x{}", rules.board_width, rules.board_height),
            });
        }
        // The tick interval must never reach zero
        if rules.min_tick_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "MIN_TICK_MS",
                value: rules.min_tick_ms.to_string(),
            });
        }
        if rules.base_tick_ms < rules.min_tick_ms {
            return Err(ConfigError::Invalid {
                key: "BASE_TICK_MS",
                value: format!("{} (below MIN_TICK_MS {})", rules.base_tick_ms, rules.min_tick_ms),
            });
        }

        let game_seed = lookup("GAME_SEED")
            .map(|raw| parse_value("GAME_SEED", raw))
            .transpose()?;

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),
            supabase,
            rules,
            game_seed,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => parse_value(key, raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_need_no_environment() {
        let config = load(&[]).unwrap();

        assert_eq!(config.server_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.client_origin, "*");
        assert!(config.supabase.is_none());
        assert!(config.game_seed.is_none());
        assert_eq!(config.rules.board_width, 20);
        assert_eq!(config.rules.board_height, 15);
    }

    #[test]
    fn port_takes_priority_over_server_addr() {
        let config = load(&[("PORT", "9000"), ("SERVER_ADDR", "127.0.0.1:7000")]).unwrap();
        assert_eq!(config.server_addr.port(), 9000);

        let config = load(&[("SERVER_ADDR", "127.0.0.1:7000")]).unwrap();
        assert_eq!(config.server_addr, "127.0.0.1:7000".parse().unwrap());
    }

    #[test]
    fn supabase_needs_both_settings() {
        let err = load(&[("SUPABASE_URL", "https://x.supabase.co")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY")));

        let config = load(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "secret"),
        ])
        .unwrap();
        let supabase = config.supabase.unwrap();
        assert_eq!(supabase.url, "https://x.supabase.co");
        assert_eq!(supabase.service_role_key, "secret");
    }

    #[test]
    fn game_tuning_is_read_from_environment() {
        let config = load(&[
            ("BOARD_WIDTH", "30"),
            ("BASE_TICK_MS", "400"),
            ("GAME_SEED", "7"),
        ])
        .unwrap();

        assert_eq!(config.rules.board_width, 30);
        assert_eq!(config.rules.base_tick_ms, 400);
        assert_eq!(config.rules.min_tick_ms, 100);
        assert_eq!(config.game_seed, Some(7));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = load(&[("BOARD_HEIGHT", "tall")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BOARD_HEIGHT", .. }));

        assert!(load(&[("BOARD_WIDTH", "2")]).is_err());
        assert!(matches!(
            load(&[("SERVER_ADDR", "nowhere")]).unwrap_err(),
            ConfigError::InvalidAddress
        ));
    }

    #[test]
    fn tick_bounds_must_be_positive_and_ordered() {
        let err = load(&[("BASE_TICK_MS", "0"), ("MIN_TICK_MS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MIN_TICK_MS", .. }));

        let err = load(&[("BASE_TICK_MS", "50"), ("MIN_TICK_MS", "100")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BASE_TICK_MS", .. }));

        let config = load(&[("BASE_TICK_MS", "100"), ("MIN_TICK_MS", "100")]).unwrap();
        assert!(!config.rules.tick_interval(50).is_zero());
    }
}
