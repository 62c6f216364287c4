use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder secrets that only make sense on a developer machine.
pub const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub session_days: i64,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, so tests do not have to touch the process
    /// environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = var("FRIENDBOOK_JWT_SECRET", "dev-secret-change-me");
        let db_path = PathBuf::from(var("FRIENDBOOK_DB_PATH", "friendbook.db"));
        let host = var("FRIENDBOOK_HOST", "0.0.0.0");
        let port: u16 = var("FRIENDBOOK_PORT", "3000")
            .parse()
            .context("FRIENDBOOK_PORT must be a port number")?;
        let session_days: i64 = var("FRIENDBOOK_SESSION_DAYS", "30")
            .parse()
            .context("FRIENDBOOK_SESSION_DAYS must be a whole number of days")?;
        if session_days <= 0 {
            bail!("FRIENDBOOK_SESSION_DAYS must be positive, got {}", session_days);
        }
        let cookie_secure = parse_bool(&var("FRIENDBOOK_COOKIE_SECURE", "false"))
            .context("FRIENDBOOK_COOKIE_SECURE must be true or false")?;

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            session_days,
            cookie_secure,
        })
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        self.jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => bail!("not a boolean: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.db_path, PathBuf::from("friendbook.db"));
        assert_eq!(cfg.session_days, 30);
        assert!(!cfg.cookie_secure);
        assert!(cfg.uses_placeholder_secret());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("FRIENDBOOK_JWT_SECRET", "a-real-secret"),
            ("FRIENDBOOK_HOST", "127.0.0.1"),
            ("FRIENDBOOK_PORT", "8080"),
            ("FRIENDBOOK_COOKIE_SECURE", "yes"),
        ])
        .unwrap();
        assert_eq!(cfg.addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert!(cfg.cookie_secure);
        assert!(!cfg.uses_placeholder_secret());
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(config(&[("FRIENDBOOK_PORT", "http")]).is_err());
        assert!(config(&[("FRIENDBOOK_SESSION_DAYS", "0")]).is_err());
        assert!(config(&[("FRIENDBOOK_COOKIE_SECURE", "maybe")]).is_err());
    }
}
