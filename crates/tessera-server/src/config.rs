use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Server settings, read from `TESSERA_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub canvas_width: i32,
    pub canvas_height: i32,
    pub autosave_debounce: Duration,
    pub theme_duration_days: i64,
    pub rotation_check: Duration,
    /// How often settled working copies are dropped from memory.
    pub idle_sweep: Duration,
    /// JSON asset list; the built-in catalog when unset.
    pub asset_catalog: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: var("TESSERA_HOST", "0.0.0.0"),
            port: parse(&lookup, "TESSERA_PORT", 3000)?,
            db_path: PathBuf::from(var("TESSERA_DB_PATH", "tessera.db")),
            jwt_secret: var("TESSERA_JWT_SECRET", "dev-secret-change-me"),
            canvas_width: parse(&lookup, "TESSERA_CANVAS_WIDTH", 800)?,
            canvas_height: parse(&lookup, "TESSERA_CANVAS_HEIGHT", 600)?,
            autosave_debounce: Duration::from_millis(parse(&lookup, "TESSERA_AUTOSAVE_DEBOUNCE_MS", 2000)?),
            theme_duration_days: parse(&lookup, "TESSERA_THEME_DURATION_DAYS", 7)?,
            rotation_check: Duration::from_secs(parse(&lookup, "TESSERA_ROTATION_CHECK_SECS", 60)?),
            idle_sweep: Duration::from_secs(parse(&lookup, "TESSERA_IDLE_SWEEP_SECS", 300)?),
            asset_catalog: lookup("TESSERA_ASSET_CATALOG").map(PathBuf::from),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        None => Ok(default),
    }
}
