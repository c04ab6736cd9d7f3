use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

use deskline_ai::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use deskline_api::HashParams;
use deskline_api::session::DEFAULT_ACCESS_TTL;

/// Runtime settings, read from `DESKLINE_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub redis_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub ai_auto_reply: bool,
    pub request_timeout: Duration,
    pub hash: HashParams,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = HashParams::default();

        let jwt_expires_in = match var("DESKLINE_JWT_EXPIRES_IN") {
            Some(raw) => parse_duration(&raw).context("DESKLINE_JWT_EXPIRES_IN")?,
            None => DEFAULT_ACCESS_TTL,
        };

        Ok(Self {
            host: var("DESKLINE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(var("DESKLINE_PORT"), 3000, "DESKLINE_PORT")?,
            db_path: PathBuf::from(var("DESKLINE_DB_PATH").unwrap_or_else(|| "deskline.db".into())),
            jwt_secret: var("DESKLINE_JWT_SECRET")
                .unwrap_or_else(|| "dev-secret-change-me".into()),
            jwt_expires_in,
            redis_url: var("DESKLINE_REDIS_URL"),
            openai_api_key: var("DESKLINE_OPENAI_API_KEY"),
            openai_model: var("DESKLINE_OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            openai_base_url: var("DESKLINE_OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            ai_auto_reply: parse_or(var("DESKLINE_AI_AUTO_REPLY"), false, "DESKLINE_AI_AUTO_REPLY")?,
            request_timeout: Duration::from_secs(parse_or(
                var("DESKLINE_REQUEST_TIMEOUT_SECS"),
                30,
                "DESKLINE_REQUEST_TIMEOUT_SECS",
            )?),
            hash: HashParams {
                memory_kib: parse_or(
                    var("DESKLINE_HASH_MEMORY_KIB"),
                    defaults.memory_kib,
                    "DESKLINE_HASH_MEMORY_KIB",
                )?,
                iterations: parse_or(
                    var("DESKLINE_HASH_ITERATIONS"),
                    defaults.iterations,
                    "DESKLINE_HASH_ITERATIONS",
                )?,
                parallelism: parse_or(
                    var("DESKLINE_HASH_PARALLELISM"),
                    defaults.parallelism,
                    "DESKLINE_HASH_PARALLELISM",
                )?,
            },
        })
    }
}

fn parse_or<T>(raw: Option<String>, default: T, key: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key}: cannot parse {raw:?}")),
        None => Ok(default),
    }
}

/// `"90"`, `"90s"`, `"15m"`, `"12h"`, `"7d"`. A bare number is seconds.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => raw.split_at(idx),
        None => (raw, "s"),
    };
    if digits.is_empty() {
        bail!("missing number in duration {raw:?}");
    }

    let value: u64 = digits.parse()?;
    let scale: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        other => bail!("unknown duration unit {other:?} in {raw:?}"),
    };
    // Token expiry is a signed unix timestamp, so the lifetime must fit in i64.
    let secs = value
        .checked_mul(scale)
        .filter(|secs| i64::try_from(*secs).is_ok())
        .ok_or_else(|| anyhow::anyhow!("duration {raw:?} is too large"))?;
    Ok(Duration::from_secs(secs))
}
