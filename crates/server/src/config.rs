//! Process configuration.
//!
//! Settings come from command-line flags, their environment variables, and
//! an optional JSON file, in that order of precedence. The file may nest
//! objects (`database.host`), which are flattened into dotted keys; every
//! leaf must be a string, number or boolean.
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_JWT_EXPIRE_MINUTES: u64 = 60;
const DEFAULT_HASH_COST: u32 = 2;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WORKERS: usize = 4;
const SHORT_SECRET: usize = 32;
/// One year.
const MAX_JWT_EXPIRE_MINUTES: u64 = 365 * 24 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config key {key} holds an unsupported {kind} value")]
    Unsupported { key: String, kind: &'static str },
    #[error("config key {key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

#[derive(Debug, Default, clap::Parser)]
#[command(name = "backend", about = "Account registration, login and profile service")]
pub struct Args {
    /// JSON config file consulted after flags and environment.
    #[arg(long, env = "WARDEN_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, env = "BIND_ADDR")]
    pub bind: Option<String>,
    #[arg(long, env = "DB_URL", hide_env_values = true)]
    pub db_url: Option<String>,
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,
    #[arg(long, env = "JWT_EXPIRE_MINUTES")]
    pub jwt_expire_minutes: Option<u64>,
    /// Argon2 iteration count.
    #[arg(long, env = "HASH_COST")]
    pub hash_cost: Option<u32>,
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,
    #[arg(long, env = "WORKERS")]
    pub workers: Option<usize>,
    /// Seeds an `admin` account with this password when none exists.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

/// Flattened file settings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Settings(BTreeMap<String, String>);

impl Settings {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&json)
    }
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let ref value = serde_json::from_str::<serde_json::Value>(json)?;
        let mut flat = BTreeMap::new();
        match value {
            serde_json::Value::Object(_) => flatten("", value, &mut flat)?,
            other => {
                return Err(ConfigError::Unsupported {
                    key: String::from("<root>"),
                    kind: kind(other),
                });
            }
        }
        Ok(Self(flat))
    }
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
    pub fn value<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| ConfigError::Invalid {
                    key,
                    value: raw.to_string(),
                })
            })
            .transpose()
    }
    /// Connection string assembled from a nested `database` object.
    fn database_url(&self) -> Result<Option<String>, ConfigError> {
        let (Some(host), Some(name), Some(user)) = (
            self.get("database.host"),
            self.get("database.name"),
            self.get("database.username"),
        ) else {
            return Ok(None);
        };
        let port = self.value::<u16>("database.port")?.unwrap_or(DEFAULT_DB_PORT);
        let password = self.get("database.password").unwrap_or_default();
        Ok(Some(format!(
            "postgres://{}:{}@{}:{}/{}",
            user, password, host, port, name
        )))
    }
}

fn kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// The closed set of value kinds a setting may take. Anything else is a
/// typed error naming the key.
fn flatten(
    prefix: &str,
    value: &serde_json::Value,
    out: &mut BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    use serde_json::Value;
    match value {
        Value::Object(map) => map.iter().try_for_each(|(k, v)| match prefix {
            "" => flatten(k, v, out),
            _ => flatten(&format!("{}.{}", prefix, k), v, out),
        }),
        Value::String(s) => leaf(prefix, s.clone(), out),
        Value::Number(n) => leaf(prefix, n.to_string(), out),
        Value::Bool(b) => leaf(prefix, b.to_string(), out),
        Value::Array(_) | Value::Null => Err(ConfigError::Unsupported {
            key: prefix.to_string(),
            kind: kind(value),
        }),
    }
}

fn leaf(key: &str, value: String, out: &mut BTreeMap<String, String>) -> Result<(), ConfigError> {
    out.insert(key.to_string(), value);
    Ok(())
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub db_url: String,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub hash_cost: u32,
    pub request_timeout: Duration,
    pub workers: usize,
    pub admin_password: Option<String>,
}

impl Config {
    /// Parses flags and environment, then the config file they point to.
    pub fn load() -> Result<Self, ConfigError> {
        let args = <Args as clap::Parser>::parse();
        let settings = match args.config {
            Some(ref path) => Settings::read(path)?,
            None => Settings::default(),
        };
        Self::resolve(args, &settings)
    }

    pub fn resolve(args: Args, file: &Settings) -> Result<Self, ConfigError> {
        let bind = match args.bind {
            Some(bind) => bind,
            None => format!(
                "0.0.0.0:{}",
                file.value::<u16>("port")?.unwrap_or(DEFAULT_PORT)
            ),
        };
        let db_url = match args.db_url.or_else(|| file.get("dbUrl").map(String::from)) {
            Some(url) => url,
            None => file.database_url()?.ok_or(ConfigError::Missing("DB_URL"))?,
        };
        let jwt_secret = args
            .jwt_secret
            .or_else(|| file.get("jwtSecret").map(String::from))
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < SHORT_SECRET {
            log::warn!("JWT_SECRET is shorter than {} bytes", SHORT_SECRET);
        }
        let minutes = match args.jwt_expire_minutes {
            Some(m) => m,
            None => file
                .value::<u64>("jwtExpireTime")?
                .unwrap_or(DEFAULT_JWT_EXPIRE_MINUTES),
        };
        if minutes == 0 || minutes > MAX_JWT_EXPIRE_MINUTES {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRE_MINUTES",
                value: minutes.to_string(),
            });
        }
        let hash_cost = match args.hash_cost {
            Some(c) => c,
            None => file.value::<u32>("hashCost")?.unwrap_or(DEFAULT_HASH_COST),
        };
        let timeout = match args.request_timeout_secs {
            Some(t) => t,
            None => file
                .value::<u64>("requestTimeout")?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        let workers = match args.workers {
            Some(w) => w,
            None => file.value::<usize>("workers")?.unwrap_or(DEFAULT_WORKERS),
        };
        if workers == 0 {
            return Err(ConfigError::Invalid {
                key: "WORKERS",
                value: workers.to_string(),
            });
        }
        let admin_password = args
            .admin_password
            .or_else(|| file.get("adminPassword").map(String::from))
            .filter(|p| !p.is_empty());
        Ok(Self {
            bind,
            db_url,
            jwt_secret,
            jwt_ttl: Duration::from_secs(minutes.saturating_mul(60)),
            hash_cost,
            request_timeout: Duration::from_secs(timeout),
            workers,
            admin_password,
        })
    }
}
