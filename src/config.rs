use crate::backend::{BackendError, FileBackend, RestBackend, SharedBackend};
use crate::sync::DEFAULT_SAVE_DEBOUNCE;
use std::{env, fmt::Display, path::PathBuf, str::FromStr, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_SESSION_IDLE_SECS: u64 = 12 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    File,
    Remote,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(BackendKind::File),
            "remote" => Ok(BackendKind::Remote),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set when FRJ_BACKEND=remote")]
    MissingRemote(&'static str),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend: BackendKind,
    pub data_path: PathBuf,
    pub remote_url: Option<String>,
    pub remote_anon_key: Option<String>,
    pub legacy_dir: PathBuf,
    pub save_debounce: Duration,
    /// Sessions unused for this long are closed.
    pub session_idle: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: try_load(&lookup, "PORT", 8080),
            backend: try_load(&lookup, "FRJ_BACKEND", BackendKind::File),
            data_path: lookup("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/backend.json")),
            remote_url: lookup("FRJ_REMOTE_URL").filter(|value| !value.trim().is_empty()),
            remote_anon_key: lookup("FRJ_REMOTE_ANON_KEY").filter(|value| !value.trim().is_empty()),
            legacy_dir: lookup("FRJ_LEGACY_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/legacy")),
            save_debounce: Duration::from_millis(try_load(
                &lookup,
                "FRJ_SAVE_DEBOUNCE_MS",
                DEFAULT_SAVE_DEBOUNCE.as_millis() as u64,
            )),
            session_idle: Duration::from_secs(try_load(&lookup, "FRJ_SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS)),
        }
    }

    pub async fn build_backend(&self) -> Result<SharedBackend, ConfigError> {
        match self.backend {
            BackendKind::File => Ok(Arc::new(FileBackend::open(&self.data_path).await)),
            BackendKind::Remote => {
                let url = self
                    .remote_url
                    .as_deref()
                    .ok_or(ConfigError::MissingRemote("FRJ_REMOTE_URL"))?;
                let key = self
                    .remote_anon_key
                    .as_deref()
                    .ok_or(ConfigError::MissingRemote("FRJ_REMOTE_ANON_KEY"))?;
                info!("using remote backend at {url}");
                Ok(Arc::new(RestBackend::new(url, key)?))
            }
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|err| {
        warn!("Invalid {key} value '{raw}': {err}, using default");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.data_path, PathBuf::from("data/backend.json"));
        assert_eq!(config.save_debounce, Duration::from_millis(700));
        assert_eq!(config.session_idle, Duration::from_secs(12 * 60 * 60));
    }

    #[test]
    fn session_idle_is_configurable() {
        assert_eq!(config(&[("FRJ_SESSION_IDLE_SECS", "90")]).session_idle, Duration::from_secs(90));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config(&[("PORT", "http"), ("FRJ_SAVE_DEBOUNCE_MS", "-1"), ("FRJ_BACKEND", "cloud")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.save_debounce, Duration::from_millis(700));
        assert_eq!(config.backend, BackendKind::File);
    }

    #[tokio::test]
    async fn remote_backend_requires_url_and_key() {
        let config = config(&[("FRJ_BACKEND", "remote"), ("FRJ_REMOTE_URL", "https://x.example")]);
        assert!(matches!(
            config.build_backend().await,
            Err(ConfigError::MissingRemote("FRJ_REMOTE_ANON_KEY"))
        ));
    }
}
