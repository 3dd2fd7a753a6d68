use crate::models::Journal;
use crate::transfer::parse_journal;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{error, info, warn};

pub async fn load_data<T: DeserializeOwned + Default>(path: &Path) -> T {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file {}: {err}", path.display());
                T::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => T::default(),
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            T::default()
        }
    }
}

pub async fn persist_data<T: Serialize>(path: &Path, data: &T) -> Result<(), std::io::Error> {
    let payload = serde_json::to_vec_pretty(data).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, payload).await
}

/// Reads the journal a user kept before accounts existed, if any.
///
/// The cache is never written. Unreadable or invalid files count as absent.
pub async fn read_legacy_cache(dir: &Path, user_id: &str) -> Option<Journal> {
    if user_id.is_empty() || user_id.contains(['/', '\\']) || user_id.contains("..") {
        return None;
    }
    let path = dir.join(format!("{user_id}.json"));
    let bytes = match fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!("failed to read legacy cache {}: {err}", path.display());
            return None;
        }
    };

    match parse_journal(&bytes) {
        Ok(journal) => {
            info!(user_id, "found legacy journal cache");
            Some(journal)
        }
        Err(err) => {
            warn!("ignoring legacy cache {}: {err}", path.display());
            None
        }
    }
}
