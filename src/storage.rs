use crate::errors::AppError;
use crate::models::AppData;
use crate::snapshot::load_document;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, warn};

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match load_document(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                preserve_unreadable(path).await;
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

/// Copies an unparseable data file aside before the defaults replace it on
/// the next persist.
async fn preserve_unreadable(path: &Path) {
    let backup = path.with_extension("json.bak");
    match fs::copy(path, &backup).await {
        Ok(_) => warn!(backup = %backup.display(), "kept unreadable data file"),
        Err(err) => error!("failed to keep unreadable data file: {err}"),
    }
}

/// Writes the whole document next to `path` and renames it into place, so a
/// crash mid-write never leaves a truncated file behind.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, payload).await.map_err(AppError::internal)?;
    fs::rename(&staging, path).await.map_err(AppError::internal)?;
    debug!(path = %path.display(), "persisted data");
    Ok(())
}
