use crate::errors::AppError;
use crate::session::SessionData;
use std::path::Path;
use tokio::fs;
use tracing::error;

pub async fn load_sessions(path: &Path) -> SessionData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse session file {}: {err}", path.display());
                SessionData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => SessionData::default(),
        Err(err) => {
            error!("failed to read session file {}: {err}", path.display());
            SessionData::default()
        }
    }
}

pub async fn persist_sessions(path: &Path, data: &SessionData) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
