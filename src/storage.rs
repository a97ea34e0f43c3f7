use crate::errors::AppError;
use crate::models::{AttendanceRecord, Records};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};

/// Fixed key the record list is saved under.
pub const STORE_KEY: &str = "mahasina_reports";

/// Key-value backed record list. The payload for [`STORE_KEY`] lives in
/// `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::with_key(data_dir, STORE_KEY)
    }

    pub fn with_key(data_dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last persisted list, or an empty one when nothing usable is stored.
    pub async fn load(&self) -> Records {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<AttendanceRecord>>(&bytes) {
                Ok(records) => records.into(),
                Err(err) => {
                    error!("failed to parse {}: {err}", self.path.display());
                    empty()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => empty(),
            Err(err) => {
                error!("failed to read {}: {err}", self.path.display());
                empty()
            }
        }
    }

    /// Replaces the stored list with `records`.
    pub async fn persist(&self, records: &[AttendanceRecord]) -> Result<(), AppError> {
        let payload = serde_json::to_vec_pretty(records)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("cleared {}", self.path.display());
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// New list with `record` in front; `records` itself is left as is.
pub fn append(records: &[AttendanceRecord], record: AttendanceRecord) -> Records {
    std::iter::once(record)
        .chain(records.iter().cloned())
        .collect()
}

fn empty() -> Records {
    Vec::new().into()
}
