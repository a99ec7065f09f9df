use crate::error::AppError;
use crate::storage::StorageGateway;
use log::warn;
use std::path::PathBuf;

const STORE_DIR_ENV_VAR: &str = "TASKPAD_STORE_DIR";

/// One file per key under a single store directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

pub fn store_dir() -> Result<PathBuf, AppError> {
    if let Ok(dir) = std::env::var(STORE_DIR_ENV_VAR)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("taskpad"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("taskpad"))
    }
}

impl FileStore {
    pub fn open_default() -> Result<Self, AppError> {
        Ok(Self { dir: store_dir()? })
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageGateway for FileStore {
    fn read_blob(&self, key: &str) -> Option<String> {
        let path = self.key_path(key);
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!("failed to read {}: {err}", path.display());
                None
            }
        }
    }

    fn write_blob(&self, key: &str, payload: &str) -> Result<(), AppError> {
        let path = self.key_path(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
        }

        std::fs::write(&path, payload).map_err(|err| AppError::io(err.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)
                .map_err(|err| AppError::io(err.to_string()))?;
        }

        Ok(())
    }
}
