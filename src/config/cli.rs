use crate::core::Storage;
use crate::utils::error::{ReconError, Result};
use std::fs;
use std::path::Path;

/// 將輸出寫入本機目錄
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReconError::StorageError {
                message: format!("Cannot create directory {}: {}", parent.display(), e),
            })?;
        }

        fs::write(&full_path, data).map_err(|e| ReconError::StorageError {
            message: format!("Cannot write {}: {}", full_path.display(), e),
        })?;
        tracing::debug!("💾 Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(())
    }

    fn location(&self, path: &str) -> String {
        Path::new(&self.base_path).join(path).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        storage
            .write_file("unresolved/next_steps.csv", b"order_id,next_steps,summary\n")
            .await
            .unwrap();

        let full = temp_dir.path().join("unresolved/next_steps.csv");
        assert!(full.exists());
        assert_eq!(storage.location("unresolved/next_steps.csv"), full.display().to_string());
        assert_eq!(
            storage.read_file("unresolved/next_steps.csv").await.unwrap(),
            b"order_id,next_steps,summary\n"
        );
    }
}
