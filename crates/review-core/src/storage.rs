//! Whole-file storage for a review project

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DOCUMENT_FILE: &str = "document.pdf";
pub const RESULT_FILE: &str = "document_result.json";

/// Read and write the two files a review needs.
///
/// Missing files are `Ok(None)`; any other failure is an error.
#[async_trait]
pub trait ResultStorage: Send + Sync {
    async fn read_result(&self) -> io::Result<Option<String>>;

    async fn write_result(&self, json: &str) -> io::Result<()>;

    async fn read_document(&self) -> io::Result<Option<Vec<u8>>>;
}

/// Project directory holding `document.pdf` and `document_result.json`
#[derive(Debug, Clone)]
pub struct FsProjectStorage {
    root: PathBuf,
}

impl FsProjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self) -> PathBuf {
        self.root.join(DOCUMENT_FILE)
    }

    pub fn result_path(&self) -> PathBuf {
        self.root.join(RESULT_FILE)
    }
}

fn missing_as_none<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ResultStorage for FsProjectStorage {
    async fn read_result(&self) -> io::Result<Option<String>> {
        missing_as_none(tokio::fs::read_to_string(self.result_path()).await)
    }

    async fn write_result(&self, json: &str) -> io::Result<()> {
        tokio::fs::write(self.result_path(), json).await
    }

    async fn read_document(&self) -> io::Result<Option<Vec<u8>>> {
        missing_as_none(tokio::fs::read(self.document_path()).await)
    }
}

/// In-memory project, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Option<Vec<u8>>,
    result: Mutex<Option<String>>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new(document: Option<Vec<u8>>, result: Option<String>) -> Self {
        Self {
            document,
            result: Mutex::new(result),
            fail_writes: false,
        }
    }

    /// Make every write fail, as a read-only disk would
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn stored_result(&self) -> Option<String> {
        self.result.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl ResultStorage for MemoryStorage {
    async fn read_result(&self) -> io::Result<Option<String>> {
        Ok(self.stored_result())
    }

    async fn write_result(&self, json: &str) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "storage is read-only",
            ));
        }
        let mut slot = self
            .result
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "storage lock poisoned"))?;
        *slot = Some(json.to_string());
        Ok(())
    }

    async fn read_document(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.document.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_missing_files_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsProjectStorage::new(dir.path());
        assert!(storage.read_result().await.unwrap().is_none());
        assert!(storage.read_document().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fs_result_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsProjectStorage::new(dir.path());
        storage.write_result(r#"{"issues":[]}"#).await.unwrap();

        assert_eq!(
            storage.read_result().await.unwrap().as_deref(),
            Some(r#"{"issues":[]}"#)
        );
        assert!(dir.path().join(RESULT_FILE).exists());
    }

    #[tokio::test]
    async fn test_fs_reads_document_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DOCUMENT_FILE), b"%PDF-1.7").unwrap();
        let storage = FsProjectStorage::new(dir.path());
        assert_eq!(
            storage.read_document().await.unwrap(),
            Some(b"%PDF-1.7".to_vec())
        );
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsProjectStorage::new(dir.path().join("gone"));
        assert!(storage.write_result("{}").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_failing_writes() {
        let storage = MemoryStorage::new(None, Some("[]".to_string())).failing_writes();
        assert!(storage.write_result("{}").await.is_err());
        assert_eq!(storage.stored_result().as_deref(), Some("[]"));
    }
}
