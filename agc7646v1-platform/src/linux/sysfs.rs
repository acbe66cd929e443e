//! Sysfs attribute access.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::tracing::prelude::*;

/// Sysfs tree rooted at a mount point (normally `/sys`).
#[derive(Debug, Clone)]
pub struct Sysfs {
    root: PathBuf,
}

impl Sysfs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, attribute: &Path) -> PathBuf {
        self.root.join(attribute)
    }

    /// Write `value` to an attribute. The attribute must already exist;
    /// sysfs never creates files on write.
    pub async fn write(&self, attribute: &Path, value: &str) -> Result<()> {
        let path = self.path(attribute);
        trace!(path = %path.display(), value, "sysfs write");
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .await
            .map_err(|e| Error::Hardware(format!("{}: {}", path.display(), e)))?;
        // sysfs reports rejected values from write(), which tokio only
        // surfaces once the buffered data is flushed.
        let written = match file.write_all(value.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        written.map_err(|e| Error::Hardware(format!("{}: {}", path.display(), e)))
    }

    /// Read an attribute, trimmed of the trailing newline.
    pub async fn read(&self, attribute: &Path) -> Result<String> {
        let path = self.path(attribute);
        let text = tokio::fs::read_to_string(&path).await?;
        Ok(text.trim_end().to_string())
    }
}
