//! Kernel module loading.
//!
//! Platform modules ship inside the image under the ONL module tree and are
//! loaded by path with `insmod`. Anything not found there (e.g. modules
//! packaged with the distribution kernel) falls back to `modprobe`.

use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::tracing::prelude::*;

/// Loads kernel modules by name.
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    search_dirs: Vec<PathBuf>,
    proc_modules: PathBuf,
    insmod: String,
    modprobe: String,
}

impl ModuleLoader {
    /// Build a loader for `platform` (e.g. `x86-64-delta-agc7646v1`) from
    /// `vendor`, searching the module tree of kernel `release`.
    pub fn new(
        modules_root: &Path,
        release: &str,
        vendor: &str,
        platform: &str,
        proc_modules: &Path,
    ) -> Self {
        let onl = modules_root.join(release).join("onl");
        Self {
            search_dirs: vec![
                onl.join(vendor).join(platform),
                onl.join(vendor).join("common"),
                onl,
            ],
            proc_modules: proc_modules.to_path_buf(),
            insmod: "insmod".into(),
            modprobe: "modprobe".into(),
        }
    }

    /// A loader with no module tree to search, so every load goes through
    /// `modprobe`. Used when the kernel release cannot be determined.
    pub fn modprobe_only(proc_modules: &Path) -> Self {
        Self {
            search_dirs: Vec::new(),
            proc_modules: proc_modules.to_path_buf(),
            insmod: "insmod".into(),
            modprobe: "modprobe".into(),
        }
    }

    /// Replace the programs used to load modules.
    pub fn with_programs(mut self, insmod: impl Into<String>, modprobe: impl Into<String>) -> Self {
        self.insmod = insmod.into();
        self.modprobe = modprobe.into();
        self
    }

    /// Directories searched for `<name>.ko`, in order.
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// First `<name>.ko` found in the search directories.
    pub async fn find(&self, name: &str) -> Option<PathBuf> {
        let file = format!("{}.ko", name);
        for dir in &self.search_dirs {
            let candidate = dir.join(&file);
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }
        None
    }

    /// Whether the kernel already lists `name` as loaded.
    ///
    /// An unreadable module list counts as "not loaded"; the load attempt
    /// that follows reports the real problem.
    pub async fn is_loaded(&self, name: &str) -> bool {
        let wanted = name.replace('-', "_");
        match tokio::fs::read_to_string(&self.proc_modules).await {
            Ok(list) => list
                .lines()
                .filter_map(|line| line.split_whitespace().next())
                .any(|loaded| loaded == wanted),
            Err(e) => {
                debug!(path = %self.proc_modules.display(), error = %e, "Cannot read module list");
                false
            }
        }
    }

    /// Load `name`, preferring a platform-shipped object over modprobe.
    pub async fn load(&self, name: &str) -> Result<()> {
        if self.is_loaded(name).await {
            debug!(module = name, "Module already loaded");
            return Ok(());
        }

        let mut cmd = match self.find(name).await {
            Some(path) => {
                debug!(module = name, path = %path.display(), "Inserting module");
                let mut cmd = Command::new(&self.insmod);
                cmd.arg(path);
                cmd
            }
            None => {
                debug!(module = name, "No platform object, using modprobe");
                let mut cmd = Command::new(&self.modprobe);
                cmd.arg(name);
                cmd
            }
        };

        let output = cmd.output().await.map_err(|e| Error::Module {
            module: name.to_string(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Module {
                module: name.to_string(),
                reason: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        info!(module = name, "Module loaded");
        Ok(())
    }
}
