//! Configuration management for the bring-up tool.
//!
//! Every field has a default matching a stock switch image, so a missing
//! config file is not an error. Values are loaded from TOML and then
//! overridden from the environment, which is how test rigs and chroot
//! builds point the tool at a fake sysfs tree.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/onl/agc7646v1.toml";

const ENV_SYSFS_ROOT: &str = "AGC7646V1_SYSFS_ROOT";
const ENV_DEV_ROOT: &str = "AGC7646V1_DEV_ROOT";
const ENV_MODULES_ROOT: &str = "AGC7646V1_MODULES_ROOT";
const ENV_KERNEL_RELEASE: &str = "AGC7646V1_KERNEL_RELEASE";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Mount point of sysfs
    pub sysfs_root: PathBuf,

    /// Directory holding the i2c-dev character devices
    pub dev_root: PathBuf,

    /// Root of the kernel module tree
    pub modules_root: PathBuf,

    /// List of loaded modules, as exposed by procfs
    pub proc_modules: PathBuf,

    /// Kernel release used to locate modules; `uname -r` when unset
    pub kernel_release: Option<String>,

    /// Log level when RUST_LOG is not set
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys"),
            dev_root: PathBuf::from("/dev"),
            modules_root: PathBuf::from("/lib/modules"),
            proc_modules: PathBuf::from("/proc/modules"),
            kernel_release: None,
            log_level: None,
        }
    }
}

impl Config {
    /// Load configuration from a specific file.
    ///
    /// A file that does not exist yields the defaults. Environment
    /// overrides are applied in both cases.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Like [`Config::load_from`], but an unreadable or malformed file falls
    /// back to the defaults (with environment overrides) instead of failing.
    /// The error is handed back so the caller can log it.
    pub fn load_or_default(path: &Path) -> (Self, Option<Error>) {
        match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(e) => {
                let mut config = Self::default();
                config.apply_env(|key| std::env::var(key).ok());
                (config, Some(e))
            }
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Override fields from environment variables, looked up via `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_SYSFS_ROOT) {
            self.sysfs_root = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DEV_ROOT) {
            self.dev_root = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_MODULES_ROOT) {
            self.modules_root = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_KERNEL_RELEASE) {
            self.kernel_release = Some(v);
        }
    }

    /// Kernel release to search modules under.
    pub fn kernel_release(&self) -> Result<String> {
        if let Some(release) = &self.kernel_release {
            return Ok(release.clone());
        }
        let uts = nix::sys::utsname::uname()?;
        uts.release()
            .to_str()
            .map(str::to_owned)
            .ok_or_else(|| Error::Config("kernel release is not valid UTF-8".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sysfs_root, PathBuf::from("/sys"));
        assert_eq!(config.dev_root, PathBuf::from("/dev"));
        assert_eq!(config.modules_root, PathBuf::from("/lib/modules"));
        assert_eq!(config.proc_modules, PathBuf::from("/proc/modules"));
        assert!(config.kernel_release.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            sysfs_root = "/tmp/sys"
            kernel_release = "4.14.49-OpenNetworkLinux"
            "#,
        )
        .unwrap();
        assert_eq!(config.sysfs_root, PathBuf::from("/tmp/sys"));
        assert_eq!(config.kernel_release.as_deref(), Some("4.14.49-OpenNetworkLinux"));
        assert_eq!(config.dev_root, PathBuf::from("/dev"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml("sysfs = \"/sys\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("AGC7646V1_SYSFS_ROOT", "/mnt/sys"),
            ("AGC7646V1_KERNEL_RELEASE", "5.4.0"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.sysfs_root, PathBuf::from("/mnt/sys"));
        assert_eq!(config.kernel_release().unwrap(), "5.4.0");
        assert_eq!(config.modules_root, PathBuf::from("/lib/modules"));
    }

    #[test]
    #[serial]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::env::remove_var("AGC7646V1_DEV_ROOT");
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.dev_root, PathBuf::from("/dev"));
    }

    #[test]
    #[serial]
    fn test_load_from_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dev_root = \"/srv/dev\"").unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();

        std::env::set_var("AGC7646V1_DEV_ROOT", "/override/dev");
        let config = Config::load_from(file.path());
        std::env::remove_var("AGC7646V1_DEV_ROOT");

        let config = config.unwrap();
        assert_eq!(config.dev_root, PathBuf::from("/override/dev"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    #[serial]
    fn test_malformed_file_error_names_path_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sysfs = \"/sys\"").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(msg.matches("Configuration error").count(), 1, "{msg}");
        assert!(msg.contains(&file.path().display().to_string()), "{msg}");
    }

    #[test]
    #[serial]
    fn test_malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sysfs = \"/sys\"").unwrap();

        std::env::set_var("AGC7646V1_SYSFS_ROOT", "/mnt/sys");
        let (config, err) = Config::load_or_default(file.path());
        std::env::remove_var("AGC7646V1_SYSFS_ROOT");

        assert!(matches!(err, Some(Error::Config(_))));
        assert_eq!(config.sysfs_root, PathBuf::from("/mnt/sys"));
        assert_eq!(config.dev_root, PathBuf::from("/dev"));
    }

    #[test]
    #[serial]
    fn test_valid_file_loads_without_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dev_root = \"/srv/dev\"").unwrap();

        std::env::remove_var("AGC7646V1_DEV_ROOT");
        let (config, err) = Config::load_or_default(file.path());

        assert!(err.is_none());
        assert_eq!(config.dev_root, PathBuf::from("/srv/dev"));
    }
}
