//! Layered configuration for the filing service.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults.
//! 2. A TOML, YAML or JSON file: the explicit path if one was given,
//!    otherwise `config.toml` in the platform configuration directory (if it
//!    exists).
//! 3. `FILER_`-prefixed environment variables, with `__` separating nested
//!    keys (`FILER_SERVER__ADDRESS`, `FILER_NAMESPACES__SCANS__INVOICE_ROOT`).
//!
//! Configuration is read once at startup and validated before anything is
//! opened; every error here is fatal.

pub mod error;

use crate::error::{ErrorKind, Result};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "FILER_";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: SocketAddr,
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
        }
    }
}

/// The two roots one namespace files between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Flat inbox of pending invoices.
    pub invoice_root: PathBuf,
    /// Letter-bucketed archive.
    pub directories_root: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceConfig>,
}

impl Config {
    /// Load and validate configuration from every source.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(path)?.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    /// Defaults merged with the configuration file, without the environment.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::FileNotFound(path.to_path_buf())),
            Some(path) => path.to_path_buf(),
            None => match default_config_file() {
                Some(file) if file.is_file() => file,
                _ => {
                    tracing::debug!("No configuration file found; using defaults and environment only");
                    return Ok(figment);
                },
            },
        };
        tracing::info!(path = %file.display(), "Loading configuration file");
        let extension = file.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        Ok(match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file(&file)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(&file)),
            Some("json") => figment.merge(Json::file(&file)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(file)),
        })
    }

    /// Extract a [`Config`] from an assembled figment and validate it.
    pub fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|e| ErrorKind::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the engine relies on before any root is opened.
    pub fn validate(&self) -> Result<()> {
        if self.namespaces.is_empty() {
            exn::bail!(ErrorKind::NoNamespaces);
        }
        let mut roots: Vec<&Path> = Vec::with_capacity(self.namespaces.len() * 2);
        for (name, namespace) in &self.namespaces {
            if !is_valid_namespace_name(name) {
                exn::bail!(ErrorKind::InvalidNamespace(name.clone()));
            }
            for root in [&namespace.invoice_root, &namespace.directories_root] {
                if !root.is_absolute() {
                    exn::bail!(ErrorKind::RelativeRoot {
                        namespace: name.clone(),
                        path: root.clone(),
                    });
                }
                let overlapping = roots.iter().find(|other| root.starts_with(other) || other.starts_with(root));
                if let Some(other) = overlapping {
                    exn::bail!(ErrorKind::OverlappingRoots {
                        first: other.to_path_buf(),
                        second: root.clone(),
                    });
                }
                roots.push(root);
            }
        }
        Ok(())
    }

    pub fn namespace(&self, name: &str) -> Option<&NamespaceConfig> {
        self.namespaces.get(name)
    }
}

/// Namespace names become a URL path segment.
fn is_valid_namespace_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `config.toml` in the platform configuration directory, e.g.
/// `~/.config/filer/config.toml` on Linux.
pub fn default_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "filer").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn namespace(invoice_root: &str, directories_root: &str) -> NamespaceConfig {
        NamespaceConfig {
            invoice_root: PathBuf::from(invoice_root),
            directories_root: PathBuf::from(directories_root),
        }
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "filer.toml",
            r#"
                [server]
                address = "0.0.0.0:8080"

                [namespaces.customer-scanned-documents]
                invoice_root = "/srv/invoices/inbox"
                directories_root = "/srv/invoices/archive"
            "#,
        );
        let config = Config::extract(Config::figment(Some(&path)).unwrap()).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(
            config.namespace("customer-scanned-documents"),
            Some(&namespace("/srv/invoices/inbox", "/srv/invoices/archive"))
        );
    }

    #[test]
    fn test_load_yaml_file_uses_default_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "filer.yml",
            "namespaces:\n  scans:\n    invoice_root: /in\n    directories_root: /out\n",
        );
        let config = Config::extract(Config::figment(Some(&path)).unwrap()).unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.namespaces.len(), 1);
    }

    #[test]
    fn test_later_layers_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "filer.json",
            r#"{"namespaces": {"scans": {"invoice_root": "/in", "directories_root": "/out"}}}"#,
        );
        let figment = Config::figment(Some(&path))
            .unwrap()
            .merge(Serialized::default("namespaces.scans.invoice_root", "/elsewhere"));
        let config = Config::extract(figment).unwrap();
        assert_eq!(config.namespace("scans"), Some(&namespace("/elsewhere", "/out")));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::figment(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "filer.ini", "[server]");
        let err = Config::figment(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "filer.toml", "[namespaces.scans]\ninvoice_root = 42\n");
        let err = Config::extract(Config::figment(Some(&path)).unwrap()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load(_)));
    }

    #[test]
    fn test_no_namespaces() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::NoNamespaces));
    }

    #[rstest]
    #[case::relative_inbox("inbox", "/srv/archive")]
    #[case::relative_archive("/srv/inbox", "./archive")]
    fn test_relative_roots_rejected(#[case] invoice_root: &str, #[case] directories_root: &str) {
        let config = Config {
            namespaces: BTreeMap::from([("scans".to_string(), namespace(invoice_root, directories_root))]),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::RelativeRoot { .. }));
    }

    #[rstest]
    #[case::same("/srv/files", "/srv/files")]
    #[case::archive_inside_inbox("/srv/files", "/srv/files/archive")]
    #[case::inbox_inside_archive("/srv/archive/inbox", "/srv/archive")]
    fn test_overlapping_roots_rejected(#[case] invoice_root: &str, #[case] directories_root: &str) {
        let config = Config {
            namespaces: BTreeMap::from([("scans".to_string(), namespace(invoice_root, directories_root))]),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::OverlappingRoots { .. }));
    }

    #[test]
    fn test_roots_not_shared_between_namespaces() {
        let config = Config {
            namespaces: BTreeMap::from([
                ("first".to_string(), namespace("/srv/first/inbox", "/srv/first/archive")),
                ("second".to_string(), namespace("/srv/second/inbox", "/srv/first/archive")),
            ]),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sibling_roots_with_common_prefix_allowed() {
        let config = Config {
            namespaces: BTreeMap::from([("scans".to_string(), namespace("/srv/inbox", "/srv/inbox-archive"))]),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case("customer-scanned-documents", true)]
    #[case("scans_2024", true)]
    #[case("", false)]
    #[case("with space", false)]
    #[case("a/b", false)]
    fn test_namespace_names(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_valid_namespace_name(name), valid);
    }
}
