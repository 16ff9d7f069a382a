use std::env;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::management::{keys, ManagementContext};

/// Catalog that scans the base classpath for entries.
pub const SCANNING_CATALOG_BOM_URL: &str = "classpath://catalog/scanning.catalog.bom";
/// Catalog with no entries.
pub const EMPTY_CATALOG_URL: &str = "classpath://catalog/empty.catalog.bom";

/// Which catalog the management platform loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CatalogSource {
    /// Scan these roots for catalog entries.
    Scanning { roots: Vec<PathBuf> },
    /// Use the catalog at this URL.
    Explicit { url: String },
    /// Load nothing, whatever catalog the configuration names.
    Empty,
}

impl CatalogSource {
    /// Forced scanning wins, then an explicit URL, else the empty catalog.
    pub fn select(force_scan: bool, explicit_url: Option<&str>) -> Self {
        if force_scan {
            Self::Scanning {
                roots: scan_roots(),
            }
        } else if let Some(url) = explicit_url {
            Self::Explicit {
                url: url.to_string(),
            }
        } else {
            Self::Empty
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Scanning { .. } => SCANNING_CATALOG_BOM_URL,
            Self::Explicit { url } => url,
            Self::Empty => EMPTY_CATALOG_URL,
        }
    }

    /// Write the selection into the management context.
    pub fn apply(&self, mgmt: &ManagementContext) {
        let config = mgmt.config();
        config.put(keys::CATALOG_URL, self.url());
        if let Self::Scanning { roots } = self {
            let joined = roots
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(",");
            config.put(keys::CATALOG_BASE_CLASSPATH, joined);
            mgmt.set_base_classpath_for_scanning(roots.clone());
        }
        debug!(catalog = %self.url(), "Catalog source selected");
    }
}

/// Directory of the running executable, then the working directory.
fn scan_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(dir) = env::current_exe().ok().and_then(|p| p.parent().map(PathBuf::from)) {
        roots.push(dir);
    }
    if let Ok(cwd) = env::current_dir() {
        if !roots.contains(&cwd) {
            roots.push(cwd);
        }
    }
    roots
}
