use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LaunchError;
use crate::filters::FilterKind;

/// Descriptor file looked up at the root of a webapp.
pub const WEB_DESCRIPTOR_FILE: &str = "webapp.yaml";

/// Deployment settings read from `webapp.yaml`.
///
/// ```yaml
/// context_path: /
/// filters: [request-tagging, logging]
/// api: true
/// welcome: index.html
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebDescriptor {
    pub context_path: String,
    /// Replaces the launcher's servlet filters when present.
    pub filters: Option<Vec<FilterKind>>,
    /// Serve the REST API next to the static content.
    pub api: bool,
    pub welcome: String,
}

impl Default for WebDescriptor {
    fn default() -> Self {
        Self {
            context_path: "/".to_string(),
            filters: None,
            api: true,
            welcome: "index.html".to_string(),
        }
    }
}

impl WebDescriptor {
    pub fn from_yaml(path: &Path, source: &str) -> Result<Self, LaunchError> {
        serde_yaml::from_str(source).map_err(|e| LaunchError::InvalidDescriptor {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Read `webapp.yaml` under `root`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self, LaunchError> {
        let path = root.join(WEB_DESCRIPTOR_FILE);
        match fs::read_to_string(&path) {
            Ok(source) => {
                debug!(path = %path.display(), "Web descriptor found");
                Self::from_yaml(&path, &source)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(LaunchError::content(path, e)),
        }
    }
}

/// A context supplied by the caller instead of the one the launch mode would build.
#[derive(Debug, Clone)]
pub enum ContextHandler {
    /// A web application rooted at a directory or archive. Accepts a security handler.
    WebApp {
        root: PathBuf,
        descriptor: Option<WebDescriptor>,
    },
    /// Anything else. Security handlers are not installed on custom contexts.
    Custom {
        static_root: Option<PathBuf>,
        context_path: String,
        serve_api: bool,
    },
}

impl ContextHandler {
    /// Web application whose descriptor is read from `root` at launch.
    pub fn web_app(root: impl Into<PathBuf>) -> Self {
        Self::WebApp {
            root: root.into(),
            descriptor: None,
        }
    }

    /// Web application with an explicit descriptor.
    pub fn web_app_with_descriptor(root: impl Into<PathBuf>, descriptor: WebDescriptor) -> Self {
        Self::WebApp {
            root: root.into(),
            descriptor: Some(descriptor),
        }
    }

    /// Custom context serving the API at `/` and, optionally, static files.
    pub fn custom(static_root: Option<PathBuf>) -> Self {
        Self::Custom {
            static_root,
            context_path: "/".to_string(),
            serve_api: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults_fill_missing_fields() {
        let d = WebDescriptor::from_yaml(Path::new("webapp.yaml"), "api: false\n").unwrap();
        assert!(!d.api);
        assert_eq!(d.context_path, "/");
        assert_eq!(d.welcome, "index.html");
        assert_eq!(d.filters, None);
    }

    #[test]
    fn test_descriptor_filters() {
        let d = WebDescriptor::from_yaml(
            Path::new("webapp.yaml"),
            "context_path: /api\nfilters: [logging]\n",
        )
        .unwrap();
        assert_eq!(d.context_path, "/api");
        assert_eq!(d.filters, Some(vec![FilterKind::Logging]));
    }

    #[test]
    fn test_malformed_descriptor_is_fatal() {
        let err = WebDescriptor::from_yaml(Path::new("webapp.yaml"), "filters: [gzip]\n").unwrap_err();
        assert!(matches!(err, LaunchError::InvalidDescriptor { .. }));
        let err = WebDescriptor::from_yaml(Path::new("webapp.yaml"), "surprise: 1\n").unwrap_err();
        assert!(matches!(err, LaunchError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_missing_descriptor_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(WebDescriptor::load(dir.path()).unwrap(), WebDescriptor::default());
    }
}
