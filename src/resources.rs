//! Bundled resource lookup.
//!
//! Resources are addressed by URL. `classpath://` names are resolved against a list of
//! resource directories, first match wins; `file://` URLs and bare paths are read from the
//! filesystem directly.

use std::io;
use std::path::{Component, PathBuf};

use tracing::debug;
use url::Url;

const CLASSPATH_SCHEME: &str = "classpath";

/// Loader for `classpath://` and file resources.
#[derive(Debug, Clone, Default)]
pub struct ClasspathResources {
    roots: Vec<PathBuf>,
}

impl ClasspathResources {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Loader with no resource directories; only file resources resolve.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Filesystem location of `url`, if it exists.
    pub fn locate(&self, url: &str) -> Option<PathBuf> {
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == CLASSPATH_SCHEME => {
                let relative = classpath_relative(&parsed)?;
                self.roots
                    .iter()
                    .map(|root| root.join(&relative))
                    .find(|candidate| candidate.exists())
            }
            Ok(parsed) if parsed.scheme() == "file" => {
                parsed.to_file_path().ok().filter(|p| p.exists())
            }
            Ok(_) => None,
            Err(_) => Some(PathBuf::from(url)).filter(|p| p.exists()),
        }
    }

    /// Whether `url` names an existing resource.
    pub fn exists(&self, url: &str) -> bool {
        self.locate(url).is_some()
    }

    /// Read the resource at `url`.
    pub fn fetch(&self, url: &str) -> io::Result<Vec<u8>> {
        let path = self.locate(url).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("resource not found: {url}"))
        })?;
        debug!(url = %url, path = %path.display(), "Loading resource");
        std::fs::read(path)
    }
}

/// `classpath://catalog/empty.bom` parses with host `catalog` and path `/empty.bom`.
fn classpath_relative(url: &Url) -> Option<PathBuf> {
    let mut joined = String::new();
    if let Some(host) = url.host_str() {
        joined.push_str(host);
    }
    joined.push_str(url.path());
    let relative = PathBuf::from(joined.trim_start_matches('/'));
    let safe = !relative.as_os_str().is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    safe.then_some(relative)
}
