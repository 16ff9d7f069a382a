//! # Content Module
//!
//! Locates the packaged web content served next to the API.
//!
//! Candidate locations are path patterns relative to the working directory. The final
//! segment may be a glob (see [`FilenameGlob`]); when several entries match, the most
//! recently modified wins, with ties going to the first entry in file name order.
//!
//! When nothing matches, the launcher serves a generated placeholder directory instead.
//! Placeholder and unpacked-archive directories are owned by the [`ContentRoot`] and
//! removed when it is dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::LaunchError;
use crate::resources::ClasspathResources;

mod fallback;
mod glob;

pub use fallback::create_temp_web_dir_with_index_html;
pub use glob::FilenameGlob;

/// Resource name of the GUI archive bundled with the launcher.
pub const BUNDLED_GUI_RESOURCE: &str = "classpath://gui.tar";

/// Placeholder shown when no GUI can be found.
pub const GUI_NOT_AVAILABLE_MESSAGE: &str = "REST API <p> (gui not available)";

/// Where the companion GUI is usually found relative to the working directory.
pub fn default_gui_candidates() -> Vec<String> {
    [
        "../../app-ui/src/main/webapp",
        "../../../app-ui/src/main/webapp",
        "../app-ui/src/main/webapp",
        "./app-ui/src/main/webapp",
        "../../app-ui/target/*.tar",
        "../../../app-ui/target/*.tar",
        "../app-ui/target/*.tar",
        "./app-ui/target/*.tar",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Where a REST webapp with its own descriptor is found.
pub fn default_descriptor_candidates() -> Vec<String> {
    vec!["src/main/webapp".to_string(), "../rest/target/*.tar".to_string()]
}

/// Resolve `pattern` to a path.
///
/// An existing path is returned as given. Otherwise the file name is matched as a glob
/// against the entries of the parent directory and the newest match is returned as an
/// absolute path. A missing parent directory is simply no match.
pub fn find_matching_file(pattern: impl AsRef<Path>) -> Option<PathBuf> {
    let pattern = pattern.as_ref();
    if pattern.exists() {
        return Some(pattern.to_path_buf());
    }

    let name = pattern.file_name()?.to_str()?;
    let glob = FilenameGlob::new(name)?;
    let dir = match pattern.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let entries = fs::read_dir(&dir).ok()?;

    let mut matches: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let file_name = entry.file_name().into_string().ok()?;
            glob.is_match(&file_name).then(|| (file_name, entry.path()))
        })
        .collect();
    matches.sort_by(|a, b| a.0.cmp(&b.0));

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for (_, path) in matches {
        let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) else {
            continue;
        };
        if newest.as_ref().map_or(true, |(best, _)| modified > *best) {
            newest = Some((modified, path));
        }
    }

    let (_, path) = newest?;
    Some(absolute(&path))
}

/// The first pattern that yields a match, in order.
pub fn find_first_matching_file<I, P>(patterns: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    patterns.into_iter().find_map(find_matching_file)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// What was chosen as static content for a launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResolvedContent {
    /// A directory found among the candidates.
    Directory { path: PathBuf },
    /// An archive found among the candidates, unpacked before serving.
    Archive { path: PathBuf },
    /// The archive bundled as a resource, unpacked before serving.
    Bundled { url: String },
    /// Generated placeholder page.
    Fallback { message: String },
}

impl ResolvedContent {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Directory the server reads static files from, plus any temporary directory backing it.
#[derive(Debug)]
pub struct ContentRoot {
    resolved: ResolvedContent,
    serve_dir: PathBuf,
    _temp: Option<TempDir>,
}

impl ContentRoot {
    /// Serve `path`: a directory as is, a `.tar` archive unpacked into a temporary directory.
    pub fn from_path(path: &Path) -> Result<Self, LaunchError> {
        let abs = absolute(path);
        let path = abs.as_path();
        if path.is_dir() {
            return Ok(Self {
                resolved: ResolvedContent::Directory {
                    path: path.to_path_buf(),
                },
                serve_dir: path.to_path_buf(),
                _temp: None,
            });
        }
        let file = fs::File::open(path).map_err(|e| LaunchError::content(path, e))?;
        let temp = unpack(file, path)?;
        Ok(Self {
            resolved: ResolvedContent::Archive {
                path: path.to_path_buf(),
            },
            serve_dir: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    /// Unpack an archive held in memory.
    pub fn from_archive_bytes(url: &str, bytes: &[u8]) -> Result<Self, LaunchError> {
        let temp = unpack(io::Cursor::new(bytes), Path::new(url))?;
        Ok(Self {
            resolved: ResolvedContent::Bundled {
                url: url.to_string(),
            },
            serve_dir: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    /// Generated placeholder directory with an `index.html` carrying `message`.
    pub fn fallback(message: &str) -> Result<Self, LaunchError> {
        let temp = create_temp_web_dir_with_index_html(message)
            .map_err(|e| LaunchError::content(std::env::temp_dir(), e))?;
        Ok(Self {
            resolved: ResolvedContent::Fallback {
                message: message.to_string(),
            },
            serve_dir: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    pub fn resolved(&self) -> &ResolvedContent {
        &self.resolved
    }

    pub fn serve_dir(&self) -> &Path {
        &self.serve_dir
    }
}

fn unpack<R: io::Read>(reader: R, origin: &Path) -> Result<TempDir, LaunchError> {
    let temp = tempfile::Builder::new()
        .prefix("restlaunch-content-")
        .tempdir()
        .map_err(|e| LaunchError::content(origin, e))?;
    tar::Archive::new(reader)
        .unpack(temp.path())
        .map_err(|e| LaunchError::content(origin, e))?;
    debug!(archive = %origin.display(), dir = %temp.path().display(), "Archive unpacked");
    Ok(temp)
}

/// Content precedence for the programmatic (servlet) deployment.
#[derive(Debug, Clone)]
pub struct ContentLocator {
    gui_candidates: Vec<String>,
    bundled_resource: String,
    resources: ClasspathResources,
}

impl ContentLocator {
    pub fn new(
        gui_candidates: Vec<String>,
        bundled_resource: impl Into<String>,
        resources: ClasspathResources,
    ) -> Self {
        Self {
            gui_candidates,
            bundled_resource: bundled_resource.into(),
            resources,
        }
    }

    /// GUI from source candidates, then the bundled archive, then the placeholder.
    ///
    /// Candidates are only consulted when `include_gui` is set; the bundled archive is
    /// used whenever present.
    pub fn resolve_gui(&self, include_gui: bool) -> Result<ContentRoot, LaunchError> {
        if include_gui {
            if let Some(path) = find_first_matching_file(&self.gui_candidates) {
                info!(path = %path.display(), "Serving GUI from source");
                return ContentRoot::from_path(&path);
            }
            debug!(candidates = ?self.gui_candidates, "No GUI found among source candidates");
        }

        if self.resources.exists(&self.bundled_resource) {
            match self.resources.fetch(&self.bundled_resource) {
                Ok(bytes) => {
                    info!(resource = %self.bundled_resource, "Serving bundled GUI archive");
                    return ContentRoot::from_archive_bytes(&self.bundled_resource, &bytes);
                }
                Err(e) => {
                    warn!(resource = %self.bundled_resource, error = %e, "Bundled GUI archive unreadable");
                }
            }
        }

        info!("GUI not available, serving placeholder page");
        ContentRoot::fallback(GUI_NOT_AVAILABLE_MESSAGE)
    }
}

impl Default for ContentLocator {
    fn default() -> Self {
        Self::new(
            default_gui_candidates(),
            BUNDLED_GUI_RESOURCE,
            ClasspathResources::empty(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_path_returned_as_given() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        fs::write(&file, "hi").unwrap();
        assert_eq!(find_matching_file(&file), Some(file));
    }

    #[test]
    fn test_missing_parent_is_no_match() {
        assert_eq!(find_matching_file("/definitely/not/here/*.tar"), None);
    }

    #[test]
    fn test_fallback_root_has_index() {
        let root = ContentRoot::fallback(GUI_NOT_AVAILABLE_MESSAGE).unwrap();
        let index = fs::read_to_string(root.serve_dir().join("index.html")).unwrap();
        assert!(index.contains("REST API <p> (gui not available)"));
        assert!(root.resolved().is_fallback());
        let dir = root.serve_dir().to_path_buf();
        drop(root);
        assert!(!dir.exists());
    }

    #[test]
    fn test_unpacks_tar() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("ui.tar");
        {
            let mut builder = tar::Builder::new(fs::File::create(&archive).unwrap());
            let body = b"<h1>ui</h1>";
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "index.html", &body[..])
                .unwrap();
            builder.finish().unwrap();
        }
        let root = ContentRoot::from_path(&archive).unwrap();
        assert_eq!(
            fs::read_to_string(root.serve_dir().join("index.html")).unwrap(),
            "<h1>ui</h1>"
        );
        assert!(matches!(root.resolved(), ResolvedContent::Archive { .. }));
    }
}
