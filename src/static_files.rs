use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Read-only view of the resolved content directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
    welcome: String,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
            welcome: "index.html".to_string(),
        }
    }

    /// File served for directory requests (default `index.html`).
    pub fn with_welcome(mut self, welcome: impl Into<String>) -> Self {
        self.welcome = welcome.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "ico" => "image/x-icon",
            "woff" => "font/woff",
            "woff2" => "font/woff2",
            _ => "application/octet-stream",
        }
    }

    /// Load the file for `url_path`; directories resolve to their welcome file.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let mut path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if path.is_dir() {
            path.push(&self.welcome);
        }
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, StaticFiles) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), "Hello\n").unwrap();
        fs::write(dir.path().join("index.html"), "<h1>root</h1>").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.html"), "<h1>docs</h1>").unwrap();
        let sf = StaticFiles::new(dir.path());
        (dir, sf)
    }

    #[test]
    fn test_map_path_prevents_traversal() {
        let (_dir, sf) = fixture();
        assert!(sf.map_path("../Cargo.toml").is_none());
        assert!(sf.map_path("/docs/../../Cargo.toml").is_none());
    }

    #[test]
    fn test_load_plain_file() {
        let (_dir, sf) = fixture();
        let (bytes, ct) = sf.load("hello.txt").unwrap();
        assert_eq!(ct, "text/plain");
        assert_eq!(String::from_utf8(bytes).unwrap(), "Hello\n");
    }

    #[test]
    fn test_directories_serve_welcome_file() {
        let (_dir, sf) = fixture();
        let (bytes, ct) = sf.load("/").unwrap();
        assert_eq!(ct, "text/html");
        assert_eq!(bytes, b"<h1>root</h1>");
        let (bytes, _) = sf.load("/docs").unwrap();
        assert_eq!(bytes, b"<h1>docs</h1>");
        assert!(sf.load("/missing.js").is_err());
    }
}
