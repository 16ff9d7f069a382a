use std::fs;
use std::io;

use minijinja::{context, Environment};
use tempfile::TempDir;
use tracing::debug;

// Registered without an `.html` suffix so minijinja leaves the message unescaped; the
// placeholder message carries markup.
const INDEX_TEMPLATE_NAME: &str = "index";
const INDEX_TEMPLATE: &str = "<!DOCTYPE html>\n<html>\n<head><title>{{ title }}</title></head>\n<body>{{ message }}</body>\n</html>\n";

fn render_index(message: &str) -> io::Result<String> {
    let mut env = Environment::new();
    env.add_template(INDEX_TEMPLATE_NAME, INDEX_TEMPLATE)
        .map_err(io::Error::other)?;
    let tmpl = env
        .get_template(INDEX_TEMPLATE_NAME)
        .map_err(io::Error::other)?;
    tmpl.render(context! { title => "REST API", message => message })
        .map_err(io::Error::other)
}

/// Create a temporary directory holding an `index.html` around `message`.
///
/// The directory is removed when the returned [`TempDir`] is dropped.
pub fn create_temp_web_dir_with_index_html(message: &str) -> io::Result<TempDir> {
    let dir = tempfile::Builder::new().prefix("restlaunch-web-").tempdir()?;
    fs::write(dir.path().join("index.html"), render_index(message)?)?;
    debug!(dir = %dir.path().display(), "Placeholder web directory created");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_not_escaped() {
        let html = render_index("a <p> b").unwrap();
        assert!(html.contains("<body>a <p> b</body>"));
    }
}
