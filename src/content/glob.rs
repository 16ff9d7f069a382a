use regex::Regex;

/// Filename glob: `*` matches any run, `?` one character, `{a,b}` either alternative.
///
/// Globs apply to a single path segment, so `*` also matches `.` and never needs to
/// cross a separator.
#[derive(Debug, Clone)]
pub struct FilenameGlob {
    regex: Regex,
}

impl FilenameGlob {
    /// Compile `pattern`. Returns `None` if the braces do not balance.
    pub fn new(pattern: &str) -> Option<Self> {
        let source = translate(pattern)?;
        let regex = Regex::new(&source).ok()?;
        Some(Self { regex })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

fn translate(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut depth = 0usize;
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '{' => {
                depth += 1;
                out.push_str("(?:");
            }
            '}' if depth > 0 => {
                depth -= 1;
                out.push(')');
            }
            ',' if depth > 0 => out.push('|'),
            other => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }
    if depth != 0 {
        return None;
    }
    out.push('$');
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, name: &str) -> bool {
        FilenameGlob::new(pattern).unwrap().is_match(name)
    }

    #[test]
    fn test_star_and_question() {
        assert!(matches("*.tar", "app-ui-1.0.tar"));
        assert!(!matches("*.tar", "app-ui-1.0.tar.gz"));
        assert!(matches("v?.txt", "v1.txt"));
        assert!(!matches("v?.txt", "v10.txt"));
    }

    #[test]
    fn test_alternatives() {
        assert!(matches("gui.{tar,war}", "gui.war"));
        assert!(matches("gui.{tar,war}", "gui.tar"));
        assert!(!matches("gui.{tar,war}", "gui.zip"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("a+b(1).txt", "a+b(1).txt"));
        assert!(!matches("a.txt", "abtxt"));
    }

    #[test]
    fn test_unbalanced_braces_rejected() {
        assert!(FilenameGlob::new("gui.{tar").is_none());
    }
}
