//! Base template loading and placeholder substitution.

use std::path::PathBuf;

use crate::config::AmphoraConfig;
use crate::error::AmphoraError;

/// Where the base template comes from.
///
/// Dev mode re-reads the template from the source directory on every
/// request; production reads the build-dir copy once.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Fixed(String),
    File(PathBuf),
}

impl TemplateSource {
    /// Source following the configured mode.
    pub fn from_config(config: &AmphoraConfig) -> Result<Self, AmphoraError> {
        let path = config.template_path();
        if config.dev {
            Ok(TemplateSource::File(path))
        } else {
            let template = std::fs::read_to_string(&path)
                .map_err(|e| AmphoraError::Template(format!("{}: {}", path.display(), e)))?;
            Ok(TemplateSource::Fixed(template))
        }
    }

    /// Load the current template text.
    pub fn load(&self) -> Result<String, AmphoraError> {
        match self {
            TemplateSource::Fixed(template) => Ok(template.clone()),
            TemplateSource::File(path) => std::fs::read_to_string(path)
                .map_err(|e| AmphoraError::Template(format!("{}: {}", path.display(), e))),
        }
    }
}

/// Substitute the document placeholders.
///
/// `%base%`, `%html%`, `%head%` and `%styles%` are single-occurrence;
/// `%cspnonce%` substitutes everywhere it appears.
pub(crate) fn render_document(
    template: &str,
    base_path: &str,
    html: &str,
    head: &str,
    styles: &str,
    nonce: &str,
) -> String {
    template
        .replacen("%base%", &format!(r#"<base href="{}/">"#, base_path), 1)
        .replacen("%html%", html, 1)
        .replacen("%head%", head, 1)
        .replacen("%styles%", styles, 1)
        .replace("%cspnonce%", nonce)
}

/// Escape text for embedding in an HTML body.
pub(crate) fn escape_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    for c in html.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Substitution Tests ===

    #[test]
    fn test_render_document_substitutes_all_placeholders() {
        let template = "<head>%base%%head%%styles%</head><body>%html%</body>";
        let doc = render_document(template, "/amp", "<p>hi</p>", "<title>t</title>", "<style></style>", "");

        assert_eq!(
            doc,
            r#"<head><base href="/amp/"><title>t</title><style></style></head><body><p>hi</p></body>"#
        );
    }

    #[test]
    fn test_render_document_nonce_repeats() {
        let template = r#"<script nonce="%cspnonce%"></script><style nonce="%cspnonce%"></style>"#;
        let doc = render_document(template, "", "", "", "", "abc123");
        assert_eq!(
            doc,
            r#"<script nonce="abc123"></script><style nonce="abc123"></style>"#
        );
    }

    #[test]
    fn test_render_document_literal_replacement() {
        // Substituted content containing `$` must land verbatim
        let doc = render_document("%html%", "", "cost: $1", "", "", "");
        assert_eq!(doc, "cost: $1");
    }

    // === Escape Tests ===

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("it's"), "it&#39;s");
    }

    // === Source Tests ===

    #[test]
    fn test_fixed_template_load() {
        let source = TemplateSource::Fixed("<html>%html%</html>".to_string());
        assert_eq!(source.load().unwrap(), "<html>%html%</html>");
    }

    #[test]
    fn test_file_template_missing_errors() {
        let source = TemplateSource::File(PathBuf::from("/nonexistent/template.html"));
        assert!(matches!(source.load(), Err(AmphoraError::Template(_))));
    }
}
