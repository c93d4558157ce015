use ammonia::Builder;
use comrak::{markdown_to_html, Options};
use std::collections::HashSet;

/// Render an event description or comment body to sanitized HTML.
///
/// comrak parses the Markdown, ammonia strips anything unsafe. Descriptions
/// and comments only need prose-level formatting, so the allowlist is small.
pub fn render_markdown(raw: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.render.unsafe_ = true; // comrak may emit raw HTML; ammonia cleans it

    let html = markdown_to_html(raw, &options);
    sanitize_html(&html)
}

fn sanitize_html(html: &str) -> String {
    let extra_tags: HashSet<&str> = [
        "h1", "h2", "h3", "pre", "code", "blockquote", "hr", "del", "s",
    ]
    .iter()
    .copied()
    .collect();

    let url_schemes: HashSet<&str> = ["http", "https", "mailto"].iter().copied().collect();

    let mut builder = Builder::default();
    builder.add_tags(&extra_tags);
    builder.add_tag_attributes("a", &["href", "title"]);
    builder.add_tag_attributes("code", &["class"]);
    builder.url_schemes(url_schemes);
    builder.link_rel(Some("noopener noreferrer"));

    builder.clean(html).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prose_formatting_renders() {
        let html = render_markdown("Bring **snacks** and *drinks*.");
        assert!(html.contains("<strong>snacks</strong>"));
        assert!(html.contains("<em>drinks</em>"));
    }

    #[test]
    fn headings_render() {
        let html = render_markdown("# Agenda");
        assert!(html.contains("<h1>Agenda</h1>"));
    }

    #[test]
    fn autolink_renders_anchor() {
        let html = render_markdown("Details at https://example.com");
        assert!(html.contains("<a href=\"https://example.com\""));
    }

    #[test]
    fn script_tag_stripped() {
        let html = render_markdown("<script>alert('xss')</script>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("alert"));
    }

    #[test]
    fn javascript_url_stripped() {
        let html = render_markdown("[click](javascript:alert(1))");
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn event_handler_attribute_stripped() {
        let html = render_markdown("<em onclick=alert(1)>hi</em>");
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn empty_input() {
        assert!(render_markdown("").trim().is_empty());
    }
}
