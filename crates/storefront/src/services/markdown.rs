//! Markdown rendering for content pages.

use comrak::{Options, markdown_to_html};

/// Render page markdown to HTML.
///
/// Raw HTML in the source is escaped, so admin-authored pages cannot inject
/// scripts.
#[must_use]
pub fn render(markdown: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.render.escape = true;
    markdown_to_html(markdown, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_headings_and_lists() {
        let html = render("# Returns\n\n- 14 days\n- unworn");
        assert!(html.contains("<h1>Returns</h1>"));
        assert!(html.contains("<li>14 days</li>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_tables_enabled() {
        let html = render("| Size | cm |\n|---|---|\n| 38 | 24.5 |");
        assert!(html.contains("<table>"));
    }
}
