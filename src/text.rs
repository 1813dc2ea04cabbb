use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// Visible text of a page as trimmed, non-empty lines in document order.
#[derive(Debug, Clone, Default)]
pub struct PageText {
    lines: Vec<String>,
}

impl PageText {
    pub fn from_raw(raw: &str) -> Self {
        let lines = raw
            .replace("\r\n", "\n")
            .split('\n')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        PageText { lines }
    }

    /// Text nodes under `<body>`, skipping script/style content.
    pub fn from_document(doc: &Html) -> Self {
        let root = doc.select(&BODY).next().unwrap_or_else(|| doc.root_element());
        Self::from_raw(&visible_text(root))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The first `n` lines (fewer if the page is short).
    pub fn head(&self, n: usize) -> &[String] {
        &self.lines[..n.min(self.lines.len())]
    }

    pub fn first_in_head<F>(&self, n: usize, f: F) -> Option<&str>
    where
        F: Fn(&str) -> bool,
    {
        self.head(n).iter().map(String::as_str).find(|l| f(*l))
    }
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
        if hidden {
            continue;
        }
        out.push_str(text);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_lines_are_trimmed_and_non_empty() {
        let t = PageText::from_raw("  Dr. A \r\n\r\n MBBS \n\n");
        assert_eq!(t.lines(), ["Dr. A", "MBBS"]);
    }

    #[test]
    fn head_is_clamped() {
        let t = PageText::from_raw("a\nb\nc");
        assert_eq!(t.head(2), ["a", "b"]);
        assert_eq!(t.head(10).len(), 3);
        assert_eq!(t.first_in_head(3, |l| l == "c"), Some("c"));
        assert_eq!(t.first_in_head(2, |l| l == "c"), None);
    }

    #[test]
    fn document_skips_scripts() {
        let doc = Html::parse_document(
            "<html><head><title>T</title></head><body><h1>Dr. A</h1>\
             <script>var x = 1;</script><p>MBBS, FCPS</p><style>p{}</style></body></html>",
        );
        let t = PageText::from_document(&doc);
        assert_eq!(t.lines(), ["Dr. A", "MBBS, FCPS"]);
    }
}
