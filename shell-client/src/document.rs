// shell-client/src/document.rs
//! Structured render target for the shell.
//!
//! Views author complete standalone pages; only their body-equivalent
//! content is injected into the running document. Style and script
//! resources occupy reserved slots identified by fixed element ids, and
//! slot swaps are remove-then-insert so at most one element per reserved
//! id exists at any instant.

/// Reserved element identifier for the current view's style resource
pub const VIEW_STYLE_ID: &str = "view-style";
/// Reserved element identifier for the current view's script resource
pub const VIEW_SCRIPT_ID: &str = "view-script";

/// An explicit content node extracted from untrusted markup, decoupled
/// from the live document it will be injected into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    inner: String,
}

impl Fragment {
    pub fn from_html(html: &str) -> Self {
        Self { inner: html.trim().to_string() }
    }

    pub fn as_html(&self) -> &str {
        &self.inner
    }
}

/// Extract the body-equivalent content of a fetched page.
///
/// The wrapping document shell is discarded; markup without a `<body>`
/// element is taken whole. View authors need not know their markup will
/// be injected into a host page.
pub fn extract_body(markup: &str) -> Fragment {
    let lower = markup.to_ascii_lowercase();

    let inner = lower.find("<body").and_then(|open| {
        let content_start = markup[open..].find('>').map(|i| open + i + 1)?;
        let content_end = lower[content_start..]
            .find("</body")
            .map(|i| content_start + i)
            .unwrap_or(markup.len());
        Some(&markup[content_start..content_end])
    });

    Fragment::from_html(inner.unwrap_or(markup))
}

/// A resource element occupying a reserved slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLink {
    pub id: &'static str,
    pub href: String,
}

/// The live document: main container plus the reserved resource slots.
/// Owned by the UI event loop; the composer is the sole mutator.
#[derive(Debug)]
pub struct Document {
    main: Fragment,
    styles: Vec<ResourceLink>,
    scripts: Vec<ResourceLink>,
}

impl Document {
    /// A fresh document showing the shell/welcome content
    pub fn new(shell_content: Fragment) -> Self {
        Self { main: shell_content, styles: Vec::new(), scripts: Vec::new() }
    }

    /// Replace the main container's content wholesale
    pub fn replace_main(&mut self, fragment: Fragment) {
        self.main = fragment;
    }

    pub fn main_html(&self) -> &str {
        self.main.as_html()
    }

    pub fn remove_style(&mut self, id: &str) {
        self.styles.retain(|link| link.id != id);
    }

    pub fn insert_style(&mut self, id: &'static str, href: String) {
        self.styles.push(ResourceLink { id, href });
    }

    pub fn remove_script(&mut self, id: &str) {
        self.scripts.retain(|link| link.id != id);
    }

    pub fn insert_script(&mut self, id: &'static str, href: String) {
        self.scripts.push(ResourceLink { id, href });
    }

    pub fn style_links(&self) -> &[ResourceLink] {
        &self.styles
    }

    pub fn script_links(&self) -> &[ResourceLink] {
        &self.scripts
    }

    /// Render the document as a standalone page
    pub fn render(&self) -> String {
        let mut head = String::new();
        for link in &self.styles {
            head.push_str(&format!(
                "<link id=\"{}\" rel=\"stylesheet\" href=\"{}\">\n",
                link.id, link.href
            ));
        }

        let mut tail = String::new();
        for link in &self.scripts {
            tail.push_str(&format!("<script id=\"{}\" src=\"{}\"></script>\n", link.id, link.href));
        }

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n{}</head>\n<body>\n<main>{}</main>\n{}</body>\n</html>\n",
            head,
            self.main.as_html(),
            tail
        )
    }
}
