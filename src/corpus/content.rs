//! Content-kind dispatch.
//!
//! The response shape for a document depends only on its file extension.
//! The kind is resolved once at lookup time; each kind carries its render
//! rule so handlers never re-inspect the name.

use pulldown_cmark::{html, Options, Parser};

/// Extensions a document may be created with.
pub const ALLOWED_EXTENSIONS: &[&str] = &["md", "txt", "jpg", "jpeg", "png"];

/// MIME types accepted by the image upload endpoint.
pub const ALLOWED_IMAGE_MIMES: &[&str] = &["image/jpeg", "image/png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Rendered to HTML inside the site layout.
    Markdown,
    /// Served verbatim as text/plain.
    PlainText,
    Jpeg,
    Png,
    /// Anything else in the corpus: passthrough with a guessed MIME type.
    Other,
}

impl ContentKind {
    pub fn from_name(name: &str) -> Self {
        match extension(name).map(|ext| ext.to_ascii_lowercase()).as_deref() {
            Some("md") => Self::Markdown,
            Some("txt") => Self::PlainText,
            Some("jpg") | Some("jpeg") => Self::Jpeg,
            Some("png") => Self::Png,
            _ => Self::Other,
        }
    }

    /// Content-Type header value for a document of this kind.
    pub fn content_type(self, name: &str) -> String {
        match self {
            Self::Markdown => "text/html; charset=utf-8".into(),
            Self::PlainText => "text/plain".into(),
            Self::Jpeg => "image/jpeg".into(),
            Self::Png => "image/png".into(),
            Self::Other => mime_guess::from_path(name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    }
}

/// Extension after the last dot, if any. Case is preserved.
pub fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn extension_allowed(name: &str) -> bool {
    extension(name)
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.iter().any(|allowed| *allowed == ext)
        })
        .unwrap_or(false)
}

/// Convert markdown source to an HTML fragment.
pub fn markdown_to_html(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 2);
    html::push_html(&mut out, parser);
    out
}
