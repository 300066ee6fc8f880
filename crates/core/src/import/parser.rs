//! Text extraction from story documents.
//!
//! Parsing never fails outright: unreadable or unsupported files produce an
//! error-tagged text (see [`ERROR_TAG`]) so callers can surface the reason.

use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use image::ImageDecoder;
use regex::Regex;
use serde::Serialize;

/// Prefix of every error-tagged parse result.
pub const ERROR_TAG: &str = "[error]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Word,
    Markdown,
    Html,
    Image,
    Text,
    Mixed,
    Unknown,
    /// Text submitted directly rather than from a file.
    Raw,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Word => "Word",
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
            Self::Image => "image",
            Self::Text => "text",
            Self::Mixed => "mixed",
            Self::Unknown => "unknown",
            Self::Raw => "raw text",
        }
    }

    /// Detect the kind from a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" | "doc" => Self::Word,
            "md" | "markdown" => Self::Markdown,
            "html" | "htm" => Self::Html,
            "jpg" | "jpeg" | "png" => Self::Image,
            "txt" => Self::Text,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedDocument {
    pub kind: DocumentKind,
    pub text: String,
}

impl ParsedDocument {
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            kind: DocumentKind::Raw,
            text: text.into(),
        }
    }

    fn error(kind: DocumentKind, message: impl std::fmt::Display) -> Self {
        Self {
            kind,
            text: format!("{ERROR_TAG} {message}"),
        }
    }

    pub fn is_error(&self) -> bool {
        self.text.starts_with(ERROR_TAG)
    }
}

pub struct DocumentParser;

impl DocumentParser {
    pub fn parse(path: &Path) -> ParsedDocument {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let kind = DocumentKind::from_extension(&ext);

        if !path.exists() {
            return ParsedDocument::error(kind, format!("file not found: {}", path.display()));
        }

        let result = match (kind, ext.as_str()) {
            (DocumentKind::Markdown, _) => std::fs::read_to_string(path).map_err(|e| e.to_string()),
            (DocumentKind::Text, _) => read_text_lossy(path),
            (DocumentKind::Html, _) => std::fs::read_to_string(path)
                .map(|html| strip_html(&html))
                .map_err(|e| e.to_string()),
            (DocumentKind::Word, "docx") => read_docx(path),
            (DocumentKind::Word, _) => Err("legacy .doc files are not supported, save as .docx".into()),
            (DocumentKind::Image, _) => describe_image(path),
            (DocumentKind::Pdf, _) => Err("PDF text extraction is not supported".into()),
            _ => Err(format!("unsupported file format: .{ext}")),
        };

        match result {
            Ok(text) => {
                tracing::debug!(path = %path.display(), kind = %kind, chars = text.chars().count(), "Parsed document");
                ParsedDocument { kind, text }
            }
            Err(message) => {
                tracing::warn!(path = %path.display(), kind = %kind, error = %message, "Document parse failed");
                ParsedDocument::error(kind, message)
            }
        }
    }

    /// Parse several files into one combined document with a header per file.
    /// Files that fail to parse are left out; `None` when none succeed.
    pub fn parse_many(paths: &[&Path]) -> Option<ParsedDocument> {
        let sections: Vec<String> = paths
            .iter()
            .map(|path| (path, Self::parse(path)))
            .filter(|(_, doc)| !doc.is_error())
            .map(|(path, doc)| {
                let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                format!("=== {name} ({}) ===\n{}", doc.kind, doc.text)
            })
            .collect();

        if sections.is_empty() {
            return None;
        }
        Some(ParsedDocument {
            kind: DocumentKind::Mixed,
            text: sections.join("\n\n"),
        })
    }
}

fn read_text_lossy(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("valid regex")
});
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Strip scripts, styles and tags; keep one trimmed text line per block.
pub fn strip_html(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE_RE.replace_all(html, "");
    let without_comments = COMMENT_RE.replace_all(&without_scripts, "");
    let text = TAG_RE.replace_all(&without_comments, "\n");
    decode_entities(&text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Word
// ---------------------------------------------------------------------------

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:p[ >].*?</w:p>").expect("valid regex"));
static RUN_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").expect("valid regex"));

fn read_docx(path: &Path) -> Result<String, String> {
    let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| format!("not a Word document: {e}"))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("not a Word document: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;
    Ok(docx_paragraphs(&xml))
}

/// Non-blank paragraph texts of a `word/document.xml`, blank-line separated.
pub fn docx_paragraphs(xml: &str) -> String {
    PARAGRAPH_RE
        .find_iter(xml)
        .map(|paragraph| {
            RUN_TEXT_RE
                .captures_iter(paragraph.as_str())
                .filter_map(|c| c.get(1))
                .map(|m| decode_entities(m.as_str()))
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

fn describe_image(path: &Path) -> Result<String, String> {
    let decoder = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| e.to_string())?
        .into_decoder()
        .map_err(|e| format!("unreadable image: {e}"))?;
    let (width, height) = decoder.dimensions();
    let color = decoder.color_type();
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();

    Ok(format!(
        "[image file]\nFile name: {name}\nSize: {width}x{height}\nColor mode: {color:?}\n\n\
         Describe the scene or characters shown in this image.\nImage path: {}\n",
        path.display()
    ))
}
