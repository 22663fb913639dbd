use serde::{Deserialize, Serialize};

/// One extracted page of a source document. Produced by the external PDF
/// extractor; read-only input to the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number in the source document.
    #[serde(alias = "page_num")]
    pub number: u32,
    pub text: String,
    #[serde(default)]
    pub char_count: usize,
}

impl Page {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        let char_count = text.chars().count();
        Self { number, text, char_count }
    }
}

/// Source metadata copied onto every chunk of a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocMetadata {
    pub meeting: String,
    pub agency: String,
    pub title: String,
    /// `YYYY-MM-DD`; `None` routes the document to the fallback month.
    pub date: Option<String>,
    pub url: String,
}

/// A fully extracted document: metadata plus its ordered page texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub metadata: DocMetadata,
    pub pages: Vec<Page>,
}

impl Document {
    /// Total characters across all pages, separator excluded.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}
