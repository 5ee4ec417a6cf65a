use std::fmt;

use serde::{Deserialize, Serialize};

const ABS_BASE: &str = "https://arxiv.org/abs";
const PDF_BASE: &str = "https://arxiv.org/pdf";

pub fn abs_url(id: &str) -> String {
    format!("{ABS_BASE}/{id}")
}

pub fn pdf_url(id: &str) -> String {
    format!("{PDF_BASE}/{id}")
}

/// One harvested paper. Serialized with the output keys
/// `id, pdf, abs, authors, title, categories, comment, summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: String,
    #[serde(rename = "pdf", default)]
    pub pdf_url: String,
    #[serde(rename = "abs", default)]
    pub abs_url: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub summary: String,
}

impl PaperRecord {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            pdf_url: pdf_url(&id),
            abs_url: abs_url(&id),
            id,
            authors: Vec::new(),
            title: String::new(),
            categories: Vec::new(),
            comment: None,
            summary: String::new(),
        }
    }

    /// Fills `pdf`/`abs` from the id when they are blank. Existing links are kept.
    pub fn ensure_links(&mut self) {
        if self.pdf_url.trim().is_empty() {
            self.pdf_url = pdf_url(&self.id);
        }
        if self.abs_url.trim().is_empty() {
            self.abs_url = abs_url(&self.id);
        }
    }

    pub fn field(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Authors => FieldValue::List(&self.authors),
            Field::Title => FieldValue::Text(&self.title),
            Field::Categories => FieldValue::List(&self.categories),
            Field::Comment => match &self.comment {
                Some(comment) => FieldValue::Text(comment),
                None => FieldValue::Absent,
            },
            Field::Summary => FieldValue::Text(&self.summary),
        }
    }
}

/// Fields enrichment may fill. `id`, `pdf` and `abs` are never among them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Authors,
    Title,
    Categories,
    Comment,
    Summary,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Authors => "authors",
            Field::Title => "title",
            Field::Categories => "categories",
            Field::Comment => "comment",
            Field::Summary => "summary",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field value tagged by shape, so "missing" is decided the same way for every field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Absent,
    Text(&'a str),
    List(&'a [String]),
}

impl FieldValue<'_> {
    pub fn is_missing(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }
}
