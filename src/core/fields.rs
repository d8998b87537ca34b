use crate::core::metadata::MetadataDocument;
use scraper::Html;
use serde::{Deserialize, Serialize};

/// How an element's text becomes the stored field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProcess {
    /// Treat the text as an HTML fragment, keep the rendered text, trim it.
    HtmlToText,
    /// Store the text exactly as found.
    Verbatim,
    /// Keep everything before the first `T` of an ISO-8601 datetime.
    DateOnly,
}

impl PostProcess {
    pub fn apply(self, text: &str) -> String {
        match self {
            PostProcess::HtmlToText => html_to_text(text),
            PostProcess::Verbatim => text.to_string(),
            PostProcess::DateOnly => text.split('T').next().unwrap_or_default().to_string(),
        }
    }
}

pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Value(String),
    MissingElement,
    MissingText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Used in the report, e.g. "No revision date element for ...".
    pub name: String,
    pub path: String,
    pub post_process: PostProcess,
    /// Appended to the layer name: `<layer>.<suffix>`.
    pub suffix: String,
}

impl FieldRule {
    pub fn new(name: &str, path: &str, post_process: PostProcess, suffix: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            post_process,
            suffix: suffix.to_string(),
        }
    }

    pub fn abstract_rule() -> Self {
        Self::new(
            "abstract",
            "dataIdInfo/idAbs",
            PostProcess::HtmlToText,
            "abstract.txt",
        )
    }

    pub fn title_rule() -> Self {
        Self::new(
            "title",
            "dataIdInfo/idCitation/resTitle",
            PostProcess::Verbatim,
            "title.txt",
        )
    }

    pub fn revision_date_rule() -> Self {
        Self::new(
            "revision date",
            "dataIdInfo/idCitation/date/reviseDate",
            PostProcess::DateOnly,
            "revision_date.txt",
        )
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::abstract_rule(),
            Self::title_rule(),
            Self::revision_date_rule(),
        ]
    }

    pub fn extract(&self, doc: &MetadataDocument) -> Extraction {
        let Some(element) = doc.find(&self.path) else {
            return Extraction::MissingElement;
        };

        let text = element.text();
        if text.is_empty() {
            return Extraction::MissingText;
        }

        let value = self.post_process.apply(&text);
        if value.is_empty() {
            return Extraction::MissingText;
        }

        Extraction::Value(value)
    }
}
