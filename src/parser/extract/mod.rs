pub mod illustrated;
pub mod plain;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::config::{Markup, ScrapeConfig};
use crate::record::{option_id, QuestionOption};

static QUESTION_TEXT: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".question-text").unwrap());
static ARTICLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("article").unwrap());
static OPTION_SPANS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.list-group-item label span").unwrap());

/// Year and session read off the page itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub year: String,
    pub exam_session: String,
}

impl PageMeta {
    pub fn unknown() -> Self {
        Self {
            year: "Unknown".into(),
            exam_session: "Unknown".into(),
        }
    }
}

/// One implementation per site markup variant.
pub trait Extractor: Send + Sync {
    fn extract_text(&self, doc: &Html) -> String;
    fn extract_options(&self, doc: &Html) -> Vec<QuestionOption>;
    fn extract_images(&self, doc: &Html) -> Vec<String>;
    /// `None` when the variant carries no page-level metadata.
    fn extract_metadata(&self, doc: &Html) -> Option<PageMeta>;
}

pub fn for_config(cfg: &ScrapeConfig) -> Box<dyn Extractor> {
    match cfg.markup {
        Markup::Plain => Box::new(plain::PlainExtractor),
        Markup::Illustrated => Box::new(illustrated::IllustratedExtractor::new(
            &cfg.image_base,
            &cfg.image_ext,
        )),
    }
}

/// Raw fields pulled from one page, before answer resolution.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub question_text: String,
    pub options: Vec<QuestionOption>,
    pub image_urls: Vec<String>,
    pub meta: Option<PageMeta>,
}

impl Extracted {
    pub fn from_document(extractor: &dyn Extractor, doc: &Html, serial: usize) -> Self {
        let question_text = extractor.extract_text(doc);
        if question_text.is_empty() {
            warn!("No question text found for question {}", serial);
        }
        Self {
            question_text,
            options: extractor.extract_options(doc),
            image_urls: extractor.extract_images(doc),
            meta: extractor.extract_metadata(doc),
        }
    }
}

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn joined_text(doc: &Html, selector: &Selector) -> String {
    doc.select(selector).map(elem_text).collect::<String>().trim().to_string()
}

/// Dedicated text container first, then the whole article.
pub(crate) fn question_text(doc: &Html) -> String {
    let text = joined_text(doc, &QUESTION_TEXT);
    if !text.is_empty() {
        return text;
    }
    joined_text(doc, &ARTICLE)
}

/// Option spans in document order; `image_for` may attach a figure to an option.
pub(crate) fn options_with<F>(doc: &Html, image_for: F) -> Vec<QuestionOption>
where
    F: Fn(ElementRef) -> Option<String>,
{
    doc.select(&OPTION_SPANS)
        .enumerate()
        .map(|(i, span)| {
            let image_url = image_for(span);
            QuestionOption {
                id: option_id(i),
                text: elem_text(span).trim().to_string(),
                has_image: image_url.is_some(),
                image_url: image_url.unwrap_or_default(),
                has_equation: false,
                equation_data: String::new(),
            }
        })
        .collect()
}

pub(crate) fn question_container(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&QUESTION_TEXT).next()
}
