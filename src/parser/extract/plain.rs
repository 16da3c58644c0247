use scraper::Html;

use super::{options_with, question_text, Extractor, PageMeta};
use crate::record::QuestionOption;

/// Full-test pages: no figures, year and session come from the run config.
pub struct PlainExtractor;

impl Extractor for PlainExtractor {
    fn extract_text(&self, doc: &Html) -> String {
        question_text(doc)
    }

    fn extract_options(&self, doc: &Html) -> Vec<QuestionOption> {
        options_with(doc, |_| None)
    }

    fn extract_images(&self, _doc: &Html) -> Vec<String> {
        Vec::new()
    }

    fn extract_metadata(&self, _doc: &Html) -> Option<PageMeta> {
        None
    }
}
