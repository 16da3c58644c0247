use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{options_with, question_container, question_text, Extractor, PageMeta};
use crate::record::QuestionOption;

static IMAGE_MARKER: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".question-image").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static PAPER_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d{4})\s*CDS-(I{1,2})\]").unwrap());

/// Chapter-wise pages. Figures are class-tagged placeholders (`img-<id>`) whose
/// URL is synthesized from a fixed base and extension; nothing checks it exists.
pub struct IllustratedExtractor {
    image_base: String,
    image_ext: String,
}

impl IllustratedExtractor {
    pub fn new(image_base: &str, image_ext: &str) -> Self {
        Self {
            image_base: image_base.to_string(),
            image_ext: image_ext.to_string(),
        }
    }

    fn image_url(&self, marker: ElementRef) -> Option<String> {
        let token = marker
            .value()
            .classes()
            .find_map(|c| c.strip_prefix("img-"))
            .filter(|t| !t.is_empty())?;
        Some(format!("{}{}{}", self.image_base, token, self.image_ext))
    }

    fn option_image(&self, span: ElementRef) -> Option<String> {
        let item = enclosing_list_item(span)?;
        item.select(&IMAGE_MARKER).find_map(|m| self.image_url(m))
    }
}

impl Extractor for IllustratedExtractor {
    fn extract_text(&self, doc: &Html) -> String {
        question_text(doc)
    }

    fn extract_options(&self, doc: &Html) -> Vec<QuestionOption> {
        options_with(doc, |span| self.option_image(span))
    }

    /// Question-level figures only; markers inside an option belong to that option.
    fn extract_images(&self, doc: &Html) -> Vec<String> {
        doc.select(&IMAGE_MARKER)
            .filter(|m| enclosing_list_item(*m).is_none())
            .filter_map(|m| self.image_url(m))
            .collect()
    }

    fn extract_metadata(&self, doc: &Html) -> Option<PageMeta> {
        let haystack = question_container(doc)
            .and_then(|q| q.parent())
            .and_then(ElementRef::wrap)
            .or_else(|| doc.select(&BODY).next())
            .map(visible_text)
            .unwrap_or_default();

        let meta = PAPER_TAG_RE
            .captures(&haystack)
            .map(|caps| PageMeta {
                year: caps[1].to_string(),
                exam_session: caps[2].to_string(),
            })
            .unwrap_or_else(PageMeta::unknown);
        Some(meta)
    }
}

/// Rendered text only: skips `script` and `style` bodies such as JSON-LD blocks.
fn visible_text(el: ElementRef) -> String {
    el.descendants()
        .filter(|node| {
            node.parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()))
                .map_or(true, |name| name != "script" && name != "style")
        })
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect()
}

fn enclosing_list_item(el: ElementRef) -> Option<ElementRef> {
    el.ancestors().filter_map(ElementRef::wrap).find(|a| {
        a.value().name() == "li" && a.value().classes().any(|c| c == "list-group-item")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> IllustratedExtractor {
        IllustratedExtractor::new("https://img.test/", ".png")
    }

    #[test]
    fn paper_tag_from_sibling_text() {
        let doc = Html::parse_document(
            "<div><span>[2021 CDS-I]</span><div class='question-text'>Q</div></div>",
        );
        let meta = extractor().extract_metadata(&doc).unwrap();
        assert_eq!(meta.year, "2021");
        assert_eq!(meta.exam_session, "I");
    }

    #[test]
    fn missing_paper_tag_is_unknown() {
        let doc = Html::parse_document("<div><div class='question-text'>Q</div></div>");
        assert_eq!(extractor().extract_metadata(&doc), Some(PageMeta::unknown()));
    }

    #[test]
    fn malformed_paper_tag_is_unknown() {
        let doc = Html::parse_document(
            "<div>[19 CDS-III]<div class='question-text'>Q</div></div>",
        );
        assert_eq!(extractor().extract_metadata(&doc), Some(PageMeta::unknown()));
    }

    #[test]
    fn marker_without_token_is_skipped() {
        let doc = Html::parse_document(
            "<div class='question-image'></div><div class='question-image img-77 wide'></div>",
        );
        assert_eq!(extractor().extract_images(&doc), ["https://img.test/77.png"]);
    }

    #[test]
    fn option_markers_stay_with_their_option() {
        let doc = Html::parse_document(
            "<ul>\
               <li class='list-group-item'><label><span>plain</span></label></li>\
               <li class='list-group-item'><label><span>fig</span></label><i class='question-image img-5'></i></li>\
             </ul>",
        );
        let ex = extractor();
        let opts = ex.extract_options(&doc);
        assert!(!opts[0].has_image);
        assert_eq!(opts[1].image_url, "https://img.test/5.png");
        assert!(ex.extract_images(&doc).is_empty());
    }

    #[test]
    fn paper_tag_ignores_title_and_structured_data() {
        let doc = Html::parse_document(
            "<html><head><title>[2017 CDS-I]</title></head><body>\
               <script type='application/ld+json'>{\"text\": \"[2018 CDS-I]\"}</script>\
               <p>[2020 CDS-II] Which lens?</p></body></html>",
        );
        let meta = extractor().extract_metadata(&doc).unwrap();
        assert_eq!(meta.year, "2020");
        assert_eq!(meta.exam_session, "II");
    }

    #[test]
    fn tag_only_in_structured_data_is_unknown() {
        let doc = Html::parse_document(
            "<body><script type='application/ld+json'>{\"text\": \"[2018 CDS-I]\"}</script><p>Q</p></body>",
        );
        assert_eq!(extractor().extract_metadata(&doc), Some(PageMeta::unknown()));
    }
}
