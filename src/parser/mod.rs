pub mod answer;
pub mod assemble;
pub mod extract;

use scraper::Html;

use crate::config::ScrapeConfig;
use crate::record::QuestionRecord;
use extract::Extracted;

/// Three-stage pipeline: html → extracted fields + resolved answer → record.
pub fn process_page(html: &str, serial: usize, cfg: &ScrapeConfig) -> QuestionRecord {
    let doc = Html::parse_document(html);
    let extractor = extract::for_config(cfg);

    let fields = Extracted::from_document(extractor.as_ref(), &doc, serial);
    let answer = answer::resolve(&doc, &fields.options, cfg.tie_break, serial);
    assemble::assemble(fields, answer, cfg, serial)
}

// ── Tests ──
