use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::TieBreak;
use crate::record::QuestionOption;

static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    pub correct_option: String,
    pub explanation: String,
}

/// Resolve the accepted answer from the page's QAPage JSON-LD blocks.
///
/// Each accepted block replaces the explanation and re-runs option matching,
/// so the last such block on the page wins. Broken blocks are logged and skipped.
pub fn resolve(doc: &Html, options: &[QuestionOption], tie_break: TieBreak, serial: usize) -> Answer {
    let mut answer = Answer::default();

    for script in doc.select(&JSON_LD) {
        let raw: String = script.text().collect();
        let data: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Error parsing JSON-LD for question {}: {}", serial, e);
                continue;
            }
        };

        if data.get("@type").and_then(Value::as_str) != Some("QAPage") {
            continue;
        }
        let Some(accepted) = data.pointer("/mainEntity/acceptedAnswer").filter(|v| !v.is_null()) else {
            continue;
        };
        let Some(text) = accepted.get("text").and_then(Value::as_str) else {
            warn!("Accepted answer without text for question {}", serial);
            continue;
        };

        answer.explanation = text.to_string();
        if let Some(id) = match_option(text, options, tie_break) {
            answer.correct_option = id;
        }
    }

    if answer.correct_option.is_empty() {
        debug!("No correct option resolved for question {}", serial);
    }
    answer
}

/// Case-insensitive containment of option text inside the answer text.
pub fn match_option(answer_text: &str, options: &[QuestionOption], tie_break: TieBreak) -> Option<String> {
    let haystack = answer_text.to_lowercase();
    let mut hits = options
        .iter()
        .filter(|o| haystack.contains(&o.text.to_lowercase()))
        .map(|o| o.id.clone());

    match tie_break {
        TieBreak::First => hits.next(),
        TieBreak::Last => hits.last(),
    }
}
