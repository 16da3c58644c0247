use serde::{Deserialize, Serialize};

/// One scraped multiple-choice question, in the on-disk JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub exam_type: String,
    pub metadata: Metadata,
    pub content: Content,
    pub options: Vec<QuestionOption>,
    pub solution: Solution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub question_id: String,
    pub serial_no: String,
    pub subject: String,
    pub topic: String,
    pub subtopic: String,
    pub year: String,
    pub exam_session: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub question_text: String,
    pub question_format: String,
    pub has_image: bool,
    pub image_urls: Vec<String>,
    pub has_equation: bool,
    pub equation_data: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    pub has_image: bool,
    pub image_url: String,
    pub has_equation: bool,
    pub equation_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub correct_option: String,
    pub explanation: String,
    pub explanation_format: String,
    pub has_image: bool,
    pub image_urls: Vec<String>,
    pub has_equation: bool,
    pub equation_data: String,
}

const OPTION_IDS: [&str; 4] = ["A", "B", "C", "D"];

/// Positional option id: A..D, then the 0-based index for anything past the fourth.
pub fn option_id(index: usize) -> String {
    OPTION_IDS
        .get(index)
        .map(|s| s.to_string())
        .unwrap_or_else(|| index.to_string())
}

pub fn question_id(year: &str, session: &str, exam_type: &str, subject: &str, serial: usize) -> String {
    format!("{}_{}_{}_{}_{}", year, session, exam_type, subject, serial)
}
