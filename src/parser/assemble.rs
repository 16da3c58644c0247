use super::answer::Answer;
use super::extract::Extracted;
use crate::config::ScrapeConfig;
use crate::record::{question_id, Content, Metadata, QuestionRecord, Solution};

/// Merge extracted fields, the resolved answer and run constants into one record.
/// Year and session read off the page take precedence over the configured ones.
pub fn assemble(fields: Extracted, answer: Answer, cfg: &ScrapeConfig, serial: usize) -> QuestionRecord {
    let (year, exam_session) = match fields.meta {
        Some(meta) => (meta.year, meta.exam_session),
        None => (cfg.year.clone(), cfg.exam_session.clone()),
    };

    QuestionRecord {
        exam_type: cfg.exam_type.clone(),
        metadata: Metadata {
            question_id: question_id(&year, &exam_session, &cfg.exam_type, &cfg.subject, serial),
            serial_no: serial.to_string(),
            subject: cfg.subject.clone(),
            topic: cfg.topic.clone(),
            subtopic: cfg.subtopic.clone(),
            year,
            exam_session,
        },
        content: Content {
            question_text: fields.question_text,
            question_format: "text".into(),
            has_image: !fields.image_urls.is_empty(),
            image_urls: fields.image_urls,
            has_equation: false,
            equation_data: String::new(),
            language: "en".into(),
        },
        options: fields.options,
        solution: Solution {
            correct_option: answer.correct_option,
            explanation: answer.explanation,
            explanation_format: "text".into(),
            has_image: false,
            image_urls: Vec::new(),
            has_equation: false,
            equation_data: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Markup;
    use crate::parser::extract::PageMeta;
    use crate::parser::tests::config;

    fn fields(meta: Option<PageMeta>) -> Extracted {
        Extracted {
            question_text: "Q?".into(),
            options: Vec::new(),
            image_urls: Vec::new(),
            meta,
        }
    }

    #[test]
    fn config_year_used_without_page_meta() {
        let rec = assemble(fields(None), Answer::default(), &config(Markup::Plain), 3);
        assert_eq!(rec.metadata.year, "2024");
        assert_eq!(rec.metadata.exam_session, "I");
        assert_eq!(rec.metadata.question_id, "2024_I_UPSC_CDS_GK_3");
        assert!(!rec.content.has_image);
        assert_eq!(rec.solution.explanation_format, "text");
    }

    #[test]
    fn page_meta_overrides_config() {
        let meta = PageMeta {
            year: "2018".into(),
            exam_session: "II".into(),
        };
        let rec = assemble(fields(Some(meta)), Answer::default(), &config(Markup::Illustrated), 1);
        assert_eq!(rec.metadata.question_id, "2018_II_UPSC_CDS_GK_1");
    }

    #[test]
    fn serializes_to_expected_shape() {
        let answer = Answer {
            correct_option: "A".into(),
            explanation: "because".into(),
        };
        let rec = assemble(fields(None), answer, &config(Markup::Plain), 1);
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["metadata"]["serial_no"], "1");
        assert_eq!(v["content"]["question_format"], "text");
        assert_eq!(v["solution"]["correct_option"], "A");
        assert_eq!(v["content"]["has_equation"], false);
    }
}
