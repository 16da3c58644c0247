use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::error::ApiError;

const PRELIMS_DIR: &str = "UPSC PRELIMS PYQs";
const ESSAYS_DIR: &str = "UPSC_Essays";
const MAINS_GS_DIR: &str = "UPSC_MAINS_CSE_GS_PAPERS";
const CHAPTER_WISE_DIR: &str = "CSE_General_Studies_Chapter_Wise";
const CDS_GS_DIR: &str = "CDS General Studies";
const CDS_SCIENCE_DIR: &str = "CDS Science Chapter Wise";
const CDS_PYQS_DIR: &str = "CDS PYQs";
const CDS_MATHS_DIR: &str = "CDS_MATHS_PYQs";

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").unwrap());
static MAINS_GS_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UPSC_MAIN_CSE_GS_(\d{4})_PAPER_[1-4]\.json$").unwrap());
static NON_ASCII_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\x00-\x7F]").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prelims,
    Mains,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Prelims => "Prelims",
            Stage::Mains => "Mains",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdsExam {
    I,
    II,
}

impl CdsExam {
    /// `"I"` is CDS I; anything else is CDS II.
    pub fn from_param(s: &str) -> Self {
        if s == "I" || s == "CDS I" {
            CdsExam::I
        } else {
            CdsExam::II
        }
    }

    pub fn numeral(self) -> &'static str {
        match self {
            CdsExam::I => "I",
            CdsExam::II => "II",
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            CdsExam::I => "CDS I",
            CdsExam::II => "CDS II",
        }
    }
}

/// Chapter-wise topic slugs: (slug, file stem, display name).
const CHAPTER_TOPICS: &[(&str, &str, &str)] = &[
    ("social-issues", "SocialIssues", "Social Issues"),
    ("science-and-technology", "ScienceAndTechnology", "Science and Technology"),
    ("security-issues", "SecurityIssues", "Security Issues"),
    ("international-relations", "InternationalRelations", "International Relations"),
    ("indian-polity", "IndianPolityAndGovernance", "Indian Polity and Governance"),
    ("history-and-culture", "HistoryAndCulture", "History and Culture"),
    ("health-and-education", "HealthAndEducation", "Health and Education"),
    ("geography-and-environment", "GeographyAndEnvironment", "Geography and Environment"),
    ("ethics-and-governance", "EthicsAndGovernance", "Ethics and Governance"),
    ("economy-and-development", "EconomyAndDevelopment", "Economy and Development"),
];

const CDS_GS_SUBJECTS: &[(&str, &str)] = &[
    ("economy", "2024-General Studies-economy.json"),
    ("general-knowledge", "2024-General Studies-general-knowledge.json"),
    ("geography", "2024-General Studies-geography.json"),
    ("history", "2024-General Studies-history.json"),
    ("polity", "2024-General Studies-polity.json"),
];

const CDS_SCIENCE_SUBJECTS: &[(&str, &str)] = &[
    ("biology", "Biology.json"),
    ("chemistry", "Chemistry.json"),
    ("physics", "Physics.json"),
];

/// Read-only question store rooted at one data directory. Handlers ask it for
/// papers by (year, exam, subject) and never build paths themselves.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
}

impl Corpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ── UPSC ──

    pub fn prelims_dir(&self) -> PathBuf {
        self.root.join(PRELIMS_DIR)
    }

    pub fn prelims_paper(&self, year: &str, paper: u8) -> Result<PathBuf, ApiError> {
        let year = year_param(year)?;
        Ok(self
            .prelims_dir()
            .join(format!("{}_General-Studies_{}.json", year, paper)))
    }

    pub fn essays_dir(&self) -> PathBuf {
        self.root.join(ESSAYS_DIR)
    }

    pub fn essay_file(&self, year: &str) -> Result<PathBuf, ApiError> {
        let year = year_param(year)?;
        Ok(self.essays_dir().join(format!("{}_essays.json", year)))
    }

    pub fn mains_gs_dir(&self) -> PathBuf {
        self.root.join(MAINS_GS_DIR)
    }

    pub fn mains_gs_paper(&self, year: &str, paper: u8) -> Result<PathBuf, ApiError> {
        let year = year_param(year)?;
        Ok(self
            .mains_gs_dir()
            .join(format!("UPSC_MAIN_CSE_GS_{}_PAPER_{}.json", year, paper)))
    }

    /// Chapter-wise file plus its display name. Mains has no security-issues set.
    pub fn chapter_wise(&self, stage: Stage, topic: &str) -> Result<(PathBuf, &'static str), ApiError> {
        let (_, stem, name) = CHAPTER_TOPICS
            .iter()
            .find(|(slug, _, _)| *slug == topic)
            .filter(|(slug, _, _)| !(stage == Stage::Mains && *slug == "security-issues"))
            .ok_or_else(|| ApiError::not_found("Topic not found"))?;
        let file = format!("{}_General_Studies_{}.json", stage.label(), stem);
        Ok((self.root.join(CHAPTER_WISE_DIR).join(file), *name))
    }

    // ── CDS ──

    pub fn cds_general_studies(&self, subject: &str) -> Result<PathBuf, ApiError> {
        lookup(CDS_GS_SUBJECTS, subject).map(|f| self.root.join(CDS_GS_DIR).join(f))
    }

    pub fn cds_science(&self, subject: &str) -> Result<PathBuf, ApiError> {
        lookup(CDS_SCIENCE_SUBJECTS, subject).map(|f| self.root.join(CDS_SCIENCE_DIR).join(f))
    }

    pub fn cds_pyqs_dir(&self) -> PathBuf {
        self.root.join(CDS_PYQS_DIR)
    }

    pub fn cds_paper(&self, year: &str, exam: CdsExam, subject: &str) -> Result<PathBuf, ApiError> {
        let year = year_param(year)?;
        let subject = segment_param(subject)?;
        Ok(self
            .cds_pyqs_dir()
            .join(year)
            .join(exam.dir_name())
            .join(cds_paper_file_name(year, exam, subject)))
    }

    pub fn cds_maths_dir(&self) -> PathBuf {
        self.root.join(CDS_MATHS_DIR)
    }
}

pub fn cds_paper_file_name(year: &str, exam: CdsExam, subject: &str) -> String {
    format!("UPSC_CDS_{}_{}_{}_QP.json", year, exam.numeral(), subject)
}

/// Subject part of `UPSC_CDS_{year}_{I|II}_{subject}_QP.json`.
pub fn cds_subject_from_file(file: &str) -> Option<String> {
    let rest = file.strip_suffix(".json")?;
    let subject = rest.splitn(5, '_').nth(4)?;
    Some(subject.trim_end_matches("_QP").to_string())
}

pub fn mains_gs_year_from_file(file: &str) -> Option<String> {
    MAINS_GS_FILE_RE.captures(file).map(|c| c[1].to_string())
}

pub fn is_year(s: &str) -> bool {
    YEAR_RE.is_match(s)
}

fn year_param(year: &str) -> Result<&str, ApiError> {
    if is_year(year) {
        Ok(year)
    } else {
        Err(ApiError::BadRequest(format!("Invalid year: {}", year)))
    }
}

fn segment_param(s: &str) -> Result<&str, ApiError> {
    if s.is_empty() || s.contains(['/', '\\']) || s.contains("..") {
        Err(ApiError::BadRequest(format!("Invalid path segment: {}", s)))
    } else {
        Ok(s)
    }
}

fn lookup(table: &[(&str, &'static str)], key: &str) -> Result<&'static str, ApiError> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, file)| *file)
        .ok_or_else(|| ApiError::not_found("Subject not found"))
}

// ── Reading ──

/// Parse a JSON file. `ascii_only` drops non-ASCII characters first.
/// A missing file is a 404; anything else is an internal error.
pub async fn read_json(path: &Path, ascii_only: bool) -> Result<Value, ApiError> {
    debug!("Reading {}", path.display());
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::not_found_with(
                "Resource not found",
                format!("File path: {}", path.display()),
            ));
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Error reading file {}", path.display()))
                .into())
        }
    };
    let text = if ascii_only {
        NON_ASCII_RE.replace_all(&raw, "").into_owned()
    } else {
        raw
    };
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Error parsing file {}", path.display()))?;
    Ok(value)
}

/// Sorted entry names of a directory.
pub async fn list_dir(path: &Path) -> anyhow::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(path)
        .await
        .with_context(|| format!("Error reading directory {}", path.display()))?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Sorted names of sub-directories whose name passes `keep`.
pub async fn list_subdirs<F: Fn(&str) -> bool>(path: &Path, keep: F) -> anyhow::Result<Vec<String>> {
    let mut dirs = Vec::new();
    for name in list_dir(path).await? {
        if keep(&name) && tokio::fs::metadata(path.join(&name)).await?.is_dir() {
            dirs.push(name);
        }
    }
    Ok(dirs)
}

/// The question array inside a corpus file: the root when it is an array,
/// otherwise the first array-valued field of a root object.
pub fn extract_questions(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Root array or nothing; used by routes that never look inside objects.
pub fn root_array(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_questions_from_array_root() {
        let v = json!([{"q": 1}, {"q": 2}]);
        assert_eq!(extract_questions(v.clone()), v.as_array().unwrap().clone());
    }

    #[test]
    fn extract_questions_takes_first_array_field() {
        let v = json!({"title": "x", "questions": [1, 2], "more": [3]});
        assert_eq!(extract_questions(v), vec![json!(1), json!(2)]);
    }

    #[test]
    fn extract_questions_of_scalar_is_empty() {
        assert!(extract_questions(json!("nope")).is_empty());
        assert!(extract_questions(json!({"a": 1})).is_empty());
    }

    #[test]
    fn cds_subject_parsing() {
        assert_eq!(cds_subject_from_file("UPSC_CDS_2023_I_English_QP.json").as_deref(), Some("English"));
        assert_eq!(
            cds_subject_from_file("UPSC_CDS_2023_II_General_Studies_QP.json").as_deref(),
            Some("General_Studies")
        );
        assert_eq!(cds_subject_from_file("notes.txt"), None);
    }

    #[test]
    fn cds_paper_path() {
        let c = Corpus::new("/data");
        let p = c.cds_paper("2022", CdsExam::from_param("II"), "Maths").unwrap();
        assert_eq!(
            p,
            PathBuf::from("/data/CDS PYQs/2022/CDS II/UPSC_CDS_2022_II_Maths_QP.json")
        );
    }

    #[test]
    fn rejects_traversal() {
        let c = Corpus::new("/data");
        assert!(matches!(c.prelims_paper("../etc", 1), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            c.cds_paper("2022", CdsExam::I, "../../secret"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn mains_has_no_security_issues() {
        let c = Corpus::new("/data");
        assert!(c.chapter_wise(Stage::Prelims, "security-issues").is_ok());
        assert!(matches!(
            c.chapter_wise(Stage::Mains, "security-issues"),
            Err(ApiError::NotFound { .. })
        ));
        let (path, name) = c.chapter_wise(Stage::Mains, "indian-polity").unwrap();
        assert!(path.ends_with("Mains_General_Studies_IndianPolityAndGovernance.json"));
        assert_eq!(name, "Indian Polity and Governance");
    }

    #[test]
    fn mains_gs_years() {
        assert_eq!(mains_gs_year_from_file("UPSC_MAIN_CSE_GS_2021_PAPER_3.json").as_deref(), Some("2021"));
        assert_eq!(mains_gs_year_from_file("UPSC_MAIN_CSE_GS_2021_PAPER_9.json"), None);
    }

    #[tokio::test]
    async fn ascii_filter_applies_before_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.json");
        std::fs::write(&path, "[\"caf\u{e9}\"]").unwrap();
        assert_eq!(read_json(&path, true).await.unwrap(), json!(["caf"]));
        assert_eq!(read_json(&path, false).await.unwrap(), json!(["caf\u{e9}"]));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json(&dir.path().join("nope.json"), false).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }
}
