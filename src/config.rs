use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};

pub const DEFAULT_EXAM_TYPE: &str = "UPSC_CDS";
pub const DEFAULT_IMAGE_BASE: &str = "https://www.examsnet.com/images/questions/";
pub const DEFAULT_IMAGE_EXT: &str = ".png";

/// Page layout family. Selects the `Extractor` used for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Markup {
    /// Full-test pages: text and options only.
    Plain,
    /// Chapter-wise pages with figure placeholders and a `[YYYY CDS-I]` tag.
    Illustrated,
}

/// How the question index is joined onto the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UrlStyle {
    /// `{base}{n}`
    Append,
    /// `{base}/{n}`
    Path,
}

/// Which option wins when several option texts occur in the accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TieBreak {
    First,
    #[default]
    Last,
}

#[derive(Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// Base URL the question number is joined onto
    #[arg(long)]
    pub base_url: String,
    /// Number of questions (pages 1..=N)
    #[arg(short = 'n', long = "total")]
    pub total_questions: usize,
    #[arg(long)]
    pub subject: String,
    #[arg(long, default_value = "Unknown")]
    pub year: String,
    #[arg(long = "session", default_value = "I")]
    pub exam_session: String,
    #[arg(long, default_value = DEFAULT_EXAM_TYPE)]
    pub exam_type: String,
    #[arg(long, default_value = "")]
    pub topic: String,
    #[arg(long, default_value = "")]
    pub subtopic: String,
    #[arg(long, value_enum, default_value = "plain")]
    pub markup: Markup,
    #[arg(long, value_enum, default_value = "append")]
    pub url_style: UrlStyle,
    #[arg(long, value_enum, default_value = "last")]
    pub tie_break: TieBreak,
    /// Output file (default derived from markup, subject, year and session)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Pages fetched in parallel
    #[arg(long, default_value = "1")]
    pub concurrency: usize,
    /// Retries per page on 429/5xx
    #[arg(long, default_value = "0")]
    pub retries: u32,
    #[arg(long, default_value = "2000")]
    pub backoff_ms: u64,
    #[arg(long, default_value = DEFAULT_IMAGE_BASE)]
    pub image_base: String,
    #[arg(long, default_value = DEFAULT_IMAGE_EXT)]
    pub image_ext: String,
}

/// Everything one scrape run needs. Built from CLI args, passed into `batch::run`.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub total_questions: usize,
    pub subject: String,
    pub year: String,
    pub exam_session: String,
    pub exam_type: String,
    pub topic: String,
    pub subtopic: String,
    pub output_path: PathBuf,
    pub markup: Markup,
    pub url_style: UrlStyle,
    pub tie_break: TieBreak,
    pub concurrency: usize,
    pub retries: u32,
    pub backoff_ms: u64,
    pub image_base: String,
    pub image_ext: String,
}

impl ScrapeConfig {
    pub fn from_args(args: ScrapeArgs) -> Result<Self> {
        if args.base_url.trim().is_empty() {
            bail!("--base-url must not be empty");
        }
        if args.total_questions == 0 {
            bail!("--total must be at least 1");
        }
        if args.concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }
        if args.subject.trim().is_empty() {
            bail!("--subject must not be empty");
        }

        let output_path = args.output.unwrap_or_else(|| {
            default_output_path(args.markup, &args.subject, &args.year, &args.exam_session)
        });

        Ok(Self {
            base_url: args.base_url,
            total_questions: args.total_questions,
            subject: args.subject,
            year: args.year,
            exam_session: args.exam_session,
            exam_type: args.exam_type,
            topic: args.topic,
            subtopic: args.subtopic,
            output_path,
            markup: args.markup,
            url_style: args.url_style,
            tie_break: args.tie_break,
            concurrency: args.concurrency,
            retries: args.retries,
            backoff_ms: args.backoff_ms,
            image_base: args.image_base,
            image_ext: args.image_ext,
        })
    }

    pub fn page_url(&self, n: usize) -> String {
        match self.url_style {
            UrlStyle::Append => format!("{}{}", self.base_url, n),
            UrlStyle::Path => format!("{}/{}", self.base_url.trim_end_matches('/'), n),
        }
    }
}

pub fn default_output_path(markup: Markup, subject: &str, year: &str, session: &str) -> PathBuf {
    match markup {
        Markup::Plain => PathBuf::from(format!("{}-{}-{}.json", year, session, subject)),
        Markup::Illustrated => PathBuf::from(subject).join(format!("{}.json", subject)),
    }
}

/// HTTP service settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub addr: String,
    pub data_dir: PathBuf,
    /// Include error detail in 500 envelopes.
    pub expose_errors: bool,
}

impl ServeConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let port = std::env::var("PORT").unwrap_or_else(|_| "5000".into());
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| ".".into());
        let expose_errors = std::env::var("APP_ENV")
            .map(|v| v == "development")
            .unwrap_or(false);
        Self {
            addr: format!("0.0.0.0:{}", port),
            data_dir: PathBuf::from(data_dir),
            expose_errors,
        }
    }
}
