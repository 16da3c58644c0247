use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::ScrapeConfig;
use crate::fetch::{fetch_with_retry, PageSource};
use crate::parser;
use crate::record::QuestionRecord;

/// Batch stats returned after completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub saved: usize,
    pub failed: usize,
}

/// Fetch, extract and write one batch. Only the final write can fail the run.
pub async fn run<S: PageSource>(cfg: &ScrapeConfig, source: S) -> Result<BatchStats> {
    let records = collect(cfg, source).await?;
    write_batch(&cfg.output_path, &records)?;

    let stats = BatchStats {
        total: cfg.total_questions,
        saved: records.len(),
        failed: cfg.total_questions - records.len(),
    };
    info!(
        "Scraped {} pages ({} saved, {} failed)",
        stats.total, stats.saved, stats.failed
    );
    Ok(stats)
}

/// Records for pages `1..=total` in index order, failed pages dropped.
pub async fn collect<S: PageSource>(cfg: &ScrapeConfig, source: S) -> Result<Vec<QuestionRecord>> {
    let pb = progress_bar(cfg.total_questions)?;

    let records = if cfg.concurrency <= 1 {
        collect_sequential(cfg, &source, &pb).await
    } else {
        collect_pooled(cfg, Arc::new(source), &pb).await
    };

    pb.finish_and_clear();
    Ok(records)
}

async fn collect_sequential<S: PageSource>(
    cfg: &ScrapeConfig,
    source: &S,
    pb: &ProgressBar,
) -> Vec<QuestionRecord> {
    let mut records = Vec::with_capacity(cfg.total_questions);
    for n in 1..=cfg.total_questions {
        if let Some(rec) = scrape_one(cfg, source, n).await {
            records.push(rec);
        }
        pb.inc(1);
    }
    records
}

/// Worker pool: at most `concurrency` fetches in flight, results re-ordered by index.
async fn collect_pooled<S: PageSource>(
    cfg: &ScrapeConfig,
    source: Arc<S>,
    pb: &ProgressBar,
) -> Vec<QuestionRecord> {
    let semaphore = Arc::new(Semaphore::new(cfg.concurrency));
    let shared_cfg = Arc::new(cfg.clone());
    let (tx, mut rx) =
        tokio::sync::mpsc::channel::<(usize, Option<QuestionRecord>)>(cfg.concurrency * 2);

    for n in 1..=cfg.total_questions {
        let source = Arc::clone(&source);
        let sem = Arc::clone(&semaphore);
        let cfg = Arc::clone(&shared_cfg);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let rec = scrape_one(&cfg, source.as_ref(), n).await;
            let _ = tx.send((n, rec)).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut results = Vec::with_capacity(cfg.total_questions);
    while let Some(item) = rx.recv().await {
        results.push(item);
        pb.inc(1);
    }

    results.sort_by_key(|(n, _)| *n);
    results.into_iter().filter_map(|(_, rec)| rec).collect()
}

/// One page: fetch, then parse. A fetch failure is logged and yields `None`.
async fn scrape_one<S: PageSource>(cfg: &ScrapeConfig, source: &S, n: usize) -> Option<QuestionRecord> {
    let url = cfg.page_url(n);
    match fetch_with_retry(source, &url, cfg.retries, cfg.backoff_ms).await {
        Ok(html) => Some(parser::process_page(&html, n, cfg)),
        Err(e) => {
            warn!("Failed to fetch question {}: {}", n, e);
            None
        }
    }
}

/// Write the whole batch as one pretty-printed JSON array.
pub fn write_batch(path: &Path, records: &[QuestionRecord]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn progress_bar(total: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Markup;
    use crate::fetch::tests::StaticSource;
    use crate::parser::tests::{config, fixture};

    fn three_pages_missing_second(cfg: &ScrapeConfig) -> StaticSource {
        let page = fixture("plain_question");
        StaticSource::new([(cfg.page_url(1), page.clone()), (cfg.page_url(3), page)])
    }

    #[tokio::test]
    async fn failed_page_is_skipped_in_order() {
        let cfg = config(Markup::Plain);
        let records = collect(&cfg, three_pages_missing_second(&cfg)).await.unwrap();
        let serials: Vec<&str> = records.iter().map(|r| r.metadata.serial_no.as_str()).collect();
        assert_eq!(serials, ["1", "3"]);
    }

    #[tokio::test]
    async fn pool_keeps_index_order() {
        let mut cfg = config(Markup::Plain);
        cfg.concurrency = 4;
        let records = collect(&cfg, three_pages_missing_second(&cfg)).await.unwrap();
        let serials: Vec<&str> = records.iter().map(|r| r.metadata.serial_no.as_str()).collect();
        assert_eq!(serials, ["1", "3"]);
    }

    #[tokio::test]
    async fn question_ids_unique_within_batch() {
        let mut cfg = config(Markup::Plain);
        cfg.total_questions = 5;
        let page = fixture("plain_question");
        let src = StaticSource::new((1..=5).map(|n| (cfg.page_url(n), page.clone())));
        let records = collect(&cfg, src).await.unwrap();
        let mut ids: Vec<&str> = records.iter().map(|r| r.metadata.question_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn run_writes_pretty_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(Markup::Illustrated);
        cfg.output_path = dir.path().join("GK").join("GK.json");
        let src = three_pages_missing_second(&cfg);

        let stats = run(&cfg, src).await.unwrap();
        assert_eq!(stats, BatchStats { total: 3, saved: 2, failed: 1 });

        let written = std::fs::read_to_string(&cfg.output_path).unwrap();
        assert!(written.starts_with("[\n  {"));
        let back: Vec<QuestionRecord> = serde_json::from_str(&written).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[1].metadata.serial_no, "3");
    }

    #[tokio::test]
    async fn all_failures_write_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(Markup::Plain);
        cfg.output_path = dir.path().join("empty.json");
        let stats = run(&cfg, StaticSource::new(Vec::<(String, String)>::new())).await.unwrap();
        assert_eq!(stats.saved, 0);
        assert_eq!(std::fs::read_to_string(&cfg.output_path).unwrap(), "[]");
    }
}
