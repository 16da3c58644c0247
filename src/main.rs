mod batch;
mod config;
mod fetch;
mod parser;
mod record;
mod server;

use std::time::Instant;

use clap::{Parser, Subcommand};

use config::{ScrapeArgs, ScrapeConfig, ServeConfig};

#[derive(Parser)]
#[command(name = "pyq_scraper", about = "Exam question scraper and question API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape question pages 1..=N into one JSON file
    Scrape(ScrapeArgs),
    /// Serve the question corpus over HTTP (PORT, DATA_DIR, APP_ENV)
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape(args) => {
            let cfg = ScrapeConfig::from_args(args)?;
            println!(
                "Scraping {} questions from {} ...",
                cfg.total_questions,
                cfg.page_url(1)
            );
            let source = fetch::HttpSource::new()?;
            let stats = batch::run(&cfg, source).await?;
            println!(
                "Saved {} questions to {} ({} failed)",
                stats.saved,
                cfg.output_path.display(),
                stats.failed
            );
        }
        Commands::Serve => {
            server::serve(ServeConfig::from_env()).await?;
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn cli_parses_scrape() {
        let cli = Cli::parse_from([
            "pyq_scraper", "scrape", "--base-url", "https://x.test/p", "-n", "3", "--subject", "GK",
        ]);
        assert!(matches!(cli.command, Commands::Scrape(ref a) if a.total_questions == 3));
    }
}
