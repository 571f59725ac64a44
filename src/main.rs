mod error;
mod fetch;
mod output;
mod parser;
mod pipeline;
mod settings;

use std::time::Instant;

use clap::Parser;

use fetch::HttpFetcher;
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "zorro_doc_extractor",
    about = "Mirror the Zorro manual as hierarchical Markdown"
)]
struct Cli {
    /// Manual base URL (default: ZDOC_BASE_URL or the public manual)
    #[arg(long)]
    base_url: Option<String>,
    /// Table-of-contents page, relative to the base URL
    #[arg(long)]
    toc_path: Option<String>,
    /// Output directory
    #[arg(short, long)]
    output_dir: Option<String>,
    /// Pause between page downloads, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
    /// Max pages to process (default: all)
    #[arg(short = 'n', long)]
    limit: Option<usize>,
}

impl Cli {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.base_url {
            settings.base_url = v;
        }
        if let Some(v) = self.toc_path {
            settings.toc_path = v;
        }
        if let Some(v) = self.output_dir {
            settings.output_dir = v;
        }
        if let Some(v) = self.delay_ms {
            settings.delay_ms = v;
        }
        if self.limit.is_some() {
            settings.limit = self.limit;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let mut settings = Settings::load()?;
    Cli::parse().apply(&mut settings);
    tracing::info!(settings = ?settings, "Starting extraction");

    let fetcher = HttpFetcher::new()?;
    let stats = pipeline::run(&settings, &fetcher).await?;

    println!(
        "Processed {} pages ({} ok, {} errors) in {:.1}s",
        stats.total,
        stats.ok,
        stats.errors,
        t0.elapsed().as_secs_f64()
    );
    Ok(())
}
