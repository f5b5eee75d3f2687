use indicatif::{ProgressBar, ProgressStyle};
use pathscout_scanner::crawler::ProgressCallback;
use pathscout_scanner::{CrawlState, Crawler, ScanOptions};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub files: Vec<PathBuf>,
    pub urls: Vec<String>,
    /// Descend into subdirectories of directory inputs
    pub recurse: bool,
    /// Fetch scripts referenced by `src` in fetched HTML pages
    pub retrieve_external_scripts: bool,
    pub timeout_secs: u64,
    /// Maximum number of requests in flight
    pub concurrency: usize,
    pub scan: ScanOptions,
    pub user_agent: Option<String>,
    pub cookie: Option<String>,
    pub insecure: bool,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            urls: Vec::new(),
            recurse: false,
            retrieve_external_scripts: false,
            timeout_secs: 10,
            concurrency: 10,
            scan: ScanOptions::default(),
            user_agent: None,
            cookie: None,
            insecure: false,
            show_progress_bars: false,
        }
    }
}

/// Run a crawl until it completes or `shutdown` resolves.
///
/// An interrupted crawl is not an error: the state gathered so far comes back
/// with its interrupted flag set.
pub async fn execute_crawl<F>(options: CrawlOptions, shutdown: F) -> Result<CrawlState, String>
where
    F: Future<Output = ()>,
{
    let CrawlOptions {
        files,
        urls,
        recurse,
        retrieve_external_scripts,
        timeout_secs,
        concurrency,
        scan,
        user_agent,
        cookie,
        insecure,
        show_progress_bars,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .map_err(|e| format!("Invalid progress template: {}", e))?,
        );
        pb.set_message("Starting scan...");
        Some(pb)
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let mut crawler = Crawler::new()
        .with_timeout(Duration::from_secs(timeout_secs))
        .with_concurrency(concurrency)
        .with_external_scripts(retrieve_external_scripts)
        .with_recurse(recurse)
        .with_scan_options(scan)
        .with_insecure(insecure);

    if let Some(user_agent) = user_agent {
        crawler = crawler.with_user_agent(user_agent);
    }
    if let Some(cookie) = cookie {
        crawler = crawler.with_cookie(cookie);
    }
    if let Some(pb) = &progress_bar {
        let pb = pb.clone();
        let count = processed_count.clone();
        let callback: ProgressCallback = Arc::new(move |label: String| {
            let processed = count.fetch_add(1, Ordering::Relaxed) + 1;
            pb.set_message(format!("Scanning... {} sources processed ({})", processed, label));
            pb.tick();
        });
        crawler = crawler.with_progress_callback(callback);
    }

    info!(
        "Scanning {} input paths and {} URLs",
        files.len(),
        urls.len()
    );

    let mut state = CrawlState::new();
    let outcome = {
        let run = crawler.run(&mut state, &files, &urls);
        tokio::select! {
            result = run => Some(result),
            _ = shutdown => None,
        }
    };

    match outcome {
        Some(Ok(())) => {
            if let Some(pb) = &progress_bar {
                let total = processed_count.load(Ordering::Relaxed);
                pb.finish_with_message(format!("Scan complete! {} sources processed", total));
            }
        }
        Some(Err(e)) => {
            if let Some(pb) = &progress_bar {
                pb.abandon_with_message("Scan failed");
            }
            return Err(format!("Scan failed: {}", e));
        }
        None => {
            if let Some(pb) = &progress_bar {
                pb.abandon_with_message("Scan interrupted");
            }
            warn!(
                "Interrupted, keeping results for {} labels",
                state.entries().len()
            );
            state.mark_interrupted();
        }
    }

    Ok(state)
}
