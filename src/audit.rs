use crate::error::AuditError;
use crate::network::AuditFetcher;
use crate::normalize::{AuditRecord, normalize};
use crate::options::Strategy;
use crate::utils;
use console::style;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// How the batch of audits is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One URL after another, in input order.
    Sequential,
    /// A fixed pool of `workers` audits in flight at a time. Results arrive in
    /// completion order.
    Concurrent { workers: usize },
}

/// A URL that produced no record, and why.
#[derive(Debug)]
pub struct AuditFailure {
    pub url: String,
    pub error: AuditError,
}

/// Everything a batch produced: the records of all successful audits and
/// the reason for every failed one.
#[derive(Debug)]
pub struct AuditReport {
    pub strategy: Strategy,
    pub mode: ExecutionMode,
    pub total_time: Duration,
    pub records: Vec<AuditRecord>,
    pub failures: Vec<AuditFailure>,
}

impl AuditReport {
    fn new(strategy: Strategy, mode: ExecutionMode) -> Self {
        Self {
            strategy,
            mode,
            total_time: Duration::ZERO,
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Number of URLs the batch attempted.
    pub fn attempted(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    fn collect(&mut self, url: String, result: Result<AuditRecord, AuditError>) {
        match result {
            Ok(record) => self.records.push(record),
            Err(error) => self.failures.push(AuditFailure { url, error }),
        }
    }
}

/// Fetches and normalizes a single URL.
pub async fn audit_url<F: AuditFetcher>(
    fetcher: &F,
    url: &str,
    api_key: &str,
    strategy: Strategy,
) -> Result<AuditRecord, AuditError> {
    let response = fetcher.fetch(url, api_key, strategy).await?;
    Ok(normalize(&response))
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(concat!(
                "\x1b[2m[2/3]\x1b[0m",
                " 🔬 [{elapsed_precise}] [{bar:40.cyan/blue}] Auditing URL {pos}/{len} {msg}"
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("■┄"),
    );
    pb
}

/// Audits every URL in `urls` and collects the outcome of each one.
///
/// A failed audit never stops the batch; it ends up in
/// [`AuditReport::failures`] instead of [`AuditReport::records`].
///
/// # Arguments
///
/// * `urls` - The distinct URLs to audit.
/// * `api_key` - The PageSpeed API key sent with every request.
/// * `strategy` - The device class to emulate.
/// * `mode` - Sequential or concurrent dispatch.
/// * `fetcher` - The client performing the requests, shared by all workers.
pub async fn run_audits<F: AuditFetcher>(
    urls: &BTreeSet<String>,
    api_key: &str,
    strategy: Strategy,
    mode: ExecutionMode,
    fetcher: Arc<F>,
) -> AuditReport {
    let start_time = Instant::now();
    let mut report = AuditReport::new(strategy, mode);

    match mode {
        ExecutionMode::Sequential => {
            let loading_pb = progress_bar(urls.len());
            for url in urls {
                loading_pb.set_message(utils::truncate_message(url, 60));
                let result = audit_url(fetcher.as_ref(), url, api_key, strategy).await;
                report.collect(url.clone(), result);
                loading_pb.inc(1);
            }
            loading_pb.finish_with_message("- 🏁 Complete!");
        }
        ExecutionMode::Concurrent { workers } => {
            let semaphore = Arc::new(Semaphore::new(workers.max(1)));
            let api_key: Arc<str> = Arc::from(api_key);
            let wrapper_pb = MultiProgress::new();
            let loading_pb = wrapper_pb.add(progress_bar(urls.len()));

            let mut tasks: FuturesUnordered<_> = urls
                .iter()
                .map(|u| {
                    let semaphore = Arc::clone(&semaphore);
                    let fetcher = Arc::clone(&fetcher);
                    let api_key = Arc::clone(&api_key);
                    let url = u.clone();

                    // Create per-request progress indicators.
                    let loading_pb = loading_pb.clone();
                    let line_pb = wrapper_pb.add(ProgressBar::new_spinner());

                    let handle = tokio::spawn(async move {
                        let _permit = semaphore.acquire().await.expect("Semaphore closed");
                        line_pb.set_message(format!(
                            "Auditing: {}",
                            utils::truncate_message(&url, 80)
                        ));
                        line_pb.enable_steady_tick(Duration::from_millis(100));
                        let result = audit_url(fetcher.as_ref(), &url, &api_key, strategy).await;
                        line_pb.finish_and_clear();
                        loading_pb.inc(1);
                        (url, result)
                    });

                    let url = u.clone();
                    async move { (url, handle.await) }
                })
                .collect();

            while let Some((url, joined)) = tasks.next().await {
                match joined {
                    Ok((url, result)) => report.collect(url, result),
                    Err(e) => eprintln!(
                        "{} The audit of {} was aborted: {}",
                        style("[ERROR]").red(),
                        url,
                        e
                    ),
                }
            }
            loading_pb.finish_with_message("- 🏁 Complete!");
        }
    }

    report.total_time = start_time.elapsed();
    report
}
