use pagespeed_audit::audit::{ExecutionMode, audit_url, run_audits};
use pagespeed_audit::error::AuditError;
use pagespeed_audit::network::AuditFetcher;
use pagespeed_audit::normalize::{AuditRecord, Value};
use pagespeed_audit::options::Strategy;
use pagespeed_audit::pagespeed::PageSpeedResponse;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers every URL with a response derived from the URL itself. URLs
/// containing `broken` fail, URLs containing `garbled` fail to decode.
#[derive(Default)]
struct FakeFetcher {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl AuditFetcher for FakeFetcher {
    async fn fetch(
        &self,
        url: &str,
        _api_key: &str,
        strategy: Strategy,
    ) -> Result<PageSpeedResponse, AuditError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if url.contains("broken") {
            return Err(AuditError::Status(500));
        }
        if url.contains("garbled") {
            return Ok(serde_json::from_str("{\"kind\": \"oops\"}")?);
        }

        let score = (url.len() % 10) as f64 / 10.0;
        Ok(serde_json::from_value(json!({
            "lighthouseResult": {
                "finalUrl": url,
                "configSettings": { "emulatedFormFactor": strategy.as_str() },
                "audits": {
                    "speed-index": { "displayValue": format!("{},000 ms", url.len()) }
                },
                "categories": { "performance": { "score": score } }
            }
        }))?)
    }
}

fn urls(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|u| u.to_string()).collect()
}

fn final_urls(records: &[AuditRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get("final_url").map(Value::to_string).unwrap_or_default())
        .collect()
}

fn sorted(mut records: Vec<AuditRecord>) -> Vec<AuditRecord> {
    records.sort_by_key(|r| r.get("final_url").map(Value::to_string));
    records
}

#[tokio::test]
async fn test_audit_url_normalizes_the_fetched_response() {
    let fetcher = FakeFetcher::default();
    let record = audit_url(&fetcher, "https://a.com", "key", Strategy::Desktop)
        .await
        .expect("Audit should succeed");

    assert_eq!(record.get("device"), Some(&Value::Text("desktop".into())));
    assert_eq!(record.get("speed_index"), Some(&Value::Float(13000.0)));
}

#[tokio::test]
async fn test_sequential_preserves_input_order() {
    let input = urls(&["https://c.com", "https://a.com", "https://b.com"]);
    let fetcher = Arc::new(FakeFetcher::default());

    let report = run_audits(&input, "key", Strategy::Mobile, ExecutionMode::Sequential, fetcher.clone()).await;

    let expected: Vec<String> = input.iter().cloned().collect();
    assert_eq!(final_urls(&report.records), expected);
    assert!(report.failures.is_empty());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sequential_and_concurrent_produce_the_same_records() {
    let input = urls(&[
        "https://a.com",
        "https://b.com/page",
        "https://c.com/some/longer/path",
        "https://d.com/x",
        "https://e.com/yy",
        "https://f.com/zzz",
        "https://broken.com",
    ]);

    let sequential = run_audits(
        &input,
        "key",
        Strategy::Mobile,
        ExecutionMode::Sequential,
        Arc::new(FakeFetcher::default()),
    )
    .await;
    let concurrent = run_audits(
        &input,
        "key",
        Strategy::Mobile,
        ExecutionMode::Concurrent { workers: 3 },
        Arc::new(FakeFetcher::default()),
    )
    .await;

    assert_eq!(sequential.records.len(), 6);
    assert_eq!(sorted(sequential.records), sorted(concurrent.records));
    assert_eq!(sequential.failures.len(), 1);
    assert_eq!(concurrent.failures.len(), 1);
}

#[tokio::test]
async fn test_concurrent_respects_worker_count() {
    let input: BTreeSet<String> = (0..12).map(|i| format!("https://site{}.com", i)).collect();
    let fetcher = Arc::new(FakeFetcher::default());

    let report = run_audits(
        &input,
        "key",
        Strategy::Desktop,
        ExecutionMode::Concurrent { workers: 4 },
        fetcher.clone(),
    )
    .await;

    assert_eq!(report.records.len(), 12);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 12);
    let max = fetcher.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 4, "At most 4 audits may run at once, saw {}", max);
    assert!(max > 1, "Audits should overlap in concurrent mode");
}

#[tokio::test]
async fn test_failures_are_collected_with_their_reason() {
    let input = urls(&["https://ok.com", "https://broken.com", "https://garbled.com"]);

    let report = run_audits(
        &input,
        "key",
        Strategy::Mobile,
        ExecutionMode::Concurrent { workers: 2 },
        Arc::new(FakeFetcher::default()),
    )
    .await;

    assert_eq!(final_urls(&report.records), vec!["https://ok.com".to_string()]);
    assert_eq!(report.attempted(), 3);

    let mut failures: Vec<_> = report.failures.iter().collect();
    failures.sort_by(|a, b| a.url.cmp(&b.url));
    assert_eq!(failures[0].url, "https://broken.com");
    assert!(matches!(failures[0].error, AuditError::Status(500)));
    assert_eq!(failures[1].url, "https://garbled.com");
    assert!(matches!(failures[1].error, AuditError::Decode(_)));
}

#[tokio::test]
async fn test_empty_input_produces_empty_report() {
    let report = run_audits(
        &BTreeSet::new(),
        "key",
        Strategy::Mobile,
        ExecutionMode::Concurrent { workers: 5 },
        Arc::new(FakeFetcher::default()),
    )
    .await;

    assert!(report.records.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(report.attempted(), 0);
}
