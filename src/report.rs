use crate::audit::{AuditReport, ExecutionMode};
use crate::error::AuditError;
use crate::metrics::{Entry, Metrics};
use crate::normalize::{AuditRecord, Value};
use crate::utils;
use console::style;
use csv::Writer;
use std::path::PathBuf;

/// The file a result name is written to: `<name>.csv`.
pub fn csv_path(result_name: &str) -> PathBuf {
    PathBuf::from(format!("{}.csv", result_name))
}

/// Writes `records` to `<result_name>.csv` and returns the path written.
///
/// The header is the key order of the first record. Every record is
/// projected onto that header: keys the first record lacks are dropped,
/// header keys a record lacks are written as empty cells.
///
/// # Errors
///
/// - [`AuditError::EmptyResult`] if `records` is empty. No file is created.
/// - [`AuditError::Csv`] if the file cannot be created or written.
pub fn write_csv_report(records: &[AuditRecord], result_name: &str) -> Result<PathBuf, AuditError> {
    let Some(first) = records.first() else {
        return Err(AuditError::EmptyResult);
    };
    let headers: Vec<&str> = first.keys().collect();

    let report_path = csv_path(result_name);
    // If the report path has a parent directory, create it if it doesn't exist yet
    if let Some(parent) = report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AuditError::io(parent, e))?;
    }

    let mut writer = Writer::from_path(&report_path)?;
    writer.write_record(&headers)?;
    for record in records {
        writer.write_record(
            headers
                .iter()
                .map(|h| record.get(h).map(Value::to_string).unwrap_or_default()),
        )?;
    }
    writer.flush().map_err(|e| AuditError::io(&report_path, e))?;

    Ok(report_path)
}

/// Mean of a numeric column over all records that have a value for it.
fn mean(records: &[AuditRecord], column: &str) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.get(column).and_then(Value::as_f64))
        .collect();
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

impl AuditReport {
    /// The summary shown once the batch is done.
    pub fn summary(&self) -> Metrics {
        let mode = match self.mode {
            ExecutionMode::Sequential => "Sequential".to_string(),
            ExecutionMode::Concurrent { workers } => format!("Concurrent ({} workers)", workers),
        };
        let score = |column| mean(&self.records, column).map_or("-".to_string(), utils::score);

        Metrics(vec![
            Entry {
                label: "Strategy",
                value: self.strategy.to_string(),
            },
            Entry {
                label: "Execution Mode",
                value: mode,
            },
            Entry {
                label: "URLs Audited",
                value: self.attempted().to_string(),
            },
            Entry {
                label: "Succeeded",
                value: self.records.len().to_string(),
            },
            Entry {
                label: "Failed",
                value: self.failures.len().to_string(),
            },
            Entry {
                label: "Success Rate",
                value: if self.attempted() > 0 {
                    utils::percent(self.records.len() as f64 / self.attempted() as f64 * 100.0)
                } else {
                    "-".to_string()
                },
            },
            Entry {
                label: "Mean Performance",
                value: score("performance"),
            },
            Entry {
                label: "Mean Accessibility",
                value: score("accessibility"),
            },
            Entry {
                label: "Mean Best Practices",
                value: score("best_practices"),
            },
            Entry {
                label: "Mean SEO",
                value: score("seo"),
            },
            Entry {
                label: "Total Time",
                value: utils::secs(self.total_time),
            },
        ])
    }

    pub fn show_text_report(&self) {
        if !self.failures.is_empty() {
            println!("\n{}", style("Failed audits:").bold().underlined());
            for failure in &self.failures {
                println!(
                    "{} {} {}",
                    style("[WARN]").yellow(),
                    failure.url,
                    style(&failure.error).dim()
                );
            }
        }
        println!("\n{}", self.summary().build_table());
    }
}
