use once_cell::sync::Lazy;
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator, TableFormat};
use prettytable::{Cell, Row, Table};

/// Box-drawn two-column table used for the end-of-run summary:
///
/// ```text
/// ┌────────────────┬────────┐
/// │ URLs Audited   │ 12     │
/// │ Succeeded      │ 11     │
/// └────────────────┴────────┘
/// ```
static TABLE_FORMAT: Lazy<TableFormat> = Lazy::new(|| {
    FormatBuilder::new()
        .column_separator('│')
        .borders('│')
        .separators(&[LinePosition::Top], LineSeparator::new('─', '┬', '┌', '┐'))
        .separators(
            &[LinePosition::Bottom],
            LineSeparator::new('─', '┴', '└', '┘'),
        )
        .padding(1, 1)
        .build()
});

#[derive(Debug)]
pub struct Entry {
    pub label: &'static str,
    pub value: String,
}

/// An ordered list of labelled values.
#[derive(Debug)]
pub struct Metrics(pub Vec<Entry>);

impl Metrics {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.value.as_str())
    }

    pub fn build_table(&self) -> String {
        let mut table = Table::new();
        table.set_format(*TABLE_FORMAT);
        for entry in &self.0 {
            table.add_row(Row::new(vec![
                Cell::new(entry.label),
                Cell::new(&entry.value),
            ]));
        }
        table.to_string()
    }
}
