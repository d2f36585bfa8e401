use crate::pagespeed::{Audit, Category, FieldMetric, FieldMetrics, PageSpeedResponse};
use std::fmt;

/// The columns of every record, in the order they are written.
pub const FIELD_NAMES: [&str; 18] = [
    "final_url",
    "device",
    "first_contentful_paint",
    "time_to_interactive",
    "largest_contentful_paint",
    "speed_index",
    "total_blocking_time",
    "dom_size",
    "performance",
    "accessibility",
    "best_practices",
    "seo",
    "field_first_contentful_paint",
    "field_first_input_delay",
    "field_largest_contentful_paint",
    "field_cumulative_layout_shift",
    "field_interaction_to_next_paint",
    "field_time_to_first_byte",
];

/// A single scalar cell of an [`AuditRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Float(f64),
    Integer(i64),
    Absent,
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map_or(Value::Absent, Value::Text)
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Value::Absent, Value::Float)
    }
}

impl From<Option<i64>> for Value {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Value::Absent, Value::Integer)
    }
}

/// Absent values render as an empty string. Floats always keep a decimal
/// point (`1234.0`), so float and integer columns stay distinguishable.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Absent => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: Value,
}

/// One flattened audit: an ordered list of named scalar fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuditRecord(pub Vec<Field>);

impl AuditRecord {
    pub fn new() -> Self {
        AuditRecord(Vec::with_capacity(FIELD_NAMES.len()))
    }

    pub fn push(&mut self, name: &'static str, value: impl Into<Value>) {
        self.0.push(Field {
            name,
            value: value.into(),
        });
    }

    /// Returns the value stored under `name`, or `None` if the record has no such key.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// The field names in record order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|f| f.name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Strips letters, underscores and commas from a display value like
/// `"1,234 ms"` and returns what is left, trimmed. `None` if nothing is left.
fn strip_units(display: &str) -> Option<String> {
    let stripped: String = display
        .chars()
        .filter(|c| !(c.is_ascii_alphabetic() || *c == '_' || *c == ','))
        .collect();
    let stripped = stripped.trim();
    (!stripped.is_empty()).then(|| stripped.to_string())
}

/// Parses a display value as a float.
///
/// # Examples
///
/// ```rust
/// use pagespeed_audit::normalize::parse_display_value;
///
/// assert_eq!(parse_display_value("1,234 ms"), Some(1234.0));
/// assert_eq!(parse_display_value("1.2\u{a0}s"), Some(1.2));
/// assert_eq!(parse_display_value(""), None);
/// ```
pub fn parse_display_value(display: &str) -> Option<f64> {
    strip_units(display)?.parse().ok()
}

/// Parses a display value as an integer, e.g. `"1,024 elements"` to `1024`.
pub fn parse_display_integer(display: &str) -> Option<i64> {
    strip_units(display)?.parse().ok()
}

fn display_value(audit: &Option<Audit>) -> Option<&str> {
    audit.as_ref()?.display_value.as_deref()
}

fn score(category: &Option<Category>) -> Option<f64> {
    category.as_ref()?.score
}

fn field_category(metric: &Option<FieldMetric>) -> Option<String> {
    metric.as_ref()?.category.clone()
}

/// Flattens a decoded response into an [`AuditRecord`] holding every column
/// of [`FIELD_NAMES`]. Missing or unparsable parts become [`Value::Absent`].
pub fn normalize(response: &PageSpeedResponse) -> AuditRecord {
    let lighthouse = &response.lighthouse_result;
    let audits = &lighthouse.audits;
    let categories = &lighthouse.categories;
    let seconds = |audit: &Option<Audit>| display_value(audit).and_then(parse_display_value);

    let mut record = AuditRecord::new();
    record.push("final_url", lighthouse.final_url().map(String::from));
    record.push("device", lighthouse.device().map(String::from));
    record.push("first_contentful_paint", seconds(&audits.first_contentful_paint));
    record.push("time_to_interactive", seconds(&audits.interactive));
    record.push("largest_contentful_paint", seconds(&audits.largest_contentful_paint));
    record.push("speed_index", seconds(&audits.speed_index));
    record.push("total_blocking_time", seconds(&audits.total_blocking_time));
    record.push(
        "dom_size",
        display_value(&audits.dom_size).and_then(parse_display_integer),
    );
    record.push("performance", score(&categories.performance));
    record.push("accessibility", score(&categories.accessibility));
    record.push("best_practices", score(&categories.best_practices));
    record.push("seo", score(&categories.seo));

    // Field data only exists for pages with enough real-user traffic.
    let metrics = response
        .loading_experience
        .as_ref()
        .and_then(|l| l.metrics.as_ref());
    let field = |pick: fn(&FieldMetrics) -> &Option<FieldMetric>| {
        metrics.and_then(|m| field_category(pick(m)))
    };
    record.push(
        "field_first_contentful_paint",
        field(|m| &m.first_contentful_paint_ms),
    );
    record.push("field_first_input_delay", field(|m| &m.first_input_delay_ms));
    record.push(
        "field_largest_contentful_paint",
        field(|m| &m.largest_contentful_paint_ms),
    );
    record.push(
        "field_cumulative_layout_shift",
        field(|m| &m.cumulative_layout_shift_score),
    );
    record.push(
        "field_interaction_to_next_paint",
        field(|m| &m.interaction_to_next_paint),
    );
    record.push(
        "field_time_to_first_byte",
        field(|m| &m.experimental_time_to_first_byte),
    );

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_units_and_separators() {
        assert_eq!(parse_display_value("1,234 ms"), Some(1234.0));
        assert_eq!(parse_display_value("3.4 s"), Some(3.4));
        assert_eq!(parse_display_value("ms"), None);
        assert_eq!(parse_display_value("n/a"), None);
    }

    #[test]
    fn parses_integers() {
        assert_eq!(parse_display_integer("88"), Some(88));
        assert_eq!(parse_display_integer("1,024 elements"), Some(1024));
        assert_eq!(parse_display_integer("1.5"), None);
    }

    #[test]
    fn absent_renders_empty() {
        assert_eq!(Value::Absent.to_string(), "");
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Float(1234.0).to_string(), "1234.0");
        assert_eq!(Value::Float(0.52).to_string(), "0.52");
        assert_eq!(Value::Text("mobile".into()).to_string(), "mobile");
    }
}
