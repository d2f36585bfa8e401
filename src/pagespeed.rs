//! Typed view of a PageSpeed Insights v5 response.
//!
//! Only the parts we export are modelled. Everything is optional except the
//! `lighthouseResult` section itself, so a single missing audit or category
//! never fails the decoding of the whole document.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpeedResponse {
    pub lighthouse_result: LighthouseResult,
    pub loading_experience: Option<LoadingExperience>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseResult {
    pub final_url: Option<String>,
    /// Replaces `finalUrl` in newer Lighthouse versions.
    pub final_displayed_url: Option<String>,
    pub config_settings: Option<ConfigSettings>,
    #[serde(default)]
    pub audits: Audits,
    #[serde(default)]
    pub categories: Categories,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSettings {
    pub emulated_form_factor: Option<String>,
    pub form_factor: Option<String>,
}

/// The lab audits we read a display value from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Audits {
    pub first_contentful_paint: Option<Audit>,
    pub interactive: Option<Audit>,
    pub largest_contentful_paint: Option<Audit>,
    pub speed_index: Option<Audit>,
    pub total_blocking_time: Option<Audit>,
    pub dom_size: Option<Audit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    /// Human readable value with units, e.g. `"1.2 s"` or `"1,234 elements"`.
    pub display_value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Categories {
    pub performance: Option<Category>,
    pub accessibility: Option<Category>,
    pub best_practices: Option<Category>,
    pub seo: Option<Category>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Category {
    pub score: Option<f64>,
}

/// Real-user data from the Chrome UX Report, if the page has enough traffic.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingExperience {
    pub metrics: Option<FieldMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FieldMetrics {
    pub first_contentful_paint_ms: Option<FieldMetric>,
    pub first_input_delay_ms: Option<FieldMetric>,
    pub largest_contentful_paint_ms: Option<FieldMetric>,
    pub cumulative_layout_shift_score: Option<FieldMetric>,
    pub interaction_to_next_paint: Option<FieldMetric>,
    pub experimental_time_to_first_byte: Option<FieldMetric>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldMetric {
    /// `FAST`, `AVERAGE` or `SLOW`.
    pub category: Option<String>,
}

impl LighthouseResult {
    pub fn final_url(&self) -> Option<&str> {
        self.final_url
            .as_deref()
            .or(self.final_displayed_url.as_deref())
    }

    /// The emulated device, `"mobile"` or `"desktop"`.
    pub fn device(&self) -> Option<&str> {
        let settings = self.config_settings.as_ref()?;
        settings
            .emulated_form_factor
            .as_deref()
            .or(settings.form_factor.as_deref())
    }
}
