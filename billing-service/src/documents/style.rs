//! Renderer style configuration.
//!
//! The effective style is an explicit value threaded into every render
//! call. The three-level merge (hardcoded defaults <- stored settings <-
//! per-request overrides) happens once at the handler boundary; renderers
//! never read ambient state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date display format for the document meta row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// MM/DD/YYYY
    Us,
    /// DD/MM/YYYY
    Bd,
}

/// Effective style for one render call. All three backends receive the
/// same value and honor every field.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStyle {
    pub font_family: String,
    pub font_size: f32,
    pub font_color: String,
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
    pub company_name: String,
    pub company_tagline: String,
    pub company_email: String,
    pub company_phone: String,
    /// Faint full-page background watermark.
    pub pad_enabled: bool,
    pub pad_opacity: f32,
    pub pad_image: Option<String>,
    pub signature_enabled: bool,
    pub signature_image: Option<String>,
    pub signature_width_mm: f32,
    pub signature_height_mm: f32,
    pub date_format: DateFormat,
    pub date_show_prefix: bool,
    pub date_prefix: String,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        DocumentStyle {
            font_family: "Helvetica".to_string(),
            font_size: 10.0,
            font_color: "#111111".to_string(),
            margin_top_mm: 14.0,
            margin_bottom_mm: 14.0,
            company_name: "Creative Sign & Print".to_string(),
            company_tagline: "All kinds of signage, branding & printing solutions".to_string(),
            company_email: "info@creativesign.example".to_string(),
            company_phone: "+880 1700-000000".to_string(),
            pad_enabled: false,
            pad_opacity: 0.08,
            pad_image: None,
            signature_enabled: false,
            signature_image: None,
            signature_width_mm: 40.0,
            signature_height_mm: 18.0,
            date_format: DateFormat::Bd,
            date_show_prefix: true,
            date_prefix: "Date: ".to_string(),
        }
    }
}

/// Partial style: the shape persisted in the settings store and accepted
/// as per-request overrides. Unset fields inherit from the layer below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleOverrides {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_color: Option<String>,
    pub margin_top_mm: Option<f32>,
    pub margin_bottom_mm: Option<f32>,
    pub company_name: Option<String>,
    pub company_tagline: Option<String>,
    pub company_email: Option<String>,
    pub company_phone: Option<String>,
    pub pad_enabled: Option<bool>,
    pub pad_opacity: Option<f32>,
    pub pad_image: Option<String>,
    pub signature_enabled: Option<bool>,
    pub signature_image: Option<String>,
    pub signature_width_mm: Option<f32>,
    pub signature_height_mm: Option<f32>,
    pub date_format: Option<DateFormat>,
    pub date_show_prefix: Option<bool>,
    pub date_prefix: Option<String>,
}

impl DocumentStyle {
    /// Merge defaults <- stored <- per-request, in that precedence order.
    pub fn merged(stored: Option<&StyleOverrides>, request: Option<&StyleOverrides>) -> Self {
        let mut style = DocumentStyle::default();
        if let Some(overrides) = stored {
            style.apply(overrides);
        }
        if let Some(overrides) = request {
            style.apply(overrides);
        }
        style
    }

    fn apply(&mut self, o: &StyleOverrides) {
        if let Some(v) = &o.font_family {
            self.font_family = v.clone();
        }
        if let Some(v) = o.font_size {
            self.font_size = v;
        }
        if let Some(v) = &o.font_color {
            self.font_color = v.clone();
        }
        if let Some(v) = o.margin_top_mm {
            self.margin_top_mm = v;
        }
        if let Some(v) = o.margin_bottom_mm {
            self.margin_bottom_mm = v;
        }
        if let Some(v) = &o.company_name {
            self.company_name = v.clone();
        }
        if let Some(v) = &o.company_tagline {
            self.company_tagline = v.clone();
        }
        if let Some(v) = &o.company_email {
            self.company_email = v.clone();
        }
        if let Some(v) = &o.company_phone {
            self.company_phone = v.clone();
        }
        if let Some(v) = o.pad_enabled {
            self.pad_enabled = v;
        }
        if let Some(v) = o.pad_opacity {
            self.pad_opacity = v;
        }
        if let Some(v) = &o.pad_image {
            self.pad_image = Some(v.clone());
        }
        if let Some(v) = o.signature_enabled {
            self.signature_enabled = v;
        }
        if let Some(v) = &o.signature_image {
            self.signature_image = Some(v.clone());
        }
        if let Some(v) = o.signature_width_mm {
            self.signature_width_mm = v;
        }
        if let Some(v) = o.signature_height_mm {
            self.signature_height_mm = v;
        }
        if let Some(v) = o.date_format {
            self.date_format = v;
        }
        if let Some(v) = o.date_show_prefix {
            self.date_show_prefix = v;
        }
        if let Some(v) = &o.date_prefix {
            self.date_prefix = v.clone();
        }
    }

    /// Format a date for the meta row, honoring the configured format and
    /// optional literal prefix.
    pub fn format_date(&self, date: NaiveDate) -> String {
        let formatted = self.format_date_plain(date);
        if self.date_show_prefix {
            format!("{}{}", self.date_prefix, formatted)
        } else {
            formatted
        }
    }

    /// Date in the configured format without the prefix, for table cells.
    pub fn format_date_plain(&self, date: NaiveDate) -> String {
        match self.date_format {
            DateFormat::Us => date.format("%m/%d/%Y").to_string(),
            DateFormat::Bd => date.format("%d/%m/%Y").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_precedence() {
        let stored = StyleOverrides {
            company_name: Some("Stored Co".to_string()),
            font_size: Some(12.0),
            ..Default::default()
        };
        let request = StyleOverrides {
            company_name: Some("Request Co".to_string()),
            ..Default::default()
        };
        let style = DocumentStyle::merged(Some(&stored), Some(&request));
        // request wins over stored, stored wins over default
        assert_eq!(style.company_name, "Request Co");
        assert_eq!(style.font_size, 12.0);
        // untouched fields keep defaults
        assert_eq!(style.margin_top_mm, 14.0);
    }

    #[test]
    fn test_date_formats() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let mut style = DocumentStyle::default();

        style.date_format = DateFormat::Bd;
        assert_eq!(style.format_date(date), "Date: 06/08/2026");

        style.date_format = DateFormat::Us;
        style.date_show_prefix = false;
        assert_eq!(style.format_date(date), "08/06/2026");
    }
}
