//! Backend-agnostic document model.
//!
//! Every render builds one `Document` (an ordered list of typed blocks)
//! from a job or topsheet, and each output backend is a thin adapter that
//! walks the blocks. Layout conditionals live in the builder, so the three
//! backends cannot drift apart structurally.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Document type. Challan documents are the pricing-free variant: the
/// adapters suppress unit price/total columns and the amount-in-words
/// block for them unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Quotation,
    Challan,
    Bill,
}

impl DocumentKind {
    /// Canonical uppercase title, shared by all backends.
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "QUOTATION",
            DocumentKind::Challan => "DELIVERY CHALLAN",
            DocumentKind::Bill => "TAX INVOICE",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "QT",
            DocumentKind::Challan => "CH",
            DocumentKind::Bill => "INV",
        }
    }

    pub fn shows_pricing(&self) -> bool {
        !matches!(self, DocumentKind::Challan)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "quotation",
            DocumentKind::Challan => "challan",
            DocumentKind::Bill => "bill",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "challan" => DocumentKind::Challan,
            "bill" | "invoice" => DocumentKind::Bill,
            _ => DocumentKind::Quotation,
        }
    }
}

/// Derived document number: `PREFIX-YYYY-MMDD`, with a 1-based `-{index}`
/// suffix for bulk renders.
pub fn document_number(kind: DocumentKind, date: NaiveDate, index: Option<usize>) -> String {
    let base = format!(
        "{}-{}-{:02}{:02}",
        kind.prefix(),
        date.year(),
        date.month(),
        date.day()
    );
    match index {
        Some(i) => format!("{}-{}", base, i),
        None => base,
    }
}

#[derive(Debug, Clone)]
pub struct HeaderBlock {
    pub company_name: String,
    pub tagline: String,
    pub contact_line: String,
}

#[derive(Debug, Clone)]
pub struct MetaBlock {
    pub document_number: String,
    pub date_text: String,
    pub ref_number: String,
}

#[derive(Debug, Clone)]
pub struct CustomerBlock {
    pub name: String,
    pub address_lines: Vec<String>,
    pub location: Option<String>,
}

/// One row of the job line-item table. Pricing cells are `None` on
/// challan documents.
#[derive(Debug, Clone)]
pub struct ItemRow {
    pub serial: i32,
    pub description: String,
    /// Extra details text followed by measurement fragments.
    pub sub_lines: Vec<String>,
    pub quantity_text: String,
    pub unit_price: Option<Decimal>,
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct ItemTableBlock {
    pub rows: Vec<ItemRow>,
    pub show_pricing: bool,
    /// Grand total row value; absent on pricing-free documents.
    pub grand_total: Option<Decimal>,
}

/// One row of the topsheet job listing.
#[derive(Debug, Clone)]
pub struct JobLine {
    pub serial: i32,
    pub detail: String,
    pub location: String,
    pub bill_number: String,
    pub challan_date_text: String,
    /// Recomputed from the job's own items, never the stored total.
    pub total: Decimal,
    pub secondary_bill_number: String,
}

#[derive(Debug, Clone)]
pub struct JobTableBlock {
    pub rows: Vec<JobLine>,
    pub grand_total: Decimal,
}

#[derive(Debug, Clone)]
pub struct SignatureBlock {
    pub left_label: String,
    pub right_label: String,
}

#[derive(Debug, Clone)]
pub struct FooterBlock {
    pub document_number: String,
    pub contact_line: String,
}

/// Ordered building blocks of one rendered page. The builder emits them in
/// the structural contract order; adapters must not reorder.
#[derive(Debug, Clone)]
pub enum Block {
    Header(HeaderBlock),
    Meta(MetaBlock),
    Title(String),
    Customer(CustomerBlock),
    Subject(String),
    ItemTable(ItemTableBlock),
    JobTable(JobTableBlock),
    AmountInWords(String),
    Notes(String),
    Terms(String),
    Signature(SignatureBlock),
    Footer(FooterBlock),
}

/// One logical document (one page/sheet per document in bulk output).
#[derive(Debug, Clone)]
pub struct Document {
    pub number: String,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn suggested_filename(&self, extension: &str) -> String {
        format!("{}.{}", self.number.replace('/', "-"), extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_number_shape() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(
            document_number(DocumentKind::Quotation, date, None),
            "QT-2026-0806"
        );
        assert_eq!(
            document_number(DocumentKind::Bill, date, Some(3)),
            "INV-2026-0806-3"
        );
    }

    #[test]
    fn test_challan_suppresses_pricing() {
        assert!(!DocumentKind::Challan.shows_pricing());
        assert!(DocumentKind::Quotation.shows_pricing());
        assert!(DocumentKind::Bill.shows_pricing());
    }

    #[test]
    fn test_canonical_titles() {
        assert_eq!(DocumentKind::Quotation.title(), "QUOTATION");
        assert_eq!(DocumentKind::Challan.title(), "DELIVERY CHALLAN");
        assert_eq!(DocumentKind::Bill.title(), "TAX INVOICE");
    }
}
