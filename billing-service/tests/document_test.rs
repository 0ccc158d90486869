//! Render pipeline integration tests: job/topsheet snapshots through the
//! document builder and all three output backends.

mod common;

use std::path::Path;

use billing_service::documents::builder::{
    build_bulk_documents, build_job_document, build_topsheet_document,
};
use billing_service::documents::html::render_html;
use billing_service::documents::pdf::render_pdf;
use billing_service::documents::xlsx::render_xlsx;
use billing_service::documents::{DocumentKind, DocumentStyle};

use common::{customer, snapshot, topsheet};

#[test]
fn quotation_html_contains_structural_blocks() {
    let style = DocumentStyle::default();
    let doc = build_job_document(&snapshot(), &customer(), DocumentKind::Quotation, &style, None);
    let html = render_html(&[doc], &style);

    assert!(html.contains("Creative Sign &amp; Print"));
    assert!(html.contains("QUOTATION"));
    assert!(html.contains("Meghna Traders Ltd"));
    assert!(html.contains("3D acrylic letter signage"));
    // measurement fragment from the 2'6" x 3' x 2 pcs measurement
    assert!(html.contains("2&#39;6&quot; x 3&#39; (2 pcs) = 15.00 sft"));
    // pricing present: 15 * 120 + 2500 = 4300
    assert!(html.contains("Tk 4,300.00"));
    assert!(html.contains("Four Thousand Three Hundred Taka Only"));
    assert!(html.contains("Received By"));
    assert!(html.contains("Authorized Signatory"));
    assert!(html.contains("Terms &amp; Conditions"));
}

#[test]
fn challan_suppresses_pricing_everywhere() {
    let style = DocumentStyle::default();
    let doc = build_job_document(&snapshot(), &customer(), DocumentKind::Challan, &style, None);
    let html = render_html(&[doc], &style);

    assert!(html.contains("DELIVERY CHALLAN"));
    assert!(!html.contains("Unit Price"));
    assert!(!html.contains("Grand Total"));
    assert!(!html.contains("In Words"));
    assert!(!html.contains("Tk "));
    // quantities still shown
    assert!(html.contains("15 sqft"));
}

#[test]
fn pdf_renders_binary_document() {
    let style = DocumentStyle::default();
    let doc = build_job_document(&snapshot(), &customer(), DocumentKind::Bill, &style, None);
    let bytes = render_pdf(&[doc], &style, Path::new("assets")).expect("pdf render");

    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.len() > 500);
}

#[test]
fn pdf_survives_missing_watermark_asset() {
    let mut style = DocumentStyle::default();
    style.pad_enabled = true;
    style.pad_image = Some("does-not-exist.png".to_string());
    style.signature_enabled = true;
    style.signature_image = Some("also-missing.png".to_string());

    let doc = build_job_document(&snapshot(), &customer(), DocumentKind::Bill, &style, None);
    // missing assets degrade, they must not abort the render
    let bytes = render_pdf(&[doc], &style, Path::new("assets")).expect("pdf render");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn xlsx_renders_workbook() {
    let style = DocumentStyle::default();
    let doc = build_job_document(&snapshot(), &customer(), DocumentKind::Bill, &style, None);
    let bytes = render_xlsx(&[doc], &style, Path::new("assets")).expect("xlsx render");

    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn bulk_render_produces_distinct_suffixed_numbers() {
    let style = DocumentStyle::default();
    let jobs = vec![
        (snapshot(), customer()),
        (snapshot(), customer()),
        (snapshot(), customer()),
    ];
    let docs = build_bulk_documents(&jobs, DocumentKind::Bill, &style);

    let numbers: Vec<&str> = docs.iter().map(|d| d.number.as_str()).collect();
    assert_eq!(numbers.len(), 3);
    for (i, number) in numbers.iter().enumerate() {
        assert!(number.ends_with(&format!("-{}", i + 1)));
    }
    // numbers differ only by the trailing index
    let base: Vec<&str> = numbers
        .iter()
        .map(|n| n.rsplit_once('-').unwrap().0)
        .collect();
    assert!(base.iter().all(|b| *b == base[0]));

    // all three land in one PDF
    let bytes = render_pdf(&docs, &style, Path::new("assets")).expect("bulk pdf");
    assert!(bytes.starts_with(b"%PDF"));

    // and one workbook with a sheet per job
    let bytes = render_xlsx(&docs, &style, Path::new("assets")).expect("bulk xlsx");
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn topsheet_document_lists_jobs_with_recomputed_totals() {
    let style = DocumentStyle::default();
    let mut a = snapshot();
    a.job.total_amount = common::dec("99999"); // stale stored value
    let b = snapshot();

    let doc = build_topsheet_document(&topsheet(), &[a, b], &style);
    let html = render_html(&[doc], &style);

    assert!(html.contains("TOP SHEET"));
    assert!(html.contains("TS-202608-0077"));
    // each job recomputes to 4300; the listing must ignore the stale 99999
    assert!(html.contains("Tk 4,300.00"));
    assert!(html.contains("Tk 8,600.00"));
    assert!(!html.contains("99,999"));
    assert!(html.contains("Eight Thousand Six Hundred Taka Only"));
    assert!(html.contains("Checked By"));
}

#[test]
fn style_overrides_flow_through_every_backend() {
    let mut style = DocumentStyle::default();
    style.company_name = "Override & Co".to_string();
    style.date_show_prefix = false;

    let doc = build_job_document(&snapshot(), &customer(), DocumentKind::Bill, &style, None);

    let html = render_html(&[doc.clone()], &style);
    assert!(html.contains("Override &amp; Co"));
    assert!(!html.contains("Date: "));

    let pdf = render_pdf(&[doc.clone()], &style, Path::new("assets")).expect("pdf");
    assert!(pdf.starts_with(b"%PDF"));

    let xlsx = render_xlsx(&[doc], &style, Path::new("assets")).expect("xlsx");
    assert_eq!(&xlsx[0..2], b"PK");
}
