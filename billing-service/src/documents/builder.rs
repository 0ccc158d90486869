//! Job/topsheet -> document model builders.
//!
//! All structural decisions (block order, pricing suppression, subject
//! synthesis, amount-in-words gating) are made here exactly once; the
//! output backends only translate blocks to their medium.

use rust_decimal::Decimal;

use crate::documents::model::{
    Block, CustomerBlock, Document, DocumentKind, FooterBlock, HeaderBlock, ItemRow,
    ItemTableBlock, JobLine, JobTableBlock, MetaBlock, SignatureBlock, document_number,
};
use crate::documents::style::DocumentStyle;
use crate::models::{Customer, JobSnapshot, Topsheet};
use crate::services::totals;
use crate::utils::money::number_to_words;

fn header_block(style: &DocumentStyle) -> HeaderBlock {
    HeaderBlock {
        company_name: style.company_name.clone(),
        tagline: style.company_tagline.clone(),
        contact_line: format!("{} | {}", style.company_email, style.company_phone),
    }
}

fn footer_block(number: &str, style: &DocumentStyle) -> FooterBlock {
    FooterBlock {
        document_number: number.to_string(),
        contact_line: format!("{} | {}", style.company_email, style.company_phone),
    }
}

/// Synthesized subject line. Challan documents carry just the job detail
/// and location; pricing documents lead with the document title and name
/// the customer.
fn subject_line(kind: DocumentKind, detail: &str, location: &str, customer_name: &str) -> String {
    match kind {
        DocumentKind::Challan => {
            if location.is_empty() {
                detail.to_string()
            } else {
                format!("{} at {}", detail, location)
            }
        }
        _ => {
            if location.is_empty() {
                format!("{} for {} at {}", kind.title(), detail, customer_name)
            } else {
                format!(
                    "{} for {} at {}, {}",
                    kind.title(),
                    detail,
                    customer_name,
                    location
                )
            }
        }
    }
}

fn quantity_text(quantity: Decimal, unit: &str) -> String {
    let qty = quantity.normalize();
    if unit.is_empty() {
        qty.to_string()
    } else {
        format!("{} {}", qty, unit)
    }
}

/// Build the document for one job.
///
/// `bulk_index` appends the 1-based `-{index}` suffix used by bulk renders
/// to keep per-job document numbers distinguishable.
pub fn build_job_document(
    snapshot: &JobSnapshot,
    customer: &Customer,
    kind: DocumentKind,
    style: &DocumentStyle,
    bulk_index: Option<usize>,
) -> Document {
    let job = &snapshot.job;
    let number = document_number(kind, job.job_date, bulk_index);
    let show_pricing = kind.shows_pricing();

    let mut blocks = Vec::new();

    blocks.push(Block::Header(header_block(style)));
    blocks.push(Block::Meta(MetaBlock {
        document_number: number.clone(),
        date_text: style.format_date(job.job_date),
        ref_number: job.ref_number.clone(),
    }));
    blocks.push(Block::Title(kind.title().to_string()));

    let mut address_lines = Vec::new();
    if let Some(line) = customer.address_line1.as_deref().filter(|l| !l.is_empty()) {
        address_lines.push(line.to_string());
    }
    if let Some(line) = customer.address_line2.as_deref().filter(|l| !l.is_empty()) {
        address_lines.push(line.to_string());
    }
    blocks.push(Block::Customer(CustomerBlock {
        name: customer.name.clone(),
        address_lines,
        location: Some(job.location.clone()).filter(|l| !l.is_empty()),
    }));

    blocks.push(Block::Subject(subject_line(
        kind,
        &job.detail,
        &job.location,
        &customer.name,
    )));

    let rows: Vec<ItemRow> = snapshot
        .items
        .iter()
        .map(|entry| {
            let item = &entry.item;
            let mut sub_lines = Vec::new();
            if let Some(extra) = item.extra_details.as_deref().filter(|e| !e.is_empty()) {
                sub_lines.push(extra.to_string());
            }
            for m in &entry.measurements {
                sub_lines.push(m.display_fragment());
            }
            // The display sums measurement areas itself; the stored item
            // quantity is the caller's business and is not overwritten.
            if entry.measurements.len() > 1 {
                let area_sum: Decimal = entry.measurements.iter().map(|m| m.area_sqft).sum();
                sub_lines.push(format!(
                    "Total area: {:.2} sft",
                    area_sum.round_dp_with_strategy(
                        2,
                        rust_decimal::RoundingStrategy::MidpointAwayFromZero
                    )
                ));
            }
            ItemRow {
                serial: item.serial_no,
                description: item.description.clone(),
                sub_lines,
                quantity_text: quantity_text(item.quantity, &item.unit),
                unit_price: show_pricing.then_some(item.unit_price),
                total: show_pricing.then_some(item.total),
            }
        })
        .collect();

    // Grand total follows the recompute policy: live item sums when they
    // are positive, the stored total otherwise. Job-level discount and the
    // VAT sum (currently always zero) stay in the formula.
    let item_sum: Decimal = snapshot.items.iter().map(|e| e.item.total).sum();
    let vat_sum: Decimal = snapshot.items.iter().map(|e| e.item.vat_amount).sum();
    let grand_total = if !snapshot.items.is_empty() && item_sum > Decimal::ZERO {
        let discount = item_sum * job.discount_percent / Decimal::from(100);
        (item_sum - discount) + vat_sum
    } else {
        job.total_amount
    };

    blocks.push(Block::ItemTable(ItemTableBlock {
        rows,
        show_pricing,
        grand_total: show_pricing.then_some(grand_total),
    }));

    if show_pricing && grand_total > Decimal::ZERO {
        blocks.push(Block::AmountInWords(number_to_words(grand_total)));
    }

    if let Some(notes) = job.notes.as_deref().filter(|n| !n.is_empty()) {
        blocks.push(Block::Notes(notes.to_string()));
    }
    if let Some(terms) = job.terms.as_deref().filter(|t| !t.is_empty()) {
        blocks.push(Block::Terms(terms.to_string()));
    }

    blocks.push(Block::Signature(SignatureBlock {
        left_label: "Received By".to_string(),
        right_label: "Authorized Signatory".to_string(),
    }));
    blocks.push(Block::Footer(footer_block(&number, style)));

    Document { number, blocks }
}

/// Build documents for a batch of jobs: one page/sheet each, numbered with
/// a trailing 1-based index.
pub fn build_bulk_documents(
    jobs: &[(JobSnapshot, Customer)],
    kind: DocumentKind,
    style: &DocumentStyle,
) -> Vec<Document> {
    jobs.iter()
        .enumerate()
        .map(|(i, (snapshot, customer))| {
            build_job_document(snapshot, customer, kind, style, Some(i + 1))
        })
        .collect()
}

/// Build the topsheet document: a single job-per-row listing with a totals
/// row and amount-in-words trailer. Job totals are recomputed from each
/// job's own items per the recompute policy.
pub fn build_topsheet_document(
    topsheet: &Topsheet,
    members: &[JobSnapshot],
    style: &DocumentStyle,
) -> Document {
    let number = topsheet.topsheet_number.clone();

    let mut blocks = Vec::new();
    blocks.push(Block::Header(header_block(style)));
    blocks.push(Block::Meta(MetaBlock {
        document_number: number.clone(),
        date_text: style.format_date(topsheet.topsheet_date),
        ref_number: topsheet.topsheet_number.clone(),
    }));
    blocks.push(Block::Title("TOP SHEET".to_string()));

    let address_lines = topsheet
        .customer_address
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(|a| vec![a.to_string()])
        .unwrap_or_default();
    blocks.push(Block::Customer(CustomerBlock {
        name: topsheet.customer_name.clone(),
        address_lines,
        location: None,
    }));

    let rows: Vec<JobLine> = members
        .iter()
        .enumerate()
        .map(|(i, snapshot)| {
            let job = &snapshot.job;
            JobLine {
                serial: (i + 1) as i32,
                detail: job.detail.clone(),
                location: job.location.clone(),
                bill_number: job
                    .bill_number
                    .clone()
                    .unwrap_or_else(|| job.ref_number.clone()),
                challan_date_text: job
                    .challan_date
                    .map(|d| style.format_date_plain(d))
                    .unwrap_or_default(),
                total: totals::snapshot_total(snapshot),
                secondary_bill_number: job.bbl_bill_number.clone().unwrap_or_default(),
            }
        })
        .collect();

    let grand_total: Decimal = rows.iter().map(|r| r.total).sum();
    blocks.push(Block::JobTable(JobTableBlock { rows, grand_total }));

    if grand_total > Decimal::ZERO {
        blocks.push(Block::AmountInWords(number_to_words(grand_total)));
    }

    blocks.push(Block::Signature(SignatureBlock {
        left_label: "Checked By".to_string(),
        right_label: "Authorized Signatory".to_string(),
    }));
    blocks.push(Block::Footer(footer_block(&number, style)));

    Document { number, blocks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::style::DocumentStyle;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use crate::models::{Customer, ItemWithMeasurements, Job, JobSnapshot, LineItem};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn customer() -> Customer {
        Customer {
            customer_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "ACME Traders".to_string(),
            address_line1: Some("House 12, Road 5".to_string()),
            address_line2: Some("Gulshan, Dhaka".to_string()),
            phone: None,
            email: None,
            created_utc: Utc::now(),
        }
    }

    fn snapshot_with_item(total: Decimal) -> JobSnapshot {
        let job = Job {
            job_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            topsheet_id: None,
            ref_number: "JOB-202608-0042".to_string(),
            subject: "Shopfront branding".to_string(),
            detail: "Acrylic letter signage".to_string(),
            location: "Banani".to_string(),
            status: "quotation".to_string(),
            job_date: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            quotation_date: None,
            challan_date: None,
            bill_date: None,
            bill_number: None,
            bbl_bill_number: None,
            challan_number: None,
            discount_percent: Decimal::ZERO,
            notes: None,
            terms: None,
            subtotal: total,
            total_vat: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total_amount: total,
            amount_in_words: String::new(),
            created_utc: Utc::now(),
        };
        let item = LineItem {
            line_item_id: Uuid::new_v4(),
            job_id: job.job_id,
            owner_id: job.owner_id,
            serial_no: 1,
            description: "Acrylic letters".to_string(),
            extra_details: None,
            quantity: dec("10"),
            unit: "sqft".to_string(),
            unit_price: total / dec("10"),
            buy_price: Decimal::ZERO,
            discount_percent: Decimal::ZERO,
            vat_rate: Decimal::ZERO,
            subtotal: total,
            discount_amount: Decimal::ZERO,
            vat_amount: Decimal::ZERO,
            total,
            auto_calculate_sqft: false,
            calculated_sqft: None,
            created_utc: Utc::now(),
        };
        JobSnapshot {
            job,
            items: vec![ItemWithMeasurements {
                item,
                measurements: vec![],
            }],
            expenses: vec![],
        }
    }

    fn find_table(doc: &Document) -> &ItemTableBlock {
        doc.blocks
            .iter()
            .find_map(|b| match b {
                Block::ItemTable(t) => Some(t),
                _ => None,
            })
            .expect("item table present")
    }

    #[test]
    fn test_challan_has_no_pricing_or_words() {
        let snapshot = snapshot_with_item(dec("500"));
        let doc = build_job_document(
            &snapshot,
            &customer(),
            DocumentKind::Challan,
            &DocumentStyle::default(),
            None,
        );

        let table = find_table(&doc);
        assert!(!table.show_pricing);
        assert!(table.grand_total.is_none());
        assert!(table.rows.iter().all(|r| r.unit_price.is_none() && r.total.is_none()));
        assert!(!doc
            .blocks
            .iter()
            .any(|b| matches!(b, Block::AmountInWords(_))));
    }

    #[test]
    fn test_bill_shows_pricing_and_words() {
        let snapshot = snapshot_with_item(dec("500"));
        let doc = build_job_document(
            &snapshot,
            &customer(),
            DocumentKind::Bill,
            &DocumentStyle::default(),
            None,
        );

        let table = find_table(&doc);
        assert!(table.show_pricing);
        assert_eq!(table.grand_total, Some(dec("500")));
        assert!(doc
            .blocks
            .iter()
            .any(|b| matches!(b, Block::AmountInWords(w) if w == "Five Hundred Taka Only")));
    }

    #[test]
    fn test_grand_total_prefers_recomputed_items() {
        let mut snapshot = snapshot_with_item(dec("500"));
        // stale stored total must lose to the live item sum
        snapshot.job.total_amount = dec("300");
        let doc = build_job_document(
            &snapshot,
            &customer(),
            DocumentKind::Bill,
            &DocumentStyle::default(),
            None,
        );
        assert_eq!(find_table(&doc).grand_total, Some(dec("500")));
    }

    #[test]
    fn test_bulk_numbers_are_suffixed() {
        let jobs = vec![
            (snapshot_with_item(dec("100")), customer()),
            (snapshot_with_item(dec("200")), customer()),
        ];
        let docs = build_bulk_documents(&jobs, DocumentKind::Bill, &DocumentStyle::default());
        assert_eq!(docs.len(), 2);
        assert!(docs[0].number.ends_with("-1"));
        assert!(docs[1].number.ends_with("-2"));
        assert_eq!(
            find_table(&docs[0]).grand_total,
            Some(dec("100")),
            "each bulk page carries its own job's totals"
        );
    }

    #[test]
    fn test_topsheet_listing_recomputes_job_totals() {
        let mut a = snapshot_with_item(dec("400"));
        a.job.total_amount = dec("9999"); // stale
        let b = snapshot_with_item(dec("600"));
        let topsheet = Topsheet {
            topsheet_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            topsheet_number: "TS-2026-001".to_string(),
            topsheet_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            customer_name: "ACME Traders".to_string(),
            customer_address: Some("Gulshan, Dhaka".to_string()),
            status: "submitted".to_string(),
            created_utc: Utc::now(),
        };

        let doc = build_topsheet_document(&topsheet, &[a, b], &DocumentStyle::default());
        let table = doc
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::JobTable(t) => Some(t),
                _ => None,
            })
            .expect("job table present");

        assert_eq!(table.rows[0].total, dec("400"));
        assert_eq!(table.grand_total, dec("1000"));
    }
}
