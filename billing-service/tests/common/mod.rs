//! Shared fixtures for billing-service integration tests. Everything here
//! builds in-memory snapshots; no database is required.

#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use billing_service::models::{
    Customer, Expense, ItemWithMeasurements, Job, JobSnapshot, LineItem, Measurement, Topsheet,
};
use billing_service::services::pricing;

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn august(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, day).unwrap()
}

pub fn customer() -> Customer {
    Customer {
        customer_id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        name: "Meghna Traders Ltd".to_string(),
        address_line1: Some("House 42, Road 11".to_string()),
        address_line2: Some("Banani, Dhaka 1213".to_string()),
        phone: Some("+880 1800-111222".to_string()),
        email: Some("accounts@meghna.example".to_string()),
        created_utc: Utc::now(),
    }
}

pub fn job(stored_total: &str) -> Job {
    Job {
        job_id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        topsheet_id: None,
        ref_number: "JOB-202608-1234".to_string(),
        subject: "Office branding".to_string(),
        detail: "3D acrylic letter signage".to_string(),
        location: "Head Office, Motijheel".to_string(),
        status: "quotation".to_string(),
        job_date: august(6),
        quotation_date: Some(august(6)),
        challan_date: None,
        bill_date: None,
        bill_number: None,
        bbl_bill_number: None,
        challan_number: None,
        discount_percent: Decimal::ZERO,
        notes: Some("Delivery within 10 working days.".to_string()),
        terms: Some("50% advance with work order.".to_string()),
        subtotal: dec(stored_total),
        total_vat: Decimal::ZERO,
        discount_amount: Decimal::ZERO,
        total_amount: dec(stored_total),
        amount_in_words: String::new(),
        created_utc: Utc::now(),
    }
}

pub fn line_item(job: &Job, serial: i32, description: &str, quantity: &str, unit_price: &str) -> LineItem {
    let line = pricing::calculate_line_item(Some(dec(quantity)), Some(dec(unit_price)), None);
    LineItem {
        line_item_id: Uuid::new_v4(),
        job_id: job.job_id,
        owner_id: job.owner_id,
        serial_no: serial,
        description: description.to_string(),
        extra_details: None,
        quantity: dec(quantity),
        unit: "sqft".to_string(),
        unit_price: dec(unit_price),
        buy_price: Decimal::ZERO,
        discount_percent: Decimal::ZERO,
        vat_rate: Decimal::ZERO,
        subtotal: line.subtotal,
        discount_amount: line.discount_amount,
        vat_amount: line.vat_amount,
        total: line.total,
        auto_calculate_sqft: false,
        calculated_sqft: None,
        created_utc: Utc::now(),
    }
}

pub fn measurement(item: &LineItem, wf: i32, wi: i32, hf: i32, hi: i32, qty: i32) -> Measurement {
    Measurement {
        measurement_id: Uuid::new_v4(),
        line_item_id: item.line_item_id,
        owner_id: item.owner_id,
        width_feet: wf,
        width_inches: wi,
        height_feet: hf,
        height_inches: hi,
        quantity: qty,
        area_sqft: pricing::measurement_area(wf, wi, hf, hi, qty),
        description: None,
        sort_order: 0,
    }
}

pub fn expense(job: &Job, amount: &str, active: bool) -> Expense {
    Expense {
        expense_id: Uuid::new_v4(),
        job_id: job.job_id,
        owner_id: job.owner_id,
        description: "Acrylic sheets".to_string(),
        category: "material".to_string(),
        amount: dec(amount),
        expense_date: job.job_date,
        is_active: active,
        created_utc: Utc::now(),
    }
}

/// A ready-made snapshot: two priced items, one with measurements.
pub fn snapshot() -> JobSnapshot {
    let job = job("0");
    let item_a = line_item(&job, 1, "Acrylic letter set", "15", "120");
    let m = measurement(&item_a, 2, 6, 3, 0, 2);
    let item_b = line_item(&job, 2, "Installation charge", "1", "2500");
    JobSnapshot {
        job,
        items: vec![
            ItemWithMeasurements {
                item: item_a,
                measurements: vec![m],
            },
            ItemWithMeasurements {
                item: item_b,
                measurements: vec![],
            },
        ],
        expenses: vec![],
    }
}

pub fn topsheet() -> Topsheet {
    Topsheet {
        topsheet_id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        topsheet_number: "TS-202608-0077".to_string(),
        topsheet_date: august(10),
        customer_name: "Meghna Traders Ltd".to_string(),
        customer_address: Some("Banani, Dhaka 1213".to_string()),
        status: "submitted".to_string(),
        created_utc: Utc::now(),
    }
}
