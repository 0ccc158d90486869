//! Aggregate recalculation engine.
//!
//! Stored totals on jobs are advisory caches. Every reporting path
//! (dashboard, documents, topsheet listings) recomputes from live children
//! and silently prefers the recomputed value; divergence between stored and
//! recomputed totals is the tolerated steady state, never an error.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Expense, JobSnapshot, Topsheet};
use crate::services::pricing::CalculatedLine;
use crate::utils::money::number_to_words;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Read-time job total: the sum of item totals when items exist and sum to
/// a positive amount, otherwise the stored total.
///
/// The fallback when items sum to exactly zero is deliberate: it guards a
/// manually-entered total against being wiped by an all-free item list.
pub fn effective_job_total(stored_total: Decimal, item_totals: &[Decimal]) -> Decimal {
    if item_totals.is_empty() {
        return stored_total;
    }
    let recalculated: Decimal = item_totals.iter().copied().sum();
    if recalculated > Decimal::ZERO {
        recalculated
    } else {
        stored_total
    }
}

/// Read-time total for a materialized job snapshot.
pub fn snapshot_total(snapshot: &JobSnapshot) -> Decimal {
    let item_totals: Vec<Decimal> = snapshot.items.iter().map(|i| i.item.total).collect();
    effective_job_total(snapshot.job.total_amount, &item_totals)
}

/// Sum of active expenses. Soft-deleted expenses are excluded but retained
/// for audit.
pub fn active_expense_total(expenses: &[Expense]) -> Decimal {
    expenses
        .iter()
        .filter(|e| e.is_active)
        .map(|e| e.amount)
        .sum()
}

/// Expected profit: recomputed total minus active expenses.
pub fn expected_profit(snapshot: &JobSnapshot) -> Decimal {
    snapshot_total(snapshot) - active_expense_total(&snapshot.expenses)
}

/// Persist-time financial rollup for a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFinancials {
    pub subtotal: Decimal,
    pub total_vat: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub amount_in_words: String,
}

/// Compute the stored financial fields from calculated lines and the
/// job-level discount percent. Only called on item-bearing writes; a
/// status-only update must leave the stored fields untouched.
pub fn job_financials(lines: &[CalculatedLine], discount_percent: Decimal) -> JobFinancials {
    let subtotal: Decimal = lines.iter().map(|l| l.subtotal).sum();
    let total_vat: Decimal = lines.iter().map(|l| l.vat_amount).sum();
    let discount_amount = subtotal * discount_percent / Decimal::from(100);
    let total_amount = (subtotal - discount_amount) + total_vat;

    JobFinancials {
        subtotal,
        total_vat,
        discount_amount,
        total_amount,
        amount_in_words: number_to_words(total_amount),
    }
}

/// Read-time topsheet rollup. The topsheet has no stored total to fall
/// back on; member jobs are recomputed individually per the same policy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopsheetRollup {
    pub grand_total: Decimal,
    pub total_expenses: Decimal,
    pub total_profit: Decimal,
}

pub fn topsheet_rollup(jobs: &[JobSnapshot]) -> TopsheetRollup {
    let grand_total: Decimal = jobs.iter().map(snapshot_total).sum();
    let total_expenses: Decimal = jobs
        .iter()
        .map(|j| active_expense_total(&j.expenses))
        .sum();

    TopsheetRollup {
        grand_total,
        total_expenses,
        total_profit: grand_total - total_expenses,
    }
}

/// Per-month job bucket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthJobs {
    pub month: &'static str,
    pub job_count: u32,
    pub revenue: Decimal,
}

/// Per-month profit bucket. `topsheet_count` is an annotation only:
/// topsheet data never feeds the revenue/expense/profit numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthProfit {
    pub month: &'static str,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    pub topsheet_count: u32,
}

/// Dashboard rollup for one calendar year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub year: i32,
    pub jobs_by_month: Vec<MonthJobs>,
    pub monthly_profit: Vec<MonthProfit>,
}

/// Bucket jobs by the calendar month of their `job_date` (never a
/// milestone date). Jobs are the source of truth for all financial
/// figures; topsheets are counted in a separate pass purely for reference.
pub fn monthly_summary(year: i32, jobs: &[JobSnapshot], topsheets: &[Topsheet]) -> MonthlySummary {
    let mut jobs_by_month: Vec<MonthJobs> = MONTH_NAMES
        .iter()
        .map(|m| MonthJobs {
            month: m,
            job_count: 0,
            revenue: Decimal::ZERO,
        })
        .collect();

    let mut monthly_profit: Vec<MonthProfit> = MONTH_NAMES
        .iter()
        .map(|m| MonthProfit {
            month: m,
            revenue: Decimal::ZERO,
            expenses: Decimal::ZERO,
            profit: Decimal::ZERO,
            topsheet_count: 0,
        })
        .collect();

    for snapshot in jobs {
        if snapshot.job.job_date.year() != year {
            continue;
        }
        let idx = snapshot.job.job_date.month0() as usize;
        let revenue = snapshot_total(snapshot);
        let expenses = active_expense_total(&snapshot.expenses);

        jobs_by_month[idx].job_count += 1;
        jobs_by_month[idx].revenue += revenue;

        monthly_profit[idx].revenue += revenue;
        monthly_profit[idx].expenses += expenses;
        monthly_profit[idx].profit += revenue - expenses;
    }

    // Topsheets annotate the profit buckets but never contribute amounts.
    for topsheet in topsheets {
        if topsheet.topsheet_date.year() != year {
            continue;
        }
        let idx = topsheet.topsheet_date.month0() as usize;
        monthly_profit[idx].topsheet_count += 1;
    }

    MonthlySummary {
        year,
        jobs_by_month,
        monthly_profit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Expense, ItemWithMeasurements, Job, JobSnapshot, LineItem};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn job_with(stored_total: Decimal, date: NaiveDate) -> Job {
        Job {
            job_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            topsheet_id: None,
            ref_number: "JOB-202608-0001".to_string(),
            subject: "Test job".to_string(),
            detail: "Signage work".to_string(),
            location: "Dhaka".to_string(),
            status: "quotation".to_string(),
            job_date: date,
            quotation_date: None,
            challan_date: None,
            bill_date: None,
            bill_number: None,
            bbl_bill_number: None,
            challan_number: None,
            discount_percent: Decimal::ZERO,
            notes: None,
            terms: None,
            subtotal: stored_total,
            total_vat: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total_amount: stored_total,
            amount_in_words: String::new(),
            created_utc: Utc::now(),
        }
    }

    fn item_with_total(job: &Job, total: Decimal) -> ItemWithMeasurements {
        ItemWithMeasurements {
            item: LineItem {
                line_item_id: Uuid::new_v4(),
                job_id: job.job_id,
                owner_id: job.owner_id,
                serial_no: 1,
                description: "Work".to_string(),
                extra_details: None,
                quantity: Decimal::ONE,
                unit: "nos".to_string(),
                unit_price: total,
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
            },
            measurements: vec![],
        }
    }

    fn expense_of(job: &Job, amount: Decimal, active: bool) -> Expense {
        Expense {
            expense_id: Uuid::new_v4(),
            job_id: job.job_id,
            owner_id: job.owner_id,
            description: "Materials".to_string(),
            category: "material".to_string(),
            amount,
            expense_date: job.job_date,
            is_active: active,
            created_utc: Utc::now(),
        }
    }

    fn snapshot(
        stored_total: Decimal,
        item_totals: &[Decimal],
        expenses: Vec<Expense>,
        date: NaiveDate,
    ) -> JobSnapshot {
        let job = job_with(stored_total, date);
        let items = item_totals
            .iter()
            .map(|t| item_with_total(&job, *t))
            .collect();
        JobSnapshot {
            job,
            items,
            expenses,
        }
    }

    fn aug(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, day).unwrap()
    }

    #[test]
    fn test_recomputed_total_wins_over_stale_stored() {
        let s = snapshot(dec("300"), &[dec("200"), dec("300")], vec![], aug(1));
        assert_eq!(snapshot_total(&s), dec("500"));
    }

    #[test]
    fn test_empty_items_fall_back_to_stored() {
        let s = snapshot(dec("300"), &[], vec![], aug(1));
        assert_eq!(snapshot_total(&s), dec("300"));
    }

    #[test]
    fn test_zero_item_sum_falls_back_to_stored() {
        let s = snapshot(dec("300"), &[Decimal::ZERO, Decimal::ZERO], vec![], aug(1));
        assert_eq!(snapshot_total(&s), dec("300"));
    }

    #[test]
    fn test_expected_profit_excludes_inactive_expenses() {
        let job = job_with(Decimal::ZERO, aug(1));
        let expenses = vec![
            expense_of(&job, dec("100"), true),
            expense_of(&job, dec("50"), true),
            expense_of(&job, dec("9999"), false),
        ];
        let s = snapshot(Decimal::ZERO, &[dec("1000")], expenses, aug(1));
        assert_eq!(expected_profit(&s), dec("850"));
    }

    #[test]
    fn test_job_financials_rollup() {
        let lines = vec![
            CalculatedLine {
                subtotal: dec("1000"),
                discount_amount: Decimal::ZERO,
                vat_amount: Decimal::ZERO,
                total: dec("1000"),
            },
            CalculatedLine {
                subtotal: dec("500"),
                discount_amount: Decimal::ZERO,
                vat_amount: Decimal::ZERO,
                total: dec("500"),
            },
        ];
        let fin = job_financials(&lines, dec("10"));
        assert_eq!(fin.subtotal, dec("1500"));
        assert_eq!(fin.total_vat, Decimal::ZERO);
        assert_eq!(fin.discount_amount, dec("150"));
        assert_eq!(fin.total_amount, dec("1350"));
        assert_eq!(
            fin.amount_in_words,
            "One Thousand Three Hundred Fifty Taka Only"
        );
    }

    #[test]
    fn test_topsheet_rollup_uses_recomputed_totals() {
        let a = snapshot(dec("1"), &[dec("400")], vec![], aug(2));
        let b = snapshot(dec("999"), &[], vec![], aug(3));
        let rollup = topsheet_rollup(&[a, b]);
        // 400 recomputed + 999 stored fallback
        assert_eq!(rollup.grand_total, dec("1399"));
        assert_eq!(rollup.total_profit, dec("1399"));
    }

    #[test]
    fn test_monthly_summary_buckets_by_job_date() {
        let job_a = snapshot(Decimal::ZERO, &[dec("1000")], vec![], aug(5));
        let mut expenses_job = snapshot(Decimal::ZERO, &[dec("500")], vec![], aug(20));
        let e = expense_of(&expenses_job.job, dec("200"), true);
        expenses_job.expenses.push(e);
        let other_year = snapshot(
            Decimal::ZERO,
            &[dec("7777")],
            vec![],
            NaiveDate::from_ymd_opt(2025, 8, 5).unwrap(),
        );

        let summary = monthly_summary(2026, &[job_a, expenses_job, other_year], &[]);
        let august_jobs = &summary.jobs_by_month[7];
        assert_eq!(august_jobs.month, "August");
        assert_eq!(august_jobs.job_count, 2);
        assert_eq!(august_jobs.revenue, dec("1500"));

        let august_profit = &summary.monthly_profit[7];
        assert_eq!(august_profit.revenue, dec("1500"));
        assert_eq!(august_profit.expenses, dec("200"));
        assert_eq!(august_profit.profit, dec("1300"));
    }

    #[test]
    fn test_topsheets_never_feed_profit() {
        let job = snapshot(Decimal::ZERO, &[dec("1000")], vec![], aug(5));
        let topsheet = Topsheet {
            topsheet_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            topsheet_number: "TS-0001".to_string(),
            topsheet_date: aug(10),
            customer_name: "ACME".to_string(),
            customer_address: None,
            status: "draft".to_string(),
            created_utc: Utc::now(),
        };

        let summary = monthly_summary(2026, &[job], &[topsheet]);
        let august = &summary.monthly_profit[7];
        assert_eq!(august.topsheet_count, 1);
        // annotation only, amounts untouched by the topsheet
        assert_eq!(august.revenue, dec("1000"));
        assert_eq!(august.profit, dec("1000"));
    }
}
