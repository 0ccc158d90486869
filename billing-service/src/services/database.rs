//! Database service for billing-service.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dtos::{JobPayload, LineItemPayload, TopsheetPayload};
use crate::models::{
    CreateCustomer, CreateExpense, Customer, Expense, ItemWithMeasurements, Job, JobSnapshot,
    LineItem, ListJobsFilter, Measurement, Setting, Topsheet, UpdateCustomer, UpdateExpense,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::{pricing, totals};
use crate::utils;

const JOB_COLUMNS: &str = "job_id, owner_id, customer_id, topsheet_id, ref_number, subject, \
detail, location, status, job_date, quotation_date, challan_date, bill_date, bill_number, \
bbl_bill_number, challan_number, discount_percent, notes, terms, subtotal, total_vat, \
discount_amount, total_amount, amount_in_words, created_utc";

/// One job row with its item aggregates, for listings.
#[derive(Debug, Clone, FromRow)]
pub struct JobRowRecord {
    #[sqlx(flatten)]
    pub job: Job,
    pub item_sum: Decimal,
    pub item_count: i64,
}

impl JobRowRecord {
    /// Recompute-don't-trust total for display.
    pub fn effective_total(&self) -> Decimal {
        if self.item_count == 0 {
            self.job.total_amount
        } else {
            totals::effective_job_total(self.job.total_amount, &[self.item_sum])
        }
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "billing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(owner_id = %owner_id))]
    pub async fn create_customer(
        &self,
        owner_id: Uuid,
        input: &CreateCustomer,
    ) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (customer_id, owner_id, name, address_line1, address_line2, phone, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING customer_id, owner_id, name, address_line1, address_line2, phone, email, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&input.name)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.phone)
        .bind(&input.email)
        .fetch_one(&self.pool)
        .await?;

        info!(customer_id = %customer.customer_id, "Customer created");
        Ok(customer)
    }

    pub async fn get_customer(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT customer_id, owner_id, name, address_line1, address_line2, phone, email, created_utc \
             FROM customers WHERE owner_id = $1 AND customer_id = $2",
        )
        .bind(owner_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    pub async fn list_customers(&self, owner_id: Uuid) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT customer_id, owner_id, name, address_line1, address_line2, phone, email, created_utc \
             FROM customers WHERE owner_id = $1 ORDER BY name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn update_customer(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = COALESCE($3, name),
                address_line1 = COALESCE($4, address_line1),
                address_line2 = COALESCE($5, address_line2),
                phone = COALESCE($6, phone),
                email = COALESCE($7, email)
            WHERE owner_id = $1 AND customer_id = $2
            RETURNING customer_id, owner_id, name, address_line1, address_line2, phone, email, created_utc
            "#,
        )
        .bind(owner_id)
        .bind(customer_id)
        .bind(&input.name)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.phone)
        .bind(&input.email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    pub async fn delete_customer(&self, owner_id: Uuid, customer_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE owner_id = $1 AND customer_id = $2")
            .bind(owner_id)
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict(anyhow::anyhow!("Customer still has jobs"))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e)),
            })?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Job Operations
    // -------------------------------------------------------------------------

    /// Create a job with its full item set in one transaction. Serials are
    /// assigned 1..N from submission order and the stored financial rollup
    /// is computed from the submitted items.
    #[instrument(skip(self, payload), fields(owner_id = %owner_id))]
    pub async fn create_job(&self, owner_id: Uuid, payload: &JobPayload) -> Result<Uuid, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_job"])
            .start_timer();

        let job_id = Uuid::new_v4();
        let ref_number = utils::generate_ref_number();
        let items = payload.items.clone().unwrap_or_default();
        let lines: Vec<pricing::CalculatedLine> = items
            .iter()
            .map(|i| pricing::calculate_line_item(i.quantity, i.unit_price, i.discount_percent))
            .collect();
        let discount_percent = payload.discount_percent.unwrap_or(Decimal::ZERO);
        let financials = totals::job_financials(&lines, discount_percent);
        let job_date = payload.job_date.unwrap_or_else(|| Utc::now().date_naive());
        let status = payload
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "quotation".to_string());

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO jobs (job_id, owner_id, customer_id, topsheet_id, ref_number, subject,
                detail, location, status, job_date, quotation_date, challan_date, bill_date,
                bill_number, bbl_bill_number, challan_number, discount_percent, notes, terms,
                subtotal, total_vat, discount_amount, total_amount, amount_in_words)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23, $24)
            "#,
        )
        .bind(job_id)
        .bind(owner_id)
        .bind(payload.customer_id)
        .bind(payload.topsheet_id)
        .bind(&ref_number)
        .bind(&payload.subject)
        .bind(&payload.detail)
        .bind(&payload.location)
        .bind(&status)
        .bind(job_date)
        .bind(payload.quotation_date)
        .bind(payload.challan_date)
        .bind(payload.bill_date)
        .bind(&payload.bill_number)
        .bind(&payload.bbl_bill_number)
        .bind(&payload.challan_number)
        .bind(discount_percent)
        .bind(&payload.notes)
        .bind(&payload.terms)
        .bind(financials.subtotal)
        .bind(financials.total_vat)
        .bind(financials.discount_amount)
        .bind(financials.total_amount)
        .bind(&financials.amount_in_words)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Reference number collision, retry"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create job: {}", e)),
        })?;

        insert_items(&mut tx, owner_id, job_id, &items, &lines).await?;

        tx.commit().await?;
        timer.observe_duration();

        info!(job_id = %job_id, ref_number = %ref_number, "Job created");
        Ok(job_id)
    }

    /// Update a job.
    ///
    /// With an items payload this replaces the full item set (delete all,
    /// reinsert) and recomputes the stored financials. Without one it is a
    /// status-only update: scalar fields are patched and the stored
    /// financial fields are preserved verbatim, so flipping a status never
    /// silently zeroes totals.
    #[instrument(skip(self, payload), fields(owner_id = %owner_id, job_id = %job_id))]
    pub async fn update_job(
        &self,
        owner_id: Uuid,
        job_id: Uuid,
        payload: &JobPayload,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_job"])
            .start_timer();

        let mut tx = self.pool.begin().await?;

        let scalar_update = sqlx::query(
            r#"
            UPDATE jobs SET
                customer_id = $3,
                topsheet_id = $4,
                subject = $5,
                detail = $6,
                location = $7,
                status = COALESCE($8, status),
                job_date = COALESCE($9, job_date),
                quotation_date = $10,
                challan_date = $11,
                bill_date = $12,
                bill_number = $13,
                bbl_bill_number = $14,
                challan_number = $15,
                discount_percent = COALESCE($16, discount_percent),
                notes = $17,
                terms = $18
            WHERE owner_id = $1 AND job_id = $2
            "#,
        )
        .bind(owner_id)
        .bind(job_id)
        .bind(payload.customer_id)
        .bind(payload.topsheet_id)
        .bind(&payload.subject)
        .bind(&payload.detail)
        .bind(&payload.location)
        .bind(payload.status.map(|s| s.as_str()))
        .bind(payload.job_date)
        .bind(payload.quotation_date)
        .bind(payload.challan_date)
        .bind(payload.bill_date)
        .bind(&payload.bill_number)
        .bind(&payload.bbl_bill_number)
        .bind(&payload.challan_number)
        .bind(payload.discount_percent)
        .bind(&payload.notes)
        .bind(&payload.terms)
        .execute(&mut *tx)
        .await?;

        if scalar_update.rows_affected() == 0 {
            return Ok(false);
        }

        if let Some(items) = &payload.items {
            let lines: Vec<pricing::CalculatedLine> = items
                .iter()
                .map(|i| pricing::calculate_line_item(i.quantity, i.unit_price, i.discount_percent))
                .collect();
            let discount_percent = payload.discount_percent.unwrap_or(Decimal::ZERO);
            let financials = totals::job_financials(&lines, discount_percent);

            sqlx::query(
                r#"
                UPDATE jobs SET subtotal = $3, total_vat = $4, discount_amount = $5,
                    total_amount = $6, amount_in_words = $7
                WHERE owner_id = $1 AND job_id = $2
                "#,
            )
            .bind(owner_id)
            .bind(job_id)
            .bind(financials.subtotal)
            .bind(financials.total_vat)
            .bind(financials.discount_amount)
            .bind(financials.total_amount)
            .bind(&financials.amount_in_words)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM line_items WHERE owner_id = $1 AND job_id = $2")
                .bind(owner_id)
                .bind(job_id)
                .execute(&mut *tx)
                .await?;

            insert_items(&mut tx, owner_id, job_id, items, &lines).await?;
        }

        tx.commit().await?;
        timer.observe_duration();

        info!(job_id = %job_id, "Job updated");
        Ok(true)
    }

    /// Load one fully-materialized job: items (with measurements, in sort
    /// order) and active expenses.
    #[instrument(skip(self), fields(owner_id = %owner_id, job_id = %job_id))]
    pub async fn get_job_snapshot(
        &self,
        owner_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<JobSnapshot>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_job_snapshot"])
            .start_timer();

        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE owner_id = $1 AND job_id = $2",
            JOB_COLUMNS
        ))
        .bind(owner_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(job) = job else {
            return Ok(None);
        };

        let mut snapshots = self.assemble_snapshots(vec![job]).await?;
        timer.observe_duration();
        Ok(snapshots.pop())
    }

    /// Load snapshots for a set of job ids, preserving the requested order.
    pub async fn get_job_snapshots(
        &self,
        owner_id: Uuid,
        job_ids: &[Uuid],
    ) -> Result<Vec<JobSnapshot>, AppError> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE owner_id = $1 AND job_id = ANY($2)",
            JOB_COLUMNS
        ))
        .bind(owner_id)
        .bind(job_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut snapshots = self.assemble_snapshots(jobs).await?;
        // preserve the caller's ordering
        let order: HashMap<Uuid, usize> = job_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        snapshots.sort_by_key(|s| order.get(&s.job.job_id).copied().unwrap_or(usize::MAX));
        Ok(snapshots)
    }

    /// Paginated job listing with free-text search and status filter.
    /// Returns rows plus the total match count.
    #[instrument(skip(self, filter), fields(owner_id = %owner_id))]
    pub async fn list_jobs(
        &self,
        owner_id: Uuid,
        filter: &ListJobsFilter,
    ) -> Result<(Vec<JobRowRecord>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_jobs"])
            .start_timer();

        let page = filter.page.unwrap_or(1).max(1);
        let page_size = filter.page_size.unwrap_or(20).clamp(1, 100);
        let offset = ((page - 1) * page_size) as i64;
        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s));
        let status = filter.status.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, JobRowRecord>(&format!(
            r#"
            SELECT {}, COALESCE(i.item_sum, 0) AS item_sum, COALESCE(i.item_count, 0) AS item_count
            FROM jobs j
            JOIN customers c ON c.customer_id = j.customer_id
            LEFT JOIN (
                SELECT job_id, SUM(total) AS item_sum, COUNT(*) AS item_count
                FROM line_items GROUP BY job_id
            ) i ON i.job_id = j.job_id
            WHERE j.owner_id = $1
              AND ($2::text IS NULL OR j.status = $2)
              AND ($3::text IS NULL
                   OR j.ref_number ILIKE $3
                   OR j.subject ILIKE $3
                   OR j.location ILIKE $3
                   OR c.name ILIKE $3)
            ORDER BY j.created_utc DESC
            LIMIT $4 OFFSET $5
            "#,
            JOB_COLUMNS
                .split(", ")
                .map(|col| format!("j.{}", col))
                .collect::<Vec<_>>()
                .join(", ")
        ))
        .bind(owner_id)
        .bind(status)
        .bind(&pattern)
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM jobs j
            JOIN customers c ON c.customer_id = j.customer_id
            WHERE j.owner_id = $1
              AND ($2::text IS NULL OR j.status = $2)
              AND ($3::text IS NULL
                   OR j.ref_number ILIKE $3
                   OR j.subject ILIKE $3
                   OR j.location ILIKE $3
                   OR c.name ILIKE $3)
            "#,
        )
        .bind(owner_id)
        .bind(status)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        timer.observe_duration();
        Ok((rows, total))
    }

    /// Delete a job; line items, measurements and expenses cascade.
    pub async fn delete_job(&self, owner_id: Uuid, job_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE owner_id = $1 AND job_id = $2")
            .bind(owner_id)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Expense Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(owner_id = %owner_id, job_id = %job_id))]
    pub async fn create_expense(
        &self,
        owner_id: Uuid,
        job_id: Uuid,
        input: &CreateExpense,
    ) -> Result<Expense, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (expense_id, job_id, owner_id, description, category, amount, expense_date, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING expense_id, job_id, owner_id, description, category, amount, expense_date, is_active, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job_id)
        .bind(owner_id)
        .bind(&input.description)
        .bind(input.category.as_str())
        .bind(input.amount)
        .bind(input.expense_date)
        .fetch_one(&self.pool)
        .await?;

        info!(expense_id = %expense.expense_id, "Expense created");
        Ok(expense)
    }

    /// Update an expense. `active: Some(false)` is the soft-delete path:
    /// the row stays for audit but leaves every total.
    pub async fn update_expense(
        &self,
        owner_id: Uuid,
        expense_id: Uuid,
        input: &UpdateExpense,
    ) -> Result<Option<Expense>, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses SET
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                amount = COALESCE($5, amount),
                expense_date = COALESCE($6, expense_date),
                is_active = COALESCE($7, is_active)
            WHERE owner_id = $1 AND expense_id = $2
            RETURNING expense_id, job_id, owner_id, description, category, amount, expense_date, is_active, created_utc
            "#,
        )
        .bind(owner_id)
        .bind(expense_id)
        .bind(&input.description)
        .bind(input.category.map(|c| c.as_str()))
        .bind(input.amount)
        .bind(input.expense_date)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(expense)
    }

    // -------------------------------------------------------------------------
    // Topsheet Operations
    // -------------------------------------------------------------------------

    /// Create a topsheet and connect the submitted member jobs.
    #[instrument(skip(self, payload), fields(owner_id = %owner_id))]
    pub async fn create_topsheet(
        &self,
        owner_id: Uuid,
        payload: &TopsheetPayload,
    ) -> Result<Topsheet, AppError> {
        let topsheet_number = payload
            .topsheet_number
            .clone()
            .unwrap_or_else(utils::generate_topsheet_number);
        let topsheet_date = payload
            .topsheet_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let status = payload
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "draft".to_string());

        let mut tx = self.pool.begin().await?;

        let topsheet = sqlx::query_as::<_, Topsheet>(
            r#"
            INSERT INTO topsheets (topsheet_id, owner_id, topsheet_number, topsheet_date, customer_name, customer_address, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING topsheet_id, owner_id, topsheet_number, topsheet_date, customer_name, customer_address, status, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&topsheet_number)
        .bind(topsheet_date)
        .bind(&payload.customer_name)
        .bind(&payload.customer_address)
        .bind(&status)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Topsheet number '{}' already exists",
                    topsheet_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create topsheet: {}", e)),
        })?;

        connect_members(&mut tx, owner_id, topsheet.topsheet_id, &payload.job_ids).await?;

        tx.commit().await?;
        info!(topsheet_id = %topsheet.topsheet_id, "Topsheet created");
        Ok(topsheet)
    }

    /// Update a topsheet and reassign membership: every current member is
    /// disconnected first, then the submitted set is connected.
    #[instrument(skip(self, payload), fields(owner_id = %owner_id, topsheet_id = %topsheet_id))]
    pub async fn update_topsheet(
        &self,
        owner_id: Uuid,
        topsheet_id: Uuid,
        payload: &TopsheetPayload,
    ) -> Result<Option<Topsheet>, AppError> {
        let mut tx = self.pool.begin().await?;

        let topsheet = sqlx::query_as::<_, Topsheet>(
            r#"
            UPDATE topsheets SET
                topsheet_number = COALESCE($3, topsheet_number),
                topsheet_date = COALESCE($4, topsheet_date),
                customer_name = $5,
                customer_address = $6,
                status = COALESCE($7, status)
            WHERE owner_id = $1 AND topsheet_id = $2
            RETURNING topsheet_id, owner_id, topsheet_number, topsheet_date, customer_name, customer_address, status, created_utc
            "#,
        )
        .bind(owner_id)
        .bind(topsheet_id)
        .bind(&payload.topsheet_number)
        .bind(payload.topsheet_date)
        .bind(&payload.customer_name)
        .bind(&payload.customer_address)
        .bind(payload.status.map(|s| s.as_str()))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(topsheet) = topsheet else {
            return Ok(None);
        };

        sqlx::query("UPDATE jobs SET topsheet_id = NULL WHERE owner_id = $1 AND topsheet_id = $2")
            .bind(owner_id)
            .bind(topsheet_id)
            .execute(&mut *tx)
            .await?;

        connect_members(&mut tx, owner_id, topsheet_id, &payload.job_ids).await?;

        tx.commit().await?;
        Ok(Some(topsheet))
    }

    pub async fn get_topsheet(
        &self,
        owner_id: Uuid,
        topsheet_id: Uuid,
    ) -> Result<Option<Topsheet>, AppError> {
        let topsheet = sqlx::query_as::<_, Topsheet>(
            "SELECT topsheet_id, owner_id, topsheet_number, topsheet_date, customer_name, customer_address, status, created_utc \
             FROM topsheets WHERE owner_id = $1 AND topsheet_id = $2",
        )
        .bind(owner_id)
        .bind(topsheet_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(topsheet)
    }

    pub async fn list_topsheets(&self, owner_id: Uuid) -> Result<Vec<Topsheet>, AppError> {
        let topsheets = sqlx::query_as::<_, Topsheet>(
            "SELECT topsheet_id, owner_id, topsheet_number, topsheet_date, customer_name, customer_address, status, created_utc \
             FROM topsheets WHERE owner_id = $1 ORDER BY topsheet_date DESC, topsheet_number DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(topsheets)
    }

    /// Delete a topsheet. Member jobs are unlinked (topsheet_id set NULL by
    /// the FK rule), never deleted.
    pub async fn delete_topsheet(&self, owner_id: Uuid, topsheet_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM topsheets WHERE owner_id = $1 AND topsheet_id = $2")
            .bind(owner_id)
            .bind(topsheet_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load the fully-materialized member jobs of a topsheet.
    pub async fn topsheet_member_snapshots(
        &self,
        owner_id: Uuid,
        topsheet_id: Uuid,
    ) -> Result<Vec<JobSnapshot>, AppError> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE owner_id = $1 AND topsheet_id = $2 ORDER BY created_utc",
            JOB_COLUMNS
        ))
        .bind(owner_id)
        .bind(topsheet_id)
        .fetch_all(&self.pool)
        .await?;

        self.assemble_snapshots(jobs).await
    }

    // -------------------------------------------------------------------------
    // Dashboard Queries
    // -------------------------------------------------------------------------

    /// All job snapshots whose job_date falls in the given calendar year.
    pub async fn snapshots_for_year(
        &self,
        owner_id: Uuid,
        year: i32,
    ) -> Result<Vec<JobSnapshot>, AppError> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE owner_id = $1 AND date_part('year', job_date) = $2",
            JOB_COLUMNS
        ))
        .bind(owner_id)
        .bind(year as f64)
        .fetch_all(&self.pool)
        .await?;

        self.assemble_snapshots(jobs).await
    }

    pub async fn topsheets_for_year(
        &self,
        owner_id: Uuid,
        year: i32,
    ) -> Result<Vec<Topsheet>, AppError> {
        let topsheets = sqlx::query_as::<_, Topsheet>(
            "SELECT topsheet_id, owner_id, topsheet_number, topsheet_date, customer_name, customer_address, status, created_utc \
             FROM topsheets WHERE owner_id = $1 AND date_part('year', topsheet_date) = $2",
        )
        .bind(owner_id)
        .bind(year as f64)
        .fetch_all(&self.pool)
        .await?;
        Ok(topsheets)
    }

    // -------------------------------------------------------------------------
    // Settings Store
    // -------------------------------------------------------------------------

    pub async fn get_setting(&self, owner_id: Uuid, key: &str) -> Result<Option<Setting>, AppError> {
        let setting = sqlx::query_as::<_, Setting>(
            "SELECT owner_id, key, value, updated_utc FROM settings WHERE owner_id = $1 AND key = $2",
        )
        .bind(owner_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(setting)
    }

    pub async fn put_setting(
        &self,
        owner_id: Uuid,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<Setting, AppError> {
        let setting = sqlx::query_as::<_, Setting>(
            r#"
            INSERT INTO settings (owner_id, key, value, updated_utc)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (owner_id, key) DO UPDATE SET value = $3, updated_utc = now()
            RETURNING owner_id, key, value, updated_utc
            "#,
        )
        .bind(owner_id)
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok(setting)
    }

    // -------------------------------------------------------------------------
    // Snapshot Assembly
    // -------------------------------------------------------------------------

    /// Attach items (with measurements, sort-ordered) and active expenses
    /// to a batch of job rows.
    async fn assemble_snapshots(&self, jobs: Vec<Job>) -> Result<Vec<JobSnapshot>, AppError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        let job_ids: Vec<Uuid> = jobs.iter().map(|j| j.job_id).collect();

        let items = sqlx::query_as::<_, LineItem>(
            "SELECT line_item_id, job_id, owner_id, serial_no, description, extra_details, \
             quantity, unit, unit_price, buy_price, discount_percent, vat_rate, subtotal, \
             discount_amount, vat_amount, total, auto_calculate_sqft, calculated_sqft, created_utc \
             FROM line_items WHERE job_id = ANY($1) ORDER BY job_id, serial_no",
        )
        .bind(&job_ids)
        .fetch_all(&self.pool)
        .await?;

        let item_ids: Vec<Uuid> = items.iter().map(|i| i.line_item_id).collect();
        let measurements = if item_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, Measurement>(
                "SELECT measurement_id, line_item_id, owner_id, width_feet, width_inches, \
                 height_feet, height_inches, quantity, area_sqft, description, sort_order \
                 FROM measurements WHERE line_item_id = ANY($1) ORDER BY line_item_id, sort_order",
            )
            .bind(&item_ids)
            .fetch_all(&self.pool)
            .await?
        };

        let expenses = sqlx::query_as::<_, Expense>(
            "SELECT expense_id, job_id, owner_id, description, category, amount, expense_date, \
             is_active, created_utc \
             FROM expenses WHERE job_id = ANY($1) AND is_active = TRUE ORDER BY created_utc",
        )
        .bind(&job_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut measurements_by_item: HashMap<Uuid, Vec<Measurement>> = HashMap::new();
        for m in measurements {
            measurements_by_item.entry(m.line_item_id).or_default().push(m);
        }

        let mut items_by_job: HashMap<Uuid, Vec<ItemWithMeasurements>> = HashMap::new();
        for item in items {
            let measurements = measurements_by_item
                .remove(&item.line_item_id)
                .unwrap_or_default();
            items_by_job
                .entry(item.job_id)
                .or_default()
                .push(ItemWithMeasurements { item, measurements });
        }

        let mut expenses_by_job: HashMap<Uuid, Vec<Expense>> = HashMap::new();
        for e in expenses {
            expenses_by_job.entry(e.job_id).or_default().push(e);
        }

        Ok(jobs
            .into_iter()
            .map(|job| {
                let items = items_by_job.remove(&job.job_id).unwrap_or_default();
                let expenses = expenses_by_job.remove(&job.job_id).unwrap_or_default();
                JobSnapshot {
                    job,
                    items,
                    expenses,
                }
            })
            .collect())
    }
}

/// Insert the item set (serials 1..N from submission order) and their
/// measurement batches inside the caller's transaction.
async fn insert_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner_id: Uuid,
    job_id: Uuid,
    items: &[LineItemPayload],
    lines: &[pricing::CalculatedLine],
) -> Result<(), AppError> {
    for (index, (item, line)) in items.iter().zip(lines.iter()).enumerate() {
        let line_item_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO line_items (line_item_id, job_id, owner_id, serial_no, description,
                extra_details, quantity, unit, unit_price, buy_price, discount_percent, vat_rate,
                subtotal, discount_amount, vat_amount, total, auto_calculate_sqft, calculated_sqft)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(line_item_id)
        .bind(job_id)
        .bind(owner_id)
        .bind((index + 1) as i32)
        .bind(&item.description)
        .bind(&item.extra_details)
        .bind(item.quantity.unwrap_or(Decimal::ZERO))
        .bind(&item.unit)
        .bind(item.unit_price.unwrap_or(Decimal::ZERO))
        .bind(item.buy_price.unwrap_or(Decimal::ZERO))
        .bind(item.discount_percent.unwrap_or(Decimal::ZERO))
        .bind(item.vat_rate.unwrap_or(Decimal::ZERO))
        .bind(line.subtotal)
        .bind(line.discount_amount)
        .bind(line.vat_amount)
        .bind(line.total)
        .bind(item.auto_calculate_sqft)
        .bind(item.calculated_sqft)
        .execute(&mut **tx)
        .await?;

        for (sort_order, m) in item.measurements.iter().enumerate() {
            let area = pricing::measurement_area(
                m.width_feet,
                m.width_inches,
                m.height_feet,
                m.height_inches,
                m.quantity,
            );
            sqlx::query(
                r#"
                INSERT INTO measurements (measurement_id, line_item_id, owner_id, width_feet,
                    width_inches, height_feet, height_inches, quantity, area_sqft, description, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(line_item_id)
            .bind(owner_id)
            .bind(m.width_feet)
            .bind(m.width_inches)
            .bind(m.height_feet)
            .bind(m.height_inches)
            .bind(m.quantity)
            .bind(area)
            .bind(&m.description)
            .bind(sort_order as i32)
            .execute(&mut **tx)
            .await?;
        }
    }
    Ok(())
}

/// Connect member jobs to a topsheet within the caller's transaction.
async fn connect_members(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner_id: Uuid,
    topsheet_id: Uuid,
    job_ids: &[Uuid],
) -> Result<(), AppError> {
    if job_ids.is_empty() {
        return Ok(());
    }
    sqlx::query("UPDATE jobs SET topsheet_id = $1 WHERE owner_id = $2 AND job_id = ANY($3)")
        .bind(topsheet_id)
        .bind(owner_id)
        .bind(job_ids)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
