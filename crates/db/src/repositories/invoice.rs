//! Invoice repository for database operations.
//!
//! Creation assigns the next invoice number for the owning user and leans on
//! the `(user_id, invoice_number)` unique constraint to catch concurrent
//! allocations: on a collision the sequence is re-read and the insert retried.
//! All queries are scoped to the owning user; another account's invoice is
//! indistinguishable from a missing one.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::warn;
use uuid::Uuid;

use invoya_core::invoice::sequence::NUMBER_PREFIX;
use invoya_core::invoice::{
    InvoiceStatus, InvoiceTotals, LineItem, check_transition, compute_totals, line_amount,
    next_invoice_number, validate_items, validate_tax_rate,
};

use crate::entities::{clients, invoice_items, invoices};
use crate::repositories::email_log::EmailKind;

/// How many times an insert is retried after an invoice number collision.
const NUMBER_ALLOCATION_ATTEMPTS: u32 = 3;

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice not found (or owned by another account).
    #[error("Invoice not found: {0}")]
    NotFound(Uuid),

    /// Referenced client not found (or owned by another account).
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// Invoice number allocation kept colliding with concurrent inserts.
    #[error("Could not allocate a unique invoice number, please retry")]
    NumberConflict,

    /// Domain rule violation (validation or lifecycle).
    #[error(transparent)]
    Lifecycle(#[from] invoya_core::invoice::InvoiceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Owning user ID.
    pub user_id: Uuid,
    /// Client being billed.
    pub client_id: Uuid,
    /// Initial status; defaults to draft. Only draft and sent are accepted.
    pub status: Option<InvoiceStatus>,
    /// Date the invoice is issued.
    pub issue_date: NaiveDate,
    /// Date payment is due.
    pub due_date: NaiveDate,
    /// Tax rate in percent.
    pub tax_rate: Decimal,
    /// Free-form notes shown on the invoice.
    pub notes: Option<String>,
    /// Line items; amounts are derived, never accepted.
    pub items: Vec<LineItem>,
}

/// Input for updating an invoice.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceInput {
    /// Client being billed.
    pub client_id: Option<Uuid>,
    /// Requested status change, validated against the lifecycle.
    pub status: Option<InvoiceStatus>,
    /// Date the invoice is issued.
    pub issue_date: Option<NaiveDate>,
    /// Date payment is due.
    pub due_date: Option<NaiveDate>,
    /// Tax rate in percent.
    pub tax_rate: Option<Decimal>,
    /// Free-form notes shown on the invoice.
    pub notes: Option<Option<String>>,
    /// Replacement line items; totals are recomputed when present.
    pub items: Option<Vec<LineItem>>,
}

/// An invoice with its client and ordered line items.
#[derive(Debug, Clone)]
pub struct InvoiceDetail {
    /// The invoice record.
    pub invoice: invoices::Model,
    /// The billed client.
    pub client: clients::Model,
    /// Line items in display order.
    pub items: Vec<invoice_items::Model>,
}

/// Invoice repository for CRUD and lifecycle operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an invoice with derived totals and a freshly assigned number.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Line items or the tax rate fail validation
    /// - The requested initial status is anything other than draft or sent
    /// - The client does not exist for this user
    /// - Number allocation keeps colliding with concurrent inserts
    pub async fn create(&self, input: CreateInvoiceInput) -> Result<InvoiceDetail, InvoiceError> {
        validate_items(&input.items)?;
        validate_tax_rate(input.tax_rate)?;

        let status = input.status.unwrap_or(InvoiceStatus::Draft);
        check_transition(InvoiceStatus::Draft, status)?;

        let client = clients::Entity::find_by_id(input.client_id)
            .filter(clients::Column::UserId.eq(input.user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::ClientNotFound(input.client_id))?;

        let totals = compute_totals(&input.items, input.tax_rate);

        let mut attempt = 1;
        loop {
            let last = self.last_invoice_number(input.user_id).await?;
            let number = next_invoice_number(last.as_deref(), Utc::now().year());

            match self.try_insert(&input, status, &totals, &number).await {
                Ok((invoice, items)) => {
                    return Ok(InvoiceDetail {
                        invoice,
                        client,
                        items,
                    });
                }
                Err(err) => {
                    let collision =
                        matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)));
                    if !collision {
                        return Err(err.into());
                    }
                    if attempt >= NUMBER_ALLOCATION_ATTEMPTS {
                        return Err(InvoiceError::NumberConflict);
                    }
                    warn!(
                        user_id = %input.user_id,
                        number,
                        attempt,
                        "invoice number already taken, re-reading sequence"
                    );
                    attempt += 1;
                }
            }
        }
    }

    /// Lists invoices for a user with their clients, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        status: Option<InvoiceStatus>,
    ) -> Result<Vec<(invoices::Model, clients::Model)>, InvoiceError> {
        let mut query = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .order_by_desc(invoices::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(invoices::Column::Status.eq(status.as_str()));
        }

        let rows = query
            .find_also_related(clients::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(invoice, client)| client.map(|c| (invoice, c)))
            .collect())
    }

    /// Finds an invoice with its client and line items, scoped to the owner.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` if no such invoice exists for this
    /// user.
    pub async fn find(&self, user_id: Uuid, id: Uuid) -> Result<InvoiceDetail, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let client = clients::Entity::find_by_id(invoice.client_id)
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::ClientNotFound(invoice.client_id))?;

        let items = invoice_items::Entity::find()
            .filter(invoice_items::Column::InvoiceId.eq(id))
            .order_by_asc(invoice_items::Column::Position)
            .all(&self.db)
            .await?;

        Ok(InvoiceDetail {
            invoice,
            client,
            items,
        })
    }

    /// Updates an invoice, recomputing totals when items or tax rate change.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The invoice or a newly referenced client does not exist for this user
    /// - A requested status change is not allowed by the lifecycle
    /// - Replacement items or the new tax rate fail validation
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateInvoiceInput,
    ) -> Result<InvoiceDetail, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let current: InvoiceStatus = invoice.status.parse()?;

        if let Some(next) = input.status {
            check_transition(current, next)?;
        }
        if let Some(tax_rate) = input.tax_rate {
            validate_tax_rate(tax_rate)?;
        }
        if let Some(items) = &input.items {
            validate_items(items)?;
        }
        if let Some(client_id) = input.client_id {
            let owned = clients::Entity::find_by_id(client_id)
                .filter(clients::Column::UserId.eq(user_id))
                .one(&self.db)
                .await?;
            if owned.is_none() {
                return Err(InvoiceError::ClientNotFound(client_id));
            }
        }

        // Totals are derived: any change to items or tax rate recomputes them.
        let totals = if input.items.is_some() || input.tax_rate.is_some() {
            let effective_tax_rate = input.tax_rate.unwrap_or(invoice.tax_rate);
            let items = match &input.items {
                Some(items) => items.clone(),
                None => self.load_line_items(id).await?,
            };
            Some(compute_totals(&items, effective_tax_rate))
        } else {
            None
        };

        let now = Utc::now().into();
        let txn = self.db.begin().await?;

        let mut active: invoices::ActiveModel = invoice.into();
        if let Some(client_id) = input.client_id {
            active.client_id = Set(client_id);
        }
        if let Some(next) = input.status {
            active.status = Set(next.as_str().to_string());
            if next == InvoiceStatus::Paid && current != InvoiceStatus::Paid {
                active.paid_at = Set(Some(now));
            }
        }
        if let Some(issue_date) = input.issue_date {
            active.issue_date = Set(issue_date);
        }
        if let Some(due_date) = input.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(tax_rate) = input.tax_rate {
            active.tax_rate = Set(tax_rate);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        if let Some(totals) = totals {
            active.subtotal = Set(totals.subtotal);
            active.tax_amount = Set(totals.tax_amount);
            active.total = Set(totals.total);
        }
        active.updated_at = Set(now);
        active.update(&txn).await?;

        if let Some(items) = &input.items {
            invoice_items::Entity::delete_many()
                .filter(invoice_items::Column::InvoiceId.eq(id))
                .exec(&txn)
                .await?;
            Self::insert_items(&txn, id, items).await?;
        }

        txn.commit().await?;

        self.find(user_id, id).await
    }

    /// Deletes an invoice and its line items.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` if no such invoice exists for this
    /// user.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), InvoiceError> {
        let result = invoices::Entity::delete_many()
            .filter(invoices::Column::Id.eq(id))
            .filter(invoices::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(InvoiceError::NotFound(id));
        }
        Ok(())
    }

    /// Records that the invoice was emailed to its client.
    ///
    /// Stamps `last_emailed_at`. Sending the invoice itself promotes a draft
    /// to sent; reminders never touch the status.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice does not exist for this user or the
    /// database update fails.
    pub async fn record_email_sent(
        &self,
        user_id: Uuid,
        id: Uuid,
        kind: EmailKind,
    ) -> Result<invoices::Model, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let current: InvoiceStatus = invoice.status.parse()?;
        let now = Utc::now().into();

        let mut active: invoices::ActiveModel = invoice.into();
        active.last_emailed_at = Set(Some(now));
        if current == InvoiceStatus::Draft && kind == EmailKind::Invoice {
            active.status = Set(InvoiceStatus::Sent.as_str().to_string());
        }
        active.updated_at = Set(now);

        Ok(active.update(&self.db).await?)
    }

    /// Applies a confirmed payment to an invoice.
    ///
    /// Payment reconciliation bypasses the caller-facing lifecycle: any
    /// unpaid invoice moves straight to paid, with `paid_at` stamped from the
    /// provider's event time rather than processing time. Returns `None` when
    /// the invoice was already paid, which makes provider event replays
    /// harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice does not exist for this user or the
    /// database update fails.
    pub async fn mark_paid(
        &self,
        user_id: Uuid,
        id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<invoices::Model>, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let current: InvoiceStatus = invoice.status.parse()?;
        if current == InvoiceStatus::Paid {
            return Ok(None);
        }

        let mut active: invoices::ActiveModel = invoice.into();
        active.status = Set(InvoiceStatus::Paid.as_str().to_string());
        active.paid_at = Set(Some(paid_at.into()));
        active.updated_at = Set(Utc::now().into());

        Ok(Some(active.update(&self.db).await?))
    }

    /// Reverts an invoice after a failed or reversed payment.
    ///
    /// A paid invoice drops back to sent with `paid_at` cleared so it shows
    /// as outstanding again. Invoices that were never paid are left alone and
    /// `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice does not exist for this user or the
    /// database update fails.
    pub async fn mark_payment_failed(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<invoices::Model>, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let current: InvoiceStatus = invoice.status.parse()?;
        if current != InvoiceStatus::Paid {
            return Ok(None);
        }

        let now = Utc::now().into();
        let mut active: invoices::ActiveModel = invoice.into();
        active.status = Set(InvoiceStatus::Sent.as_str().to_string());
        active.paid_at = Set(None);
        active.updated_at = Set(now);

        Ok(Some(active.update(&self.db).await?))
    }

    /// Finds the owner's greatest invoice number, if any.
    ///
    /// Zero-padded counters keep lexicographic and numeric order identical,
    /// so a descending string sort finds the latest number.
    async fn last_invoice_number(&self, user_id: Uuid) -> Result<Option<String>, DbErr> {
        let pattern = format!("{NUMBER_PREFIX}%");
        let last = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::InvoiceNumber.like(&pattern))
            .order_by_desc(invoices::Column::InvoiceNumber)
            .one(&self.db)
            .await?;

        Ok(last.map(|invoice| invoice.invoice_number))
    }

    /// Inserts the invoice row and its items in one transaction.
    async fn try_insert(
        &self,
        input: &CreateInvoiceInput,
        status: InvoiceStatus,
        totals: &InvoiceTotals,
        number: &str,
    ) -> Result<(invoices::Model, Vec<invoice_items::Model>), DbErr> {
        let txn = self.db.begin().await?;
        let now = Utc::now().into();

        let invoice = invoices::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            client_id: Set(input.client_id),
            invoice_number: Set(number.to_string()),
            status: Set(status.as_str().to_string()),
            issue_date: Set(input.issue_date),
            due_date: Set(input.due_date),
            subtotal: Set(totals.subtotal),
            tax_rate: Set(input.tax_rate),
            tax_amount: Set(totals.tax_amount),
            total: Set(totals.total),
            notes: Set(input.notes.clone()),
            paid_at: Set(None),
            last_emailed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let items = Self::insert_items(&txn, invoice.id, &input.items).await?;

        txn.commit().await?;
        Ok((invoice, items))
    }

    /// Inserts line items with derived amounts and display positions.
    async fn insert_items(
        txn: &DatabaseTransaction,
        invoice_id: Uuid,
        items: &[LineItem],
    ) -> Result<Vec<invoice_items::Model>, DbErr> {
        let mut rows = Vec::with_capacity(items.len());
        let mut position: i32 = 0;

        for item in items {
            let row = invoice_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                invoice_id: Set(invoice_id),
                description: Set(item.description.clone()),
                quantity: Set(item.quantity),
                rate: Set(item.rate),
                amount: Set(line_amount(item.quantity, item.rate)),
                position: Set(position),
            }
            .insert(txn)
            .await?;

            rows.push(row);
            position += 1;
        }

        Ok(rows)
    }

    /// Loads the stored line items mapped back to domain values.
    async fn load_line_items(&self, invoice_id: Uuid) -> Result<Vec<LineItem>, DbErr> {
        let rows = invoice_items::Entity::find()
            .filter(invoice_items::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(invoice_items::Column::Position)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| LineItem {
                description: row.description,
                quantity: row.quantity,
                rate: row.rate,
            })
            .collect())
    }
}
