//! `LedgerRepository` for `PgMarketplaceStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spinandsell_core::error::DomainError;
use spinandsell_core::model::{InvoiceAttachment, LedgerEntry, SaleRecording};
use spinandsell_core::repository::LedgerRepository;
use uuid::Uuid;

use crate::error::db_error;
use crate::pg_marketplace_store::PgMarketplaceStore;
use crate::rows::LedgerRow;

#[async_trait]
impl LedgerRepository for PgMarketplaceStore {
    async fn record_sale(
        &self,
        entry: &LedgerEntry,
        sold_at: DateTime<Utc>,
    ) -> Result<SaleRecording, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // A concurrent insert of the same session blocks here until the other
        // transaction finishes, then falls through to the existing row.
        let inserted = sqlx::query_as::<_, LedgerRow>(
            "INSERT INTO ledger_entries (id, payment_session_id, payment_intent_id, listing_id, \
             seller_id, buyer_id, amount, platform_fee, currency, status, invoice_number, \
             invoice_url, tax_amount, metadata, created_at, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             ON CONFLICT (payment_session_id) DO NOTHING \
             RETURNING *",
        )
        .bind(entry.id)
        .bind(&entry.payment_session_id)
        .bind(&entry.payment_intent_id)
        .bind(entry.listing_id)
        .bind(entry.seller_id)
        .bind(entry.buyer_id)
        .bind(entry.amount)
        .bind(entry.platform_fee)
        .bind(&entry.currency)
        .bind(entry.status.as_str())
        .bind(&entry.invoice_number)
        .bind(&entry.invoice_url)
        .bind(entry.tax_amount)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .bind(entry.completed_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let Some(row) = inserted else {
            tx.rollback().await.map_err(db_error)?;
            let existing = self
                .find_by_payment_session(&entry.payment_session_id)
                .await?
                .ok_or_else(|| DomainError::not_found("ledger entry", &entry.payment_session_id))?;
            return Ok(SaleRecording::AlreadyRecorded(existing));
        };

        let updated = sqlx::query(
            "UPDATE listings SET sold = TRUE, paid = TRUE, buyer_id = $2, \
             sold_at = COALESCE(sold_at, $3) \
             WHERE id = $1 AND (sold = FALSE OR buyer_id = $2)",
        )
        .bind(entry.listing_id)
        .bind(entry.buyer_id)
        .bind(sold_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();

        if updated == 0 {
            let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM listings WHERE id = $1")
                .bind(entry.listing_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?
                .is_some();
            tx.rollback().await.map_err(db_error)?;
            return Err(if exists {
                DomainError::Conflict(format!(
                    "listing {} already sold to another buyer",
                    entry.listing_id
                ))
            } else {
                DomainError::not_found("listing", entry.listing_id)
            });
        }

        tx.commit().await.map_err(db_error)?;
        Ok(SaleRecording::Recorded(LedgerEntry::try_from(row)?))
    }

    async fn attach_invoice(
        &self,
        entry_id: Uuid,
        invoice: &InvoiceAttachment,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE ledger_entries SET invoice_number = $2, invoice_url = $3, tax_amount = $4 \
             WHERE id = $1",
        )
        .bind(entry_id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.invoice_url)
        .bind(invoice.tax_amount)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("ledger entry", entry_id));
        }
        Ok(())
    }

    async fn find_by_payment_session(
        &self,
        payment_session_id: &str,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        sqlx::query_as::<_, LedgerRow>("SELECT * FROM ledger_entries WHERE payment_session_id = $1")
            .bind(payment_session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(LedgerEntry::try_from)
            .transpose()
    }
}
