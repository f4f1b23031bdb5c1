//! Post-payment fulfillment workflow.
//!
//! The ledger entry and the listing's sold transition are committed together.
//! Everything after that is best-effort: invoice, notifications and the sale
//! thread each report their own outcome and never undo the sale.

use spinandsell_core::error::DomainError;
use spinandsell_core::mail::OutboundEmail;
use spinandsell_core::model::{
    InvoiceAttachment, LedgerEntry, LedgerStatus, Listing, SaleRecording, User,
};
use spinandsell_core::payment::ProviderSession;
use spinandsell_messaging::application::command_handlers::handle_open_sale_thread;
use spinandsell_messaging::domain::commands::OpenSaleThread;
use uuid::Uuid;

use super::CheckoutServices;
use crate::domain::invoice::{INVOICE_CONTENT_TYPE, InvoiceDocument, InvoiceTotals, invoice_number};
use crate::domain::metadata::SaleMetadata;
use crate::domain::notifications::SaleNotice;
use crate::domain::report::{FulfillmentReport, FulfillmentStatus, FulfillmentStep, StepResult};

/// Loaded participants of a sale.
struct SaleContext {
    metadata: SaleMetadata,
    listing: Listing,
    buyer: User,
    seller: User,
}

/// Runs the fulfillment workflow for a completed checkout session.
///
/// Problems with the session itself (bad metadata, unknown listing or users,
/// a listing already sold to someone else) produce an `Aborted` report, since
/// redelivering the same event cannot fix them.
///
/// # Errors
///
/// Returns `DomainError` only when loading context or recording the sale
/// fails for a transient reason, so the provider redelivers the event.
#[tracing::instrument(skip_all, fields(session_id = %session.id, %correlation_id))]
pub async fn fulfill_checkout(
    session: &ProviderSession,
    correlation_id: Uuid,
    services: CheckoutServices<'_>,
) -> Result<FulfillmentReport, DomainError> {
    let metadata = match SaleMetadata::parse(&session.metadata) {
        Ok(metadata) => metadata,
        Err(err) => {
            tracing::error!(error = %err, "unusable checkout session metadata");
            return Ok(FulfillmentReport::aborted(&session.id, err.to_string()));
        }
    };

    let context = match load_context(metadata, services).await? {
        Ok(context) => context,
        Err(reason) => {
            tracing::error!(listing_id = %metadata.listing_id, reason = %reason, "fulfillment aborted");
            return Ok(FulfillmentReport::aborted(&session.id, reason));
        }
    };

    let entry = ledger_entry(session, &context, services);
    let entry = match services.ledger.record_sale(&entry, entry.created_at).await {
        Ok(SaleRecording::Recorded(entry)) => entry,
        Ok(SaleRecording::AlreadyRecorded(existing)) => {
            tracing::info!(ledger_entry_id = %existing.id, "sale already recorded");
            return Ok(FulfillmentReport {
                session_id: session.id.clone(),
                ledger_entry_id: Some(existing.id),
                status: FulfillmentStatus::AlreadyProcessed,
                steps: Vec::new(),
            });
        }
        Err(err @ (DomainError::Conflict(_) | DomainError::NotFound { .. })) => {
            tracing::error!(
                listing_id = %context.listing.id,
                buyer_id = %context.buyer.id,
                error = %err,
                "payment received for a listing that cannot be sold; refund manually"
            );
            return Ok(FulfillmentReport::aborted(&session.id, err.to_string()));
        }
        Err(err) => return Err(err),
    };
    tracing::info!(
        ledger_entry_id = %entry.id,
        listing_id = %entry.listing_id,
        amount = entry.amount,
        platform_fee = entry.platform_fee,
        "sale recorded"
    );

    let mut steps = Vec::with_capacity(4);
    let (invoice_step, entry) = issue_invoice(entry, &context, services).await;
    steps.push(invoice_step);

    let notice = SaleNotice {
        entry: &entry,
        listing: &context.listing,
        buyer: &context.buyer,
        seller: &context.seller,
        base_url: &services.settings.base_url,
    };
    steps.push(
        deliver(
            FulfillmentStep::BuyerNotification,
            notice.buyer_confirmation(),
            services,
        )
        .await,
    );
    steps.push(
        deliver(
            FulfillmentStep::SellerNotification,
            notice.seller_notification(),
            services,
        )
        .await,
    );
    steps.push(open_sale_thread(&context, correlation_id, services).await);

    let report = FulfillmentReport {
        session_id: session.id.clone(),
        ledger_entry_id: Some(entry.id),
        status: FulfillmentStatus::Fulfilled,
        steps,
    };
    for (step, reason) in report.failures() {
        tracing::warn!(ledger_entry_id = %entry.id, %step, reason, "fulfillment step failed");
    }
    Ok(report)
}

/// Outer `Err` is a transient failure; inner `Err` is a reason to abort.
async fn load_context(
    metadata: SaleMetadata,
    services: CheckoutServices<'_>,
) -> Result<Result<SaleContext, String>, DomainError> {
    let Some(listing) = services.listings.find_listing(metadata.listing_id).await? else {
        return Ok(Err(format!("listing {} not found", metadata.listing_id)));
    };
    if listing.seller_id != metadata.seller_id {
        return Ok(Err(format!(
            "seller {} does not own listing {}",
            metadata.seller_id, listing.id
        )));
    }
    let Some(buyer) = services.users.find_user(metadata.buyer_id).await? else {
        return Ok(Err(format!("buyer {} not found", metadata.buyer_id)));
    };
    let Some(seller) = services.users.find_user(metadata.seller_id).await? else {
        return Ok(Err(format!("seller {} not found", metadata.seller_id)));
    };
    Ok(Ok(SaleContext {
        metadata,
        listing,
        buyer,
        seller,
    }))
}

fn ledger_entry(
    session: &ProviderSession,
    context: &SaleContext,
    services: CheckoutServices<'_>,
) -> LedgerEntry {
    let now = services.clock.now();
    let amount = session.amount_total.unwrap_or(context.listing.price);
    let platform_fee = context
        .metadata
        .platform_fee
        .unwrap_or_else(|| services.settings.fees.platform_fee(amount));
    let metadata = session
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect::<serde_json::Map<_, _>>();

    LedgerEntry {
        id: Uuid::new_v4(),
        payment_session_id: session.id.clone(),
        payment_intent_id: session.payment_intent_id.clone(),
        listing_id: context.listing.id,
        seller_id: context.seller.id,
        buyer_id: context.buyer.id,
        amount,
        platform_fee,
        currency: session
            .currency
            .clone()
            .unwrap_or_else(|| services.settings.currency.clone()),
        status: LedgerStatus::Completed,
        invoice_number: None,
        invoice_url: None,
        tax_amount: None,
        metadata: serde_json::Value::Object(metadata),
        created_at: now,
        completed_at: Some(now),
    }
}

async fn issue_invoice(
    mut entry: LedgerEntry,
    context: &SaleContext,
    services: CheckoutServices<'_>,
) -> (StepResult, LedgerEntry) {
    let number = invoice_number(services.clock.current_year(), entry.id);
    let tax_rate_percent = services.settings.tax_rate_percent;
    let document = InvoiceDocument {
        number: &number,
        issued_at: services.clock.now(),
        entry: &entry,
        listing: &context.listing,
        buyer: &context.buyer,
        seller: &context.seller,
        totals: InvoiceTotals::compute(entry.amount, entry.platform_fee, tax_rate_percent),
        tax_rate_percent,
    };
    let tax_amount = document.totals.tax;
    let html = document.render_html();

    let url = match services
        .documents
        .store(&document.file_name(), INVOICE_CONTENT_TYPE, html.into_bytes())
        .await
    {
        Ok(url) => url,
        Err(err) => return (StepResult::failed(FulfillmentStep::Invoice, err.to_string()), entry),
    };

    let attachment = InvoiceAttachment {
        invoice_number: number,
        invoice_url: url,
        tax_amount,
    };
    if let Err(err) = services.ledger.attach_invoice(entry.id, &attachment).await {
        return (StepResult::failed(FulfillmentStep::Invoice, err.to_string()), entry);
    }
    tracing::info!(invoice_number = %attachment.invoice_number, "invoice issued");

    entry.invoice_number = Some(attachment.invoice_number);
    entry.invoice_url = Some(attachment.invoice_url);
    entry.tax_amount = Some(attachment.tax_amount);
    (StepResult::completed(FulfillmentStep::Invoice), entry)
}

async fn deliver(
    step: FulfillmentStep,
    email: OutboundEmail,
    services: CheckoutServices<'_>,
) -> StepResult {
    if email.to.trim().is_empty() {
        return StepResult::skipped(step, "recipient has no e-mail address");
    }
    match services.mailer.send(&email).await {
        Ok(()) => StepResult::completed(step),
        Err(err) => StepResult::failed(step, err.to_string()),
    }
}

async fn open_sale_thread(
    context: &SaleContext,
    correlation_id: Uuid,
    services: CheckoutServices<'_>,
) -> StepResult {
    let command = OpenSaleThread {
        correlation_id,
        buyer_id: context.buyer.id,
        seller_id: context.seller.id,
        listing_id: context.listing.id,
        greeting: sale_greeting(&context.listing),
    };
    match handle_open_sale_thread(&command, services.clock, services.threads).await {
        Ok(_) => StepResult::completed(FulfillmentStep::SaleThread),
        Err(err) => StepResult::failed(FulfillmentStep::SaleThread, err.to_string()),
    }
}

/// Longest listing title quoted in the greeting.
const GREETING_TITLE_CHARS: usize = 200;

/// The buyer's first message. Titles are shortened so the greeting always
/// fits a message, whatever the listing's brand and model lengths.
fn sale_greeting(listing: &Listing) -> String {
    let title = listing.title();
    let title = if title.chars().count() > GREETING_TITLE_CHARS {
        let mut short: String = title.chars().take(GREETING_TITLE_CHARS - 1).collect();
        short.push('…');
        short
    } else {
        title
    };
    format!("¡Hola! Acabo de comprar tu {title}. ¿Cuándo podemos coordinar la entrega?")
}
