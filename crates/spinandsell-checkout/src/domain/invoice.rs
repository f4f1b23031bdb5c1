//! Invoice numbering, tax and HTML rendering.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use spinandsell_core::model::{LedgerEntry, Listing, User};
use spinandsell_core::money::{MinorUnits, format_minor_units, percent_of};
use uuid::Uuid;

use super::html::escape;

/// Content type of rendered invoices.
pub const INVOICE_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Issuer details printed on every invoice.
#[derive(Debug, Clone, Copy)]
pub struct Issuer {
    pub name: &'static str,
    pub address: &'static str,
    pub tax_id: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
}

pub const ISSUER: Issuer = Issuer {
    name: "SpinAndSell S.L.",
    address: "Calle Principal 123, 28001 Madrid, España",
    tax_id: "B12345678",
    email: "facturacion@spinandsell.com",
    phone: "+34 900 123 456",
};

/// `INV-{year}-{last 8 characters of the id, uppercased}`.
#[must_use]
pub fn invoice_number(year: i32, ledger_entry_id: Uuid) -> String {
    let id = ledger_entry_id.to_string();
    let tail = &id[id.len() - 8..];
    format!("INV-{year}-{}", tail.to_uppercase())
}

/// Amount, fee and tax breakdown of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub amount: MinorUnits,
    pub platform_fee: MinorUnits,
    pub subtotal: MinorUnits,
    pub tax: MinorUnits,
}

impl InvoiceTotals {
    /// Tax is charged on the amount net of the platform fee.
    #[must_use]
    pub fn compute(amount: MinorUnits, platform_fee: MinorUnits, tax_rate_percent: u32) -> Self {
        let subtotal = amount - platform_fee;
        Self {
            amount,
            platform_fee,
            subtotal,
            tax: percent_of(subtotal, tax_rate_percent),
        }
    }
}

/// Everything printed on an invoice.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceDocument<'a> {
    pub number: &'a str,
    pub issued_at: DateTime<Utc>,
    pub entry: &'a LedgerEntry,
    pub listing: &'a Listing,
    pub buyer: &'a User,
    pub seller: &'a User,
    pub totals: InvoiceTotals,
    pub tax_rate_percent: u32,
}

impl InvoiceDocument<'_> {
    /// File name under which the invoice is stored.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.html", self.number)
    }

    /// Renders the invoice as a standalone HTML page. Every user-supplied
    /// field is escaped.
    #[must_use]
    pub fn render_html(&self) -> String {
        let currency = escape(&self.entry.currency.to_uppercase());
        let money = |amount: MinorUnits| format!("{} {currency}", format_minor_units(amount));
        let issuer = ISSUER;
        let mut html = String::with_capacity(4096);

        html.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"UTF-8\">\n");
        let _ = writeln!(html, "<title>Factura {}</title>", escape(self.number));
        html.push_str(
            "<style>body{font-family:Arial,sans-serif;color:#333}\
             .invoice{max-width:800px;margin:0 auto}\
             h3{color:#10B981;border-bottom:2px solid #10B981}\
             table{width:100%;border-collapse:collapse}\
             td,th{padding:8px;text-align:left;border-bottom:1px solid #ddd}</style>\n",
        );
        html.push_str("</head>\n<body>\n<div class=\"invoice\">\n");

        let _ = writeln!(
            html,
            "<header><strong>{}</strong><p>{}</p><p>CIF: {}</p><p>Email: {}</p><p>Teléfono: {}</p></header>",
            issuer.name, issuer.address, issuer.tax_id, issuer.email, issuer.phone
        );
        let _ = writeln!(
            html,
            "<h2>FACTURA</h2><p><strong>Número:</strong> {}</p><p><strong>Fecha:</strong> {}</p><p><strong>ID Transacción:</strong> {}</p>",
            escape(self.number),
            self.issued_at.format("%d/%m/%Y"),
            escape(&self.entry.payment_session_id)
        );

        let _ = writeln!(
            html,
            "<h3>Datos del Comprador</h3><p><strong>{}</strong></p><p>{}</p>",
            escape(self.buyer.display_name("Cliente")),
            escape(&self.buyer.email)
        );
        let _ = writeln!(
            html,
            "<h3>Datos del Vendedor</h3><p><strong>{}</strong></p><p>{}</p>",
            escape(self.seller.display_name("Vendedor")),
            escape(&self.seller.email)
        );

        html.push_str(
            "<h3>Detalles del Producto</h3>\n<table><thead><tr><th>Descripción</th>\
             <th>Cantidad</th><th>Precio Unitario</th><th>Total</th></tr></thead>\n",
        );
        let _ = writeln!(
            html,
            "<tbody><tr><td>{}</td><td>1</td><td>{amount}</td><td>{amount}</td></tr></tbody></table>",
            escape(&self.listing.title()),
            amount = money(self.totals.amount)
        );

        let _ = writeln!(
            html,
            "<h3>Totales</h3><table>\
             <tr><td>Comisión de plataforma</td><td>{}</td></tr>\
             <tr><td>Subtotal</td><td>{}</td></tr>\
             <tr><td>IVA ({}%)</td><td>{}</td></tr>\
             <tr><td><strong>Total</strong></td><td><strong>{}</strong></td></tr></table>",
            money(self.totals.platform_fee),
            money(self.totals.subtotal),
            self.tax_rate_percent,
            money(self.totals.tax),
            money(self.totals.amount)
        );

        html.push_str("<footer><p>Gracias por confiar en SpinAndSell.</p></footer>\n");
        html.push_str("</div>\n</body>\n</html>\n");
        html
    }
}
