//! E-mail templates sent after a completed sale.

use spinandsell_core::mail::OutboundEmail;
use spinandsell_core::model::{LedgerEntry, Listing, User};
use spinandsell_core::money::{MinorUnits, format_minor_units};

use super::html::escape;

/// Data shared by the buyer and seller notifications.
#[derive(Debug, Clone, Copy)]
pub struct SaleNotice<'a> {
    pub entry: &'a LedgerEntry,
    pub listing: &'a Listing,
    pub buyer: &'a User,
    pub seller: &'a User,
    /// Public base URL without a trailing slash.
    pub base_url: &'a str,
}

impl SaleNotice<'_> {
    fn money(&self, amount: MinorUnits) -> String {
        format!(
            "{} {}",
            format_minor_units(amount),
            escape(&self.entry.currency.to_uppercase())
        )
    }

    fn date(&self) -> String {
        self.entry
            .completed_at
            .unwrap_or(self.entry.created_at)
            .format("%d/%m/%Y")
            .to_string()
    }

    /// Purchase confirmation for the buyer.
    #[must_use]
    pub fn buyer_confirmation(&self) -> OutboundEmail {
        let mut content = format!(
            "<h2>¡Compra realizada con éxito!</h2>\n\
             <p>Hola {buyer},</p>\n\
             <p>Tu compra se ha procesado correctamente.</p>\n\
             <div class=\"product-info\"><h3>{title}</h3>\
             <p class=\"price\">{amount}</p>\
             <p><strong>ID de transacción:</strong> {session}</p>\
             <p><strong>Fecha:</strong> {date}</p></div>\n\
             <h3>Vendedor</h3><p><strong>Nombre:</strong> {seller}</p>\
             <p><strong>Email:</strong> {seller_email}</p>\n\
             <p><a href=\"{base}/mensajes\" class=\"button\">Contactar Vendedor</a></p>\n",
            buyer = escape(self.buyer.display_name("Usuario")),
            title = escape(&self.listing.title()),
            amount = self.money(self.entry.amount),
            session = escape(&self.entry.payment_session_id),
            date = self.date(),
            seller = escape(self.seller.display_name("No especificado")),
            seller_email = escape(&self.seller.email),
            base = self.base_url,
        );
        if let Some(url) = &self.entry.invoice_url {
            content.push_str(&format!(
                "<p><a href=\"{}\" class=\"button\">Descargar Factura</a></p>\n",
                escape(url)
            ));
        }

        OutboundEmail {
            to: self.buyer.email.clone(),
            subject: format!(
                "Compra confirmada - {} {}",
                self.listing.brand, self.listing.model
            ),
            html: layout("Compra Confirmada", &content),
        }
    }

    /// Sale notification for the seller, with the fee and net earnings.
    #[must_use]
    pub fn seller_notification(&self) -> OutboundEmail {
        let content = format!(
            "<h2>¡Tu producto se ha vendido!</h2>\n\
             <p>Hola {seller},</p>\n\
             <div class=\"product-info\"><h3>{title}</h3>\
             <p class=\"price\">{amount}</p>\
             <p><strong>Comisión de plataforma:</strong> {fee}</p>\
             <p><strong>Tu ganancia:</strong> {net}</p></div>\n\
             <h3>Comprador</h3><p><strong>Nombre:</strong> {buyer}</p>\
             <p><strong>Email:</strong> {buyer_email}</p>\n\
             <p><strong>ID de transacción:</strong> {session}</p>\
             <p><strong>Fecha:</strong> {date}</p><p><strong>Estado:</strong> Pagado</p>\n\
             <p><a href=\"{base}/mensajes\" class=\"button\">Ver Mensajes</a> \
             <a href=\"{base}/mis-productos\" class=\"button\">Mis Productos</a></p>\n",
            seller = escape(self.seller.display_name("Usuario")),
            title = escape(&self.listing.title()),
            amount = self.money(self.entry.amount),
            fee = self.money(self.entry.platform_fee),
            net = self.money(self.entry.amount - self.entry.platform_fee),
            buyer = escape(self.buyer.display_name("No especificado")),
            buyer_email = escape(&self.buyer.email),
            session = escape(&self.entry.payment_session_id),
            date = self.date(),
            base = self.base_url,
        );

        OutboundEmail {
            to: self.seller.email.clone(),
            subject: format!(
                "¡Producto vendido! - {} {}",
                self.listing.brand, self.listing.model
            ),
            html: layout("Producto Vendido", &content),
        }
    }
}

fn layout(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"es\">\n<head><meta charset=\"UTF-8\"><title>{title}</title>\
         <style>body{{font-family:Arial,sans-serif;line-height:1.6;color:#333}}\
         .header{{background:#10B981;color:white;padding:20px;text-align:center}}\
         .button{{display:inline-block;background:#10B981;color:white;padding:12px 24px;text-decoration:none;border-radius:6px}}\
         .price{{font-size:24px;font-weight:bold;color:#10B981}}</style></head>\n\
         <body><div class=\"header\"><h1>SpinAndSell</h1><p>{title}</p></div>\n\
         <div class=\"content\">\n{content}</div>\n\
         <div class=\"footer\"><p>SpinAndSell - Marketplace de bicicletas y patinetes</p></div>\n\
         </body>\n</html>\n"
    )
}
