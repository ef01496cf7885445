//! Single-page A4 invoice built with lopdf using the standard Helvetica faces.
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use models::money;

use super::InvoiceDocument;
use crate::errors::ServiceError;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const LEFT: i64 = 50;
const RIGHT: i64 = 545;
const VALUE_X: i64 = 200;
const AMOUNT_X: i64 = 420;

struct Page {
    ops: Vec<Operation>,
    y: i64,
}

impl Page {
    fn new() -> Self { Self { ops: Vec::new(), y: PAGE_HEIGHT - 60 } }

    fn text(&mut self, font: &str, size: i64, x: i64, y: i64, s: &str) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)]));
        self.ops.push(Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]));
        self.ops.push(Operation::new("Tj", vec![Object::string_literal(pdf_safe(s))]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn line(&mut self, font: &str, size: i64, s: &str) {
        let y = self.y;
        self.text(font, size, LEFT, y, s);
        self.y -= size + 8;
    }

    fn field(&mut self, label: &str, value: &str) {
        let y = self.y;
        self.text("F2", 10, LEFT, y, label);
        self.text("F1", 10, VALUE_X, y, value);
        self.y -= 16;
    }

    fn amount(&mut self, font: &str, label: &str, value: &str) {
        let y = self.y;
        self.text(font, 11, LEFT, y, label);
        self.text(font, 11, AMOUNT_X, y, value);
        self.y -= 18;
    }

    fn rule(&mut self) {
        let y = self.y + 4;
        self.ops.push(Operation::new("m", vec![Object::Integer(LEFT), Object::Integer(y)]));
        self.ops.push(Operation::new("l", vec![Object::Integer(RIGHT), Object::Integer(y)]));
        self.ops.push(Operation::new("S", vec![]));
        self.y -= 14;
    }

    fn gap(&mut self, h: i64) { self.y -= h; }
}

/// Standard fonts without an explicit encoding: keep printable ASCII only.
fn pdf_safe(s: &str) -> String {
    s.chars().map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' }).collect()
}

pub fn render_pdf(doc_in: &InvoiceDocument) -> Result<Vec<u8>, ServiceError> {
    let cur = doc_in.currency.as_str();
    let mut p = Page::new();
    p.line("F2", 20, &doc_in.company_name);
    p.line("F1", 10, "Home services, booked and paid online");
    p.gap(6);
    p.line("F2", 16, "TAX INVOICE");
    p.rule();

    p.field("Invoice Number", &doc_in.invoice_number);
    p.field("Invoice Date", &doc_in.generated_at.format("%d %b %Y").to_string());
    p.field("Booking ID", &doc_in.booking_id.to_string());
    p.field("Service Date", &doc_in.booking_date.format("%d %b %Y %H:%M").to_string());
    p.gap(8);

    p.line("F2", 12, "Bill To");
    p.field("Customer", &doc_in.customer_name);
    p.field("Email", &doc_in.customer_email);
    p.field("Phone", &doc_in.customer_phone);
    p.field("Service Address", &doc_in.address);
    p.gap(8);

    p.line("F2", 12, "Service Details");
    p.field("Service", &doc_in.service_name);
    p.field("Provider", &doc_in.provider_name);
    p.gap(8);
    p.rule();

    p.amount("F1", "Subtotal", &money::format_plain(doc_in.subtotal, cur));
    p.amount("F1", &format!("GST ({}%)", doc_in.tax_rate), &money::format_plain(doc_in.tax_amount, cur));
    p.rule();
    p.amount("F2", "Total", &money::format_plain(doc_in.total_amount, cur));
    p.gap(10);

    if let Some(method) = &doc_in.payment_method {
        p.field("Payment Method", method);
    }
    if let Some(txn) = &doc_in.transaction_id {
        p.field("Transaction ID", txn);
    }
    p.gap(20);
    p.line("F1", 9, "This is a computer generated invoice and does not require a signature.");

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });
    let content = Content { operations: p.ops };
    let encoded = content.encode().map_err(|e| ServiceError::Internal(format!("pdf content: {e}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| ServiceError::Internal(format!("pdf write: {e}")))?;
    Ok(out)
}
