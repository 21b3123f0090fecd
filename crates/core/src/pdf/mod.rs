//! Invoice PDF rendering.
//!
//! Renders a single-page A4 document with the built-in Helvetica fonts.
//! Rendering is pure: invoice data in, PDF bytes out, no filesystem access.
//! Layout positions are whole millimeters so all cursor math stays in
//! integers.

use std::io::BufWriter;

use chrono::NaiveDate;
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::invoice::InvoiceStatus;

/// Errors that can occur while rendering a PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The PDF backend failed to produce a document.
    #[error("failed to render PDF: {0}")]
    Render(String),
}

/// A line item as it appears on the rendered document.
#[derive(Debug, Clone)]
pub struct DocumentItem {
    /// What is being billed.
    pub description: String,
    /// Quantity billed.
    pub quantity: Decimal,
    /// Price per unit.
    pub rate: Decimal,
    /// Derived line amount.
    pub amount: Decimal,
}

/// Everything needed to render one invoice.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    /// Human-readable invoice number.
    pub invoice_number: String,
    /// Lifecycle status printed in the header.
    pub status: InvoiceStatus,
    /// Date the invoice was issued.
    pub issue_date: NaiveDate,
    /// Date payment is due.
    pub due_date: NaiveDate,
    /// Name of the issuing user.
    pub sender_name: String,
    /// Billed client's name.
    pub client_name: String,
    /// Billed client's company, if any.
    pub client_company: Option<String>,
    /// Billed client's postal address, if any.
    pub client_address: Option<String>,
    /// Billed client's email.
    pub client_email: String,
    /// Line items in display order.
    pub items: Vec<DocumentItem>,
    /// Sum of line amounts.
    pub subtotal: Decimal,
    /// Tax rate in percent.
    pub tax_rate: Decimal,
    /// Derived tax amount.
    pub tax_amount: Decimal,
    /// Grand total.
    pub total: Decimal,
    /// Free-form notes, if any.
    pub notes: Option<String>,
}

// Column positions in mm on an A4 page (210 x 297).
const LEFT: i32 = 18;
const RIGHT: i32 = 192;
const COL_QTY: i32 = 106;
const COL_RATE: i32 = 124;
const COL_AMOUNT: i32 = 159;

#[allow(clippy::cast_precision_loss)]
const fn mm(value: i32) -> Mm {
    Mm(value as f32)
}

fn money(value: Decimal) -> String {
    format!("${value:.2}")
}

fn divider(layer: &PdfLayerReference, y: i32) {
    let line = Line {
        points: vec![
            (Point::new(mm(LEFT), mm(y)), false),
            (Point::new(mm(RIGHT), mm(y)), false),
        ],
        is_closed: false,
    };
    layer.set_outline_thickness(0.5);
    layer.add_line(line);
}

/// Renders an invoice into PDF bytes.
///
/// # Errors
///
/// Returns `PdfError::Render` if the PDF backend fails.
pub fn render_invoice(invoice: &InvoiceDocument) -> Result<Vec<u8>, PdfError> {
    let (doc, page, layer_index) = PdfDocument::new(
        format!("Invoice {}", invoice.invoice_number),
        Mm(210.0),
        Mm(297.0),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PdfError::Render(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| PdfError::Render(e.to_string()))?;
    let layer = doc.get_page(page).get_layer(layer_index);

    render_header(&layer, &font, &bold, invoice);
    render_bill_to(&layer, &font, &bold, invoice);
    let y = render_items(&layer, &font, &bold, invoice);
    let y = render_totals(&layer, &font, &bold, invoice, y);
    render_footer(&layer, &font, invoice, y);

    let mut bytes: Vec<u8> = Vec::new();
    doc.save(&mut BufWriter::new(&mut bytes))
        .map_err(|e| PdfError::Render(e.to_string()))?;
    Ok(bytes)
}

fn render_header(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
    invoice: &InvoiceDocument,
) {
    layer.use_text("INVOICE", 24.0, mm(LEFT), mm(272), bold);
    layer.use_text(invoice.invoice_number.clone(), 11.0, mm(LEFT), mm(264), font);
    layer.use_text(
        format!("Status: {}", invoice.status),
        10.0,
        mm(LEFT),
        mm(258),
        font,
    );

    layer.use_text(
        format!("Issue Date: {}", invoice.issue_date.format("%Y-%m-%d")),
        10.0,
        mm(COL_RATE),
        mm(264),
        font,
    );
    layer.use_text(
        format!("Due Date: {}", invoice.due_date.format("%Y-%m-%d")),
        10.0,
        mm(COL_RATE),
        mm(258),
        font,
    );

    layer.use_text("From:", 10.0, mm(LEFT), mm(246), bold);
    layer.use_text(invoice.sender_name.clone(), 10.0, mm(LEFT), mm(240), font);
}

fn render_bill_to(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
    invoice: &InvoiceDocument,
) {
    layer.use_text("Bill To:", 10.0, mm(LEFT), mm(228), bold);

    let mut y = 222;
    layer.use_text(invoice.client_name.clone(), 10.0, mm(LEFT), mm(y), font);
    y -= 6;
    if let Some(company) = &invoice.client_company {
        layer.use_text(company.clone(), 10.0, mm(LEFT), mm(y), font);
        y -= 6;
    }
    if let Some(address) = &invoice.client_address {
        layer.use_text(address.clone(), 10.0, mm(LEFT), mm(y), font);
        y -= 6;
    }
    layer.use_text(invoice.client_email.clone(), 10.0, mm(LEFT), mm(y), font);
}

fn render_items(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
    invoice: &InvoiceDocument,
) -> i32 {
    let mut y = 196;

    layer.use_text("Description", 10.0, mm(LEFT), mm(y), bold);
    layer.use_text("Qty", 10.0, mm(COL_QTY), mm(y), bold);
    layer.use_text("Rate", 10.0, mm(COL_RATE), mm(y), bold);
    layer.use_text("Amount", 10.0, mm(COL_AMOUNT), mm(y), bold);
    y -= 3;
    divider(layer, y);
    y -= 7;

    for item in &invoice.items {
        layer.use_text(item.description.clone(), 10.0, mm(LEFT), mm(y), font);
        layer.use_text(item.quantity.to_string(), 10.0, mm(COL_QTY), mm(y), font);
        layer.use_text(money(item.rate), 10.0, mm(COL_RATE), mm(y), font);
        layer.use_text(money(item.amount), 10.0, mm(COL_AMOUNT), mm(y), font);
        y -= 7;
    }

    y += 2;
    divider(layer, y);
    y - 8
}

fn render_totals(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
    invoice: &InvoiceDocument,
    mut y: i32,
) -> i32 {
    layer.use_text("Subtotal:", 10.0, mm(COL_RATE), mm(y), font);
    layer.use_text(money(invoice.subtotal), 10.0, mm(COL_AMOUNT), mm(y), font);
    y -= 6;

    layer.use_text(
        format!("Tax ({}%):", invoice.tax_rate),
        10.0,
        mm(COL_RATE),
        mm(y),
        font,
    );
    layer.use_text(money(invoice.tax_amount), 10.0, mm(COL_AMOUNT), mm(y), font);
    y -= 7;

    layer.use_text("Total:", 11.0, mm(COL_RATE), mm(y), bold);
    layer.use_text(money(invoice.total), 11.0, mm(COL_AMOUNT), mm(y), bold);
    y - 12
}

fn render_footer(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    invoice: &InvoiceDocument,
    mut y: i32,
) {
    if let Some(notes) = &invoice.notes {
        layer.use_text("Notes:", 10.0, mm(LEFT), mm(y), font);
        y -= 6;
        layer.use_text(notes.clone(), 9.0, mm(LEFT), mm(y), font);
    }

    layer.use_text("Thank you for your business!", 10.0, mm(70), mm(16), font);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_invoice() -> InvoiceDocument {
        InvoiceDocument {
            invoice_number: "INV-20260001".to_string(),
            status: InvoiceStatus::Sent,
            issue_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            sender_name: "Jordan Freelance".to_string(),
            client_name: "Acme Corp".to_string(),
            client_company: Some("Acme Holdings".to_string()),
            client_address: Some("1 Main St, Springfield".to_string()),
            client_email: "billing@acme.example".to_string(),
            items: vec![
                DocumentItem {
                    description: "Design work".to_string(),
                    quantity: dec!(2),
                    rate: dec!(50),
                    amount: dec!(100),
                },
                DocumentItem {
                    description: "Hosting".to_string(),
                    quantity: dec!(3),
                    rate: dec!(10),
                    amount: dec!(30),
                },
            ],
            subtotal: dec!(130),
            tax_rate: dec!(10),
            tax_amount: dec!(13),
            total: dec!(143),
            notes: Some("Payable within 30 days.".to_string()),
        }
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let bytes = render_invoice(&sample_invoice()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn test_render_without_optional_fields() {
        let mut invoice = sample_invoice();
        invoice.client_company = None;
        invoice.client_address = None;
        invoice.notes = None;

        let bytes = render_invoice(&invoice).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_render_many_items_still_single_page() {
        let mut invoice = sample_invoice();
        invoice.items = (0..15)
            .map(|i| DocumentItem {
                description: format!("Item {i}"),
                quantity: dec!(1),
                rate: dec!(10),
                amount: dec!(10),
            })
            .collect();

        let bytes = render_invoice(&invoice).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
