//! CSV export for downloadable reports

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::{Expense, PurchaseRecord, SaleRecord};

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::InvalidData(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(format!("CSV encoding error: {}", e)))
}

/// Render purchases as the downloadable report
pub fn purchases_csv(records: &[PurchaseRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record([
        "Date",
        "Supplier TIN",
        "Supplier Name",
        "Receipt Number",
        "Amount (No VAT)",
        "VAT",
        "Total Amount",
    ])?;

    for rec in records {
        wtr.write_record([
            rec.date.to_string(),
            rec.supplier_tin.clone(),
            rec.supplier_name.clone(),
            rec.receipt_number.clone(),
            format!("{:.2}", rec.net_amount),
            format!("{:.2}", rec.vat),
            format!("{:.2}", rec.total),
        ])?;
    }

    finish(wtr)
}

/// Render sales as the downloadable report
///
/// `project_names` maps project ids to display names; unattributed sales
/// show as "Unlinked".
pub fn sales_csv(records: &[SaleRecord], project_names: &HashMap<i64, String>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record([
        "Invoice Date",
        "Buyer TIN",
        "Buyer Name",
        "Receipt Number",
        "Amount (VAT Exclusive)",
        "Taxable Sales",
        "VAT",
        "Project",
    ])?;

    for rec in records {
        let project = rec
            .project_id
            .and_then(|id| project_names.get(&id).cloned())
            .unwrap_or_else(|| "Unlinked".to_string());

        wtr.write_record([
            rec.invoice_date.to_string(),
            rec.buyer_tin.clone(),
            rec.buyer_name.clone(),
            rec.receipt_number.clone(),
            format!("{:.2}", rec.amount_excl_vat),
            format!("{:.2}", rec.taxable_sales),
            format!("{:.2}", rec.vat_amount),
            project,
        ])?;
    }

    finish(wtr)
}

/// Render expenses as the downloadable report
pub fn expenses_csv(records: &[Expense]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record([
        "Date",
        "Recipient",
        "Phone",
        "Amount",
        "Payment Mode",
        "Reason",
    ])?;

    for rec in records {
        wtr.write_record([
            rec.date.to_string(),
            rec.recipient_name.clone(),
            rec.recipient_phone.clone().unwrap_or_default(),
            format!("{:.2}", rec.amount),
            rec.payment_mode.to_string(),
            rec.reason.clone().unwrap_or_default(),
        ])?;
    }

    finish(wtr)
}
