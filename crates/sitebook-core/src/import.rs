//! CSV import parsers for the RRA purchase and sales exports
//!
//! Both parsers key columns by header name (the export column order is not
//! stable across downloads). Rows with unparseable dates or amounts are
//! skipped with a warning; a bad row never aborts the batch.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{NewPurchase, NewSale};

/// Expected headers of the RRA purchases export
const PURCHASE_HEADERS: [&str; 7] = [
    "Supplier TIN",
    "Supplier name",
    "Nature of Goods",
    "Receipt number",
    "Receipt issue date",
    "Amount without VAT",
    "VAT",
];

/// Expected headers of the RRA sales export
///
/// "Taxble Sales" is misspelled in the upstream export; the contract here
/// matches the file as issued.
const SALE_HEADERS: [&str; 8] = [
    "Buyer TIN",
    "Buyer Name",
    "Nature of Goods",
    "Receipt Number",
    "Invoice Date",
    "Total Amount of Sales (VAT Exclusive)",
    "Taxble Sales",
    "VAT",
];

/// Map required header names to column indexes, case-insensitively
fn header_indexes(headers: &StringRecord, required: &[&str]) -> Result<Vec<usize>> {
    required
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::Import(format!("Missing column: {}", name)))
        })
        .collect()
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("").trim()
}

/// Parse the RRA purchases export
///
/// The stored total is always computed as net + VAT; any total column in
/// the file is ignored.
pub fn parse_purchases_csv<R: Read>(reader: R) -> Result<Vec<NewPurchase>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let idx = header_indexes(&headers, &PURCHASE_HEADERS)?;
    let mut purchases = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result?;

        let receipt_number = field(&record, idx[3]).to_string();
        if receipt_number.is_empty() {
            warn!("Skipping purchase row {}: missing receipt number", line + 2);
            continue;
        }

        let date = match parse_dmy_date(field(&record, idx[4])) {
            Ok(d) => d,
            Err(e) => {
                warn!("Skipping purchase row {} ({}): {}", line + 2, receipt_number, e);
                continue;
            }
        };

        let net_amount = match parse_amount(field(&record, idx[5])) {
            Ok(a) => a,
            Err(e) => {
                warn!("Skipping purchase row {} ({}): {}", line + 2, receipt_number, e);
                continue;
            }
        };

        let vat = match parse_amount(field(&record, idx[6])) {
            Ok(a) => a,
            Err(e) => {
                warn!("Skipping purchase row {} ({}): {}", line + 2, receipt_number, e);
                continue;
            }
        };

        let nature_of_goods = Some(field(&record, idx[2]).to_string()).filter(|s| !s.is_empty());

        purchases.push(NewPurchase {
            supplier_tin: field(&record, idx[0]).to_string(),
            supplier_name: field(&record, idx[1]).to_string(),
            nature_of_goods,
            receipt_number,
            date,
            net_amount,
            vat,
            total: net_amount + vat,
        });
    }

    debug!("Parsed {} purchase rows", purchases.len());
    Ok(purchases)
}

/// Parse the RRA sales export
pub fn parse_sales_csv<R: Read>(reader: R) -> Result<Vec<NewSale>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let idx = header_indexes(&headers, &SALE_HEADERS)?;
    let mut sales = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result?;

        let receipt_number = field(&record, idx[3]).to_string();
        if receipt_number.is_empty() {
            warn!("Skipping sale row {}: missing receipt number", line + 2);
            continue;
        }

        let invoice_date = match parse_dmy_date(field(&record, idx[4])) {
            Ok(d) => d,
            Err(e) => {
                warn!("Skipping sale row {} ({}): {}", line + 2, receipt_number, e);
                continue;
            }
        };

        let amounts: std::result::Result<Vec<f64>, Error> = [idx[5], idx[6], idx[7]]
            .iter()
            .map(|&i| parse_amount(field(&record, i)))
            .collect();
        let amounts = match amounts {
            Ok(a) => a,
            Err(e) => {
                warn!("Skipping sale row {} ({}): {}", line + 2, receipt_number, e);
                continue;
            }
        };

        let nature_of_goods = Some(field(&record, idx[2]).to_string()).filter(|s| !s.is_empty());

        sales.push(NewSale {
            buyer_tin: field(&record, idx[0]).to_string(),
            buyer_name: field(&record, idx[1]).to_string(),
            nature_of_goods,
            receipt_number,
            invoice_date,
            amount_excl_vat: amounts[0],
            taxable_sales: amounts[1],
            vat_amount: amounts[2],
        });
    }

    debug!("Parsed {} sale rows", sales.len());
    Ok(sales)
}

/// Parse a date string as the export writes it (DD/MM/YYYY), falling back
/// to ISO for hand-edited files
pub fn parse_dmy_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%d/%m/%Y", // 31/01/2024
        "%d-%m-%Y", // 31-01-2024
        "%Y-%m-%d", // 2024-01-31
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling thousands separators and parentheses
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace([',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))
}
