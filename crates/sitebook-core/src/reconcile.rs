//! Set-difference reconciliation for imported purchase and sale records
//!
//! The uploaded file is the authoritative statement of which receipts exist.
//! Planning is a pure function over receipt numbers; applying the plan
//! (deletes, inserts, audit entries) lives in the database layer.

use std::collections::HashSet;

/// Anything keyed by a tax-authority receipt number
pub trait Receipted {
    fn receipt_number(&self) -> &str;
}

impl Receipted for crate::models::PurchaseRecord {
    fn receipt_number(&self) -> &str {
        &self.receipt_number
    }
}

impl Receipted for crate::models::NewPurchase {
    fn receipt_number(&self) -> &str {
        &self.receipt_number
    }
}

impl Receipted for crate::models::SaleRecord {
    fn receipt_number(&self) -> &str {
        &self.receipt_number
    }
}

impl Receipted for crate::models::NewSale {
    fn receipt_number(&self) -> &str {
        &self.receipt_number
    }
}

/// The outer join of existing records against an incoming batch
#[derive(Debug)]
pub struct ReconciliationPlan<E, N> {
    /// Existing records whose receipt number is absent from the batch
    pub to_delete: Vec<E>,
    /// Incoming rows whose receipt number is not yet in the database,
    /// first occurrence wins within the batch
    pub to_insert: Vec<N>,
    /// Receipts present on both sides, left untouched
    pub unchanged: usize,
}

/// Plan a reconciling import: O(existing + incoming) via hash sets.
///
/// Intra-batch duplicate receipt numbers are dropped silently, keeping the
/// first occurrence. A duplicate never contributes to the deleted count.
pub fn plan_reconciliation<E, N>(existing: Vec<E>, incoming: Vec<N>) -> ReconciliationPlan<E, N>
where
    E: Receipted,
    N: Receipted,
{
    let existing_receipts: HashSet<String> = existing
        .iter()
        .map(|r| r.receipt_number().to_string())
        .collect();

    let mut seen = HashSet::new();
    let mut incoming_receipts = HashSet::new();
    let mut to_insert = Vec::new();
    let mut unchanged = 0;

    for row in incoming {
        let receipt = row.receipt_number().to_string();
        if !seen.insert(receipt.clone()) {
            continue;
        }
        incoming_receipts.insert(receipt.clone());
        if existing_receipts.contains(&receipt) {
            unchanged += 1;
        } else {
            to_insert.push(row);
        }
    }

    let to_delete = existing
        .into_iter()
        .filter(|r| !incoming_receipts.contains(r.receipt_number()))
        .collect();

    ReconciliationPlan {
        to_delete,
        to_insert,
        unchanged,
    }
}
