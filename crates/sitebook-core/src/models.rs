//! Domain models for Sitebook

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Withholding tax rate applied to casual worker payments (15%)
pub const WITHHOLDING_RATE: f64 = 0.15;

/// VAT rate applied to client invoices (18%)
pub const INVOICE_VAT_RATE: f64 = 0.18;

/// A construction project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub client_name: String,
    pub contract_amount: f64,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: String,
}

/// Fields for creating or updating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub client_name: String,
    pub contract_amount: f64,
    #[serde(default)]
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::OnHold => "OnHold",
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Completed" => Ok(Self::Completed),
            "OnHold" => Ok(Self::OnHold),
            _ => Err(format!("Unknown project status: {}", s)),
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operational expense paid out by the company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub recipient_name: String,
    pub recipient_phone: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
    pub payment_mode: PaymentMode,
    pub reason: Option<String>,
    pub project_id: Option<i64>,
    pub created_at: String,
}

/// Fields for creating or updating an expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub recipient_name: String,
    pub recipient_phone: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
    pub payment_mode: PaymentMode,
    pub reason: Option<String>,
    pub project_id: Option<i64>,
}

/// How an expense was paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    Cash,
    MobileMoney,
    BankTransfer,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::MobileMoney => "MobileMoney",
            Self::BankTransfer => "BankTransfer",
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(Self::Cash),
            "MobileMoney" => Ok(Self::MobileMoney),
            "BankTransfer" => Ok(Self::BankTransfer),
            _ => Err(format!("Unknown payment mode: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A purchase record imported from the tax authority export
///
/// Created only by import, deleted when a later import omits the receipt,
/// never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: i64,
    pub supplier_tin: String,
    pub supplier_name: String,
    pub nature_of_goods: Option<String>,
    pub receipt_number: String,
    pub date: NaiveDate,
    pub net_amount: f64,
    pub vat: f64,
    /// Always net_amount + vat, computed by the importer
    pub total: f64,
    pub created_at: String,
}

/// A parsed purchase row ready for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPurchase {
    pub supplier_tin: String,
    pub supplier_name: String,
    pub nature_of_goods: Option<String>,
    pub receipt_number: String,
    pub date: NaiveDate,
    pub net_amount: f64,
    pub vat: f64,
    pub total: f64,
}

/// A sale record imported from the tax authority export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: i64,
    pub buyer_tin: String,
    pub buyer_name: String,
    pub nature_of_goods: Option<String>,
    pub receipt_number: String,
    pub invoice_date: NaiveDate,
    pub amount_excl_vat: f64,
    pub taxable_sales: f64,
    pub vat_amount: f64,
    pub project_id: Option<i64>,
    pub created_at: String,
}

/// A parsed sale row ready for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub buyer_tin: String,
    pub buyer_name: String,
    pub nature_of_goods: Option<String>,
    pub receipt_number: String,
    pub invoice_date: NaiveDate,
    pub amount_excl_vat: f64,
    pub taxable_sales: f64,
    pub vat_amount: f64,
}

/// A casual (daily-rate) worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasualWorker {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
    pub phone: Option<String>,
    pub created_at: String,
}

/// Fields for registering or updating a worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorker {
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
    pub phone: Option<String>,
}

/// A payment made to a casual worker
///
/// tax_amount is fixed at 15% of net_amount when the payment is created
/// or updated; it is never recomputed retroactively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasualPayment {
    pub id: i64,
    pub worker_id: i64,
    pub project_id: Option<i64>,
    pub activity: Option<String>,
    pub work_date: NaiveDate,
    pub net_amount: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub momo_reference: Option<String>,
    pub created_at: String,
}

/// Fields for creating or updating a casual payment
///
/// The withholding tax and total are computed by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub worker_id: i64,
    pub project_id: Option<i64>,
    pub activity: Option<String>,
    pub work_date: NaiveDate,
    pub net_amount: f64,
    pub payment_method: PaymentMethod,
    pub momo_reference: Option<String>,
}

/// How a casual worker was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    MobileMoney,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::MobileMoney => "MobileMoney",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(Self::Cash),
            "MobileMoney" => Ok(Self::MobileMoney),
            _ => Err(format!("Unknown payment method: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A loan taken by the company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub lender_name: String,
    pub description: Option<String>,
    pub total_amount: f64,
    pub amount_paid: f64,
    pub date_borrowed: NaiveDate,
    pub status: LoanStatus,
    pub created_at: String,
}

/// Fields for creating or updating a loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoan {
    pub lender_name: String,
    pub description: Option<String>,
    pub total_amount: f64,
    pub date_borrowed: NaiveDate,
}

/// A repayment made against a loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPayment {
    pub id: i64,
    pub loan_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    pub note: Option<String>,
}

/// Loan status, flips to Cleared when repayments reach the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LoanStatus {
    #[default]
    Active,
    Cleared,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Cleared => "Cleared",
        }
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Cleared" => Ok(Self::Cleared),
            _ => Err(format!("Unknown loan status: {}", s)),
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A client invoice with sequential monthly numbering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    /// Sequential number of the form INV-YYYY/MM/NNN
    pub number: String,
    pub client_name: String,
    pub site_location: Option<String>,
    pub date: NaiveDate,
    pub project_id: Option<i64>,
    pub subtotal: f64,
    /// 18% of subtotal
    pub vat: f64,
    pub total: f64,
    pub created_at: String,
    pub items: Vec<InvoiceItem>,
}

/// A line item on an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub name: String,
    pub specs: Option<String>,
    pub unit: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Fields for creating or updating an invoice
///
/// Number, line totals, subtotal, VAT and grand total are computed by
/// the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    pub client_name: String,
    pub site_location: Option<String>,
    pub date: NaiveDate,
    pub project_id: Option<i64>,
    pub items: Vec<NewInvoiceItem>,
}

/// A line item as submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoiceItem {
    pub name: String,
    pub specs: Option<String>,
    pub unit: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
}

/// Which RRA export a CSV file came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportKind {
    Purchases,
    Sales,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchases => "purchases",
            Self::Sales => "sales",
        }
    }
}

impl std::str::FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "purchases" => Ok(Self::Purchases),
            "sales" => Ok(Self::Sales),
            _ => Err(format!("Unknown import kind: {}", s)),
        }
    }
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit log action keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Import,
    Export,
    Warning,
    ClearAll,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Import => "IMPORT",
            Self::Export => "EXPORT",
            Self::Warning => "WARNING",
            Self::ClearAll => "CLEAR_ALL",
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "IMPORT" => Ok(Self::Import),
            "EXPORT" => Ok(Self::Export),
            "WARNING" => Ok(Self::Warning),
            "CLEAR_ALL" => Ok(Self::ClearAll),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record removed by reconciliation because a later import omitted it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelledRecord {
    pub receipt_number: String,
    /// Supplier name for purchases, buyer name for sales
    pub counterparty: String,
    pub date: NaiveDate,
    pub total: f64,
}

/// Result of applying an import to the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub inserted: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub cancelled: Vec<CancelledRecord>,
}
