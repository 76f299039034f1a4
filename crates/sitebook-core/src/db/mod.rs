//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `projects` - Project CRUD and dashboard totals
//! - `expenses` - Operational expense operations
//! - `purchases` - Imported purchase records and reconciliation
//! - `sales` - Imported sale records, reconciliation, project linking
//! - `workers` - Casual workers and their payments
//! - `loans` - Loans and repayments
//! - `invoices` - Client invoices with sequential numbering
//! - `reports` - Tax liability aggregation
//! - `audit` - Append-only audit log

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod audit;
mod expenses;
mod invoices;
mod loans;
mod projects;
mod purchases;
mod reports;
mod sales;
mod workers;

pub use projects::DashboardTotals;
pub use purchases::PurchaseTotals;
pub use sales::SaleTotals;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "SITEBOOK_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path. This allows moving/renaming/restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Fixed application salt - changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"sitebook-salt-v1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    // Extract the hash portion for use as SQLCipher key (hex encoded)
    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `SITEBOOK_DB_KEY` environment variable to be set.
    /// The database will be encrypted using SQLCipher with a key derived
    /// from the passphrase via Argon2.
    ///
    /// Returns an error if `SITEBOOK_DB_KEY` is not set. Use `new_unencrypted()`
    /// for development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        let encryption_key = std::env::var(DB_KEY_ENV).ok();
        match encryption_key {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    ///
    /// WARNING: This creates an unencrypted database. Only use for development
    /// or testing. For production, use `new()` with `SITEBOOK_DB_KEY` set.
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Use with_init to set the key on every new connection
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                Ok(())
            });

            Pool::builder().max_size(10).build(manager)?
        } else {
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because SQLCipher
    /// has issues with in-memory databases in the connection pool.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!("/tmp/sitebook_test_{}.db", id);

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Check if the database is encrypted
    pub fn is_encrypted(&self) -> Result<bool> {
        let conn = self.conn()?;
        // SQLCipher sets cipher_version if encryption is active
        let result: rusqlite::Result<String> =
            conn.query_row("PRAGMA cipher_version;", [], |row| row.get(0));
        Ok(result.is_ok() && std::env::var(DB_KEY_ENV).is_ok())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Cache size: ~8MB (2000 pages * 4KB default page size)
            PRAGMA cache_size = 2000;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Store temp tables in memory
            PRAGMA temp_store = MEMORY;

            -- Projects
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                client_name TEXT NOT NULL,
                contract_amount REAL NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'Active',
                start_date DATE,
                description TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status);

            -- Operational expenses
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                recipient_name TEXT NOT NULL,
                recipient_phone TEXT,
                amount REAL NOT NULL,
                date DATE NOT NULL,
                payment_mode TEXT NOT NULL DEFAULT 'Cash',
                reason TEXT,
                project_id INTEGER REFERENCES projects(id),
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            CREATE INDEX IF NOT EXISTS idx_expenses_project ON expenses(project_id);

            -- Purchases imported from the RRA export
            -- receipt_number is the natural unique key used for reconciliation
            CREATE TABLE IF NOT EXISTS purchases (
                id INTEGER PRIMARY KEY,
                supplier_tin TEXT NOT NULL,
                supplier_name TEXT NOT NULL,
                nature_of_goods TEXT,
                receipt_number TEXT NOT NULL UNIQUE,
                date DATE NOT NULL,
                net_amount REAL NOT NULL,
                vat REAL NOT NULL,
                total REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_purchases_date ON purchases(date);
            CREATE INDEX IF NOT EXISTS idx_purchases_supplier ON purchases(supplier_name);

            -- Sales imported from the RRA export
            CREATE TABLE IF NOT EXISTS sales (
                id INTEGER PRIMARY KEY,
                buyer_tin TEXT NOT NULL,
                buyer_name TEXT NOT NULL,
                nature_of_goods TEXT,
                receipt_number TEXT NOT NULL UNIQUE,
                invoice_date DATE NOT NULL,
                amount_excl_vat REAL NOT NULL,
                taxable_sales REAL NOT NULL,
                vat_amount REAL NOT NULL,
                project_id INTEGER REFERENCES projects(id),
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_sales_invoice_date ON sales(invoice_date);
            CREATE INDEX IF NOT EXISTS idx_sales_project ON sales(project_id);

            -- Casual workers
            CREATE TABLE IF NOT EXISTS casual_workers (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                id_number TEXT NOT NULL UNIQUE,
                phone TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Payments to casual workers (15% withholding computed at write time)
            CREATE TABLE IF NOT EXISTS casual_payments (
                id INTEGER PRIMARY KEY,
                worker_id INTEGER NOT NULL REFERENCES casual_workers(id) ON DELETE CASCADE,
                project_id INTEGER REFERENCES projects(id),
                activity TEXT,
                work_date DATE NOT NULL,
                net_amount REAL NOT NULL,
                tax_amount REAL NOT NULL,
                total_amount REAL NOT NULL,
                payment_method TEXT NOT NULL DEFAULT 'Cash',
                momo_reference TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_casual_payments_worker ON casual_payments(worker_id);
            CREATE INDEX IF NOT EXISTS idx_casual_payments_date ON casual_payments(work_date);

            -- Loans
            CREATE TABLE IF NOT EXISTS loans (
                id INTEGER PRIMARY KEY,
                lender_name TEXT NOT NULL,
                description TEXT,
                total_amount REAL NOT NULL,
                amount_paid REAL NOT NULL DEFAULT 0,
                date_borrowed DATE NOT NULL,
                status TEXT NOT NULL DEFAULT 'Active',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_loans_status ON loans(status);

            -- Loan repayments
            CREATE TABLE IF NOT EXISTS loan_payments (
                id INTEGER PRIMARY KEY,
                loan_id INTEGER NOT NULL REFERENCES loans(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                date DATE NOT NULL,
                note TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_loan_payments_loan ON loan_payments(loan_id);

            -- Client invoices (number is INV-YYYY/MM/NNN, sequential per month)
            CREATE TABLE IF NOT EXISTS invoices (
                id INTEGER PRIMARY KEY,
                number TEXT NOT NULL UNIQUE,
                client_name TEXT NOT NULL,
                site_location TEXT,
                date DATE NOT NULL,
                project_id INTEGER REFERENCES projects(id),
                subtotal REAL NOT NULL,
                vat REAL NOT NULL,
                total REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_invoices_date ON invoices(date);

            -- Invoice line items
            CREATE TABLE IF NOT EXISTS invoice_items (
                id INTEGER PRIMARY KEY,
                invoice_id INTEGER NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                specs TEXT,
                unit TEXT,
                quantity REAL NOT NULL,
                unit_price REAL NOT NULL,
                line_total REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_invoice_items_invoice ON invoice_items(invoice_id);

            -- Audit log (append-only record of every mutation)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
                actor TEXT NOT NULL,
                action TEXT NOT NULL,
                module TEXT,
                target_id INTEGER,
                detail TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_audit_log_actor ON audit_log(actor);
            CREATE INDEX IF NOT EXISTS idx_audit_log_timestamp ON audit_log(timestamp);
            CREATE INDEX IF NOT EXISTS idx_audit_log_action ON audit_log(action);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

/// Audit log entry
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub actor: String,
    pub action: String,
    pub module: Option<String>,
    pub target_id: Option<i64>,
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests;
