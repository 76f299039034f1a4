//! Database tests

use super::*;
use crate::models::*;
use crate::tax::DateWindow;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn purchase(receipt: &str, day: u32, net: f64, vat: f64) -> NewPurchase {
        NewPurchase {
            supplier_tin: "101234567".into(),
            supplier_name: "Kigali Cement Ltd".into(),
            nature_of_goods: Some("Cement".into()),
            receipt_number: receipt.into(),
            date: date(2024, 1, day),
            net_amount: net,
            vat,
            total: net + vat,
        }
    }

    fn sale(receipt: &str, day: u32, excl: f64, vat: f64) -> NewSale {
        NewSale {
            buyer_tin: "109876543".into(),
            buyer_name: "Acme Builders".into(),
            nature_of_goods: Some("Works".into()),
            receipt_number: receipt.into(),
            invoice_date: date(2024, 1, day),
            amount_excl_vat: excl,
            taxable_sales: excl,
            vat_amount: vat,
        }
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        let projects = db.list_projects().unwrap();
        assert!(projects.is_empty());
    }

    #[test]
    fn test_project_crud() {
        let db = Database::in_memory().unwrap();

        let id = db
            .create_project(&NewProject {
                name: "Gisozi Apartments".into(),
                client_name: "Umuhoza Ltd".into(),
                contract_amount: 5_000_000.0,
                status: ProjectStatus::Active,
                start_date: Some(date(2024, 1, 1)),
                description: None,
            })
            .unwrap();
        assert!(id > 0);

        let project = db.get_project(id).unwrap();
        assert_eq!(project.name, "Gisozi Apartments");
        assert_eq!(project.status, ProjectStatus::Active);

        let mut update = NewProject {
            name: project.name.clone(),
            client_name: project.client_name.clone(),
            contract_amount: project.contract_amount,
            status: ProjectStatus::Completed,
            start_date: project.start_date,
            description: Some("Handover done".into()),
        };
        db.update_project(id, &update).unwrap();
        let project = db.get_project(id).unwrap();
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.description.as_deref(), Some("Handover done"));

        update.status = ProjectStatus::OnHold;
        db.update_project(id, &update).unwrap();

        db.delete_project(id).unwrap();
        assert!(db.get_project(id).is_err());
    }

    #[test]
    fn test_expense_window_and_sum() {
        let db = Database::in_memory().unwrap();

        for (day, amount) in [(5, 1000.0), (15, 2000.0), (25, 4000.0)] {
            db.create_expense(&NewExpense {
                recipient_name: "Fuel Station".into(),
                recipient_phone: None,
                amount,
                date: date(2024, 1, day),
                payment_mode: PaymentMode::Cash,
                reason: Some("Diesel".into()),
                project_id: None,
            })
            .unwrap();
        }

        // End date is inclusive
        let window = DateWindow::parse(Some("2024-01-05"), Some("2024-01-15")).unwrap();
        let expenses = db.list_expenses(&window, None).unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(db.sum_expenses(&window, None).unwrap(), 3000.0);

        // Unbounded window includes everything
        let all = db.list_expenses(&DateWindow::default(), None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(db.sum_expenses(&DateWindow::default(), None).unwrap(), 7000.0);
    }

    #[test]
    fn test_insert_purchase_skips_duplicate_receipt() {
        let db = Database::in_memory().unwrap();

        let first = db.insert_purchase(&purchase("RCT-001", 5, 100.0, 18.0)).unwrap();
        assert!(first.is_some());

        let second = db.insert_purchase(&purchase("RCT-001", 6, 999.0, 99.0)).unwrap();
        assert!(second.is_none());

        let all = db.list_all_purchases().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].total, 118.0);
    }

    #[test]
    fn test_import_purchases_reconciles_by_receipt_set() {
        let db = Database::in_memory().unwrap();

        let outcome = db
            .import_purchases(
                "tester",
                vec![
                    purchase("A", 1, 100.0, 18.0),
                    purchase("B", 2, 100.0, 18.0),
                    purchase("C", 3, 100.0, 18.0),
                ],
            )
            .unwrap();
        assert_eq!(outcome.inserted, 3);
        assert_eq!(outcome.deleted, 0);

        // Later export omits A and adds D
        let outcome = db
            .import_purchases(
                "tester",
                vec![
                    purchase("B", 2, 100.0, 18.0),
                    purchase("C", 3, 100.0, 18.0),
                    purchase("D", 4, 100.0, 18.0),
                ],
            )
            .unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.deleted, 1);
        assert_eq!(outcome.unchanged, 2);
        assert_eq!(outcome.cancelled.len(), 1);
        assert_eq!(outcome.cancelled[0].receipt_number, "A");

        let receipts: Vec<String> = db
            .list_all_purchases()
            .unwrap()
            .into_iter()
            .map(|p| p.receipt_number)
            .collect();
        assert_eq!(receipts.len(), 3);
        assert!(receipts.contains(&"B".to_string()));
        assert!(receipts.contains(&"C".to_string()));
        assert!(receipts.contains(&"D".to_string()));

        // One WARNING entry per deletion, carrying the descriptive fields
        let entries = db
            .list_audit_log(&DateWindow::default(), 100, 0)
            .unwrap();
        let warnings: Vec<_> = entries.iter().filter(|e| e.action == "WARNING").collect();
        assert_eq!(warnings.len(), 1);
        let detail = warnings[0].detail.as_deref().unwrap();
        assert!(detail.contains("A"));
        assert!(detail.contains("Kigali Cement Ltd"));
        assert!(detail.contains("101234567"));
        assert!(detail.contains("118.00"));

        // And one IMPORT summary per run
        let imports: Vec<_> = entries.iter().filter(|e| e.action == "IMPORT").collect();
        assert_eq!(imports.len(), 2);
        assert!(imports[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("1 inserted, 1 cancelled"));
    }

    #[test]
    fn test_reimporting_same_file_is_a_no_op() {
        let db = Database::in_memory().unwrap();
        let rows = || vec![purchase("A", 1, 100.0, 18.0), purchase("B", 2, 50.0, 9.0)];

        let first = db.import_purchases("tester", rows()).unwrap();
        assert_eq!(first.inserted, 2);

        let second = db.import_purchases("tester", rows()).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.deleted, 0);
        assert_eq!(second.unchanged, 2);
    }

    #[test]
    fn test_intra_batch_duplicate_never_raises_deleted_count() {
        let db = Database::in_memory().unwrap();
        db.import_purchases("tester", vec![purchase("A", 1, 100.0, 18.0)])
            .unwrap();

        let outcome = db
            .import_purchases(
                "tester",
                vec![purchase("A", 1, 100.0, 18.0), purchase("A", 1, 100.0, 18.0)],
            )
            .unwrap();
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.deleted, 0);
        assert_eq!(outcome.unchanged, 1);
    }

    #[test]
    fn test_import_sales_and_project_link() {
        let db = Database::in_memory().unwrap();

        let outcome = db
            .import_sales("tester", vec![sale("S-1", 10, 200.0, 36.0)])
            .unwrap();
        assert_eq!(outcome.inserted, 1);

        let project_id = db
            .create_project(&NewProject {
                name: "Gisozi Apartments".into(),
                client_name: "Umuhoza Ltd".into(),
                contract_amount: 1.0,
                status: ProjectStatus::Active,
                start_date: None,
                description: None,
            })
            .unwrap();

        let sale_id = db.list_all_sales().unwrap()[0].id;
        db.link_sale_to_project(sale_id, Some(project_id)).unwrap();
        assert_eq!(db.list_all_sales().unwrap()[0].project_id, Some(project_id));

        db.link_sale_to_project(sale_id, None).unwrap();
        assert_eq!(db.list_all_sales().unwrap()[0].project_id, None);
    }

    #[test]
    fn test_clear_purchases() {
        let db = Database::in_memory().unwrap();
        db.import_purchases(
            "tester",
            vec![purchase("A", 1, 100.0, 18.0), purchase("B", 2, 50.0, 9.0)],
        )
        .unwrap();

        assert_eq!(db.clear_purchases().unwrap(), 2);
        assert!(db.list_all_purchases().unwrap().is_empty());
    }

    #[test]
    fn test_withholding_computed_at_create_and_update() {
        let db = Database::in_memory().unwrap();

        let worker_id = db
            .create_worker(&NewWorker {
                first_name: "Jean".into(),
                last_name: "Mugisha".into(),
                id_number: "1199x".into(),
                phone: None,
            })
            .unwrap();

        let mut new = NewPayment {
            worker_id,
            project_id: None,
            activity: Some("Masonry".into()),
            work_date: date(2024, 1, 10),
            net_amount: 10000.0,
            payment_method: PaymentMethod::Cash,
            momo_reference: None,
        };
        let id = db.create_payment(&new).unwrap();

        let payment = db.get_payment(id).unwrap();
        assert_eq!(payment.tax_amount, 1500.0);
        assert_eq!(payment.total_amount, 11500.0);

        new.net_amount = 20000.0;
        new.payment_method = PaymentMethod::MobileMoney;
        new.momo_reference = Some("MM-123".into());
        db.update_payment(id, &new).unwrap();

        let payment = db.get_payment(id).unwrap();
        assert_eq!(payment.tax_amount, 3000.0);
        assert_eq!(payment.total_amount, 23000.0);
        assert_eq!(payment.payment_method, PaymentMethod::MobileMoney);
    }

    #[test]
    fn test_loan_auto_clears_when_repaid() {
        let db = Database::in_memory().unwrap();

        let id = db
            .create_loan(&NewLoan {
                lender_name: "BK".into(),
                description: None,
                total_amount: 1000.0,
                date_borrowed: date(2024, 1, 1),
            })
            .unwrap();

        let loan = db.add_loan_payment(id, 400.0, date(2024, 2, 1), None).unwrap();
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.amount_paid, 400.0);

        let loan = db
            .add_loan_payment(id, 600.0, date(2024, 3, 1), Some("final"))
            .unwrap();
        assert_eq!(loan.status, LoanStatus::Cleared);
        assert_eq!(loan.amount_paid, 1000.0);

        assert_eq!(db.list_loan_payments(id).unwrap().len(), 2);
    }

    #[test]
    fn test_invoice_numbering_is_sequential_per_month() {
        let db = Database::in_memory().unwrap();

        let item = NewInvoiceItem {
            name: "Blocks".into(),
            specs: None,
            unit: Some("pcs".into()),
            quantity: 100.0,
            unit_price: 500.0,
        };
        let new = |d: NaiveDate| NewInvoice {
            client_name: "Umuhoza Ltd".into(),
            site_location: None,
            date: d,
            project_id: None,
            items: vec![item.clone()],
        };

        let first = db.create_invoice(&new(date(2024, 3, 5))).unwrap();
        assert_eq!(first.number, "INV-2024/03/001");

        let second = db.create_invoice(&new(date(2024, 3, 20))).unwrap();
        assert_eq!(second.number, "INV-2024/03/002");

        // New month restarts the sequence
        let third = db.create_invoice(&new(date(2024, 4, 1))).unwrap();
        assert_eq!(third.number, "INV-2024/04/001");

        // 18% VAT on the computed subtotal
        assert_eq!(first.subtotal, 50000.0);
        assert_eq!(first.vat, 9000.0);
        assert_eq!(first.total, 59000.0);
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].line_total, 50000.0);
    }

    #[test]
    fn test_invoice_numbering_skips_deleted_numbers() {
        let db = Database::in_memory().unwrap();

        let item = NewInvoiceItem {
            name: "Sand".into(),
            specs: None,
            unit: Some("m3".into()),
            quantity: 10.0,
            unit_price: 2000.0,
        };
        let new = |d: NaiveDate| NewInvoice {
            client_name: "Umuhoza Ltd".into(),
            site_location: None,
            date: d,
            project_id: None,
            items: vec![item.clone()],
        };

        let first = db.create_invoice(&new(date(2024, 3, 5))).unwrap();
        let second = db.create_invoice(&new(date(2024, 3, 12))).unwrap();
        assert_eq!(second.number, "INV-2024/03/002");

        // Deleting an earlier invoice must not free its number for reuse
        db.delete_invoice(first.id).unwrap();
        let third = db.create_invoice(&new(date(2024, 3, 20))).unwrap();
        assert_eq!(third.number, "INV-2024/03/003");
    }

    #[test]
    fn test_tax_summary_window_and_position() {
        let db = Database::in_memory().unwrap();

        db.import_purchases("tester", vec![purchase("P-1", 10, 1000.0, 40.0)])
            .unwrap();
        db.import_sales("tester", vec![sale("S-1", 15, 2000.0, 100.0)])
            .unwrap();

        let worker_id = db
            .create_worker(&NewWorker {
                first_name: "Jean".into(),
                last_name: "Mugisha".into(),
                id_number: "1199x".into(),
                phone: None,
            })
            .unwrap();
        db.create_payment(&NewPayment {
            worker_id,
            project_id: None,
            activity: None,
            work_date: date(2024, 1, 20),
            net_amount: 100.0,
            payment_method: PaymentMethod::Cash,
            momo_reference: None,
        })
        .unwrap();

        let summary = db.tax_summary(&DateWindow::default()).unwrap();
        assert_eq!(summary.vat_output, 100.0);
        assert_eq!(summary.vat_input, 40.0);
        assert_eq!(summary.withholding, 15.0);
        assert_eq!(summary.vat_position, 60.0);
        assert_eq!(summary.total_liability, 75.0);

        // End date inclusive: the sale on the 15th is inside [10th, 15th]
        let window = DateWindow::parse(Some("2024-01-10"), Some("2024-01-15")).unwrap();
        let summary = db.tax_summary(&window).unwrap();
        assert_eq!(summary.vat_output, 100.0);
        assert_eq!(summary.vat_input, 40.0);
        assert_eq!(summary.withholding, 0.0);

        // Window excluding everything
        let window = DateWindow::parse(Some("2024-02-01"), None).unwrap();
        let summary = db.tax_summary(&window).unwrap();
        assert_eq!(summary.total_liability, 0.0);
    }

    #[test]
    fn test_tax_summary_negative_position_keeps_withholding() {
        let db = Database::in_memory().unwrap();

        db.import_purchases("tester", vec![purchase("P-1", 10, 1000.0, 150.0)])
            .unwrap();
        db.import_sales("tester", vec![sale("S-1", 15, 500.0, 100.0)])
            .unwrap();

        let worker_id = db
            .create_worker(&NewWorker {
                first_name: "Jean".into(),
                last_name: "Mugisha".into(),
                id_number: "1199x".into(),
                phone: None,
            })
            .unwrap();
        db.create_payment(&NewPayment {
            worker_id,
            project_id: None,
            activity: None,
            work_date: date(2024, 1, 20),
            net_amount: 100.0,
            payment_method: PaymentMethod::Cash,
            momo_reference: None,
        })
        .unwrap();

        let summary = db.tax_summary(&DateWindow::default()).unwrap();
        assert_eq!(summary.vat_position, -50.0);
        assert_eq!(summary.total_liability, -35.0);
    }

    #[test]
    fn test_record_audit_failure_does_not_fail_primary_operation() {
        let db = Database::in_memory().unwrap();

        // Sabotage the audit table; the import must still apply
        db.conn().unwrap().execute_batch("DROP TABLE audit_log;").unwrap();

        let outcome = db
            .import_purchases("tester", vec![purchase("A", 1, 100.0, 18.0)])
            .unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(db.list_all_purchases().unwrap().len(), 1);
    }

    #[test]
    fn test_audit_log_list_and_clear() {
        let db = Database::in_memory().unwrap();

        db.log_audit("alice", AuditAction::Create, Some("projects"), Some(1), None)
            .unwrap();
        db.log_audit("bob", AuditAction::Delete, Some("expenses"), Some(2), Some("cleanup"))
            .unwrap();

        let entries = db.list_audit_log(&DateWindow::default(), 10, 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(db.count_audit_log(&DateWindow::default()).unwrap(), 2);

        // Pagination
        let page = db.list_audit_log(&DateWindow::default(), 1, 1).unwrap();
        assert_eq!(page.len(), 1);

        assert_eq!(db.clear_audit_log().unwrap(), 2);
        assert!(db.list_audit_log(&DateWindow::default(), 10, 0).unwrap().is_empty());
    }

    #[test]
    fn test_dashboard_totals() {
        let db = Database::in_memory().unwrap();

        db.create_project(&NewProject {
            name: "P1".into(),
            client_name: "C1".into(),
            contract_amount: 1000.0,
            status: ProjectStatus::Active,
            start_date: None,
            description: None,
        })
        .unwrap();
        db.create_expense(&NewExpense {
            recipient_name: "Shop".into(),
            recipient_phone: None,
            amount: 200.0,
            date: date(2024, 1, 1),
            payment_mode: PaymentMode::Cash,
            reason: None,
            project_id: None,
        })
        .unwrap();
        db.insert_purchase(&purchase("A", 1, 100.0, 18.0)).unwrap();

        let totals = db.dashboard_totals().unwrap();
        assert_eq!(totals.project_count, 1);
        assert_eq!(totals.total_contract_value, 1000.0);
        assert_eq!(totals.total_expenses, 200.0);
        assert_eq!(totals.total_purchases, 118.0);
    }
}
