//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sitebook_core::db::Database;
use tower::ServiceExt;

fn setup_test_app() -> Router {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: false,
        ..Default::default()
    };
    create_router(db, None, config)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_csv(boundary: &str, csv: &str) -> Body {
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{boundary}--\r\n"
    );
    Body::from(body)
}

const PURCHASES_HEADER: &str =
    "Supplier TIN,Supplier name,Nature of Goods,Receipt number,Receipt issue date,Amount without VAT,VAT";

async fn import_purchases_csv(app: Router, csv: &str) -> axum::response::Response {
    let boundary = "XBOUNDARY";
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/purchases/import")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(multipart_csv(boundary, csv))
            .unwrap(),
    )
    .await
    .unwrap()
}

// ========== Project API Tests ==========

#[tokio::test]
async fn test_list_projects_empty() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_and_get_project() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "name": "Gisozi Apartments",
        "client_name": "Umuhoza Ltd",
        "contract_amount": 5000000.0,
        "start_date": "2024-01-01",
        "description": null
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/projects")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Gisozi Apartments");
    assert_eq!(json["status"], "Active");
    let id = json["id"].as_i64().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/projects/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_project_not_found() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects/999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Expense API Tests ==========

#[tokio::test]
async fn test_create_expense_and_list_with_total() {
    let app = setup_test_app();

    for amount in [1000.0, 2500.0] {
        let body = serde_json::json!({
            "recipient_name": "Fuel Station",
            "recipient_phone": null,
            "amount": amount,
            "date": "2024-01-10",
            "payment_mode": "Cash",
            "reason": "Diesel",
            "project_id": null
        });

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/expenses")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/expenses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["expenses"].as_array().unwrap().len(), 2);
    assert_eq!(json["total"], 3500.0);
}

// ========== Import API Tests ==========

#[tokio::test]
async fn test_import_purchases_and_reconcile() {
    let app = setup_test_app();

    let first = format!(
        "{PURCHASES_HEADER}\n101,Kigali Cement,Cement,A,05/01/2024,100.00,18.00\n101,Kigali Cement,Cement,B,06/01/2024,200.00,36.00\n"
    );
    let response = import_purchases_csv(app.clone(), &first).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["inserted"], 2);
    assert_eq!(json["deleted"], 0);

    // Second export omits A and adds C
    let second = format!(
        "{PURCHASES_HEADER}\n101,Kigali Cement,Cement,B,06/01/2024,200.00,36.00\n101,Kigali Cement,Cement,C,07/01/2024,300.00,54.00\n"
    );
    let response = import_purchases_csv(app.clone(), &second).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["inserted"], 1);
    assert_eq!(json["deleted"], 1);
    assert_eq!(json["unchanged"], 1);

    // Flash message carries the cancelled receipt, then is consumed
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/imports/flash")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["kind"], "purchases");
    assert_eq!(json["cancelled"][0]["receipt_number"], "A");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/imports/flash")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert!(json.is_null());

    // Listing reflects the reconciled set, total = net + vat
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/purchases")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let purchases = json["purchases"].as_array().unwrap();
    assert_eq!(purchases.len(), 2);
    assert_eq!(json["totals"]["count"], 2);
    assert_eq!(json["totals"]["total"], 590.0);
}

#[tokio::test]
async fn test_import_rejects_missing_column() {
    let app = setup_test_app();

    let csv = "Supplier TIN,Supplier name\n101,Kigali Cement\n";
    let response = import_purchases_csv(app, csv).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clear_purchases_endpoint() {
    let app = setup_test_app();

    let csv = format!(
        "{PURCHASES_HEADER}\n101,Kigali Cement,Cement,A,05/01/2024,100.00,18.00\n"
    );
    import_purchases_csv(app.clone(), &csv).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/purchases")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["deleted"], 1);
}

// ========== Payment API Tests ==========

#[tokio::test]
async fn test_payment_computes_withholding() {
    let app = setup_test_app();

    let worker = serde_json::json!({
        "first_name": "Jean",
        "last_name": "Mugisha",
        "id_number": "1199x",
        "phone": null
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/workers")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&worker).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let worker_id = get_body_json(response).await["id"].as_i64().unwrap();

    let payment = serde_json::json!({
        "worker_id": worker_id,
        "project_id": null,
        "activity": "Masonry",
        "work_date": "2024-01-10",
        "net_amount": 10000.0,
        "payment_method": "Cash",
        "momo_reference": null
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/payments")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&payment).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["tax_amount"], 1500.0);
    assert_eq!(json["total_amount"], 11500.0);
}

// ========== Invoice API Tests ==========

#[tokio::test]
async fn test_create_invoice_numbering_and_vat() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "client_name": "Umuhoza Ltd",
        "site_location": "Gisozi",
        "date": "2024-03-05",
        "project_id": null,
        "items": [
            {"name": "Blocks", "specs": null, "unit": "pcs", "quantity": 100.0, "unit_price": 500.0}
        ]
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/invoices")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["number"], "INV-2024/03/001");
    assert_eq!(json["subtotal"], 50000.0);
    assert_eq!(json["vat"], 9000.0);
    assert_eq!(json["total"], 59000.0);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/invoices")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["number"], "INV-2024/03/002");
}

#[tokio::test]
async fn test_create_invoice_requires_items() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "client_name": "Umuhoza Ltd",
        "site_location": null,
        "date": "2024-03-05",
        "project_id": null,
        "items": []
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/invoices")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Report API Tests ==========

#[tokio::test]
async fn test_tax_summary_endpoint() {
    let app = setup_test_app();

    let csv = format!(
        "{PURCHASES_HEADER}\n101,Kigali Cement,Cement,A,05/01/2024,1000.00,40.00\n"
    );
    import_purchases_csv(app.clone(), &csv).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports/tax-summary")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["vat_input"], 40.0);
    assert_eq!(json["vat_output"], 0.0);
    assert_eq!(json["vat_position"], -40.0);
    assert_eq!(json["total_liability"], -40.0);
}

#[tokio::test]
async fn test_tax_summary_rejects_bad_date() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports/tax-summary?startDate=not-a-date")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Export API Tests ==========

#[tokio::test]
async fn test_export_purchases_csv() {
    let app = setup_test_app();

    let csv = format!(
        "{PURCHASES_HEADER}\n101,Kigali Cement,Cement,A,05/01/2024,100.00,18.00\n"
    );
    import_purchases_csv(app.clone(), &csv).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/purchases/export")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv; charset=utf-8"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("Date,Supplier TIN"));
    assert!(text.contains("118.00"));
}

// ========== Audit API Tests ==========

#[tokio::test]
async fn test_audit_log_records_mutations() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "name": "P1",
        "client_name": "C1",
        "contract_amount": 1.0,
        "start_date": null,
        "description": null
    });
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/projects")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/audit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "CREATE");
    assert_eq!(entries[0]["actor"], "local-dev");
}

// ========== Auth Tests ==========

fn setup_auth_app(api_keys: Vec<String>) -> Router {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        allowed_origins: vec![],
        api_keys,
    };
    create_router(db, None, config)
}

#[tokio::test]
async fn test_requires_auth_by_default() {
    let app = setup_auth_app(vec![]);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_key_auth() {
    let app = setup_auth_app(vec!["secret-key".to_string()]);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .header("authorization", "Bearer secret-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .header("authorization", "Bearer wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cf_access_header_auth() {
    let app = setup_auth_app(vec![]);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .header("cf-access-authenticated-user-email", "owner@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_validate_api_key_constant_time() {
    assert!(validate_api_key("abc", &["abc".to_string()]));
    assert!(!validate_api_key("abd", &["abc".to_string()]));
    assert!(!validate_api_key("abcd", &["abc".to_string()]));
    assert!(!validate_api_key("abc", &[]));
}
