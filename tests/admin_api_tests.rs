mod common;

use alumni_backend::model::payment::{Payment, PaymentMethod, PaymentStatus, PaymentType};
use alumni_backend::model::user::{Role, User};
use axum::http::{header, StatusCode};
use bson::oid::ObjectId;
use chrono::{DateTime, TimeZone, Utc};
use common::TestApp;
use serde_json::json;

fn payment(payer: &User, amount: f64, status: PaymentStatus, at: DateTime<Utc>) -> Payment {
    Payment {
        id: Some(ObjectId::new()),
        user: payer.id.unwrap(),
        amount,
        currency: "USD".into(),
        payment_type: PaymentType::Membership,
        purpose: "Annual dues".into(),
        status,
        payment_method: PaymentMethod::Zaad,
        transaction_id: Some(format!("tx-{amount}")),
        payment_details: Some(bson::doc! { "provider": "zaad", "msisdn": "252631234567" }),
        created_at: at,
        updated_at: at,
    }
}

fn seed_payments(app: &TestApp, payer: &User) {
    let jan = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
    let feb = Utc.with_ymd_and_hms(2025, 2, 3, 10, 0, 0).unwrap();
    let mut items = app.payments.items.lock().unwrap();
    items.push(payment(payer, 50.0, PaymentStatus::Completed, jan));
    items.push(payment(payer, 25.0, PaymentStatus::Completed, feb));
    items.push(payment(payer, 10.0, PaymentStatus::Completed, feb));
    items.push(payment(payer, 99.0, PaymentStatus::Failed, feb));
}

#[tokio::test]
async fn test_admin_routes_reject_non_admins() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/api/admin/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token required");

    let (_, moderator) = app.login_as("Mod", Role::Moderator);
    for uri in ["/api/admin/dashboard", "/api/admin/users", "/api/admin/settings", "/api/admin/payments"] {
        let (status, body) = app.call("GET", uri, Some(&moderator), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["message"], "Insufficient permissions");
    }
}

#[tokio::test]
async fn test_dashboard_aggregates() {
    let app = TestApp::new();
    let (admin, token) = app.login_as("Root", Role::Admin);
    app.login_as("Amina", Role::Alumni);
    let gone = app.seed_user("Gone", "gone@example.com", Role::Alumni);
    app.edit_user(&gone, |u| u.is_active = false);
    seed_payments(&app, &admin);

    let (status, body) = app.call("GET", "/api/admin/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"]["total"], 2);
    assert_eq!(body["users"]["byRole"], json!({ "admin": 1, "alumni": 1 }));
    assert_eq!(body["users"]["recent"].as_array().unwrap().len(), 2);
    assert_eq!(body["payments"]["totalRevenue"], 85.0);
    assert_eq!(
        body["payments"]["monthlyRevenue"],
        json!([
            { "month": "2025-01", "revenue": 50.0, "transactions": 1 },
            { "month": "2025-02", "revenue": 35.0, "transactions": 2 },
        ])
    );
    assert_eq!(body["events"]["total"], 0);
    assert_eq!(body["jobs"]["total"], 0);

    let (_, body) = app
        .call(
            "GET",
            "/api/admin/dashboard?startDate=2025-02-01T00:00:00Z&endDate=2025-02-28T00:00:00Z",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["payments"]["recentRevenue"], 35.0);
    assert_eq!(body["users"]["new"], 0);
}

#[tokio::test]
async fn test_list_users_filters_by_role_and_status() {
    let app = TestApp::new();
    let (_, token) = app.login_as("Root", Role::Admin);
    app.login_as("Amina", Role::Alumni);
    app.login_as("Mod", Role::Moderator);
    let gone = app.seed_user("Gone", "gone@example.com", Role::Alumni);
    app.edit_user(&gone, |u| u.is_active = false);

    let (status, body) = app.call("GET", "/api/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["limit"], 50);

    let (_, body) = app.call("GET", "/api/admin/users?status=inactive", Some(&token), None).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["users"][0]["email"], "gone@example.com");

    let (_, body) = app.call("GET", "/api/admin/users?role=moderator", Some(&token), None).await;
    assert_eq!(body["users"][0]["firstName"], "Mod");
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_update_role_and_status() {
    let app = TestApp::new();
    let (_, token) = app.login_as("Root", Role::Admin);
    let (member, member_token) = app.login_as("Amina", Role::Alumni);
    let base = format!("/api/admin/users/{}", member.id.unwrap().to_hex());

    let (status, body) = app
        .call("PUT", &format!("{base}/role"), Some(&token), Some(json!({ "role": "moderator" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User role updated successfully");
    assert_eq!(body["user"]["role"], "moderator");
    assert_eq!(app.stored_user(&member).role, Role::Moderator);

    let (status, _) = app
        .call("PUT", &format!("{base}/role"), Some(&token), Some(json!({ "role": "superuser" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call("PUT", &format!("{base}/status"), Some(&token), Some(json!({ "isActive": false })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deactivated successfully");
    assert_eq!(body["user"]["isActive"], false);

    let (status, _) = app.call("GET", "/api/auth/me", Some(&member_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = app
        .call("PUT", &format!("{base}/status"), Some(&token), Some(json!({ "isActive": true })))
        .await;
    assert_eq!(body["message"], "User activated successfully");

    let missing = format!("/api/admin/users/{}/status", ObjectId::new().to_hex());
    let (status, body) = app.call("PUT", &missing, Some(&token), Some(json!({ "isActive": true }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_list_payments_redacts_details() {
    let app = TestApp::new();
    let (admin, token) = app.login_as("Root", Role::Admin);
    seed_payments(&app, &admin);

    let (status, body) = app
        .call("GET", "/api/admin/payments?status=completed&limit=2", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"], json!({ "page": 1, "limit": 2, "total": 3, "pages": 2 }));
    let first = &body["payments"][0];
    assert!(first.get("paymentDetails").is_none());
    assert_eq!(first["user"]["email"], "root@example.com");
    assert_eq!(first["status"], "completed");
}

#[tokio::test]
async fn test_settings_reflect_site_and_channels() {
    let app = TestApp::new();
    let (_, token) = app.login_as("Root", Role::Admin);

    let (status, body) = app.call("GET", "/api/admin/settings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["general"]["siteName"], "Alumni Network");
    assert_eq!(body["notifications"]["emailEnabled"], true);
    assert_eq!(body["notifications"]["smsEnabled"], false);
    assert_eq!(body["payments"]["defaultCurrency"], "USD");
    assert_eq!(body["features"]["jobBoardEnabled"], true);
}

#[tokio::test]
async fn test_export_sets_attachment_headers() {
    let app = TestApp::new();
    let (admin, token) = app.login_as("Root", Role::Admin);
    seed_payments(&app, &admin);

    let resp = app.send("GET", "/api/admin/export/payments?format=csv", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv");
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"payments_export_"));
    assert!(disposition.ends_with(".csv\""));

    let (_, bytes) = app
        .call_raw("GET", "/api/admin/export/payments?format=csv", Some(&token), None)
        .await;
    let csv = String::from_utf8(bytes).unwrap();
    let mut lines = csv.lines();
    let header_row = lines.next().unwrap();
    assert!(header_row.contains("user.email"));
    assert!(!header_row.contains("paymentDetails"));
    assert_eq!(lines.count(), 3);
}

#[tokio::test]
async fn test_export_json_and_unknown_type() {
    let app = TestApp::new();
    let (_, token) = app.login_as("Root", Role::Admin);
    app.login_as("Amina", Role::Alumni);

    let resp = app.send("GET", "/api/admin/export/users", Some(&token), None).await;
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    let (_, bytes) = app.call_raw("GET", "/api/admin/export/users", Some(&token), None).await;
    let users: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(users.as_array().unwrap().len(), 2);
    assert!(users[0].get("passwordHash").is_none());

    let (status, body) = app.call("GET", "/api/admin/export/donations", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid export type");
}

#[tokio::test]
async fn test_bulk_notification_targets_audience() {
    let app = TestApp::new();
    let (_, token) = app.login_as("Root", Role::Admin);
    let class_of_2015 = app.seed_user("Amina", "amina@example.com", Role::Alumni);
    app.edit_user(&class_of_2015, |u| u.profile.graduation_year = Some(2015));
    let quiet = app.seed_user("Bashir", "bashir@example.com", Role::Alumni);
    app.edit_user(&quiet, |u| {
        u.profile.graduation_year = Some(2015);
        u.preferences.email_notifications = false;
    });

    let (status, body) = app
        .call(
            "POST",
            "/api/admin/notifications/bulk",
            Some(&token),
            Some(json!({
                "type": "email",
                "message": "Reunion registration is open",
                "audience": { "graduationYears": [2015] }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Notifications sent successfully");
    assert_eq!(body["results"]["email"], json!({ "successful": 1, "failed": 0 }));

    let emails = app.notifier.emails.lock().unwrap();
    assert_eq!(emails[0].0, vec!["amina@example.com".to_string()]);
    assert_eq!(emails[0].1, "Alumni Network");
}

#[tokio::test]
async fn test_bulk_notification_without_recipients() {
    let app = TestApp::new();
    let (_, token) = app.login_as("Root", Role::Admin);

    let (status, body) = app
        .call(
            "POST",
            "/api/admin/notifications/bulk",
            Some(&token),
            Some(json!({ "type": "both", "message": "Hello", "audience": { "graduationYears": [1999] } })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No recipients match the selected audience");
    assert!(app.notifier.emails.lock().unwrap().is_empty());
}
