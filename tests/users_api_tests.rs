mod common;

use alumni_backend::model::user::{Location, Role};
use alumni_backend::util::password::{PasswordUtils, PasswordUtilsImpl};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{TestApp, PASSWORD};
use serde_json::json;

fn seed_directory(app: &TestApp) {
    let base = Utc::now();
    let people = [
        ("Amina", 2012, "Hargeisa", "Engineer"),
        ("Bashir", 2015, "Nairobi", "Doctor"),
        ("Caaliya", 2015, "Hargeisa", "Software Engineer"),
    ];
    for (i, (name, year, city, profession)) in people.into_iter().enumerate() {
        let user = app.seed_user(name, &format!("{}@example.com", name.to_lowercase()), Role::Alumni);
        app.edit_user(&user, |u| {
            u.created_at = base - Duration::minutes(i as i64);
            u.profile.graduation_year = Some(year);
            u.profile.profession = Some(profession.to_string());
            u.profile.location = Some(Location { city: Some(city.to_string()), country: Some("Somaliland".into()) });
        });
    }
}

#[tokio::test]
async fn test_directory_lists_active_users_with_pagination() {
    let app = TestApp::new();
    seed_directory(&app);
    let hidden = app.seed_user("Deeqa", "deeqa@example.com", Role::Alumni);
    app.edit_user(&hidden, |u| u.is_active = false);

    let (status, body) = app.call("GET", "/api/users?page=2&limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"], json!({ "page": 2, "limit": 2, "total": 3, "pages": 2 }));
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["firstName"], "Caaliya");
}

#[tokio::test]
async fn test_directory_filters() {
    let app = TestApp::new();
    seed_directory(&app);

    let (_, body) = app.call("GET", "/api/users?graduationYear=2015&location=harg", None, None).await;
    let names: Vec<&str> = body["users"].as_array().unwrap().iter().map(|u| u["firstName"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Caaliya"]);

    let (_, body) = app.call("GET", "/api/users?search=engineer", None, None).await;
    assert_eq!(body["pagination"]["total"], 2);

    let (status, body) = app.call("GET", "/api/users?limit=500", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
}

#[tokio::test]
async fn test_directory_hides_private_fields_from_strangers() {
    let app = TestApp::new();
    let amina = app.seed_user("Amina", "amina@example.com", Role::Alumni);
    app.edit_user(&amina, |u| u.phone = Some("+252631111111".into()));
    let uri = format!("/api/users/{}", amina.id.unwrap().to_hex());

    let (status, body) = app.call("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("email").is_none());
    assert!(body.get("phone").is_none());
    assert!(body.get("preferences").is_none());

    let owner_token = app.token_for(&amina);
    let (_, body) = app.call("GET", &uri, Some(&owner_token), None).await;
    assert_eq!(body["email"], "amina@example.com");
    assert_eq!(body["phone"], "+252631111111");

    let (_, admin_token) = app.login_as("Root", Role::Admin);
    let (_, body) = app.call("GET", &uri, Some(&admin_token), None).await;
    assert_eq!(body["email"], "amina@example.com");
}

#[tokio::test]
async fn test_get_user_errors() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/api/users/not-an-id", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid user id");

    let missing = format!("/api/users/{}", bson::oid::ObjectId::new().to_hex());
    let (status, body) = app.call("GET", &missing, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_update_profile_merges_nested_fields() {
    let app = TestApp::new();
    let (user, token) = app.login_as("Amina", Role::Alumni);
    app.edit_user(&user, |u| {
        u.profile.location = Some(Location { city: Some("Hargeisa".into()), country: Some("Somaliland".into()) });
    });

    let (status, body) = app
        .call(
            "PUT",
            "/api/users/profile",
            Some(&token),
            Some(json!({
                "lastName": "Hassan",
                "profile": { "profession": "Architect", "location": { "city": "Berbera" }, "skills": ["cad"] }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["user"]["lastName"], "Hassan");
    assert_eq!(body["user"]["profile"]["location"], json!({ "city": "Berbera", "country": "Somaliland" }));

    let stored = app.stored_user(&user);
    assert_eq!(stored.first_name, "Amina");
    assert_eq!(stored.profile.profession.as_deref(), Some("Architect"));
    assert_eq!(stored.profile.skills, vec!["cad".to_string()]);
}

#[tokio::test]
async fn test_update_profile_rejects_taken_phone() {
    let app = TestApp::new();
    let other = app.seed_user("Bashir", "bashir@example.com", Role::Alumni);
    app.edit_user(&other, |u| u.phone = Some("+252632222222".into()));
    let (_, token) = app.login_as("Amina", Role::Alumni);

    let (status, body) = app
        .call("PUT", "/api/users/profile", Some(&token), Some(json!({ "phone": "+252 63 222-2222" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Phone number already in use");
}

#[tokio::test]
async fn test_update_preferences_keeps_unspecified_flags() {
    let app = TestApp::new();
    let (user, token) = app.login_as("Amina", Role::Alumni);

    let (status, body) = app
        .call(
            "PUT",
            "/api/users/preferences",
            Some(&token),
            Some(json!({ "smsNotifications": false, "privacy": { "showEmail": true } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preferences"]["smsNotifications"], false);
    assert_eq!(body["preferences"]["emailNotifications"], true);
    assert_eq!(body["preferences"]["privacy"]["showEmail"], true);
    assert_eq!(body["preferences"]["privacy"]["showLocation"], true);
    assert!(!app.stored_user(&user).preferences.sms_notifications);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    let (user, token) = app.login_as("Amina", Role::Alumni);

    let (status, body) = app
        .call(
            "PUT",
            "/api/users/password",
            Some(&token),
            Some(json!({ "currentPassword": "wrong", "newPassword": "brandnew1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Current password is incorrect");

    let (status, _) = app
        .call(
            "PUT",
            "/api/users/password",
            Some(&token),
            Some(json!({ "currentPassword": PASSWORD, "newPassword": "brandnew1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let stored = app.stored_user(&user);
    assert!(PasswordUtilsImpl::verify_password("brandnew1", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn test_delete_account_soft_deletes() {
    let app = TestApp::new();
    let (user, token) = app.login_as("Amina", Role::Alumni);

    let (status, body) = app
        .call("DELETE", "/api/users/account", Some(&token), Some(json!({ "password": "nope" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Incorrect password");

    let (status, _) = app
        .call("DELETE", "/api/users/account", Some(&token), Some(json!({ "password": PASSWORD })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let stored = app.stored_user(&user);
    assert!(!stored.is_active);
    assert!(stored.email.starts_with("deleted_"));

    let uri = format!("/api/users/{}", user.id.unwrap().to_hex());
    let (status, _) = app.call("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_filter_values() {
    let app = TestApp::new();
    seed_directory(&app);

    let (status, body) = app.call("GET", "/api/users/filters/graduation-years", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([2015, 2012]));

    let (_, body) = app.call("GET", "/api/users/filters/locations", None, None).await;
    assert_eq!(body, json!(["Hargeisa", "Nairobi"]));
}

#[tokio::test]
async fn test_profile_routes_require_token() {
    let app = TestApp::new();
    let (status, _) = app.call("PUT", "/api/users/profile", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
