mod common;

use common::app::AdminProcess;
use common::PASSWORD;
use once_cell::sync::Lazy;
use reqwest::{redirect, Client, StatusCode};
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static ADMIN: Lazy<OnceCell<AdminProcess>> = Lazy::new(OnceCell::new);

async fn admin() -> &'static AdminProcess {
    ADMIN.get_or_init(AdminProcess::start).await
}

async fn sign_in(client: &Client, server: &AdminProcess) -> String {
    let response = client
        .post(server.url("/login"))
        .form(&[("username", "admin"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/members");
    response.text().await.unwrap()
}

async fn find_member(client: &Client, server: &AdminProcess, term: &str) -> Value {
    client
        .get(server.url("/api/members"))
        .query(&[("q", term)])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn web_sign_in_rejects_bad_password() {
    let _guard = TEST_LOCK.lock().await;
    let server = admin().await;
    let client = Client::new();

    client.post(server.url("/logout")).send().await.unwrap();
    let members = client.get(server.url("/members")).send().await.unwrap();
    assert_eq!(members.url().path(), "/login");

    let body = client
        .post(server.url("/login"))
        .form(&[("username", "admin"), ("password", "nope")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Invalid username or password"));
    assert!(body.contains(r#"value="admin""#));
}

#[tokio::test]
async fn web_member_lifecycle() {
    let _guard = TEST_LOCK.lock().await;
    let server = admin().await;
    let client = Client::new();

    let body = sign_in(&client, server).await;
    assert!(body.contains("<h1>Members</h1>"));

    let created = client
        .post(server.url("/members"))
        .form(&[
            ("full_name", "Ana Web"),
            ("cedula", "990011"),
            ("email", "ana.web@x.com"),
            ("phone", "555"),
            ("membership_type", "Anual"),
            ("is_active", "on"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(created.url().path(), "/members");
    let body = created.text().await.unwrap();
    assert!(body.contains("Ana Web was added"));
    assert!(body.contains("Anual"));

    let page = find_member(&client, server, "990011").await;
    assert_eq!(page["total_matches"], 1);
    let id = page["items"][0]["id"].as_u64().expect("member id");

    let body = client
        .post(server.url(&format!("/members/{id}/toggle")))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Ana Web was deactivated"));

    let confirm = client
        .get(server.url(&format!("/members/{id}/delete")))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(confirm.contains("This cannot be undone"));

    let body = client
        .post(server.url(&format!("/members/{id}/delete")))
        .form(&[("confirm", "yes")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Member deleted"));
    assert_eq!(find_member(&client, server, "990011").await["total_matches"], 0);
    assert!(server.backend.data().members.iter().all(|m| m["cedula"] != "990011"));
}

#[tokio::test]
async fn web_invalid_member_form_is_shown_again() {
    let _guard = TEST_LOCK.lock().await;
    let server = admin().await;
    let client = Client::new();
    sign_in(&client, server).await;

    let before = server.backend.request_count();
    let body = client
        .post(server.url("/members"))
        .form(&[("full_name", "Sin Correo"), ("cedula", "1"), ("email", ""), ("phone", "555")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("<h1>New member</h1>"));
    assert!(body.contains(r#"value="Sin Correo""#));
    assert!(body.contains(r#"<span class="field-error">is required</span>"#));
    assert_eq!(server.backend.request_count(), before);
}

#[tokio::test]
async fn web_expired_session_returns_to_login() {
    let _guard = TEST_LOCK.lock().await;
    let server = admin().await;
    let client = Client::new();
    sign_in(&client, server).await;

    server.backend.data().valid_token = "rotated-token".into();
    let response = client
        .post(server.url("/members/reload"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/login");

    let body = sign_in(&client, server).await;
    assert!(body.contains("<h1>Members</h1>"));
}

#[tokio::test]
async fn web_stats_and_calendar_pages_render() {
    let _guard = TEST_LOCK.lock().await;
    let server = admin().await;
    let client = Client::new();
    sign_in(&client, server).await;

    let stats = client
        .get(server.url("/stats"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(stats.contains("Present now"));
    assert!(stats.contains("Sign-ups per week"));

    let calendar = client
        .post(server.url("/calendar/events"))
        .form(&[("title", "Spinning"), ("date", "2025-03-09"), ("description", "Sala 2")])
        .send()
        .await
        .unwrap();
    assert_eq!(calendar.url().path(), "/calendar");
    let body = calendar.text().await.unwrap();
    assert!(body.contains("Activity added"));
    assert!(body.contains(r#"title="Sala 2""#));
    assert!(body.contains("2025-03-09"));
}

#[tokio::test]
async fn web_member_pages_load_a_cold_cache() {
    let _guard = TEST_LOCK.lock().await;
    let server = admin().await;
    server.backend.seed_member(40, "Rosa Fría", "2024-05-05");
    let client = Client::builder().redirect(redirect::Policy::none()).build().unwrap();

    // Signing in drops the cache; the redirect to the list is not followed.
    let login = client
        .post(server.url("/login"))
        .form(&[("username", "admin"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::SEE_OTHER);

    let edit = client.get(server.url("/members/40/edit")).send().await.unwrap();
    assert_eq!(edit.status(), StatusCode::OK);
    let body = edit.text().await.unwrap();
    assert!(body.contains("<h1>Edit member</h1>"));
    assert!(body.contains(r#"value="Rosa Fría""#));

    client.post(server.url("/logout")).send().await.unwrap();
    client
        .post(server.url("/login"))
        .form(&[("username", "admin"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    let toggle = client.post(server.url("/members/40/toggle")).send().await.unwrap();
    assert_eq!(toggle.status(), StatusCode::SEE_OTHER);
    let data = server.backend.data();
    let rosa = data.members.iter().find(|m| m["id"] == 40).expect("seeded member");
    assert_eq!(rosa["is_active"], false);
}
