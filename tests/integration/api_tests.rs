//! API integration tests
//!
//! The router tests run in-process against a lazily connected pool and only
//! exercise paths that are rejected before reaching the database. The
//! `#[ignore]`d tests need a running server with a migrated database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use catalog_server::{
    api::{self, Session},
    config::AppConfig,
    models::user::UserClaims,
    repository::Repository,
    services::{sessions::MemorySessionStore, Services},
    AppState,
};

const BASE_URL: &str = "http://localhost:8080";

fn test_state() -> AppState {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("Failed to create lazy pool");
    let services = Services::new(Repository::new(pool), &config, Arc::new(MemorySessionStore::new()));
    AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    }
}

fn token_for(state: &AppState, user_id: i32, is_staff: bool) -> String {
    let now = chrono::Utc::now().timestamp();
    UserClaims {
        sub: format!("user{}", user_id),
        user_id,
        is_staff,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&state.config.auth.jwt_secret)
    .expect("Failed to create token")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Value) {
    let response = app.oneshot(request).await.expect("Request failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.expect("Failed to read body").to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("Failed to build request")
}

#[tokio::test]
async fn test_health_check_in_process() {
    let app = api::router(test_state());
    let (status, _, body) = send(app, get_request("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_root_redirects_to_catalog() {
    let app = api::router(test_state());
    let (status, headers, _) = send(app, get_request("/", None)).await;

    assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
    assert_eq!(headers[header::LOCATION], "/catalog/");
}

#[tokio::test]
async fn test_my_books_redirects_anonymous_to_login() {
    let app = api::router(test_state());
    let (status, headers, _) = send(app, get_request("/catalog/mybooks/", None)).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        headers[header::LOCATION],
        "/accounts/login/?next=%2Fcatalog%2Fmybooks%2F"
    );
}

#[tokio::test]
async fn test_my_books_redirect_keeps_query() {
    let app = api::router(test_state());
    let (status, headers, _) = send(app, get_request("/catalog/mybooks/?page=2", Some("garbage"))).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        headers[header::LOCATION],
        "/accounts/login/?next=%2Fcatalog%2Fmybooks%2F%3Fpage%3D2"
    );
}

#[tokio::test]
async fn test_book_list_rejects_bad_page() {
    let app = api::router(test_state());
    let (status, _, body) = send(app, get_request("/catalog/books/?page=abc", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchRecord");
}

#[tokio::test]
async fn test_admin_requires_authentication() {
    let app = api::router(test_state());
    let (status, _, _) = send(app, get_request("/admin/", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_rejects_non_staff() {
    let state = test_state();
    let token = token_for(&state, 2, false);
    let app = api::router(state);
    let (status, _, _) = send(app, get_request("/admin/book/", Some(&token))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_registry_lists_models() {
    let state = test_state();
    let token = token_for(&state, 1, true);
    let app = api::router(state);
    let (status, _, body) = send(app, get_request("/admin/", Some(&token))).await;

    assert_eq!(status, StatusCode::OK);
    let models = body["models"].as_object().expect("models should be an object");
    let names: Vec<&str> = models.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["author", "book", "bookinstance", "genre", "language"]);
    assert_eq!(
        body["models"]["bookinstance"]["list_filter"],
        json!(["status", "due_back", "borrower"])
    );
    assert_eq!(body["models"]["author"]["inlines"][0]["model"], "book");
}

#[tokio::test]
async fn test_admin_unknown_model_is_not_found() {
    let state = test_state();
    let token = token_for(&state, 1, true);
    let app = api::router(state);
    let (status, _, _) = send(app, get_request("/admin/publisher/", Some(&token))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_undeclared_filter_is_bad_request() {
    let state = test_state();
    let token = token_for(&state, 1, true);
    let app = api::router(state);
    let (status, _, _) = send(app, get_request("/admin/book/?status=o", Some(&token))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn session_id(app: Router, cookie: Option<String>) -> String {
    let mut builder = Request::builder().uri("/session");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_known_session_cookie_is_reused() {
    let state = test_state();
    let cookie_name = state.config.session.cookie_name.clone();
    state.services.sessions.record_visit("abc123").await.unwrap();
    let app: Router = Router::new()
        .route("/session", get(|session: Session| async move { session.id }))
        .with_state(state);

    let id = session_id(app, Some(format!("{}=abc123", cookie_name))).await;
    assert_eq!(id, "abc123");
}

#[tokio::test]
async fn test_unknown_session_cookie_is_replaced() {
    let state = test_state();
    let cookie_name = state.config.session.cookie_name.clone();
    let app: Router = Router::new()
        .route("/session", get(|session: Session| async move { session.id }))
        .with_state(state);

    let forged = session_id(app.clone(), Some(format!("{}=forged-id", cookie_name))).await;
    assert_ne!(forged, "forged-id");
    assert_eq!(forged.len(), 32);

    let fresh = session_id(app, None).await;
    assert_eq!(fresh.len(), 32);
    assert_ne!(fresh, forged);
}

#[tokio::test]
async fn test_non_integer_detail_ids_are_not_found() {
    for uri in ["/catalog/book/abc", "/catalog/author/99999999999"] {
        let app = api::router(test_state());
        let (status, _, body) = send(app, get_request(uri, None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"], "NoSuchRecord");
    }
}

#[tokio::test]
async fn test_login_redirect_target_is_served() {
    let app = api::router(test_state());
    let (status, headers, body) = send(
        app,
        get_request("/accounts/login/?next=%2Fcatalog%2Fmybooks%2F", None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-template"], "registration/login.html");
    assert_eq!(body["action"], "/accounts/login");
    assert_eq!(body["next"], "/catalog/mybooks/");
}

// ---------------------------------------------------------------------------
// Live server tests
// ---------------------------------------------------------------------------

/// Helper to get a staff token from the running server
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/accounts/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Secret the running server signs tokens with, read from the same configuration
fn server_secret() -> String {
    AppConfig::load().expect("Failed to load configuration").auth.jwt_secret
}

async fn admin_create(client: &Client, token: &str, model: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}/admin/{}/", BASE_URL, model))
        .header("Authorization", format!("Bearer {}", token))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201, "creating {}", model);
    response.json().await.expect("Failed to parse response")
}

async fn admin_delete(client: &Client, token: &str, model: &str, id: &Value) {
    let id = id.as_str().map(str::to_string).unwrap_or_else(|| id.to_string());
    let response = client
        .delete(format!("{}/admin/{}/{}", BASE_URL, model, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204, "deleting {} {}", model, id);
}

async fn get_json(client: &Client, url: String, token: Option<&str>) -> (u16, Value) {
    let mut request = client.get(url);
    if let Some(token) = token {
        request = request.header("Authorization", format!("Bearer {}", token));
    }
    let response = request.send().await.expect("Failed to send request");
    let status = response.status().as_u16();
    (status, response.json().await.unwrap_or(Value::Null))
}

fn unique_isbn() -> String {
    format!("{:013}", uuid::Uuid::new_v4().as_u128() % 10_000_000_000_000)
}

/// Create an author, a language and `count` books by that author
async fn seed_books(client: &Client, token: &str, count: usize) -> (Value, Value, Vec<Value>) {
    let author = admin_create(
        client,
        token,
        "author",
        json!({"first_name": "Seed", "last_name": "Author", "date_of_birth": "1950-01-01"}),
    )
    .await;
    let language = admin_create(
        client,
        token,
        "language",
        json!({"name": format!("Seed language {}", uuid::Uuid::new_v4())}),
    )
    .await;

    let mut books = Vec::with_capacity(count);
    for n in 0..count {
        let book = admin_create(
            client,
            token,
            "book",
            json!({
                "title": format!("Seed book {}", n),
                "author_id": author["id"],
                "language_id": language["id"],
                "isbn": unique_isbn(),
            }),
        )
        .await;
        books.push(book);
    }
    (author, language, books)
}

/// Primary keys of the first admin change-list page, in list order
async fn change_list_pks(client: &Client, token: &str, model: &str) -> Vec<Value> {
    let (status, body) = get_json(client, format!("{}/admin/{}/", BASE_URL, model), Some(token)).await;
    assert_eq!(status, 200);
    body["rows"]
        .as_array()
        .expect("rows should be an array")
        .iter()
        .map(|row| row["pk"].clone())
        .collect()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_ready() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/accounts/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/accounts/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_visit_counter_counts_previous_visits() {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");

    for expected in 0..3 {
        let response = client
            .get(format!("{}/catalog/", BASE_URL))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(response.headers()["x-template"], "index.html");
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["num_visits"], expected);
        assert!(body["num_instances_available"].as_i64() <= body["num_instances"].as_i64());
    }
}

#[tokio::test]
#[ignore]
async fn test_book_list_is_capped_and_paginated() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (author, language, books) = seed_books(&client, &token, 7).await;

    let first_five: Vec<Value> = change_list_pks(&client, &token, "book").await.into_iter().take(5).collect();
    assert_eq!(first_five.len(), 5);

    let mut seen = Vec::new();
    for (page, expected) in [(1, &first_five[0..2]), (2, &first_five[2..4]), (3, &first_five[4..5])] {
        let (status, body) = get_json(&client, format!("{}/catalog/books/?page={}", BASE_URL, page), None).await;
        assert_eq!(status, 200);
        assert_eq!(body["page"]["count"], 5);
        assert_eq!(body["page"]["num_pages"], 3);
        assert_eq!(body["page"]["per_page"], 2);
        let ids: Vec<Value> = body["book_list"].as_array().unwrap().iter().map(|b| b["id"].clone()).collect();
        assert_eq!(ids, expected);
        seen.extend(ids);
    }
    assert_eq!(seen, first_five);

    let (status, _) = get_json(&client, format!("{}/catalog/books/?page=4", BASE_URL), None).await;
    assert_eq!(status, 404);

    for book in &books {
        admin_delete(&client, &token, "book", &book["id"]).await;
    }
    admin_delete(&client, &token, "author", &author["id"]).await;
    admin_delete(&client, &token, "language", &language["id"]).await;
}

#[tokio::test]
#[ignore]
async fn test_author_list_is_capped_and_paginated() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let mut authors = Vec::new();
    for n in 0..7 {
        let author = admin_create(
            &client,
            &token,
            "author",
            json!({"first_name": format!("Seed {}", n), "last_name": "Aaberg", "date_of_birth": "1960-05-01"}),
        )
        .await;
        authors.push(author);
    }

    let first_five: Vec<Value> = change_list_pks(&client, &token, "author").await.into_iter().take(5).collect();

    let mut seen = Vec::new();
    for page in 1..=3 {
        let (status, body) = get_json(&client, format!("{}/catalog/authors/?page={}", BASE_URL, page), None).await;
        assert_eq!(status, 200);
        assert_eq!(body["page"]["count"], 5);
        seen.extend(body["author_list"].as_array().unwrap().iter().map(|a| a["id"].clone()));
    }
    assert_eq!(seen, first_five);

    let (status, _) = get_json(&client, format!("{}/catalog/authors/?page=4", BASE_URL), None).await;
    assert_eq!(status, 404);

    for author in &authors {
        admin_delete(&client, &token, "author", &author["id"]).await;
    }
}

#[tokio::test]
#[ignore]
async fn test_my_books_lists_own_loans_by_due_date() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let secret = server_secret();
    let admin = UserClaims::from_token(&token, &secret).expect("Token not signed with configured secret");
    let (author, language, books) = seed_books(&client, &token, 1).await;
    let book_id = &books[0]["id"];

    // created out of order so the listing has to sort them
    let later = admin_create(
        &client,
        &token,
        "bookinstance",
        json!({"book_id": book_id, "imprint": "Later", "due_back": "2031-06-01", "status": "o", "borrower_id": admin.user_id}),
    )
    .await;
    let sooner = admin_create(
        &client,
        &token,
        "bookinstance",
        json!({"book_id": book_id, "imprint": "Sooner", "due_back": "2031-01-01", "status": "o", "borrower_id": admin.user_id}),
    )
    .await;
    let returned = admin_create(
        &client,
        &token,
        "bookinstance",
        json!({"book_id": book_id, "imprint": "Returned", "due_back": "2030-01-01", "status": "a", "borrower_id": admin.user_id}),
    )
    .await;

    let (status, first) = get_json(&client, format!("{}/catalog/mybooks/", BASE_URL), Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(first["page"]["per_page"], 10);

    let mut listed = Vec::new();
    let num_pages = first["page"]["num_pages"].as_u64().unwrap();
    for page in 1..=num_pages {
        let (_, body) = get_json(&client, format!("{}/catalog/mybooks/?page={}", BASE_URL, page), Some(&token)).await;
        listed.extend(body["bookinstance_list"].as_array().unwrap().iter().cloned());
    }

    let ids: Vec<&Value> = listed.iter().map(|copy| &copy["id"]).collect();
    let position = |id: &Value| ids.iter().position(|listed| *listed == id);
    let sooner_at = position(&sooner["id"]).expect("on-loan copy missing");
    let later_at = position(&later["id"]).expect("on-loan copy missing");
    assert!(sooner_at < later_at);
    assert!(position(&returned["id"]).is_none());

    let dates: Vec<&str> = listed.iter().filter_map(|copy| copy["due_back"].as_str()).collect();
    assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));

    // a user with nothing borrowed sees none of these copies
    let now = chrono::Utc::now().timestamp();
    let stranger = UserClaims {
        sub: "nobody".to_string(),
        user_id: i32::MAX,
        is_staff: false,
        exp: now + 600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to create token");
    let (status, body) = get_json(&client, format!("{}/catalog/mybooks/", BASE_URL), Some(&stranger)).await;
    assert_eq!(status, 200);
    assert_eq!(body["bookinstance_list"], json!([]));
    assert_eq!(body["page"]["num_pages"], 1);

    for copy in [&later, &sooner, &returned] {
        admin_delete(&client, &token, "bookinstance", &copy["id"]).await;
    }
    admin_delete(&client, &token, "book", book_id).await;
    admin_delete(&client, &token, "author", &author["id"]).await;
    admin_delete(&client, &token, "language", &language["id"]).await;
}

#[tokio::test]
#[ignore]
async fn test_detail_of_missing_book_is_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/catalog/book/999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_admin_change_list_for_instances() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/admin/bookinstance/?status=o&due_back=this_year", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["columns"], json!(["id", "book", "imprint", "due_back"]));
    assert_eq!(body["page"]["per_page"], 100);
}

#[tokio::test]
#[ignore]
async fn test_admin_genre_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/admin/genre/", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": format!("Test genre {}", uuid::Uuid::new_v4()) }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.expect("Failed to parse response");
    let id = created["id"].as_i64().expect("No id in response");

    let response = client
        .delete(format!("{}/admin/genre/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/admin/genre/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}
