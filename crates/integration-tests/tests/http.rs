//! JSON API, file transfer and cross-cutting HTTP behaviour.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use serde_json::json;

use bookstore_integration_tests::{
    TestContext, body_bytes, body_json, form, get, json_post, location, multipart_post,
};
use bookstore_storefront::services::catalog::CatalogService;

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.send(get("/health", None)).await.status(), StatusCode::OK);
    assert_eq!(ctx.send(get("/health/ready", None)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_present() {
    let ctx = TestContext::new().await;
    let response = ctx.send(get("/", None)).await;

    let headers = response.headers();
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_api_add_book_requires_login() {
    let ctx = TestContext::new().await;
    let body = json!({"title": "Dune", "author": "Herbert", "price": 15});

    let response = ctx.send(json_post("/books/add", &body, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_add_book_forbidden_for_users() {
    let ctx = TestContext::new().await;
    ctx.user("alice").await;
    let cookie = ctx.login("alice").await;
    let body = json!({"title": "Dune", "author": "Herbert", "price": 15});

    let response = ctx.send(json_post("/books/add", &body, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_json(response).await["error"].is_string());
    assert_eq!(CatalogService::new(ctx.pool()).count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_api_add_book_as_admin() {
    let ctx = TestContext::new().await;
    ctx.admin("clerk").await;
    let cookie = ctx.login("clerk").await;

    let body = json!({"title": "Dune", "author": "Herbert", "price": "15.50"});
    let response = ctx.send(json_post("/books/add", &body, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["message"], "Book added successfully");
    let id = created["id"].as_i64().unwrap();

    let detail = body_json(ctx.send(get(&format!("/books/{id}"), None)).await).await;
    assert_eq!(detail["category"], "Uncategorized");
    assert_eq!(detail["price"], json!(15.5));

    let invalid = json!({"title": "", "author": "Herbert", "price": 1});
    let response = ctx.send(json_post("/books/add", &invalid, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let too_pricey = json!({
        "title": "Atlas",
        "author": "Rand",
        "price": "79228162514264337593543950335"
    });
    let response = ctx.send(json_post("/books/add", &too_pricey, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(CatalogService::new(ctx.pool()).list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_html_add_and_delete_book() {
    let ctx = TestContext::new().await;
    ctx.admin("clerk").await;
    let cookie = ctx.login("clerk").await;

    let response = ctx
        .send(form(
            "/add_book",
            "title=Dune&author=Herbert&price=15&category=SciFi",
            Some(&cookie),
        ))
        .await;
    assert!(response.status().is_redirection());

    let books = CatalogService::new(ctx.pool()).list_all().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].category.as_deref(), Some("SciFi"));

    let response = ctx
        .send(form(&format!("/delete_book/{}", books[0].id), "", Some(&cookie)))
        .await;
    assert_eq!(location(&response), Some("/"));
    assert_eq!(CatalogService::new(ctx.pool()).count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_and_download() {
    let ctx = TestContext::new().await;
    ctx.admin("clerk").await;
    let cookie = ctx.login("clerk").await;

    let response = ctx
        .send(multipart_post("/upload", "file", "notes.txt", b"hello", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let uploaded = body_json(response).await;
    assert_eq!(uploaded["filename"], "notes.txt");

    let response = ctx.send(get("/download/notes.txt", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"notes.txt\""
    );
    assert_eq!(body_bytes(response).await, b"hello");
}

#[tokio::test]
async fn test_upload_rejections() {
    let ctx = TestContext::new().await;
    ctx.user("alice").await;
    ctx.admin("clerk").await;

    let user_cookie = ctx.login("alice").await;
    let response = ctx
        .send(multipart_post("/upload", "file", "notes.txt", b"x", Some(&user_cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_cookie = ctx.login("clerk").await;
    let response = ctx
        .send(multipart_post("/upload", "other", "notes.txt", b"x", Some(&admin_cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file part");

    let response = ctx
        .send(multipart_post("/upload", "file", "", b"x", Some(&admin_cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No selected file");
}

#[tokio::test]
async fn test_download_rejects_bad_names() {
    let ctx = TestContext::new().await;

    let response = ctx.send(get("/download/missing.txt", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx.send(get("/download/..%2Fsecret", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx.send(get("/download/.env", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
