//! Catalog behaviour through the services and the public endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use bookstore_core::{BookId, Identity};
use bookstore_integration_tests::{TestContext, body_json, body_text, get};
use bookstore_storefront::models::BookInput;
use bookstore_storefront::services::cart::CartService;
use bookstore_storefront::services::catalog::{CatalogError, CatalogService};

#[tokio::test]
async fn test_category_filter_is_exact() {
    let ctx = TestContext::new().await;
    ctx.book("Dune", "15.0", Some("SciFi")).await;
    ctx.book("Emma", "9.0", Some("Classics")).await;
    ctx.book("Solaris", "12.0", Some("scifi")).await;

    let books = CatalogService::new(ctx.pool())
        .list_by_category("SciFi")
        .await
        .unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Dune");

    let page = body_text(ctx.send(get("/category/SciFi", None)).await).await;
    assert!(page.contains("Dune"));
    assert!(!page.contains("Emma"));
    assert!(!page.contains("Solaris"));
}

#[tokio::test]
async fn test_index_lists_all_books_with_prices() {
    let ctx = TestContext::new().await;
    ctx.book("Dune", "15", None).await;
    ctx.book("Emma", "9.5", None).await;

    let response = ctx.send(get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("All Books"));
    assert!(page.contains("$15.00"));
    assert!(page.contains("$9.50"));
}

#[tokio::test]
async fn test_book_detail_and_missing_book() {
    let ctx = TestContext::new().await;
    let book = ctx.book("Dune", "15", Some("SciFi")).await;

    let response = ctx.send(get(&format!("/book/{}", book.id), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Dune"));

    let response = ctx.send(get("/book/9999", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_suggestions_are_capped() {
    let ctx = TestContext::new().await;
    for n in 1..=7 {
        ctx.book(&format!("Rust Book {n}"), "10", None).await;
    }
    ctx.book("Emma", "9", None).await;

    let hits = body_json(ctx.send(get("/search_suggestions?query=rust", None)).await).await;
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 5);
    assert_eq!(hits[0]["title"], "Rust Book 1");
    assert!(hits[0]["id"].is_number());

    let blank = body_json(ctx.send(get("/search_suggestions?query=%20", None)).await).await;
    assert_eq!(blank, json!([]));

    let missing = body_json(ctx.send(get("/search_suggestions", None)).await).await;
    assert_eq!(missing, json!([]));
}

#[tokio::test]
async fn test_json_catalog_shapes() {
    let ctx = TestContext::new().await;
    let book = ctx.book("Dune", "15.5", Some("SciFi")).await;

    let list = body_json(ctx.send(get("/books", None)).await).await;
    assert_eq!(
        list,
        json!([{
            "id": book.id.as_i64(),
            "title": "Dune",
            "author": "Test Author",
            "price": 15.5,
            "category": "SciFi",
        }])
    );

    let detail = body_json(ctx.send(get(&format!("/books/{}", book.id), None)).await).await;
    assert_eq!(detail["price"], json!(15.5));
    assert_eq!(detail["description"], json!(null));

    let response = ctx.send(get("/books/9999", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_delete_book_removes_cart_lines() {
    let ctx = TestContext::new().await;
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    let admin = ctx.admin("clerk").await;
    let dune = ctx.book("Dune", "15", None).await;
    let emma = ctx.book("Emma", "9", None).await;

    let carts = CartService::new(ctx.pool());
    carts.add(alice.id, dune.id).await.unwrap();
    carts.add(alice.id, emma.id).await.unwrap();
    carts.add(bob.id, dune.id).await.unwrap();
    carts.add(bob.id, dune.id).await.unwrap();

    let deleted = CatalogService::new(ctx.pool())
        .delete(&admin.identity(), dune.id)
        .await
        .unwrap();
    assert_eq!(deleted.title, "Dune");

    let lines = carts.list_for_user(alice.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].book_id, emma.id);
    assert!(carts.list_for_user(bob.id).await.unwrap().is_empty());
    assert_eq!(carts.total_for_user(bob.id).await.unwrap(), Decimal::ZERO);

    let err = CatalogService::new(ctx.pool())
        .delete(&admin.identity(), dune.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
}

#[tokio::test]
async fn test_only_staff_manage_books() {
    let ctx = TestContext::new().await;
    let alice = ctx.user("alice").await;
    let catalog = CatalogService::new(ctx.pool());
    let input = BookInput {
        title: "Dune".to_owned(),
        author: "Herbert".to_owned(),
        price: "15".to_owned(),
        ..BookInput::default()
    };

    for actor in [Identity::Anonymous, alice.identity()] {
        let err = catalog.create(&actor, input.clone()).await.unwrap_err();
        assert!(matches!(err, CatalogError::PermissionDenied(_)));
        let err = catalog.delete(&actor, BookId::new(1)).await.unwrap_err();
        assert!(matches!(err, CatalogError::PermissionDenied(_)));
    }
    assert_eq!(catalog.count().await.unwrap(), 0);
}
