//! Cart behaviour: quantity merging, live pricing and ownership.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;

use bookstore_core::{BookId, CartItemId};
use bookstore_integration_tests::{TestContext, body_text, form, get, location};
use bookstore_storefront::services::cart::{CartError, CartService};

#[tokio::test]
async fn test_adding_twice_merges_lines() {
    let ctx = TestContext::new().await;
    let alice = ctx.user("alice").await;
    let dune = ctx.book("Dune", "15.0", None).await;

    let carts = CartService::new(ctx.pool());
    carts.add(alice.id, dune.id).await.unwrap();
    carts.add(alice.id, dune.id).await.unwrap();

    let view = carts.view_for_user(alice.id).await.unwrap();
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 2);
    assert_eq!(view.item_count, 2);
    assert_eq!(view.total, Decimal::new(30, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_merge_into_one_line() {
    const ADDS: u32 = 20;

    let ctx = TestContext::file_backed().await;
    let alice = ctx.user("alice").await;
    let dune = ctx.book("Dune", "15.0", None).await;

    let handles: Vec<_> = (0..ADDS)
        .map(|_| {
            let pool = ctx.pool().clone();
            let (user_id, book_id) = (alice.id, dune.id);
            tokio::spawn(async move { CartService::new(&pool).add(user_id, book_id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let lines = CartService::new(ctx.pool()).list_for_user(alice.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, ADDS);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = ?")
        .bind(alice.id.as_i64())
        .fetch_one(ctx.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_total_uses_current_price() {
    let ctx = TestContext::new().await;
    let alice = ctx.user("alice").await;
    let dune = ctx.book("Dune", "15.0", None).await;

    let carts = CartService::new(ctx.pool());
    carts.add(alice.id, dune.id).await.unwrap();

    sqlx::query("UPDATE books SET price = '20.00' WHERE id = ?")
        .bind(dune.id.as_i64())
        .execute(ctx.pool())
        .await
        .unwrap();

    assert_eq!(
        carts.total_for_user(alice.id).await.unwrap(),
        Decimal::new(20, 0)
    );
}

#[tokio::test]
async fn test_carts_are_private() {
    let ctx = TestContext::new().await;
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    let dune = ctx.book("Dune", "15", None).await;

    let carts = CartService::new(ctx.pool());
    let item = carts.add(alice.id, dune.id).await.unwrap();

    assert!(carts.list_for_user(bob.id).await.unwrap().is_empty());

    let err = carts.remove(item.id, bob.id).await.unwrap_err();
    assert!(matches!(err, CartError::PermissionDenied));
    assert_eq!(carts.list_for_user(alice.id).await.unwrap().len(), 1);

    carts.remove(item.id, alice.id).await.unwrap();
    assert!(carts.list_for_user(alice.id).await.unwrap().is_empty());

    let err = carts.remove(CartItemId::new(9999), alice.id).await.unwrap_err();
    assert!(matches!(err, CartError::NotFound));
}

#[tokio::test]
async fn test_adding_missing_book_fails() {
    let ctx = TestContext::new().await;
    let alice = ctx.user("alice").await;

    let err = CartService::new(ctx.pool())
        .add(alice.id, BookId::new(404))
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::NotFound));
}

#[tokio::test]
async fn test_anonymous_cart_redirects_to_login() {
    let ctx = TestContext::new().await;

    let response = ctx.send(get("/cart", None)).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/login"));

    let response = ctx.send(form("/add_to_cart/1", "", None)).await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_cart_pages_round_trip() {
    let ctx = TestContext::new().await;
    ctx.user("alice").await;
    let dune = ctx.book("Dune", "15", None).await;
    let cookie = ctx.login("alice").await;

    for _ in 0..2 {
        let response = ctx
            .send(form(&format!("/add_to_cart/{}", dune.id), "", Some(&cookie)))
            .await;
        assert_eq!(location(&response), Some("/cart"));
    }

    let response = ctx.send(get("/cart", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Dune"));
    assert!(page.contains("$30.00"));
    assert!(page.contains("Book added to cart"));

    let response = ctx.send(form("/add_to_cart/9999", "", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn test_removing_someone_elses_item_is_refused() {
    let ctx = TestContext::new().await;
    let alice = ctx.user("alice").await;
    ctx.user("mallory").await;
    let dune = ctx.book("Dune", "15", None).await;
    let item = CartService::new(ctx.pool())
        .add(alice.id, dune.id)
        .await
        .unwrap();

    let cookie = ctx.login("mallory").await;
    let response = ctx
        .send(form(&format!("/remove_from_cart/{}", item.id), "", Some(&cookie)))
        .await;
    assert_eq!(location(&response), Some("/cart"));

    let page = body_text(ctx.send(get("/cart", Some(&cookie))).await).await;
    assert!(page.contains("You do not have permission to delete this item"));
    assert_eq!(
        CartService::new(ctx.pool())
            .list_for_user(alice.id)
            .await
            .unwrap()
            .len(),
        1
    );
}
