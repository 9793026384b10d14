//! Cart behavior through the HTMX endpoints.

use axum::http::StatusCode;
use fantasia_integration_tests::{TestApp, line_ids, product_fields};
use fantasia_storefront::models::product;
use serde_json::json;

#[tokio::test]
async fn test_repeated_plain_add_merges_lines() {
    let mut app = TestApp::new();

    let first = app.post_form("/cart/add", &[("product_id", "p1")]).await;
    assert_eq!(first.status, StatusCode::OK);
    assert!(first.triggers_cart_update());
    assert!(first.body.contains("Saia Midi adicionado ao carrinho!"));

    app.post_form("/cart/add", &[("product_id", "p1")]).await;

    let cart = app.get("/cart").await;
    assert_eq!(line_ids(&cart.body).len(), 1);
    assert!(cart.body.contains(r#"name="quantity" value="2""#));
    assert!(cart.body.contains("R$ 80.00"));

    let count = app.get("/cart/count").await;
    assert!(count.body.contains(">2</span>"));
    assert!(count.body.contains("2 itens"));
}

#[tokio::test]
async fn test_empty_cart_has_no_badge() {
    let mut app = TestApp::new();
    let count = app.get("/cart/count").await;
    assert_eq!(count.status, StatusCode::OK);
    assert!(!count.body.contains("badge"));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Seu carrinho está vazio."));
}

#[tokio::test]
async fn test_catalog_add_refuses_product_with_colors() {
    let mut app = TestApp::new();

    let resp = app.post_form("/cart/add", &[("product_id", "p3")]).await;
    assert!(resp.body.contains("Selecione uma cor antes de adicionar ao carrinho."));
    assert!(!resp.triggers_cart_update());

    let cart = app.get("/cart").await;
    assert!(line_ids(&cart.body).is_empty());
}

#[tokio::test]
async fn test_add_unknown_product() {
    let mut app = TestApp::new();
    let resp = app.post_form("/cart/add", &[("product_id", "nada")]).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_detail_add_appends_lines() {
    let mut app = TestApp::new();

    let resp = app.post_form("/products/p3/cart", &[("cor", "Azul")]).await;
    assert!(resp.triggers_cart_update());
    assert!(resp.body.contains("Produto adicionado ao carrinho."));
    app.post_form("/products/p3/cart", &[("cor", "Azul")]).await;

    let cart = app.get("/cart").await;
    assert_eq!(line_ids(&cart.body).len(), 2);
    assert!(cart.body.contains("Cor: Azul"));
    assert!(cart.body.contains("disabled"));
}

#[tokio::test]
async fn test_detail_add_validates_options() {
    let mut app = TestApp::new();

    let no_color = app.post_form("/products/p3/cart", &[]).await;
    assert!(no_color.body.contains("Selecione uma cor antes de adicionar ao carrinho."));

    let unknown = app.post_form("/products/p3/cart", &[("cor", "Verde")]).await;
    assert!(unknown.body.contains("Cor indisponível para este produto."));

    let no_measurements = app
        .post_form("/products/p4/cart", &[("cor", "Branco"), ("observacao", "   ")])
        .await;
    assert!(no_measurements.body.contains("Coloque aqui suas medidas."));

    let cart = app.get("/cart").await;
    assert!(line_ids(&cart.body).is_empty());
}

#[tokio::test]
async fn test_custom_order_line() {
    let mut app = TestApp::new();

    app.post_form(
        "/products/p4/cart",
        &[("cor", "Marfim"), ("observacao", "Busto 90, cintura 70")],
    )
    .await;

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("encomenda-item"));
    assert!(cart.body.contains("Detalhes Encomenda: Busto 90, cintura 70"));
}

#[tokio::test]
async fn test_quantity_locked_on_lines_with_options() {
    let mut app = TestApp::new();
    app.post_form("/products/p3/cart", &[("cor", "Rosa")]).await;

    let cart = app.get("/cart").await;
    let line = line_ids(&cart.body).remove(0);

    let resp = app
        .post_form("/cart/quantity", &[("line_id", &line), ("quantity", "3")])
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("A quantidade de itens personalizados"));
    assert!(resp.body.contains(r#"name="quantity" value="1""#));
}

#[tokio::test]
async fn test_quantity_change_and_removal_by_zero() {
    let mut app = TestApp::new();
    app.post_form("/cart/add", &[("product_id", "p1")]).await;
    app.post_form("/cart/add", &[("product_id", "p2")]).await;

    let cart = app.get("/cart").await;
    let lines = line_ids(&cart.body);
    assert_eq!(lines.len(), 2);

    let resp = app
        .post_form("/cart/quantity", &[("line_id", &lines[0]), ("quantity", "4")])
        .await;
    assert!(resp.triggers_cart_update());
    assert!(resp.body.contains(r#"name="quantity" value="4""#));
    assert!(resp.body.contains("R$ 220.00"));

    let resp = app
        .post_form("/cart/quantity", &[("line_id", &lines[0]), ("quantity", "0")])
        .await;
    assert_eq!(line_ids(&resp.body), vec![lines[1].clone()]);
    assert!(!resp.body.contains("Saia Midi"));
}

#[tokio::test]
async fn test_remove_line() {
    let mut app = TestApp::new();
    app.post_form("/cart/add", &[("product_id", "p1")]).await;
    app.post_form("/products/p3/cart", &[("cor", "Azul")]).await;

    let cart = app.get("/cart").await;
    let lines = line_ids(&cart.body);

    let resp = app.post_form("/cart/remove", &[("line_id", &lines[1])]).await;
    assert_eq!(line_ids(&resp.body), vec![lines[0].clone()]);

    let again = app.post_form("/cart/remove", &[("line_id", &lines[1])]).await;
    assert!(again.body.contains("Item não encontrado no carrinho."));
}

#[tokio::test]
async fn test_change_line_color() {
    let mut app = TestApp::new();
    app.post_form("/products/p3/cart", &[("cor", "Azul")]).await;

    let cart = app.get("/cart").await;
    let line = line_ids(&cart.body).remove(0);

    let resp = app
        .post_form("/cart/color", &[("line_id", &line), ("color", "Rosa")])
        .await;
    assert!(resp.body.contains("Cor: Rosa"));
    assert!(!resp.body.contains("Cor: Azul"));
}

#[tokio::test]
async fn test_malformed_line_id() {
    let mut app = TestApp::new();
    let resp = app.post_form("/cart/remove", &[("line_id", "xyz")]).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_carts_are_per_visitor() {
    let mut ana = TestApp::new();
    let mut bia = ana.new_visitor();

    ana.post_form("/cart/add", &[("product_id", "p1")]).await;

    let cart = bia.get("/cart").await;
    assert!(line_ids(&cart.body).is_empty());
}

#[tokio::test]
async fn test_custom_order_without_colors_needs_details() {
    let mut veil = product_fields("Véu Bordado", 300.0, "Noivas", &[]);
    veil.insert("tipo".to_string(), json!(product::CUSTOM_ORDER_LABEL));
    let mut app = TestApp::with_products(vec![("v1".to_string(), veil)]);

    let home = app.get("/").await;
    assert!(home.body.contains("Ver Detalhes"));
    assert!(!home.body.contains("Adicionar ao Carrinho"));

    let resp = app.post_form("/cart/add", &[("product_id", "v1")]).await;
    assert!(resp.body.contains("Coloque aqui suas medidas."));
    assert!(!resp.triggers_cart_update());

    let cart = app.get("/cart").await;
    assert!(line_ids(&cart.body).is_empty());
}

#[tokio::test]
async fn test_huge_quantity_is_capped_and_survives_another_add() {
    let mut app = TestApp::new();
    app.post_form("/cart/add", &[("product_id", "p1")]).await;
    let line = line_ids(&app.get("/cart").await.body).remove(0);

    let resp = app
        .post_form("/cart/quantity", &[("line_id", &line), ("quantity", "99999999999")])
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"name="quantity" value="999""#));

    let again = app.post_form("/cart/add", &[("product_id", "p1")]).await;
    assert_eq!(again.status, StatusCode::OK);

    let resp = app
        .post_form("/cart/quantity", &[("line_id", &line), ("quantity", "99999999999999999999")])
        .await;
    assert!(resp.body.contains(r#"name="quantity" value="999""#));
    assert!(resp.body.contains("R$ 39960.00"));

    let count = app.get("/cart/count").await;
    assert!(count.body.contains(">999</span>"));
}

#[tokio::test]
async fn test_line_color_must_be_offered() {
    let mut app = TestApp::new();
    app.post_form("/products/p3/cart", &[("cor", "Azul")]).await;
    app.post_form("/cart/add", &[("product_id", "p1")]).await;
    let lines = line_ids(&app.get("/cart").await.body);

    let resp = app
        .post_form("/cart/color", &[("line_id", &lines[0]), ("color", "Xadrez")])
        .await;
    assert!(resp.body.contains("Cor indisponível para este produto."));
    assert!(resp.body.contains("Cor: Azul"));
    assert!(!resp.body.contains("Cor: Xadrez"));

    let resp = app
        .post_form("/cart/color", &[("line_id", &lines[1]), ("color", "Azul")])
        .await;
    assert!(resp.body.contains("Cor indisponível para este produto."));
    assert_eq!(resp.body.matches("Cor: Azul").count(), 1);
}
