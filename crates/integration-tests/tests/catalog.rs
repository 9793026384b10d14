//! Catalog browsing: filters, ordering and "load more" pagination.

use axum::http::StatusCode;
use fantasia_integration_tests::{TestApp, product_fields};

/// Ten products `p01`..`p10` priced 10..100, newest last.
fn numbered_catalog() -> TestApp {
    let products = (1..=10_u32)
        .map(|n| {
            (
                format!("p{n:02}"),
                product_fields(&format!("Produto {n:02}"), f64::from(n) * 10.0, "Vestidos", &[]),
            )
        })
        .collect();
    TestApp::with_products(products)
}

#[tokio::test]
async fn test_home_lists_catalog() {
    let mut app = TestApp::new();
    let resp = app.get("/").await;

    assert_eq!(resp.status, StatusCode::OK);
    for name in ["Saia Midi", "Blusa Renda", "Vestido Floral", "Vestido de Noiva"] {
        assert!(resp.body.contains(name), "missing {name}");
    }
    assert!(resp.body.contains("Todas as Categorias"));
    assert!(resp.body.contains("Todas as Cores"));
}

#[tokio::test]
async fn test_products_with_colors_link_to_details() {
    let mut app = TestApp::new();
    let resp = app.get("/?categoria=Vestidos").await;

    assert!(resp.body.contains("Ver Detalhes"));
    assert!(!resp.body.contains("Adicionar ao Carrinho"));
}

#[tokio::test]
async fn test_category_filter() {
    let mut app = TestApp::new();
    let resp = app.get("/?categoria=Saias").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Saia Midi"));
    assert!(!resp.body.contains("Blusa Renda"));
    assert!(!resp.body.contains("Vestido Floral"));
}

#[tokio::test]
async fn test_color_filter_applies_to_page() {
    let mut app = TestApp::new();
    let resp = app.get("/?cor=Azul").await;

    assert!(resp.body.contains("Vestido Floral"));
    assert!(!resp.body.contains("Saia Midi"));
    assert!(!resp.body.contains("Vestido de Noiva"));
}

#[tokio::test]
async fn test_filters_without_match_show_message() {
    let mut app = TestApp::new();
    let resp = app.get("/?categoria=Saias&cor=Azul").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Nenhum produto encontrado com os filtros selecionados."));
}

#[tokio::test]
async fn test_empty_catalog_message() {
    let mut app = TestApp::with_products(Vec::new());
    let resp = app.get("/").await;

    assert!(resp.body.contains("Nenhum produto encontrado."));
    assert!(!resp.body.contains("Carregar Mais"));
}

#[tokio::test]
async fn test_price_ordering() {
    let mut app = TestApp::new();

    let asc = app.get("/?ordem=asc").await;
    let saia = asc.body.find("Saia Midi").unwrap_or_default();
    let noiva = asc.body.find("Vestido de Noiva").unwrap_or_default();
    assert!(saia < noiva);

    let desc = app.get("/?ordem=desc").await;
    let saia = desc.body.find("Saia Midi").unwrap_or_default();
    let noiva = desc.body.find("Vestido de Noiva").unwrap_or_default();
    assert!(noiva < saia);
}

#[tokio::test]
async fn test_load_more_continues_after_first_page() {
    let mut app = numbered_catalog();

    let first = app.get("/").await;
    assert!(first.body.contains("Produto 10"));
    assert!(first.body.contains("Produto 03"));
    assert!(!first.body.contains("Produto 02"));
    assert!(first.body.contains("Carregar Mais"));

    let more = app.get("/catalog/more").await;
    assert_eq!(more.status, StatusCode::OK);
    assert!(more.body.contains("Produto 02"));
    assert!(more.body.contains("Produto 01"));
    assert!(!more.body.contains("Produto 10"));
    assert!(!more.body.contains("Carregar Mais"));
}

#[tokio::test]
async fn test_load_more_reflects_favorite_toggled_after_first_page() {
    let mut app = numbered_catalog();
    app.sign_up_and_in("ana@example.com").await;

    let first = app.get("/").await;
    assert!(!first.body.contains("favorite-btn favorited"));

    let on = app.post_form("/favorites/p01", &[]).await;
    assert!(on.body.contains(r#"aria-pressed="true""#));

    let more = app.get("/catalog/more").await;
    assert!(more.body.contains("Produto 01"));
    assert_eq!(more.body.matches("favorite-btn favorited").count(), 1);
}

#[tokio::test]
async fn test_load_more_keeps_active_filters() {
    let mut app = numbered_catalog();

    let first = app.get("/?ordem=asc").await;
    assert!(first.body.contains("Produto 01"));
    assert!(!first.body.contains("Produto 09"));

    let more = app.get("/catalog/more").await;
    assert!(more.body.contains("Produto 09"));
    assert!(more.body.contains("Produto 10"));
    assert!(!more.body.contains("Produto 01"));
}

#[tokio::test]
async fn test_new_visit_resets_cursor() {
    let mut app = numbered_catalog();

    app.get("/").await;
    app.get("/catalog/more").await;

    let again = app.get("/").await;
    assert!(again.body.contains("Produto 10"));
    assert!(again.body.contains("Carregar Mais"));
}

#[tokio::test]
async fn test_visitors_page_independently() {
    let mut ana = numbered_catalog();
    let mut bia = ana.new_visitor();

    ana.get("/").await;
    bia.get("/?ordem=asc").await;

    let ana_more = ana.get("/catalog/more").await;
    assert!(ana_more.body.contains("Produto 02"));

    let bia_more = bia.get("/catalog/more").await;
    assert!(bia_more.body.contains("Produto 09"));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let mut app = TestApp::new();
    let resp = app.get("/products/nao-existe").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_detail() {
    let mut app = TestApp::new();
    let resp = app.get("/products/p4").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Vestido de Noiva"));
    assert!(resp.body.contains("R$ 1200.00"));
    assert!(resp.body.contains("Coloque aqui suas medidas"));
    assert!(resp.body.contains(r#"value="Marfim""#));
    assert!(!resp.body.contains("product-sizes"));
}

#[tokio::test]
async fn test_product_detail_lists_sizes() {
    let mut skirt = product_fields("Saia Plissada", 70.0, "Saias", &[]);
    skirt.insert("tamanhos".to_string(), serde_json::json!(["P", "M", "G"]));
    let mut app = TestApp::with_products(vec![("s1".to_string(), skirt)]);

    let resp = app.get("/products/s1").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Tamanhos: P, M, G"));
}
