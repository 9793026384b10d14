//! Integration tests for the Fantasia Eterna storefront.
//!
//! The tests drive the full router in process, over the in-memory document
//! store and identity provider, so no Firebase project is needed:
//!
//! ```bash
//! cargo test -p fantasia-integration-tests
//! ```
//!
//! [`TestApp`] keeps the session cookie between requests the way a browser
//! would, so a test can add to the cart, sign in and check out in sequence.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::{Map, Value, json};
use tower::ServiceExt;

use fantasia_storefront::backend::{
    DocumentQuery, DocumentStore, MemoryDocumentStore, MemoryIdentityProvider,
};
use fantasia_storefront::config::{BackendConfig, SentryConfig, StorefrontConfig};
use fantasia_storefront::middleware::create_session_layer;
use fantasia_storefront::models::product;
use fantasia_storefront::routes;
use fantasia_storefront::state::AppState;

/// Password accepted by the registration policy.
pub const PASSWORD: &str = "vestido!1";

/// Configuration for an in-memory storefront on localhost.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        backend: BackendConfig::Memory { seed_file: None },
        sentry: SentryConfig::default(),
    }
}

/// Fields of a product document.
#[must_use]
pub fn product_fields(name: &str, price: f64, category: &str, colors: &[&str]) -> Map<String, Value> {
    let Value::Object(fields) = json!({
        "nome": name,
        "preco": price,
        "descricao": format!("Descrição de {name}"),
        "imagens": [format!("https://img.example.com/{name}.jpg")],
        "categoria": category,
        "cores": colors,
    }) else {
        unreachable!("json! object literal");
    };
    fields
}

/// A small catalog: two plain products, one with colors, one custom order.
#[must_use]
pub fn sample_catalog() -> Vec<(String, Map<String, Value>)> {
    let mut custom = product_fields("Vestido de Noiva", 1200.0, "Noivas", &["Branco", "Marfim"]);
    custom.insert("tipo".to_string(), json!(product::CUSTOM_ORDER_LABEL));

    vec![
        ("p1".to_string(), product_fields("Saia Midi", 40.0, "Saias", &[])),
        ("p2".to_string(), product_fields("Blusa Renda", 60.0, "Blusas", &[])),
        ("p3".to_string(), product_fields("Vestido Floral", 89.9, "Vestidos", &["Azul", "Rosa"])),
        ("p4".to_string(), custom),
    ]
}

/// Response captured as text.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Whether the response asks HTMX to refresh the cart badge.
    #[must_use]
    pub fn triggers_cart_update(&self) -> bool {
        self.headers
            .get("hx-trigger")
            .is_some_and(|v| v == "cart-updated")
    }

    /// `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// The storefront router plus handles on its backend.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryDocumentStore>,
    pub identity: Arc<MemoryIdentityProvider>,
    pub state: AppState,
    cookie: Option<String>,
}

impl TestApp {
    /// A storefront whose catalog holds `products`.
    #[must_use]
    pub fn with_products(products: Vec<(String, Map<String, Value>)>) -> Self {
        let config = test_config();
        let store = Arc::new(MemoryDocumentStore::with_documents(
            product::COLLECTION,
            products,
        ));
        let identity = Arc::new(MemoryIdentityProvider::new());
        let state = AppState::new(config.clone(), store.clone(), identity.clone());

        let router = routes::routes()
            .layer(create_session_layer(&config))
            .with_state(state.clone());

        Self {
            router,
            store,
            identity,
            state,
            cookie: None,
        }
    }

    /// A storefront over [`sample_catalog`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_products(sample_catalog())
    }

    /// Another visitor of the same storefront, with no session yet.
    #[must_use]
    pub fn new_visitor(&self) -> Self {
        Self {
            router: self.router.clone(),
            store: Arc::clone(&self.store),
            identity: Arc::clone(&self.identity),
            state: self.state.clone(),
            cookie: None,
        }
    }

    /// Send `request` with the session cookie and remember any new one.
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request.headers_mut().insert(
                header::COOKIE,
                cookie.parse().expect("cookie header value"),
            );
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// `GET uri`.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::get(uri)
            .body(Body::empty())
            .expect("build GET request");
        self.send(request).await
    }

    /// `POST uri` with an urlencoded form.
    pub async fn post_form(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = form
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("build POST request");
        self.send(request).await
    }

    /// Register `email` and sign in with it.
    pub async fn sign_up_and_in(&mut self, email: &str) -> TestResponse {
        let registered = self
            .post_form(
                "/auth/register",
                &[
                    ("email", email),
                    ("password", PASSWORD),
                    ("password_confirm", PASSWORD),
                ],
            )
            .await;
        assert_eq!(registered.status, StatusCode::OK, "{}", registered.body);

        self.post_form("/auth/login", &[("email", email), ("password", PASSWORD)])
            .await
    }

    /// Every document of `collection`.
    pub async fn documents(&self, collection: &str) -> Vec<Value> {
        self.store
            .query(&DocumentQuery::collection(collection))
            .await
            .expect("query memory store")
            .into_iter()
            .map(|doc| Value::Object(doc.fields))
            .collect()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Line ids in a rendered cart, in display order.
#[must_use]
pub fn line_ids(body: &str) -> Vec<String> {
    let marker = r#"name="line_id" value=""#;
    let mut ids = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find(marker) {
        rest = &rest[start + marker.len()..];
        if let Some(end) = rest.find('"') {
            let id = &rest[..end];
            if ids.last().is_none_or(|last: &String| last != id) {
                ids.push(id.to_string());
            }
            rest = &rest[end..];
        }
    }
    ids
}
