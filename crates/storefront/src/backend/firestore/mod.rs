//! Firestore REST client implementation.
//!
//! Uses `reqwest` against the documents API:
//!
//! - `GET    {documents}/{collection}/{id}` - fetch one document
//! - `POST   {documents}:runQuery` - structured queries
//! - `POST   {documents}/{collection}` - create with generated key
//! - `PATCH  {documents}/{collection}/{id}` - create or overwrite
//! - `POST   {documents}:commit` - array union / removal field transforms

pub mod value;

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use crate::backend::document::{Direction, Document, DocumentQuery, DocumentStore, OrderField};
use crate::backend::BackendError;
use crate::config::FirebaseConfig;

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<WireDocument>,
}

// =============================================================================
// FirestoreClient
// =============================================================================

/// Client for the Firestore documents REST API.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    /// `projects/{project}/databases/(default)`
    database: String,
    /// `{endpoint}/projects/{project}/databases/(default)/documents`
    documents_url: String,
    api_key: SecretString,
    access_token: Option<SecretString>,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let database = format!("projects/{}/databases/(default)", config.project_id);
        let documents_url = format!(
            "{}/{database}/documents",
            config.firestore_url.trim_end_matches('/')
        );

        Self {
            inner: Arc::new(FirestoreClientInner {
                client: reqwest::Client::new(),
                database,
                documents_url,
                api_key: config.api_key.clone(),
                access_token: config.access_token.clone(),
            }),
        }
    }

    /// Full resource name of a document.
    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.inner.database)
    }

    /// REST URL of one document. The id is percent-encoded so it cannot
    /// address another path.
    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{collection}/{}",
            self.inner.documents_url,
            urlencoding::encode(id)
        )
    }

    /// Build a request with the API key and optional bearer token attached.
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, url)
            .query(&[("key", self.inner.api_key.expose_secret())]);
        match &self.inner.access_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and return the response body.
    ///
    /// 404 responses become `BackendError::NotFound`.
    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Firestore returned non-success status"
            );
            return Err(BackendError::status(status.as_u16(), &body));
        }

        Ok(body)
    }

    /// Commit a single field transform on an existing document.
    async fn transform(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        operation: &str,
        value: &Value,
    ) -> Result<(), BackendError> {
        let body = json!({
            "writes": [{
                "transform": {
                    "document": self.document_name(collection, id),
                    "fieldTransforms": [{
                        "fieldPath": field,
                        operation: { "values": [value::encode(value)] }
                    }]
                },
                "currentDocument": { "exists": true }
            }]
        });

        let url = format!("{}:commit", self.inner.documents_url);
        self.send(
            self.request(reqwest::Method::POST, &url).json(&body),
            &format!("{collection}/{id}"),
        )
        .await?;
        Ok(())
    }
}

/// Convert a wire document into a [`Document`], taking the key from the last
/// segment of its resource name.
fn from_wire(doc: WireDocument) -> Result<Document, BackendError> {
    let id = doc
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let fields = value::decode_fields(&doc.fields).map_err(|e| BackendError::Malformed {
        document: doc.name.clone(),
        reason: e.to_string(),
    })?;
    Ok(Document::new(id, fields))
}

/// Translate a [`DocumentQuery`] into a Firestore `structuredQuery`.
///
/// Ordering by a field always appends `__name__` in the same direction so
/// that cursors (field value + document reference) are unambiguous.
#[must_use]
pub fn structured_query(query: &DocumentQuery, database: &str) -> Value {
    let mut structured = Map::new();
    structured.insert(
        "from".to_string(),
        json!([{ "collectionId": query.collection }]),
    );

    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|f| {
            json!({ "fieldFilter": {
                "field": { "fieldPath": f.field },
                "op": "EQUAL",
                "value": value::encode(&f.value)
            }})
        })
        .collect();
    match filters.len() {
        0 => {}
        1 => {
            if let Some(only) = filters.into_iter().next() {
                structured.insert("where".to_string(), only);
            }
        }
        _ => {
            structured.insert(
                "where".to_string(),
                json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
            );
        }
    }

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        let mut clauses = Vec::new();
        if let OrderField::Field(name) = &order.field {
            clauses.push(json!({ "field": { "fieldPath": name }, "direction": direction }));
        }
        clauses.push(json!({ "field": { "fieldPath": "__name__" }, "direction": direction }));
        structured.insert("orderBy".to_string(), Value::Array(clauses));
    }

    if let Some(cursor) = &query.start_after {
        let mut values = Vec::new();
        if let Some(v) = &cursor.value {
            values.push(value::encode(v));
        }
        values.push(json!({
            "referenceValue": format!("{database}/documents/{}/{}", query.collection, cursor.document_id)
        }));
        structured.insert(
            "startAt".to_string(),
            json!({ "values": values, "before": false }),
        );
    }

    if let Some(limit) = query.limit {
        structured.insert("limit".to_string(), json!(limit));
    }

    json!({ "structuredQuery": structured })
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        let url = self.document_url(collection, id);
        match self
            .send(self.request(reqwest::Method::GET, &url), &format!("{collection}/{id}"))
            .await
        {
            Ok(body) => {
                let wire: WireDocument = serde_json::from_str(&body)?;
                from_wire(wire).map(Some)
            }
            Err(BackendError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, query), fields(collection = %query.collection))]
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>, BackendError> {
        let url = format!("{}:runQuery", self.inner.documents_url);
        let body = structured_query(query, &self.inner.database);
        let text = self
            .send(
                self.request(reqwest::Method::POST, &url).json(&body),
                &query.collection,
            )
            .await?;

        let items: Vec<RunQueryItem> = serde_json::from_str(&text)?;
        let documents = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = documents.len(), "Query returned documents");
        Ok(documents)
    }

    #[instrument(skip(self, fields))]
    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<String, BackendError> {
        let url = format!("{}/{collection}", self.inner.documents_url);
        let body = json!({ "fields": value::encode_fields(&fields) });
        let text = self
            .send(
                self.request(reqwest::Method::POST, &url).json(&body),
                collection,
            )
            .await?;
        let wire: WireDocument = serde_json::from_str(&text)?;
        Ok(from_wire(wire)?.id)
    }

    #[instrument(skip(self, fields))]
    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), BackendError> {
        let url = self.document_url(collection, id);
        let body = json!({ "fields": value::encode_fields(&fields) });
        self.send(
            self.request(reqwest::Method::PATCH, &url).json(&body),
            &format!("{collection}/{id}"),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), BackendError> {
        self.transform(collection, id, field, "appendMissingElements", &value)
            .await
    }

    #[instrument(skip(self, value))]
    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), BackendError> {
        self.transform(collection, id, field, "removeAllFromArray", &value)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::document::Cursor;

    const DB: &str = "projects/p/databases/(default)";

    #[test]
    fn test_structured_query_with_filter_order_and_cursor() {
        let query = DocumentQuery::collection("produtos")
            .where_eq("categoria", "Vestidos")
            .order_by_field("preco", Direction::Descending)
            .start_after(Some(Cursor {
                value: Some(json!(99.9)),
                document_id: "abc".to_string(),
            }))
            .limit(8);

        let body = structured_query(&query, DB);
        let sq = &body["structuredQuery"];

        assert_eq!(sq["from"], json!([{"collectionId": "produtos"}]));
        assert_eq!(sq["where"]["fieldFilter"]["op"], "EQUAL");
        assert_eq!(
            sq["where"]["fieldFilter"]["value"],
            json!({"stringValue": "Vestidos"})
        );
        assert_eq!(sq["orderBy"][0]["field"]["fieldPath"], "preco");
        assert_eq!(sq["orderBy"][1]["field"]["fieldPath"], "__name__");
        assert_eq!(sq["orderBy"][1]["direction"], "DESCENDING");
        assert_eq!(sq["startAt"]["before"], false);
        assert_eq!(sq["startAt"]["values"][0], json!({"doubleValue": 99.9}));
        assert_eq!(
            sq["startAt"]["values"][1]["referenceValue"],
            "projects/p/databases/(default)/documents/produtos/abc"
        );
        assert_eq!(sq["limit"], 8);
    }

    #[test]
    fn test_structured_query_by_document_id() {
        let query = DocumentQuery::collection("produtos").order_by_id(Direction::Descending);
        let body = structured_query(&query, DB);
        let order = body["structuredQuery"]["orderBy"].as_array().unwrap();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0]["field"]["fieldPath"], "__name__");
        assert!(body["structuredQuery"].get("where").is_none());
    }

    #[test]
    fn test_structured_query_composite_filter() {
        let query = DocumentQuery::collection("pedidos")
            .where_eq("userId", "u1")
            .where_eq("status", "Aguardando Pagamento");
        let body = structured_query(&query, DB);
        assert_eq!(
            body["structuredQuery"]["where"]["compositeFilter"]["filters"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_from_wire_takes_last_path_segment() {
        let wire: WireDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/pedidos/Xy12",
            "fields": {"total": {"doubleValue": 10.5}}
        }))
        .unwrap();
        let doc = from_wire(wire).unwrap();
        assert_eq!(doc.id, "Xy12");
        assert_eq!(doc.field("total"), Some(&json!(10.5)));
    }
}
