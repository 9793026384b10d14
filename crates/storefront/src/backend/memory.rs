//! In-memory adapters for the backend ports.
//!
//! Used by the test suites and by `STOREFRONT_BACKEND=memory` for local
//! development. Ordering, cursor and exclusion rules match the hosted
//! document database: documents lacking the order-by field are left out and
//! ties are broken by document key.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use fantasia_core::{Email, UserId};

use super::BackendError;
use super::document::{Document, DocumentQuery, DocumentStore, OrderField};
use super::identity::{AuthUser, IdentityError, IdentityProvider};

type Collection = BTreeMap<String, Map<String, Value>>;

// =============================================================================
// MemoryDocumentStore
// =============================================================================

/// Document store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `documents` in `collection`.
    #[must_use]
    pub fn with_documents(
        collection: &str,
        documents: impl IntoIterator<Item = (String, Map<String, Value>)>,
    ) -> Self {
        let mut collections = HashMap::new();
        collections.insert(collection.to_string(), documents.into_iter().collect());
        Self {
            collections: RwLock::new(collections),
        }
    }

    /// Load a store from a JSON seed file.
    ///
    /// The file maps collection names to objects of document key → fields:
    ///
    /// ```json
    /// {"produtos": {"p1": {"nome": "Vestido", "preco": 89.9}}}
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not shaped as above.
    pub async fn from_seed_file(path: &Path) -> Result<Self, BackendError> {
        let text = tokio::fs::read_to_string(path).await?;
        let seed: HashMap<String, Collection> = serde_json::from_str(&text)?;
        debug!(
            path = %path.display(),
            collections = seed.len(),
            "Loaded document seed"
        );
        Ok(Self {
            collections: RwLock::new(seed),
        })
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn generate_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    async fn update_array(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        update: impl FnOnce(&mut Vec<Value>) + Send,
    ) -> Result<(), BackendError> {
        let mut collections = self.collections.write().await;
        let fields = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| BackendError::NotFound(format!("{collection}/{id}")))?;

        let entry = fields
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        if let Value::Array(items) = entry {
            update(items);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    #[instrument(skip(self, query), fields(collection = %query.collection))]
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>, BackendError> {
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let order_field = query.order_by.as_ref().and_then(|o| match &o.field {
            OrderField::Field(name) => Some(name.as_str()),
            OrderField::DocumentId => None,
        });

        let mut documents: Vec<Document> = collection
            .iter()
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .filter(|doc| query.matches(doc))
            .filter(|doc| order_field.is_none_or(|name| doc.field(name).is_some()))
            .collect();

        documents.sort_by(|a, b| query.compare(a, b));

        if let Some(cursor) = &query.start_after {
            documents.retain(|doc| query.is_after(doc, cursor));
        }
        if let Some(limit) = query.limit {
            documents.truncate(limit);
        }

        Ok(documents)
    }

    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<String, BackendError> {
        let id = Self::generate_id();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), BackendError> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), BackendError> {
        self.update_array(collection, id, field, |items| {
            if !items.contains(&value) {
                items.push(value);
            }
        })
        .await
    }

    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), BackendError> {
        self.update_array(collection, id, field, |items| {
            items.retain(|v| v != &value);
        })
        .await
    }
}

// =============================================================================
// MemoryIdentityProvider
// =============================================================================

struct Account {
    uid: UserId,
    password: SecretString,
}

/// Identity provider backed by an in-process account table.
///
/// Rejections use the same error codes as the hosted provider.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<Email, Account>>,
    reset_requests: RwLock<Vec<Email>>,
}

impl MemoryIdentityProvider {
    /// Create a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emails for which a password reset was requested, oldest first.
    pub async fn reset_requests(&self) -> Vec<Email> {
        self.reset_requests.read().await.clone()
    }

    fn issue_token(uid: &UserId) -> SecretString {
        SecretString::from(format!("memory-token-{uid}-{}", uuid::Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, IdentityError> {
        let accounts = self.accounts.read().await;
        match accounts.get(email) {
            Some(account) if account.password.expose_secret() == password.expose_secret() => {
                Ok(AuthUser {
                    uid: account.uid.clone(),
                    email: email.clone(),
                    id_token: Self::issue_token(&account.uid),
                })
            }
            _ => Err(IdentityError::rejected("INVALID_LOGIN_CREDENTIALS")),
        }
    }

    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, IdentityError> {
        if password.expose_secret().chars().count() < 6 {
            return Err(IdentityError::rejected(
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(IdentityError::rejected("EMAIL_EXISTS"));
        }

        let uid = UserId::new(uuid::Uuid::new_v4().simple().to_string());
        accounts.insert(
            email.clone(),
            Account {
                uid: uid.clone(),
                password: password.clone(),
            },
        );

        Ok(AuthUser {
            id_token: Self::issue_token(&uid),
            uid,
            email: email.clone(),
        })
    }

    async fn send_password_reset(&self, email: &Email) -> Result<(), IdentityError> {
        if !self.accounts.read().await.contains_key(email) {
            return Err(IdentityError::rejected("EMAIL_NOT_FOUND"));
        }
        self.reset_requests.write().await.push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::document::{Cursor, Direction};

    fn fields(value: Value) -> Map<String, Value> {
        let Value::Object(map) = value else {
            panic!("fields must be an object");
        };
        map
    }

    fn store() -> MemoryDocumentStore {
        MemoryDocumentStore::with_documents(
            "produtos",
            [
                ("a".to_string(), fields(json!({"preco": 30, "categoria": "Saias"}))),
                ("b".to_string(), fields(json!({"preco": 10, "categoria": "Vestidos"}))),
                ("c".to_string(), fields(json!({"preco": 20, "categoria": "Vestidos"}))),
                ("d".to_string(), fields(json!({"categoria": "Vestidos"}))),
            ],
        )
    }

    #[tokio::test]
    async fn test_query_orders_and_excludes_missing_field() {
        let store = store();
        let query = DocumentQuery::collection("produtos").order_by_field("preco", Direction::Ascending);
        let ids: Vec<String> = store.query(&query).await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_query_resumes_after_cursor() {
        let store = store();
        let query = DocumentQuery::collection("produtos")
            .order_by_id(Direction::Descending)
            .limit(2);
        let first = store.query(&query).await.unwrap();
        assert_eq!(first.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), ["d", "c"]);

        let cursor = Cursor::after(first.last().unwrap(), query.order_by.as_ref());
        let second = store
            .query(&query.clone().start_after(Some(cursor)))
            .await
            .unwrap();
        assert_eq!(second.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), ["b", "a"]);
    }

    #[tokio::test]
    async fn test_query_filters_by_equality() {
        let store = store();
        let query = DocumentQuery::collection("produtos").where_eq("categoria", "Vestidos");
        assert_eq!(store.query(&query).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_array_union_and_remove() {
        let store = MemoryDocumentStore::new();
        store
            .set("users", "u1", fields(json!({"favorites": []})))
            .await
            .unwrap();

        store.array_union("users", "u1", "favorites", json!("p1")).await.unwrap();
        store.array_union("users", "u1", "favorites", json!("p1")).await.unwrap();
        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.field("favorites"), Some(&json!(["p1"])));

        store.array_remove("users", "u1", "favorites", json!("p1")).await.unwrap();
        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.field("favorites"), Some(&json!([])));
    }

    #[tokio::test]
    async fn test_array_union_requires_document() {
        let store = MemoryDocumentStore::new();
        let err = store
            .array_union("users", "ghost", "favorites", json!("p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_generates_distinct_ids() {
        let store = MemoryDocumentStore::new();
        let a = store.create("pedidos", Map::new()).await.unwrap();
        let b = store.create("pedidos", Map::new()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count("pedidos").await, 2);
    }

    #[tokio::test]
    async fn test_identity_sign_up_then_sign_in() {
        let provider = MemoryIdentityProvider::new();
        let email = Email::parse("ana@example.com").unwrap();
        let password = SecretString::from("s3nha!".to_string());

        let created = provider.sign_up(&email, &password).await.unwrap();
        let signed_in = provider.sign_in(&email, &password).await.unwrap();
        assert_eq!(created.uid, signed_in.uid);

        let err = provider.sign_up(&email, &password).await.unwrap_err();
        assert!(matches!(err, IdentityError::Rejected { ref code } if code == "EMAIL_EXISTS"));
    }

    #[tokio::test]
    async fn test_identity_rejects_wrong_password() {
        let provider = MemoryIdentityProvider::new();
        let email = Email::parse("ana@example.com").unwrap();
        provider
            .sign_up(&email, &SecretString::from("s3nha!".to_string()))
            .await
            .unwrap();
        let err = provider
            .sign_in(&email, &SecretString::from("errada".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "E-mail ou senha inválidos.");
    }

    #[tokio::test]
    async fn test_password_reset_records_request() {
        let provider = MemoryIdentityProvider::new();
        let email = Email::parse("ana@example.com").unwrap();
        assert!(provider.send_password_reset(&email).await.is_err());

        provider
            .sign_up(&email, &SecretString::from("s3nha!".to_string()))
            .await
            .unwrap();
        provider.send_password_reset(&email).await.unwrap();
        assert_eq!(provider.reset_requests().await, vec![email]);
    }
}
