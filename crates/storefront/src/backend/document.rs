//! Document database port: documents, queries and cursors.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::BackendError;

// =============================================================================
// Documents
// =============================================================================

/// A document read from a collection.
///
/// Fields are kept as plain JSON; use [`Document::decode`] to obtain a
/// typed view.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document key within its collection.
    pub id: String,
    /// Field values.
    pub fields: Map<String, Value>,
}

impl Document {
    /// Create a document from its key and fields.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a single field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Deserialize the fields into `T`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Malformed` if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            BackendError::Malformed {
                document: self.id.clone(),
                reason: e.to_string(),
            }
        })
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// What a query is ordered by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderField {
    /// A named field. Documents lacking the field are excluded from results.
    Field(String),
    /// The document key.
    DocumentId,
}

/// Ordering clause of a query.
///
/// Ties on a field are broken by document key in the same direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: OrderField,
    pub direction: Direction,
}

/// Equality filter on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Position after which a paginated query resumes.
///
/// Captured from the last document of the previous page; holds that
/// document's value for the ordering field (if ordering by a field) and its
/// key.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    /// Ordering field value of the last document, if ordered by a field.
    pub value: Option<Value>,
    /// Key of the last document.
    pub document_id: String,
}

impl Cursor {
    /// Capture the position of `document` under `order`.
    #[must_use]
    pub fn after(document: &Document, order: Option<&OrderBy>) -> Self {
        let value = match order.map(|o| &o.field) {
            Some(OrderField::Field(name)) => Some(document.field(name).cloned().unwrap_or(Value::Null)),
            Some(OrderField::DocumentId) | None => None,
        };
        Self {
            value,
            document_id: document.id.clone(),
        }
    }
}

/// A query against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
    pub start_after: Option<Cursor>,
    pub limit: Option<usize>,
}

impl DocumentQuery {
    /// Start a query returning every document of `collection`.
    #[must_use]
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            start_after: None,
            limit: None,
        }
    }

    /// Keep only documents whose `field` equals `value`.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Order by a named field.
    #[must_use]
    pub fn order_by_field(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: OrderField::Field(field.into()),
            direction,
        });
        self
    }

    /// Order by document key.
    #[must_use]
    pub fn order_by_id(mut self, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: OrderField::DocumentId,
            direction,
        });
        self
    }

    /// Resume strictly after `cursor`.
    #[must_use]
    pub fn start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.start_after = cursor;
        self
    }

    /// Return at most `limit` documents.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `document` passes every equality filter.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.filters
            .iter()
            .all(|f| document.field(&f.field) == Some(&f.value))
    }

    /// Compare two documents under this query's ordering.
    ///
    /// Without an explicit ordering, documents sort by key ascending.
    #[must_use]
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let Some(order) = &self.order_by else {
            return a.id.cmp(&b.id);
        };
        let natural = match &order.field {
            OrderField::DocumentId => a.id.cmp(&b.id),
            OrderField::Field(name) => compare_values(
                a.field(name).unwrap_or(&Value::Null),
                b.field(name).unwrap_or(&Value::Null),
            )
            .then_with(|| a.id.cmp(&b.id)),
        };
        match order.direction {
            Direction::Ascending => natural,
            Direction::Descending => natural.reverse(),
        }
    }

    /// Whether `document` sorts strictly after `cursor` under this ordering.
    #[must_use]
    pub fn is_after(&self, document: &Document, cursor: &Cursor) -> bool {
        let anchor = Document::new(
            cursor.document_id.clone(),
            match (&self.order_by, &cursor.value) {
                (
                    Some(OrderBy {
                        field: OrderField::Field(name),
                        ..
                    }),
                    Some(value),
                ) => Map::from_iter([(name.clone(), value.clone())]),
                _ => Map::new(),
            },
        );
        self.compare(document, &anchor) == Ordering::Greater
    }
}

/// Total order over field values: null, booleans, numbers, strings, arrays,
/// maps. Values of the same kind compare naturally.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    const fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| compare_values(l, r))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}

// =============================================================================
// Port
// =============================================================================

/// Operations the storefront needs from the document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by key. Returns `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError>;

    /// Run a filtered, ordered, cursor-paginated query.
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>, BackendError>;

    /// Create a document with a generated key and return the key.
    async fn create(&self, collection: &str, fields: Map<String, Value>)
    -> Result<String, BackendError>;

    /// Create or overwrite the document at `collection/id`.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), BackendError>;

    /// Append `value` to the array `field` unless already present.
    ///
    /// Fails with `BackendError::NotFound` if the document does not exist.
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), BackendError>;

    /// Remove every occurrence of `value` from the array `field`.
    ///
    /// Fails with `BackendError::NotFound` if the document does not exist.
    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(id: &str, fields: Value) -> Document {
        let Value::Object(map) = fields else {
            panic!("fields must be an object");
        };
        Document::new(id, map)
    }

    #[test]
    fn test_compare_by_field_breaks_ties_by_id() {
        let query = DocumentQuery::collection("produtos").order_by_field("preco", Direction::Ascending);
        let a = doc("a", json!({"preco": 10}));
        let b = doc("b", json!({"preco": 10}));
        let c = doc("c", json!({"preco": 5.5}));
        assert_eq!(query.compare(&a, &b), Ordering::Less);
        assert_eq!(query.compare(&c, &a), Ordering::Less);
    }

    #[test]
    fn test_descending_reverses_tiebreak() {
        let query = DocumentQuery::collection("produtos").order_by_field("preco", Direction::Descending);
        let a = doc("a", json!({"preco": 10}));
        let b = doc("b", json!({"preco": 10}));
        assert_eq!(query.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_is_after_uses_value_and_id() {
        let query = DocumentQuery::collection("produtos").order_by_field("preco", Direction::Ascending);
        let last = doc("m", json!({"preco": 20}));
        let cursor = Cursor::after(&last, query.order_by.as_ref());

        assert!(!query.is_after(&last, &cursor));
        assert!(query.is_after(&doc("n", json!({"preco": 20})), &cursor));
        assert!(!query.is_after(&doc("z", json!({"preco": 19})), &cursor));
        assert!(query.is_after(&doc("a", json!({"preco": 21})), &cursor));
    }

    #[test]
    fn test_cursor_by_id_has_no_value() {
        let query = DocumentQuery::collection("produtos").order_by_id(Direction::Descending);
        let cursor = Cursor::after(&doc("k", json!({"preco": 1})), query.order_by.as_ref());
        assert_eq!(cursor.value, None);
        assert!(query.is_after(&doc("j", json!({})), &cursor));
        assert!(!query.is_after(&doc("l", json!({})), &cursor));
    }

    #[test]
    fn test_matches_requires_all_filters() {
        let query = DocumentQuery::collection("pedidos").where_eq("userId", "u1");
        assert!(query.matches(&doc("o1", json!({"userId": "u1"}))));
        assert!(!query.matches(&doc("o2", json!({"userId": "u2"}))));
        assert!(!query.matches(&doc("o3", json!({}))));
    }

    #[test]
    fn test_decode_reports_document_id() {
        #[derive(serde::Deserialize, Debug)]
        struct Needs {
            #[allow(dead_code)]
            nome: String,
        }
        let err = doc("p9", json!({})).decode::<Needs>().unwrap_err();
        assert!(err.to_string().contains("p9"));
    }

    #[test]
    fn test_compare_values_orders_kinds() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(3), &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(2.0)), Ordering::Equal);
    }
}
