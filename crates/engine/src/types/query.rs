//! Query types.
//!
//! A [`Query`] is rebuilt from the current listing state on every navigation
//! event and never mutated afterwards. Its [`QueryFingerprint`] identifies the
//! result ordering a cursor belongs to.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::Document;
use super::pagination::CursorValue;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    /// Descending order.
    #[serde(alias = "descending")]
    Desc,
}

impl SortDirection {
    /// Applies this direction to an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// A sort directive. The document id is always the secondary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortDirective {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl SortDirective {
    /// Creates an ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Creates a descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parses a sort value (e.g., "-createdAt" for descending).
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('-') {
            Some(stripped) => Self::desc(stripped),
            None => Self::asc(s),
        }
    }

    /// Compares two documents in this sort order, breaking ties by id.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ordering = a
            .sort_value(&self.field)
            .compare(&b.sort_value(&self.field))
            .then_with(|| a.id().cmp(b.id()));
        self.direction.apply(ordering)
    }
}

/// A filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
        };
        write!(f, "{op}")
    }
}

/// A single field constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// The document field the constraint applies to.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value compared against.
    pub value: Value,
}

impl Filter {
    /// Creates an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Creates a filter with an explicit operator.
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluates this constraint against a document. Missing fields are null.
    pub fn matches(&self, document: &Document) -> bool {
        let actual = document.sort_value(&self.field);
        let expected = CursorValue::from_json(&self.value);
        let ordering = actual.compare(&expected);
        match self.op {
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Ne => ordering != Ordering::Equal,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Gte => ordering != Ordering::Less,
        }
    }

    fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.op.hash(state);
        self.value.to_string().hash(state);
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// Identifies the ordering and membership of a query's result set.
///
/// Two cursors are comparable only if they carry the same fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryFingerprint(u64);

impl QueryFingerprint {
    /// Returns the raw fingerprint value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueryFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// An immutable listing query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Logical collection name.
    pub collection: String,
    /// Primary sort, always present.
    pub sort: SortDirective,
    /// Field constraints.
    pub filters: Vec<Filter>,
    /// Normalized search token.
    pub search_token: Option<String>,
    /// Rows per page.
    pub page_size: u32,
}

impl Query {
    /// Creates a query without filters or search.
    pub fn new(collection: impl Into<String>, sort: SortDirective, page_size: u32) -> Self {
        Self {
            collection: collection.into(),
            sort,
            filters: Vec::new(),
            search_token: None,
            page_size,
        }
    }

    /// Adds a filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sets the search token. Callers pass an already normalized token.
    pub fn with_search_token(mut self, token: Option<String>) -> Self {
        self.search_token = token;
        self
    }

    /// Computes the fingerprint over collection, sort, filters and search.
    ///
    /// Page size is excluded: changing it does not move cursor positions.
    pub fn fingerprint(&self) -> QueryFingerprint {
        let mut hasher = DefaultHasher::new();
        self.collection.hash(&mut hasher);
        self.sort.hash(&mut hasher);
        self.filters.len().hash(&mut hasher);
        for filter in &self.filters {
            filter.hash_into(&mut hasher);
        }
        self.search_token.hash(&mut hasher);
        QueryFingerprint(hasher.finish())
    }
}
