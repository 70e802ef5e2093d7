//! Entity Model - the four record types and their serialization views
//!
//! Root entities (owned by the store):
//! - `Customer` (kunde): keyed by `nr`
//! - `Order` (auftrag): keyed by `nr`, owns its `Position`s
//! - `Keyword` (schlagwort): keyed by `uuid`, read-only reference data
//!
//! Every entity converts to and from a JSON record under one of three
//! [`View`]s. Each view has its own serde record struct, so a missing
//! mandatory key fails at decode time instead of defaulting silently.

pub mod customer;
pub mod keyword;
pub mod order;
pub mod position;

pub use customer::{Customer, CustomerColumns, CustomerRecord, ForeignCustomerRecord};
pub use keyword::{ForeignKeywordRecord, Keyword, KeywordRecord};
pub use order::{ForeignOrderRecord, Order, OrderRecord};
pub use position::{ForeignPositionRecord, Position, PositionRecord};

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Shared handle to a root entity. The store holds the owning handle;
/// references from other entities hold `Weak` downgrades of it.
pub type Shared<T> = Rc<RefCell<T>>;

/// Sentinel for an unset integer domain key or scalar reference.
pub const UNSET_NR: i64 = -1;

/// Reads a JSON `null` the same as a missing key. Use together with
/// `#[serde(default)]`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Field-name mapping used when converting an entity to or from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Every persisted field, internal names
    #[default]
    Full,
    /// Every persisted field, names of the external system
    Foreign,
    /// Local snapshot persistence; same as `Full` (no transient fields)
    Cache,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Full => "full",
            View::Foreign => "foreign",
            View::Cache => "cache",
        }
    }

    pub fn all() -> &'static [View] {
        &[View::Full, View::Foreign, View::Cache]
    }
}

impl FromStr for View {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "full" | "map" => Ok(View::Full),
            "foreign" | "wire" | "external" => Ok(View::Foreign),
            "cache" | "snapshot" => Ok(View::Cache),
            _ => Err(Error::Parse(format!("Unknown view: {}", s))),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The entity kinds of the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Customer,
    Order,
    Position,
    Keyword,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customer",
            EntityKind::Order => "order",
            EntityKind::Position => "position",
            EntityKind::Keyword => "keyword",
        }
    }

    /// Snapshot file of a root collection. Positions live inside orders.
    pub fn cache_file_name(&self) -> Option<&'static str> {
        match self {
            EntityKind::Customer => Some("cacheKunde.json"),
            EntityKind::Order => Some("cacheAuftrag.json"),
            EntityKind::Keyword => Some("cacheSchlagwort.json"),
            EntityKind::Position => None,
        }
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "customer" | "customers" | "kunde" => Ok(EntityKind::Customer),
            "order" | "orders" | "auftrag" => Ok(EntityKind::Order),
            "position" | "positions" => Ok(EntityKind::Position),
            "keyword" | "keywords" | "tag" | "tags" | "schlagwort" => Ok(EntityKind::Keyword),
            _ => Err(Error::Parse(format!("Unknown entity kind: {}", s))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A domain key of any entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Nr(i64),
    Uuid(String),
}

impl From<i64> for EntityKey {
    fn from(nr: i64) -> Self {
        EntityKey::Nr(nr)
    }
}

impl From<String> for EntityKey {
    fn from(uuid: String) -> Self {
        EntityKey::Uuid(uuid)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Nr(nr) => write!(f, "{}", nr),
            EntityKey::Uuid(uuid) => write!(f, "{}", uuid),
        }
    }
}

/// Contract shared by all entity types.
pub trait Entity: Sized {
    /// Domain key type (`nr` or `uuid`)
    type Key: Clone + PartialEq + fmt::Display + fmt::Debug + Into<EntityKey>;

    const KIND: EntityKind;

    /// The domain key of this entity
    fn key(&self) -> Self::Key;

    /// False if a mandatory field still holds its sentinel value
    fn is_valid(&self) -> bool;

    /// Build an entity from a record under the given view's naming.
    /// Absent optional keys take their defaults; an absent domain key fails.
    fn from_record(view: View, record: serde_json::Value) -> Result<Self>;

    /// Export the entity as a record under the given view's naming
    fn to_record(&self, view: View) -> Result<serde_json::Value>;
}

/// Decode a JSON record into a typed view record.
pub(crate) fn decode<R: DeserializeOwned>(kind: EntityKind, record: serde_json::Value) -> Result<R> {
    serde_json::from_value(record).map_err(|e| Error::InvalidRecord {
        kind,
        reason: e.to_string(),
    })
}

/// A fresh uuid in hyphenated form, without braces.
pub(crate) fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
