//! Keyword (schlagwort) - read-only tag reference data, keyed by `uuid`

use super::{decode, generate_uuid, Entity, EntityKind, View};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyword {
    pub uuid: String,
    pub text: String,
}

impl Keyword {
    /// A new keyword with a generated uuid
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            uuid: generate_uuid(),
            text: text.into(),
        }
    }

    pub fn with_uuid(uuid: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            text: text.into(),
        }
    }
}

/// Full and cache view of a keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRecord {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub text: String,
}

/// Foreign view of a keyword. The external system uses the same names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeywordRecord {
    #[serde(rename = "uuid", default, deserialize_with = "super::null_as_default")]
    pub uuid: String,
    #[serde(rename = "text", default, deserialize_with = "super::null_as_default")]
    pub text: String,
}

impl From<ForeignKeywordRecord> for KeywordRecord {
    fn from(r: ForeignKeywordRecord) -> Self {
        Self { uuid: r.uuid, text: r.text }
    }
}

impl From<KeywordRecord> for ForeignKeywordRecord {
    fn from(r: KeywordRecord) -> Self {
        Self { uuid: r.uuid, text: r.text }
    }
}

impl Entity for Keyword {
    type Key = String;
    const KIND: EntityKind = EntityKind::Keyword;

    fn key(&self) -> String {
        self.uuid.clone()
    }

    fn is_valid(&self) -> bool {
        !self.uuid.is_empty()
    }

    fn from_record(view: View, record: serde_json::Value) -> Result<Self> {
        let record: KeywordRecord = match view {
            View::Foreign => decode::<ForeignKeywordRecord>(Self::KIND, record)?.into(),
            View::Full | View::Cache => decode(Self::KIND, record)?,
        };
        let uuid = if record.uuid.is_empty() {
            generate_uuid()
        } else {
            record.uuid
        };
        Ok(Self { uuid, text: record.text })
    }

    fn to_record(&self, view: View) -> Result<serde_json::Value> {
        let record = KeywordRecord {
            uuid: self.uuid.clone(),
            text: self.text.clone(),
        };
        let value = match view {
            View::Foreign => serde_json::to_value(ForeignKeywordRecord::from(record))?,
            View::Full | View::Cache => serde_json::to_value(record)?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_uuid_is_generated() {
        let keyword = Keyword::from_record(View::Cache, json!({"text": "eilig"})).unwrap();
        assert!(keyword.is_valid());
        assert_eq!(keyword.text, "eilig");
    }

    #[test]
    fn test_record_keeps_uuid() {
        let keyword = Keyword::with_uuid("k-1", "Stammkunde");
        let record = keyword.to_record(View::Full).unwrap();
        assert_eq!(record, json!({"uuid": "k-1", "text": "Stammkunde"}));
        assert_eq!(Keyword::from_record(View::Full, record).unwrap(), keyword);
    }

    #[test]
    fn test_default_is_invalid() {
        assert!(!Keyword::default().is_valid());
    }
}
