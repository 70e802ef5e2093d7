//! Position - an order line item, owned by value inside its `Order`

use super::{decode, generate_uuid, Entity, EntityKind, View};
use crate::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A line item. The back-reference to the owning order is the order's `nr`,
/// set when the position is attached and cleared when it is detached. It is
/// never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Position {
    pub uuid: String,
    pub bezeichnung: String,
    pub preis: Decimal,
    order_nr: Option<i64>,
}

impl Position {
    /// A detached position with a generated uuid
    pub fn new() -> Self {
        Self {
            uuid: generate_uuid(),
            ..Default::default()
        }
    }

    /// `nr` of the owning order, `None` while detached
    pub fn order_nr(&self) -> Option<i64> {
        self.order_nr
    }

    pub fn is_attached(&self) -> bool {
        self.order_nr.is_some()
    }

    pub(crate) fn attach(&mut self, order_nr: i64) {
        self.order_nr = Some(order_nr);
    }

    pub(crate) fn detach(&mut self) {
        self.order_nr = None;
    }
}

/// Full and cache view of a position. The price key is capitalized in
/// existing snapshot files. Prices are written as exact JSON numbers and
/// still read plain float snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRecord {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub bezeichnung: String,
    #[serde(rename = "Preis", default, with = "rust_decimal::serde::arbitrary_precision")]
    pub preis: Decimal,
}

/// Foreign view of a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignPositionRecord {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub uuid: String,
    #[serde(rename = "description", default, deserialize_with = "super::null_as_default")]
    pub bezeichnung: String,
    #[serde(rename = "price", default, with = "rust_decimal::serde::arbitrary_precision")]
    pub preis: Decimal,
}

impl From<ForeignPositionRecord> for PositionRecord {
    fn from(r: ForeignPositionRecord) -> Self {
        Self {
            uuid: r.uuid,
            bezeichnung: r.bezeichnung,
            preis: r.preis,
        }
    }
}

impl From<PositionRecord> for ForeignPositionRecord {
    fn from(r: PositionRecord) -> Self {
        Self {
            uuid: r.uuid,
            bezeichnung: r.bezeichnung,
            preis: r.preis,
        }
    }
}

impl From<PositionRecord> for Position {
    fn from(r: PositionRecord) -> Self {
        let uuid = if r.uuid.is_empty() { generate_uuid() } else { r.uuid };
        Self {
            uuid,
            bezeichnung: r.bezeichnung,
            preis: r.preis,
            order_nr: None,
        }
    }
}

impl From<&Position> for PositionRecord {
    fn from(p: &Position) -> Self {
        Self {
            uuid: p.uuid.clone(),
            bezeichnung: p.bezeichnung.clone(),
            preis: p.preis,
        }
    }
}

impl Entity for Position {
    type Key = String;
    const KIND: EntityKind = EntityKind::Position;

    fn key(&self) -> String {
        self.uuid.clone()
    }

    fn is_valid(&self) -> bool {
        !self.uuid.is_empty()
    }

    fn from_record(view: View, record: serde_json::Value) -> Result<Self> {
        let record: PositionRecord = match view {
            View::Foreign => decode::<ForeignPositionRecord>(Self::KIND, record)?.into(),
            View::Full | View::Cache => decode(Self::KIND, record)?,
        };
        Ok(record.into())
    }

    fn to_record(&self, view: View) -> Result<serde_json::Value> {
        let record = PositionRecord::from(self);
        let value = match view {
            View::Foreign => serde_json::to_value(ForeignPositionRecord::from(record))?,
            View::Full | View::Cache => serde_json::to_value(record)?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;
    use serde_json::json;

    #[test]
    fn test_new_generates_uuid() {
        let position = Position::new();
        assert!(position.is_valid());
        assert!(!position.is_attached());
        assert_ne!(position.uuid, Position::new().uuid);
    }

    #[test]
    fn test_cache_record_uses_capital_preis() {
        let position = Position {
            uuid: "p-1".to_string(),
            bezeichnung: "Schrauben".to_string(),
            preis: Decimal::from_f64(12.5).unwrap(),
            order_nr: None,
        };
        let record = position.to_record(View::Cache).unwrap();
        assert_eq!(record, json!({"uuid": "p-1", "bezeichnung": "Schrauben", "Preis": 12.5}));
    }

    #[test]
    fn test_foreign_record() {
        let position = Position::from_record(
            View::Foreign,
            json!({"uuid": "p-2", "description": "Muttern", "price": 3.25}),
        )
        .unwrap();
        assert_eq!(position.bezeichnung, "Muttern");
        assert_eq!(position.preis, Decimal::from_f64(3.25).unwrap());
    }

    #[test]
    fn test_missing_uuid_is_generated_on_load() {
        let position = Position::from_record(View::Full, json!({"bezeichnung": "Dübel"})).unwrap();
        assert!(position.is_valid());
        assert_eq!(position.preis, Decimal::ZERO);
    }

    #[test]
    fn test_price_keeps_every_digit() {
        let preis: Decimal = "123456789.123456789".parse().unwrap();
        let position = Position {
            uuid: "p-3".to_string(),
            bezeichnung: "Blech".to_string(),
            preis,
            order_nr: None,
        };
        for view in View::all() {
            let text = serde_json::to_string(&position.to_record(*view).unwrap()).unwrap();
            assert!(text.contains("123456789.123456789"), "{}", text);
            let back: serde_json::Value = serde_json::from_str(&text).unwrap();
            let back = Position::from_record(*view, back).unwrap();
            assert_eq!(back.preis, preis);
            assert_eq!(back, position);
        }
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let position = Position::from_record(
            View::Cache,
            json!({"uuid": "p-4", "bezeichnung": null, "Preis": 0.1}),
        )
        .unwrap();
        assert_eq!(position.bezeichnung, "");
        assert_eq!(position.preis, "0.1".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_attach_detach() {
        let mut position = Position::new();
        position.attach(4);
        assert_eq!(position.order_nr(), Some(4));
        position.detach();
        assert_eq!(position.order_nr(), None);
    }
}
