//! Order (auftrag) - keyed by `nr`
//!
//! An order owns its positions and refers lazily to one customer
//! (`auftraggeber`) and to any number of keywords (`tags`).

use super::position::{ForeignPositionRecord, PositionRecord};
use super::{decode, Customer, Entity, EntityKind, Keyword, Position, Shared, View, UNSET_NR};
use crate::reference::{LazyKeys, LazyRef};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Date format of `datum` in every view
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct Order {
    nr: i64,
    pub datum: Option<NaiveDate>,
    pub bemerkung: String,
    auftraggeber: LazyRef<Customer>,
    positionen: Vec<Position>,
    tags: LazyKeys<Keyword>,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            nr: UNSET_NR,
            datum: None,
            bemerkung: String::new(),
            auftraggeber: LazyRef::new(),
            positionen: Vec::new(),
            tags: LazyKeys::new(),
        }
    }
}

/// Orders compare by their persisted state. Bindings are not compared.
impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.nr == other.nr
            && self.datum == other.datum
            && self.bemerkung == other.bemerkung
            && self.auftraggeber.key() == other.auftraggeber.key()
            && self.positionen == other.positionen
            && self.tags.export_keys() == other.tags.export_keys()
    }
}

impl Order {
    pub fn new(nr: i64) -> Self {
        Self {
            nr,
            ..Default::default()
        }
    }

    pub fn nr(&self) -> i64 {
        self.nr
    }

    /// Change the domain key. Attached positions follow.
    pub fn set_nr(&mut self, nr: i64) {
        self.nr = nr;
        for position in &mut self.positionen {
            position.attach(nr);
        }
    }

    pub fn has_datum(&self) -> bool {
        self.datum.is_some()
    }

    // --- customer reference ---

    /// Key of the referenced customer, `-1` if unset
    pub fn auftraggeber(&self) -> i64 {
        self.auftraggeber.key()
    }

    pub fn set_auftraggeber(&mut self, nr: i64) {
        self.auftraggeber.set_key(nr);
    }

    pub fn remove_auftraggeber(&mut self) {
        self.auftraggeber.clear();
    }

    /// Bind a customer directly, adopting its `nr`
    pub fn set_customer(&mut self, customer: &Shared<Customer>) {
        let nr = customer.borrow().nr;
        self.auftraggeber.set_target(nr, customer);
    }

    /// The bound customer, if resolved and still alive
    pub fn customer(&self) -> Option<Shared<Customer>> {
        self.auftraggeber.get()
    }

    pub fn customer_ref(&self) -> &LazyRef<Customer> {
        &self.auftraggeber
    }

    pub(crate) fn customer_ref_mut(&mut self) -> &mut LazyRef<Customer> {
        &mut self.auftraggeber
    }

    // --- positions ---

    /// Create a new position with a generated uuid and attach it
    pub fn create_position(&mut self) -> &mut Position {
        self.add_position(Position::new())
    }

    /// Take ownership of a position and attach it
    pub fn add_position(&mut self, mut position: Position) -> &mut Position {
        position.attach(self.nr);
        self.positionen.push(position);
        let last = self.positionen.len() - 1;
        &mut self.positionen[last]
    }

    /// Remove and destroy the position with this uuid
    pub fn remove_position(&mut self, uuid: &str) -> bool {
        match self.positionen.iter().position(|p| p.uuid == uuid) {
            Some(index) => {
                let mut removed = self.positionen.remove(index);
                removed.detach();
                true
            }
            None => false,
        }
    }

    /// Detach a position and hand it back to the caller
    pub fn take_position(&mut self, uuid: &str) -> Option<Position> {
        let index = self.positionen.iter().position(|p| p.uuid == uuid)?;
        let mut position = self.positionen.remove(index);
        position.detach();
        Some(position)
    }

    pub fn clear_positions(&mut self) {
        self.positionen.clear();
    }

    pub fn positions(&self) -> &[Position] {
        &self.positionen
    }

    pub fn position_count(&self) -> usize {
        self.positionen.len()
    }

    // --- tags ---

    pub fn add_tag(&mut self, keyword: &Shared<Keyword>) {
        self.tags.push(keyword);
    }

    /// Drop the tag reference. The keyword is left alone.
    pub fn remove_tag(&mut self, uuid: &str) -> bool {
        self.tags.remove(&uuid.to_string())
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    /// Live tag keywords, in resolution order
    pub fn tags(&self) -> Vec<Shared<Keyword>> {
        self.tags.objects()
    }

    /// Tag keys as they would be written out
    pub fn tag_keys(&self) -> Vec<String> {
        self.tags.export_keys()
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn tags_resolved(&self) -> bool {
        self.tags.is_resolved()
    }

    pub fn tag_ref(&self) -> &LazyKeys<Keyword> {
        &self.tags
    }

    pub(crate) fn tag_ref_mut(&mut self) -> &mut LazyKeys<Keyword> {
        &mut self.tags
    }

    /// True when the customer reference (if any) is bound and the tags are resolved
    pub fn is_all_resolved(&self) -> bool {
        (!self.auftraggeber.has_reference() || self.auftraggeber.is_resolved())
            && self.tags.is_resolved()
    }

    fn from_parts(
        nr: i64,
        datum: Option<String>,
        bemerkung: String,
        auftraggeber: Option<i64>,
        positionen: Vec<Position>,
        tags: Vec<String>,
    ) -> Self {
        let mut order = Self {
            nr,
            datum: parse_datum(nr, datum.as_deref()),
            bemerkung,
            auftraggeber: LazyRef::with_key(auftraggeber.unwrap_or(UNSET_NR)),
            positionen: Vec::with_capacity(positionen.len()),
            tags: LazyKeys::from_keys(tags),
        };
        for position in positionen {
            order.add_position(position);
        }
        order
    }

    fn optional_auftraggeber(&self) -> Option<i64> {
        Some(self.auftraggeber.key()).filter(|nr| *nr != UNSET_NR)
    }

    fn formatted_datum(&self) -> Option<String> {
        self.datum.map(|d| d.format(DATE_FORMAT).to_string())
    }
}

fn parse_datum(nr: i64, datum: Option<&str>) -> Option<NaiveDate> {
    let raw = datum.filter(|s| !s.is_empty())?;
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Order {}: ignoring unparseable datum {:?}: {}", nr, raw, e);
            None
        }
    }
}

/// Full and cache view of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub nr: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub bemerkung: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auftraggeber: Option<i64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub positionen: Vec<PositionRecord>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub tags: Vec<String>,
}

/// Foreign view of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignOrderRecord {
    #[serde(rename = "number")]
    pub nr: i64,
    #[serde(rename = "date", default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<String>,
    #[serde(rename = "remark", default, deserialize_with = "super::null_as_default")]
    pub bemerkung: String,
    #[serde(rename = "customer", default, skip_serializing_if = "Option::is_none")]
    pub auftraggeber: Option<i64>,
    #[serde(rename = "items", default, deserialize_with = "super::null_as_default")]
    pub positionen: Vec<ForeignPositionRecord>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub tags: Vec<String>,
}

impl Entity for Order {
    type Key = i64;
    const KIND: EntityKind = EntityKind::Order;

    fn key(&self) -> i64 {
        self.nr
    }

    fn is_valid(&self) -> bool {
        self.nr != UNSET_NR && !self.positionen.is_empty() && self.auftraggeber.key() != UNSET_NR
    }

    fn from_record(view: View, record: serde_json::Value) -> Result<Self> {
        let order = match view {
            View::Foreign => {
                let r: ForeignOrderRecord = decode(Self::KIND, record)?;
                let positionen = r
                    .positionen
                    .into_iter()
                    .map(|p| Position::from(PositionRecord::from(p)))
                    .collect();
                Self::from_parts(r.nr, r.datum, r.bemerkung, r.auftraggeber, positionen, r.tags)
            }
            View::Full | View::Cache => {
                let r: OrderRecord = decode(Self::KIND, record)?;
                let positionen = r.positionen.into_iter().map(Position::from).collect();
                Self::from_parts(r.nr, r.datum, r.bemerkung, r.auftraggeber, positionen, r.tags)
            }
        };
        Ok(order)
    }

    fn to_record(&self, view: View) -> Result<serde_json::Value> {
        let value = match view {
            View::Foreign => serde_json::to_value(ForeignOrderRecord {
                nr: self.nr,
                datum: self.formatted_datum(),
                bemerkung: self.bemerkung.clone(),
                auftraggeber: self.optional_auftraggeber(),
                positionen: self
                    .positionen
                    .iter()
                    .map(|p| ForeignPositionRecord::from(PositionRecord::from(p)))
                    .collect(),
                tags: self.tags.export_keys(),
            })?,
            View::Full | View::Cache => serde_json::to_value(OrderRecord {
                nr: self.nr,
                datum: self.formatted_datum(),
                bemerkung: self.bemerkung.clone(),
                auftraggeber: self.optional_auftraggeber(),
                positionen: self.positionen.iter().map(PositionRecord::from).collect(),
                tags: self.tags.export_keys(),
            })?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_omission_rules() {
        let order = Order::new(1);
        let record = order.to_record(View::Cache).unwrap();
        assert_eq!(
            record,
            json!({"nr": 1, "bemerkung": "", "positionen": [], "tags": []})
        );
    }

    #[test]
    fn test_full_record() {
        let record = json!({
            "nr": 10,
            "datum": "2024-03-01",
            "bemerkung": "dringend",
            "auftraggeber": 4,
            "positionen": [
                {"uuid": "p-1", "bezeichnung": "Schrauben", "Preis": 1.5},
                {"uuid": "p-2", "bezeichnung": "Muttern", "Preis": 2.0}
            ],
            "tags": ["k-1"]
        });
        let order = Order::from_record(View::Full, record).unwrap();
        assert_eq!(order.nr(), 10);
        assert_eq!(order.datum, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(order.auftraggeber(), 4);
        assert_eq!(order.position_count(), 2);
        assert_eq!(order.positions()[0].uuid, "p-1");
        assert_eq!(order.positions()[1].order_nr(), Some(10));
        assert_eq!(order.tag_keys(), vec!["k-1"]);
        assert!(!order.tags_resolved());
        assert!(order.is_valid());

        let again = Order::from_record(View::Cache, order.to_record(View::Cache).unwrap()).unwrap();
        assert_eq!(again, order);
    }

    #[test]
    fn test_foreign_names() {
        let mut order = Order::new(2);
        order.set_auftraggeber(9);
        order.datum = NaiveDate::from_ymd_opt(2023, 12, 24);
        let position = order.create_position();
        position.bezeichnung = "Kerzen".to_string();
        position.preis = Decimal::new(45, 1);

        let record = order.to_record(View::Foreign).unwrap();
        assert_eq!(record["number"], json!(2));
        assert_eq!(record["date"], json!("2023-12-24"));
        assert_eq!(record["customer"], json!(9));
        assert_eq!(record["items"][0]["description"], json!("Kerzen"));
        assert_eq!(record["items"][0]["price"], json!(4.5));
        assert!(record.get("nr").is_none());

        let back = Order::from_record(View::Foreign, record).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn test_bad_datum_becomes_absent() {
        let order =
            Order::from_record(View::Cache, json!({"nr": 3, "datum": "01.03.2024"})).unwrap();
        assert!(!order.has_datum());
    }

    #[test]
    fn test_null_reads_as_absent() {
        let order = Order::from_record(
            View::Cache,
            json!({"nr": 1, "bemerkung": null, "positionen": null, "tags": null}),
        )
        .unwrap();
        assert_eq!(order.bemerkung, "");
        assert_eq!(order.position_count(), 0);
        assert!(order.tags_resolved());

        let foreign = Order::from_record(
            View::Foreign,
            json!({"number": 2, "remark": null, "items": [{"description": null, "price": 1.5}], "tags": null}),
        )
        .unwrap();
        assert_eq!(foreign.bemerkung, "");
        assert_eq!(foreign.positions()[0].bezeichnung, "");
    }

    #[test]
    fn test_missing_nr_fails() {
        assert!(Order::from_record(View::Cache, json!({"bemerkung": "x"})).is_err());
    }

    #[test]
    fn test_validity() {
        let mut order = Order::new(1);
        assert!(!order.is_valid());
        order.create_position();
        assert!(!order.is_valid());
        order.set_auftraggeber(2);
        assert!(order.is_valid());
        order.remove_auftraggeber();
        assert!(!order.is_valid());
    }

    #[test]
    fn test_position_ownership() {
        let mut order = Order::new(5);
        let uuid = order.create_position().uuid.clone();
        assert_eq!(order.positions()[0].order_nr(), Some(5));

        order.set_nr(6);
        assert_eq!(order.positions()[0].order_nr(), Some(6));

        let taken = order.take_position(&uuid).unwrap();
        assert_eq!(taken.order_nr(), None);
        assert_eq!(order.position_count(), 0);

        order.add_position(taken);
        assert!(order.remove_position(&uuid));
        assert!(!order.remove_position(&uuid));
    }

    #[test]
    fn test_set_customer_binds() {
        let customer = Rc::new(RefCell::new(Customer::new(8, "Berger", "Graz")));
        let mut order = Order::new(1);
        order.set_customer(&customer);
        assert_eq!(order.auftraggeber(), 8);
        assert!(order.is_all_resolved());
        assert!(Rc::ptr_eq(&order.customer().unwrap(), &customer));

        order.set_auftraggeber(8);
        assert!(order.customer().is_some());
        order.set_auftraggeber(9);
        assert!(order.customer().is_none());
        assert!(!order.is_all_resolved());
    }

    #[test]
    fn test_tags_do_not_own_keywords() {
        let keyword = Rc::new(RefCell::new(Keyword::with_uuid("k-1", "eilig")));
        let mut order = Order::new(1);
        order.add_tag(&keyword);
        assert_eq!(order.tag_count(), 1);
        assert!(order.remove_tag("k-1"));
        assert_eq!(order.tag_count(), 0);
        assert_eq!(Rc::strong_count(&keyword), 1);
    }
}
