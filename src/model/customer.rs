//! Customer (kunde) - keyed by `nr`, no references

use super::{decode, Entity, EntityKind, View, UNSET_NR};
use crate::Result;
use serde::{Deserialize, Serialize};

/// A customer. Orders point at customers through a lazy `nr` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Domain key; `-1` while unset
    pub nr: i64,
    pub name: String,
    /// City
    pub ort: String,
}

impl Default for Customer {
    fn default() -> Self {
        Self {
            nr: UNSET_NR,
            name: String::new(),
            ort: String::new(),
        }
    }
}

impl Customer {
    /// Create a customer with all fields set
    pub fn new(nr: i64, name: impl Into<String>, ort: impl Into<String>) -> Self {
        Self {
            nr,
            name: name.into(),
            ort: ort.into(),
        }
    }

    /// Append this customer's values to the parallel column vectors
    /// used for batch inserts.
    pub fn push_columns(&self, columns: &mut CustomerColumns) {
        columns.nr.push(self.nr);
        columns.name.push(self.name.clone());
        columns.ort.push(self.ort.clone());
    }
}

/// Full and cache view of a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub nr: i64,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub ort: String,
}

/// Foreign view of a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignCustomerRecord {
    #[serde(rename = "number")]
    pub nr: i64,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    #[serde(rename = "city", default, deserialize_with = "super::null_as_default")]
    pub ort: String,
}

impl From<ForeignCustomerRecord> for CustomerRecord {
    fn from(r: ForeignCustomerRecord) -> Self {
        Self { nr: r.nr, name: r.name, ort: r.ort }
    }
}

impl From<CustomerRecord> for ForeignCustomerRecord {
    fn from(r: CustomerRecord) -> Self {
        Self { nr: r.nr, name: r.name, ort: r.ort }
    }
}

impl From<CustomerRecord> for Customer {
    fn from(r: CustomerRecord) -> Self {
        Self { nr: r.nr, name: r.name, ort: r.ort }
    }
}

impl From<&Customer> for CustomerRecord {
    fn from(c: &Customer) -> Self {
        Self {
            nr: c.nr,
            name: c.name.clone(),
            ort: c.ort.clone(),
        }
    }
}

impl Entity for Customer {
    type Key = i64;
    const KIND: EntityKind = EntityKind::Customer;

    fn key(&self) -> i64 {
        self.nr
    }

    fn is_valid(&self) -> bool {
        self.nr != UNSET_NR
    }

    fn from_record(view: View, record: serde_json::Value) -> Result<Self> {
        let record: CustomerRecord = match view {
            View::Foreign => decode::<ForeignCustomerRecord>(Self::KIND, record)?.into(),
            View::Full | View::Cache => decode(Self::KIND, record)?,
        };
        Ok(record.into())
    }

    fn to_record(&self, view: View) -> Result<serde_json::Value> {
        let record = CustomerRecord::from(self);
        let value = match view {
            View::Foreign => serde_json::to_value(ForeignCustomerRecord::from(record))?,
            View::Full | View::Cache => serde_json::to_value(record)?,
        };
        Ok(value)
    }
}

/// Customer values split into one vector per SQL column.
#[derive(Debug, Default, Clone)]
pub struct CustomerColumns {
    pub nr: Vec<i64>,
    pub name: Vec<String>,
    pub ort: Vec<String>,
}

impl CustomerColumns {
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            nr: Vec::with_capacity(rows),
            name: Vec::with_capacity(rows),
            ort: Vec::with_capacity(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.nr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nr.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill_tolerates_missing_optionals() {
        let customer = Customer::from_record(View::Cache, json!({"nr": 7})).unwrap();
        assert_eq!(customer.nr, 7);
        assert_eq!(customer.name, "");
        assert_eq!(customer.ort, "");
        assert!(customer.is_valid());
    }

    #[test]
    fn test_null_optionals_read_as_empty() {
        let customer =
            Customer::from_record(View::Cache, json!({"nr": 4, "name": null, "ort": null})).unwrap();
        assert_eq!(customer.name, "");
        assert_eq!(customer.ort, "");

        let foreign = Customer::from_record(View::Foreign, json!({"number": 4, "city": null})).unwrap();
        assert_eq!(foreign, customer);
    }

    #[test]
    fn test_fill_requires_domain_key() {
        let err = Customer::from_record(View::Full, json!({"name": "Müller"})).unwrap_err();
        assert!(err.to_string().contains("nr"));
    }

    #[test]
    fn test_foreign_names() {
        let customer = Customer::new(3, "Huber", "Wien");
        let foreign = customer.to_record(View::Foreign).unwrap();
        assert_eq!(foreign, json!({"number": 3, "name": "Huber", "city": "Wien"}));

        let back = Customer::from_record(View::Foreign, foreign).unwrap();
        assert_eq!(back, customer);

        // internal names are not accepted by the foreign view
        assert!(Customer::from_record(View::Foreign, json!({"nr": 3})).is_err());
    }

    #[test]
    fn test_default_is_invalid() {
        assert!(!Customer::default().is_valid());
    }

    #[test]
    fn test_push_columns() {
        let mut columns = CustomerColumns::default();
        Customer::new(1, "A", "X").push_columns(&mut columns);
        Customer::new(2, "B", "Y").push_columns(&mut columns);

        assert_eq!(columns.len(), 2);
        assert_eq!(columns.nr, vec![1, 2]);
        assert_eq!(columns.name, vec!["A", "B"]);
        assert_eq!(columns.ort, vec!["X", "Y"]);
    }
}
