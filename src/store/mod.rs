//! Entity Store - owns the root collections
//!
//! The store holds every customer, order and keyword, loads and saves them
//! through the cache backends, resolves order references after loading,
//! and tells subscribed listeners about additions and removals.

pub mod collection;
pub mod event;

pub use collection::Collection;
pub use event::{AnyEntity, Listener, StoreEvent};

use crate::cache::{ImportReport, SnapshotCache, SqlCache};
use crate::config::{CustomerSource, OrdercacheConfig};
use crate::model::{Customer, Entity, EntityKind, Keyword, Order, Position, Shared, View};
use crate::reference::{ResolveStats, Resolver};
use crate::{Error, Result};
use event::Notifier;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Entity counts of a store
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub customers: usize,
    pub orders: usize,
    pub positions: usize,
    pub keywords: usize,
    pub unresolved_orders: usize,
    pub invalid_orders: usize,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Store Statistics:")?;
        writeln!(f, "  Customers: {}", self.customers)?;
        writeln!(f, "  Orders: {}", self.orders)?;
        writeln!(f, "  Positions: {}", self.positions)?;
        writeln!(f, "  Keywords: {}", self.keywords)?;
        writeln!(f, "  Unresolved Orders: {}", self.unresolved_orders)?;
        writeln!(f, "  Invalid Orders: {}", self.invalid_orders)
    }
}

pub struct EntityStore {
    snapshots: SnapshotCache,
    sql: Option<SqlCache>,
    customer_source: CustomerSource,
    customers: Collection<Customer>,
    orders: Collection<Order>,
    keywords: Collection<Keyword>,
    notifier: Notifier,
}

fn insert_into<T>(collection: &mut Collection<T>, notifier: &mut Notifier, entity: T) -> Shared<T>
where
    T: Entity,
    Shared<T>: Into<AnyEntity>,
{
    let handle = collection.push(entity);
    notifier.added(handle.clone().into());
    handle
}

fn delete_from<T>(collection: &mut Collection<T>, notifier: &mut Notifier, handle: &Shared<T>) -> bool
where
    T: Entity,
    Shared<T>: Into<AnyEntity>,
{
    if !collection.iter().any(|item| Rc::ptr_eq(item, handle)) {
        return false;
    }
    notifier.removed(handle.clone().into());
    collection.remove(handle).is_some()
}

fn delete_key_from<T>(collection: &mut Collection<T>, notifier: &mut Notifier, key: &T::Key) -> bool
where
    T: Entity,
    Shared<T>: Into<AnyEntity>,
{
    match collection.find(key) {
        Some(handle) => delete_from(collection, notifier, &handle),
        None => {
            debug!("No {} {} to delete", T::KIND, key);
            false
        }
    }
}

fn delete_all_from<T>(collection: &mut Collection<T>, notifier: &mut Notifier) -> usize
where
    T: Entity,
    Shared<T>: Into<AnyEntity>,
{
    let removed = collection.take_all();
    for handle in &removed {
        notifier.removed(handle.clone().into());
    }
    removed.len()
}

impl EntityStore {
    /// A store backed by snapshots only
    pub fn new(snapshots: SnapshotCache) -> Self {
        Self {
            snapshots,
            sql: None,
            customer_source: CustomerSource::Snapshot,
            customers: Collection::new(),
            orders: Collection::new(),
            keywords: Collection::new(),
            notifier: Notifier::default(),
        }
    }

    pub fn with_sql(mut self, sql: SqlCache) -> Self {
        self.sql = Some(sql);
        self
    }

    pub fn with_customer_source(mut self, source: CustomerSource) -> Self {
        self.customer_source = source;
        self
    }

    /// Build a store from configuration. A database that cannot be opened
    /// is logged and the store runs without SQLite.
    pub fn open(config: &OrdercacheConfig) -> Self {
        let snapshots = SnapshotCache::new(config.data_dir(), config.assets_dir());
        let store = Self::new(snapshots).with_customer_source(config.customer_source());

        match SqlCache::open_with_default(&config.database_path(), &config.default_database_path()) {
            Ok(mut sql) => {
                sql.set_chunk_size(config.chunk_size());
                store.with_sql(sql)
            }
            Err(e) => {
                warn!("SQLite cache unavailable at {}: {}", config.database_path().display(), e);
                store
            }
        }
    }

    pub fn snapshots(&self) -> &SnapshotCache {
        &self.snapshots
    }

    pub fn sql(&self) -> Option<&SqlCache> {
        self.sql.as_ref()
    }

    pub fn customer_source(&self) -> CustomerSource {
        self.customer_source
    }

    /// Register a listener for add/remove notifications
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.notifier.subscribe(Box::new(listener));
    }

    // ========== Lifecycle ==========

    /// Startup: load customers from the configured source, then orders and
    /// keywords, then resolve order references.
    pub fn init(&mut self) -> Result<ResolveStats> {
        match self.customer_source {
            CustomerSource::Sqlite if self.sql.is_some() => {
                self.load_customers_from_sql()?;
            }
            CustomerSource::Sqlite => {
                warn!("Customer source is sqlite but no database is open, using snapshot");
                self.load_customers()?;
            }
            CustomerSource::Snapshot => {
                self.load_customers()?;
            }
        }
        self.load_orders()?;
        self.load_keywords()?;

        let stats = self.resolve_references_for_all_orders();
        info!(
            "Loaded {} customers, {} orders, {} keywords",
            self.customers.len(),
            self.orders.len(),
            self.keywords.len()
        );
        Ok(stats)
    }

    /// Shutdown: write customer and order snapshots. Keywords are read-only.
    pub fn finish(&self) -> Result<()> {
        self.save_customers()?;
        self.save_orders()?;
        info!("Saved {} customers and {} orders", self.customers.len(), self.orders.len());
        Ok(())
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            customers: self.customers.len(),
            orders: self.orders.len(),
            keywords: self.keywords.len(),
            ..Default::default()
        };
        for order in self.orders.iter() {
            let order = order.borrow();
            stats.positions += order.position_count();
            if !order.is_all_resolved() {
                stats.unresolved_orders += 1;
            }
            if !order.is_valid() {
                stats.invalid_orders += 1;
            }
        }
        stats
    }

    // ========== Customers ==========

    pub fn load_customers(&mut self) -> Result<usize> {
        let records = self.snapshots.read(EntityKind::Customer)?;
        let count = self.customers.load_records(View::Cache, records)?;
        debug!("Loaded {} customers from snapshot", count);
        Ok(count)
    }

    pub fn save_customers(&self) -> Result<PathBuf> {
        let records = self.customers.to_records(View::Cache)?;
        self.snapshots.write(EntityKind::Customer, &records)
    }

    pub fn load_customers_from_sql(&mut self) -> Result<usize> {
        let sql = self.sql.as_ref().ok_or(Error::DatabaseUnavailable)?;
        let customers = sql.load_customers()?;
        let count = customers.len();
        self.customers.replace_all(customers);
        Ok(count)
    }

    /// Replace the SQLite customer table with the in-memory customers
    pub fn import_customers_to_sql(&self) -> Result<ImportReport> {
        let sql = self.sql.as_ref().ok_or(Error::DatabaseUnavailable)?;
        sql.import_customers(self.customers.items())
    }

    /// A detached customer with an unset `nr`
    pub fn create_customer(&self) -> Customer {
        Customer::default()
    }

    pub fn insert_customer(&mut self, customer: Customer) -> Shared<Customer> {
        insert_into(&mut self.customers, &mut self.notifier, customer)
    }

    pub fn insert_customer_from_record(&mut self, view: View, record: serde_json::Value) -> Result<Shared<Customer>> {
        let customer = Customer::from_record(view, record)?;
        Ok(self.insert_customer(customer))
    }

    pub fn delete_customer(&mut self, customer: &Shared<Customer>) -> bool {
        delete_from(&mut self.customers, &mut self.notifier, customer)
    }

    pub fn delete_customer_by_key(&mut self, nr: i64) -> bool {
        delete_key_from(&mut self.customers, &mut self.notifier, &nr)
    }

    pub fn delete_all_customers(&mut self) -> usize {
        delete_all_from(&mut self.customers, &mut self.notifier)
    }

    pub fn find_customer(&self, nr: i64) -> Option<Shared<Customer>> {
        self.customers.find(&nr)
    }

    pub fn customers_for_keys(&self, nrs: &[i64]) -> Vec<Shared<Customer>> {
        self.customers.list_for_keys(nrs).0
    }

    pub fn customers(&self) -> &[Shared<Customer>] {
        self.customers.items()
    }

    pub fn customers_as_records(&self, view: View) -> Result<Vec<serde_json::Value>> {
        self.customers.to_records(view)
    }

    // ========== Orders ==========

    pub fn load_orders(&mut self) -> Result<usize> {
        let records = self.snapshots.read(EntityKind::Order)?;
        let count = self.orders.load_records(View::Cache, records)?;
        debug!("Loaded {} orders from snapshot", count);
        Ok(count)
    }

    pub fn save_orders(&self) -> Result<PathBuf> {
        let records = self.orders.to_records(View::Cache)?;
        self.snapshots.write(EntityKind::Order, &records)
    }

    /// A detached order with an unset `nr` and no positions
    pub fn create_order(&self) -> Order {
        Order::default()
    }

    pub fn insert_order(&mut self, order: Order) -> Shared<Order> {
        insert_into(&mut self.orders, &mut self.notifier, order)
    }

    pub fn insert_order_from_record(&mut self, view: View, record: serde_json::Value) -> Result<Shared<Order>> {
        let order = Order::from_record(view, record)?;
        Ok(self.insert_order(order))
    }

    /// Remove an order. Its positions go with it; its customer and
    /// keywords stay.
    pub fn delete_order(&mut self, order: &Shared<Order>) -> bool {
        delete_from(&mut self.orders, &mut self.notifier, order)
    }

    pub fn delete_order_by_key(&mut self, nr: i64) -> bool {
        delete_key_from(&mut self.orders, &mut self.notifier, &nr)
    }

    pub fn delete_all_orders(&mut self) -> usize {
        delete_all_from(&mut self.orders, &mut self.notifier)
    }

    pub fn find_order(&self, nr: i64) -> Option<Shared<Order>> {
        self.orders.find(&nr)
    }

    pub fn orders_for_keys(&self, nrs: &[i64]) -> Vec<Shared<Order>> {
        self.orders.list_for_keys(nrs).0
    }

    pub fn orders(&self) -> &[Shared<Order>] {
        self.orders.items()
    }

    pub fn orders_as_records(&self, view: View) -> Result<Vec<serde_json::Value>> {
        self.orders.to_records(view)
    }

    /// The order a position is attached to
    pub fn order_of(&self, position: &Position) -> Option<Shared<Order>> {
        position.order_nr().and_then(|nr| self.find_order(nr))
    }

    // ========== Keywords ==========

    pub fn load_keywords(&mut self) -> Result<usize> {
        let records = self.snapshots.read(EntityKind::Keyword)?;
        let count = self.keywords.load_records(View::Cache, records)?;
        debug!("Loaded {} keywords from snapshot", count);
        Ok(count)
    }

    /// A detached keyword with a generated uuid
    pub fn create_keyword(&self) -> Keyword {
        Keyword::new("")
    }

    pub fn insert_keyword(&mut self, keyword: Keyword) -> Shared<Keyword> {
        insert_into(&mut self.keywords, &mut self.notifier, keyword)
    }

    pub fn insert_keyword_from_record(&mut self, view: View, record: serde_json::Value) -> Result<Shared<Keyword>> {
        let keyword = Keyword::from_record(view, record)?;
        Ok(self.insert_keyword(keyword))
    }

    pub fn delete_keyword(&mut self, keyword: &Shared<Keyword>) -> bool {
        delete_from(&mut self.keywords, &mut self.notifier, keyword)
    }

    pub fn delete_keyword_by_key(&mut self, uuid: &str) -> bool {
        delete_key_from(&mut self.keywords, &mut self.notifier, &uuid.to_string())
    }

    pub fn delete_all_keywords(&mut self) -> usize {
        delete_all_from(&mut self.keywords, &mut self.notifier)
    }

    pub fn find_keyword(&self, uuid: &str) -> Option<Shared<Keyword>> {
        self.keywords.find(&uuid.to_string())
    }

    pub fn keywords_for_keys(&self, uuids: &[String]) -> Vec<Shared<Keyword>> {
        self.keywords.list_for_keys(uuids).0
    }

    pub fn keywords(&self) -> &[Shared<Keyword>] {
        self.keywords.items()
    }

    pub fn keywords_as_records(&self, view: View) -> Result<Vec<serde_json::Value>> {
        self.keywords.to_records(view)
    }

    // ========== References ==========

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.customers, &self.keywords)
    }

    pub fn resolve_order_references(&self, nr: i64) -> Result<ResolveStats> {
        let order = self.find_order(nr).ok_or(Error::NotFound {
            kind: EntityKind::Order,
            key: nr.into(),
        })?;
        Ok(self.resolver().resolve_order(&order))
    }

    /// Resolve every order once; fully resolved orders are skipped
    pub fn resolve_references_for_all_orders(&self) -> ResolveStats {
        self.resolver().resolve_all(&self.orders)
    }

    /// Records of one root kind under a view
    pub fn records(&self, kind: EntityKind, view: View) -> Result<Vec<serde_json::Value>> {
        match kind {
            EntityKind::Customer => self.customers_as_records(view),
            EntityKind::Order => self.orders_as_records(view),
            EntityKind::Keyword => self.keywords_as_records(view),
            EntityKind::Position => {
                let mut records = Vec::new();
                for order in self.orders.iter() {
                    for position in order.borrow().positions() {
                        records.push(position.to_record(view)?);
                    }
                }
                Ok(records)
            }
        }
    }
}
