//! Add/remove notifications for observers of the store

use crate::model::{Customer, Entity, EntityKey, EntityKind, Keyword, Order, Shared};

/// A handle to any root entity
#[derive(Debug, Clone)]
pub enum AnyEntity {
    Customer(Shared<Customer>),
    Order(Shared<Order>),
    Keyword(Shared<Keyword>),
}

impl AnyEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            AnyEntity::Customer(_) => EntityKind::Customer,
            AnyEntity::Order(_) => EntityKind::Order,
            AnyEntity::Keyword(_) => EntityKind::Keyword,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            AnyEntity::Customer(c) => c.borrow().key().into(),
            AnyEntity::Order(o) => o.borrow().key().into(),
            AnyEntity::Keyword(k) => k.borrow().key().into(),
        }
    }
}

impl From<Shared<Customer>> for AnyEntity {
    fn from(handle: Shared<Customer>) -> Self {
        AnyEntity::Customer(handle)
    }
}

impl From<Shared<Order>> for AnyEntity {
    fn from(handle: Shared<Order>) -> Self {
        AnyEntity::Order(handle)
    }
}

impl From<Shared<Keyword>> for AnyEntity {
    fn from(handle: Shared<Keyword>) -> Self {
        AnyEntity::Keyword(handle)
    }
}

/// Change notification. On delete, `RemovedByKey` fires before `Removed`,
/// and both fire while the entity is still reachable.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Added(AnyEntity),
    RemovedByKey(EntityKind, EntityKey),
    Removed(AnyEntity),
}

pub type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Fans events out to every subscribed listener in subscription order
#[derive(Default)]
pub(crate) struct Notifier {
    listeners: Vec<Listener>,
}

impl Notifier {
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: StoreEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn added(&mut self, entity: AnyEntity) {
        self.emit(StoreEvent::Added(entity));
    }

    /// Both removal notifications, key first
    pub fn removed(&mut self, entity: AnyEntity) {
        self.emit(StoreEvent::RemovedByKey(entity.kind(), entity.key()));
        self.emit(StoreEvent::Removed(entity));
    }
}
