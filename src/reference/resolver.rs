use crate::model::{Customer, Keyword, Order, Shared};
use crate::store::Collection;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ResolveStats {
    pub orders: usize,
    pub skipped: usize,
    pub customers_resolved: usize,
    pub customers_invalid: usize,
    pub tags_resolved: usize,
    pub missing_tags: usize,
}

impl ResolveStats {
    pub fn merge(&mut self, other: &ResolveStats) {
        self.orders += other.orders;
        self.skipped += other.skipped;
        self.customers_resolved += other.customers_resolved;
        self.customers_invalid += other.customers_invalid;
        self.tags_resolved += other.tags_resolved;
        self.missing_tags += other.missing_tags;
    }
}

impl fmt::Display for ResolveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reference Resolution Stats:")?;
        writeln!(f, "  Orders Scanned: {}", self.orders)?;
        writeln!(f, "  ⏭️  Already Resolved: {}", self.skipped)?;
        writeln!(f, "  ✅ Customers Bound: {}", self.customers_resolved)?;
        writeln!(f, "  ❌ Customers Missing: {}", self.customers_invalid)?;
        writeln!(f, "  🏷️  Tag Lists Resolved: {}", self.tags_resolved)?;
        writeln!(f, "  🤔 Missing Tag Keys: {}", self.missing_tags)
    }
}

/// Binds lazy order references against the customer and keyword collections.
pub struct Resolver<'a> {
    customers: &'a Collection<Customer>,
    keywords: &'a Collection<Keyword>,
}

impl<'a> Resolver<'a> {
    pub fn new(customers: &'a Collection<Customer>, keywords: &'a Collection<Keyword>) -> Self {
        Self { customers, keywords }
    }

    /// Resolve the customer reference of one order.
    ///
    /// Returns `None` when there is nothing to do (unset, invalid or
    /// already bound), otherwise whether the customer was found.
    pub fn resolve_customer(&self, order: &mut Order) -> Option<bool> {
        let reference = order.customer_ref();
        if !reference.has_reference() || reference.is_resolved() {
            return None;
        }
        let key = reference.key();
        let nr = order.nr();

        match self.customers.find(&key) {
            Some(customer) => {
                let found_nr = customer.borrow().nr;
                if found_nr != key {
                    debug!("Order {}: customer key {} rewritten to {}", nr, key, found_nr);
                }
                order.customer_ref_mut().set_target(found_nr, &customer);
                Some(true)
            }
            None => {
                warn!("Order {}: customer {} not found", nr, key);
                order.customer_ref_mut().bind(None);
                Some(false)
            }
        }
    }

    /// Resolve the tag keys of one order in a single pass over the keywords.
    ///
    /// Returns `None` if the tags were already resolved, otherwise the keys
    /// that had no matching keyword.
    pub fn resolve_tags(&self, order: &mut Order) -> Option<Vec<String>> {
        if order.tags_resolved() {
            return None;
        }
        let pending = order.tag_ref().pending_keys();
        let (found, missing) = self.keywords.list_for_keys(&pending);
        order.tag_ref_mut().resolve(&found);
        if !missing.is_empty() {
            warn!("Order {}: {} tag key(s) without keyword", order.nr(), missing.len());
        }
        Some(missing)
    }

    /// Resolve both references of one order, skipping it if it is already
    /// fully resolved.
    pub fn resolve_order(&self, order: &Shared<Order>) -> ResolveStats {
        let mut stats = ResolveStats {
            orders: 1,
            ..Default::default()
        };
        let mut order = order.borrow_mut();
        if order.is_all_resolved() {
            stats.skipped = 1;
            return stats;
        }

        match self.resolve_customer(&mut order) {
            Some(true) => stats.customers_resolved += 1,
            Some(false) => stats.customers_invalid += 1,
            None => {}
        }
        if let Some(missing) = self.resolve_tags(&mut order) {
            stats.tags_resolved += 1;
            stats.missing_tags += missing.len();
        }
        stats
    }

    /// Resolve every order once
    pub fn resolve_all(&self, orders: &Collection<Order>) -> ResolveStats {
        let mut stats = ResolveStats::default();
        for order in orders.iter() {
            stats.merge(&self.resolve_order(order));
        }
        debug!(
            "Resolved references of {} orders ({} skipped)",
            stats.orders, stats.skipped
        );
        stats
    }
}
