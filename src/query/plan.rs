use crate::catalog::EntityKind;
use crate::catalog::keys::ColumnKey;
use crate::id::Id;
use crate::query::condition::Condition;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_cql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// A backend query: ids, a conjunctive set of conditions, ordering and
/// paging. Built per request and discarded afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub result_type: EntityKind,
    pub ids: Vec<Id>,
    pub conditions: Vec<Condition>,
    pub orders: Vec<(ColumnKey, Order)>,
    pub limit: u64,
    pub offset: u64,
}

impl Query {
    /// Limit sentinel meaning unbounded.
    pub const NO_LIMIT: u64 = u64::MAX;

    pub fn new(result_type: EntityKind) -> Self {
        Self {
            result_type,
            ids: Vec::new(),
            conditions: Vec::new(),
            orders: Vec::new(),
            limit: Self::NO_LIMIT,
            offset: 0,
        }
    }

    /// Adds an id; ids behave as an ordered set.
    pub fn id(mut self, id: impl Into<Id>) -> Self {
        let id = id.into();
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
        self
    }

    pub fn ids<I, T>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        ids.into_iter().fold(self, |q, id| q.id(id))
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
        self
    }

    /// Sets the order of a column; ordering a column twice keeps its first
    /// position and replaces the direction.
    pub fn order_by(mut self, key: ColumnKey, order: Order) -> Self {
        match self.orders.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = order,
            None => self.orders.push((key, order)),
        }
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn has_limit(&self) -> bool {
        self.limit != Self::NO_LIMIT
    }

    /// True when the query is known to return nothing.
    pub fn is_empty_by_limit(&self) -> bool {
        self.limit == 0 && self.has_limit()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query for {}", self.result_type)?;
        if !self.ids.is_empty() {
            let ids: Vec<&str> = self.ids.iter().map(Id::as_str).collect();
            write!(f, " ids={ids:?}")?;
        }
        if !self.conditions.is_empty() {
            write!(f, " conditions={:?}", self.conditions)?;
        }
        if !self.orders.is_empty() {
            write!(f, " orders={:?}", self.orders)?;
        }
        if self.has_limit() {
            write!(f, " limit={}", self.limit)?;
        }
        if self.offset != 0 {
            write!(f, " offset={}", self.offset)?;
        }
        Ok(())
    }
}
