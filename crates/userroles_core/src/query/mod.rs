//! In-memory query specification for relationship reads.
//!
//! # Responsibility
//! - Filter, sort and page an already-loaded collection.
//! - Report the filtered total alongside the returned page.
//!
//! # Invariants
//! - All filters must match for an item to be kept.
//! - Sorting is stable: equal keys keep input order.
//! - `total` counts items after filtering and before paging.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Attribute access used by filters and sort keys.
pub trait Queryable {
    /// Returns the string form of attribute `name`, or `None` if unknown.
    fn attribute(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Exact string match.
    Eq,
    /// Case-insensitive substring match.
    Like,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub attribute: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterSpec {
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: FilterOperator::Eq,
            value: value.into(),
        }
    }

    pub fn like(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: FilterOperator::Like,
            value: value.into(),
        }
    }

    fn matches<T: Queryable>(&self, item: &T) -> bool {
        let Some(actual) = item.attribute(&self.attribute) else {
            return false;
        };
        match self.operator {
            FilterOperator::Eq => actual == self.value,
            FilterOperator::Like => actual
                .to_lowercase()
                .contains(&self.value.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub attribute: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Filter, sort and paging options applied to a loaded collection.
///
/// `QuerySpec::default()` keeps every item in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub sort: Vec<SortSpec>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl QuerySpec {
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort_by(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn page(mut self, offset: u64, limit: Option<u64>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Applies filters, then sort keys, then paging.
    pub fn apply<T, I>(&self, items: I) -> ResourceList<T>
    where
        T: Queryable,
        I: IntoIterator<Item = T>,
    {
        let mut kept: Vec<T> = items
            .into_iter()
            .filter(|item| self.filters.iter().all(|filter| filter.matches(item)))
            .collect();

        if !self.sort.is_empty() {
            kept.sort_by(|left, right| self.compare(left, right));
        }

        let total = kept.len() as u64;
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = self
            .limit
            .map_or(usize::MAX, |value| usize::try_from(value).unwrap_or(usize::MAX));
        let items = kept.into_iter().skip(offset).take(limit).collect();

        ResourceList { items, total }
    }

    fn compare<T: Queryable>(&self, left: &T, right: &T) -> Ordering {
        for key in &self.sort {
            let ordering = left
                .attribute(&key.attribute)
                .cmp(&right.attribute(&key.attribute));
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList<T> {
    pub items: Vec<T>,
    /// Matching items before paging.
    pub total: u64,
}

impl<T> ResourceList<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> IntoIterator for ResourceList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
