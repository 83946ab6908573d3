use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, Result};

pub const UNCATEGORIZED: &str = "uncategorized";

/// A support category name. Only values drawn from a [`CategorySet`] (or the reserved
/// `uncategorized`) flow through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn uncategorized() -> Self {
        Self(UNCATEGORIZED.to_string())
    }

    pub fn is_uncategorized(&self) -> bool {
        self.0 == UNCATEGORIZED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed, configured enumeration of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    categories: Vec<Category>,
}

impl CategorySet {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories: Vec<Category> = Vec::new();
        for name in names {
            let name = normalize(name.as_ref());
            if name.is_empty() {
                return Err(DomainError::config("category name cannot be empty"));
            }
            if name == UNCATEGORIZED {
                return Err(DomainError::config(format!(
                    "'{UNCATEGORIZED}' is reserved and cannot be configured"
                )));
            }
            if categories.iter().any(|c| c.0 == name) {
                return Err(DomainError::config(format!("duplicate category '{name}'")));
            }
            categories.push(Category(name));
        }

        if categories.is_empty() {
            return Err(DomainError::config("at least one category is required"));
        }

        Ok(Self { categories })
    }

    /// Resolves a name into a member of the set. `uncategorized` is always accepted.
    pub fn parse(&self, name: &str) -> Option<Category> {
        let name = normalize(name);
        if name == UNCATEGORIZED {
            return Some(Category::uncategorized());
        }
        self.categories.iter().find(|c| c.0 == name).cloned()
    }

    pub fn contains(&self, category: &Category) -> bool {
        category.is_uncategorized() || self.categories.contains(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(Category::as_str).collect()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
