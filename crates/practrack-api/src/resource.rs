// ── REST resource description ──
//
// Every entity the server exposes lives under `/api/{COLLECTION}` and
// answers the same verb set. The client is written once against this
// trait instead of once per entity.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// An entity exposed as a REST collection.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Collection path below `/api/`, e.g. `"practice-sessions"`.
    const COLLECTION: &'static str;

    /// Human-readable singular name, used in errors.
    const NAME: &'static str;

    /// Server-assigned identifier, `None` before creation.
    fn id(&self) -> Option<i64>;
}

/// Query parameters for collection listings.
///
/// Every listing also carries a `cacheBuster` timestamp so intermediaries
/// never serve a stale collection after a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// Sort clauses in server syntax, e.g. `"id,desc"`.
    pub sort: Vec<String>,
}

impl ListParams {
    pub fn sorted_by(mut self, clause: impl Into<String>) -> Self {
        self.sort.push(clause.into());
        self
    }

    pub fn page(mut self, page: u32, size: u32) -> Self {
        self.page = Some(page);
        self.size = Some(size);
        self
    }

    /// Render as query pairs, `cacheBuster` last.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(size) = self.size {
            query.push(("size", size.to_string()));
        }
        for clause in &self.sort {
            query.push(("sort", clause.clone()));
        }
        query.push(("cacheBuster", cache_buster().to_string()));
        query
    }
}

fn cache_buster() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_only_bust_the_cache() {
        let query = ListParams::default().to_query();
        assert_eq!(query.len(), 1);
        assert_eq!(query[0].0, "cacheBuster");
    }

    #[test]
    fn paging_and_sort_come_before_cache_buster() {
        let query = ListParams::default()
            .page(2, 20)
            .sorted_by("id,desc")
            .to_query();
        let keys: Vec<&str> = query.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["page", "size", "sort", "cacheBuster"]);
        assert_eq!(query[2].1, "id,desc");
    }
}
