//! App-scoping collaborator: which applications receive spoofed locations

use std::collections::HashSet;

/// Decides whether an installed application is subject to spoofing
pub trait AppScope: Send + Sync {
    fn is_application_in_scope(&self, bundle_id: &str) -> bool;
}

impl<F> AppScope for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_application_in_scope(&self, bundle_id: &str) -> bool {
        self(bundle_id)
    }
}

/// Explicit set of bundle identifiers in scope
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    bundle_ids: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(bundle_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bundle_ids: bundle_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, bundle_id: impl Into<String>) -> bool {
        self.bundle_ids.insert(bundle_id.into())
    }

    pub fn remove(&mut self, bundle_id: &str) -> bool {
        self.bundle_ids.remove(bundle_id)
    }

    pub fn len(&self) -> usize {
        self.bundle_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundle_ids.is_empty()
    }
}

impl AppScope for AllowList {
    fn is_application_in_scope(&self, bundle_id: &str) -> bool {
        self.bundle_ids.contains(bundle_id)
    }
}
