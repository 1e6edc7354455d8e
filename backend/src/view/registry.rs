//! In-memory registry of live views.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use super::session::{ClusterView, ViewStatus};

struct Entry {
    view: Arc<ClusterView>,
    created_at: DateTime<Utc>,
}

/// Listing entry for a registered view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewInfo {
    pub view_id: String,
    pub created_at: DateTime<Utc>,
    pub status: ViewStatus,
}

/// Views keyed by id. Every view owns its own stream client.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    views: Arc<RwLock<HashMap<String, Entry>>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `view` under a fresh id and return the id.
    pub fn insert(&self, view: ClusterView) -> (String, Arc<ClusterView>) {
        let view_id = Uuid::new_v4().to_string();
        let view = Arc::new(view);
        self.views.write().insert(
            view_id.clone(),
            Entry {
                view: Arc::clone(&view),
                created_at: Utc::now(),
            },
        );
        (view_id, view)
    }

    pub fn get(&self, view_id: &str) -> Option<Arc<ClusterView>> {
        self.views.read().get(view_id).map(|e| Arc::clone(&e.view))
    }

    /// Unregister a view. The caller closes it.
    pub fn remove(&self, view_id: &str) -> Option<Arc<ClusterView>> {
        self.views.write().remove(view_id).map(|e| e.view)
    }

    pub fn list(&self) -> Vec<ViewInfo> {
        let mut views: Vec<ViewInfo> = self
            .views
            .read()
            .iter()
            .map(|(id, e)| ViewInfo {
                view_id: id.clone(),
                created_at: e.created_at,
                status: e.view.status(),
            })
            .collect();
        views.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        views
    }

    pub fn len(&self) -> usize {
        self.views.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.read().is_empty()
    }
}
