use mirror_core::Component;
use parking_lot::RwLock;
use tracing::info;

use crate::error::Result;
use crate::transport::Transport;

/// Installable components, fetched once per session.
#[derive(Debug, Default)]
pub struct Catalog {
    components: RwLock<Vec<Component>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached list. On failure the previous list is kept.
    pub async fn load<T: Transport + ?Sized>(&self, transport: &T) -> Result<usize> {
        let components = transport.list_components().await?;
        let count = components.len();
        *self.components.write() = components;
        info!(count, "component catalog loaded");
        Ok(count)
    }

    pub fn components(&self) -> Vec<Component> {
        self.components.read().clone()
    }

    pub fn find(&self, name: &str) -> Option<Component> {
        self.components.read().iter().find(|c| c.name == name).cloned()
    }

    /// Suggested versions of a component. Other versions may still be submitted.
    pub fn versions_for(&self, name: &str) -> Vec<String> {
        self.find(name).map(|c| c.versions).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.components.read().is_empty()
    }
}
