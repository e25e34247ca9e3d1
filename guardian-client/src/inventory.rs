//! Inventory list client. Every mutation is a read-modify-write of the whole list.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::{GuardianError, Result};
use crate::models::InventoryList;
use crate::transport::InventoryBackend;

pub const EMPTY_INVENTORY: &str = "No items in inventory.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRow {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InventoryView {
    Empty(&'static str),
    Items(Vec<InventoryRow>),
}

impl InventoryView {
    pub fn render(list: &InventoryList) -> Self {
        if list.medicines.is_empty() {
            return InventoryView::Empty(EMPTY_INVENTORY);
        }
        InventoryView::Items(
            list.medicines
                .iter()
                .enumerate()
                .map(|(index, name)| InventoryRow {
                    index,
                    name: name.clone(),
                })
                .collect(),
        )
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            InventoryView::Empty(_) => Vec::new(),
            InventoryView::Items(rows) => rows.iter().map(|r| r.name.as_str()).collect(),
        }
    }
}

pub struct InventoryClient {
    backend: Arc<dyn InventoryBackend>,
    view: InventoryView,
}

impl InventoryClient {
    pub fn new(backend: Arc<dyn InventoryBackend>) -> Self {
        Self {
            backend,
            view: InventoryView::Empty(EMPTY_INVENTORY),
        }
    }

    pub fn view(&self) -> &InventoryView {
        &self.view
    }

    pub async fn load(&mut self) -> Result<&InventoryView> {
        let list = self.backend.fetch_inventory().await?;
        self.view = InventoryView::render(&list);
        Ok(&self.view)
    }

    /// Blank input is ignored.
    pub async fn add(&mut self, item: &str) -> Result<&InventoryView> {
        let item = item.trim();
        if item.is_empty() {
            return Ok(&self.view);
        }
        let mut list = self.backend.fetch_inventory().await?;
        list.medicines.push(item.to_string());
        self.backend.store_inventory(&list).await?;
        info!(item = %item, "Inventory item added");
        self.load().await
    }

    pub async fn remove(&mut self, index: usize) -> Result<&InventoryView> {
        let mut list = self.backend.fetch_inventory().await?;
        if index >= list.medicines.len() {
            return Err(GuardianError::InventoryIndex {
                index,
                len: list.medicines.len(),
            });
        }
        let removed = list.medicines.remove(index);
        self.backend.store_inventory(&list).await?;
        info!(item = %removed, index, "Inventory item removed");
        self.load().await
    }
}
