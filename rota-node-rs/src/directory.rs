//! Operator display names

use parking_lot::RwLock;
use rota_core::OperatorId;
use std::collections::HashMap;

/// In-memory id → display name table, filled by the `name` console command
#[derive(Debug, Default)]
pub struct OperatorDirectory {
    names: RwLock<HashMap<OperatorId, String>>,
}

impl OperatorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an operator's display name; blank names are ignored
    pub fn upsert(&self, operator: OperatorId, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.names.write().insert(operator, name.to_string());
    }

    /// Display name, falling back to the raw id
    pub fn display(&self, operator: OperatorId) -> String {
        self.names
            .read()
            .get(&operator)
            .cloned()
            .unwrap_or_else(|| format!("ID {}", operator))
    }
}
