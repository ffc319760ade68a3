//! Access control for roster commands
//!
//! Only allow-listed operators may open a session, and only inside the
//! staff channel. Joining and leaving are open to everyone.

use rota_core::{OperatorId, ScopeId};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    staff_scope: ScopeId,
    operators: HashSet<OperatorId>,
}

impl AccessPolicy {
    pub fn new(staff_scope: ScopeId, operators: impl IntoIterator<Item = OperatorId>) -> Self {
        Self {
            staff_scope,
            operators: operators.into_iter().collect(),
        }
    }

    pub fn is_operator(&self, operator: OperatorId) -> bool {
        self.operators.contains(&operator)
    }

    /// Check if `operator` may open a roster session in `scope`
    pub fn may_start(&self, scope: ScopeId, operator: OperatorId) -> bool {
        scope == self.staff_scope && self.is_operator(operator)
    }

    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }
}
