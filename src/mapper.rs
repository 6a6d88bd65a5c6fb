//! Controller-to-command mapper
//!
//! Pure translation of `(controller number, value)` into at most one
//! [`SemanticCommand`]. Stateless apart from the binding table it was built
//! with; shift handling belongs to the listeners.

use crate::bindings::{BindingTable, SemanticCommand};

#[derive(Debug, Clone, Default)]
pub struct CommandMapper {
    table: BindingTable,
}

impl CommandMapper {
    pub fn new(table: BindingTable) -> Self {
        Self { table }
    }

    /// Command for a Control Change, `None` when nothing is bound to it
    pub fn dispatch(&self, controller: u8, value: u8) -> Option<SemanticCommand> {
        self.table.lookup(controller, value)
    }

    pub fn table(&self) -> &BindingTable {
        &self.table
    }
}
