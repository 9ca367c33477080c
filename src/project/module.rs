use serde::{Deserialize, Serialize};

pub const DEFAULT_MODULE_NAME: &str = "General";

/// Named grouping of budget items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    pub id: String,
    pub name: String,
}

impl Module {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
