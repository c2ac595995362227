//! Miniature sets

use serde::Serialize;

/// Known sets as (code, name), in display order
pub const SETS: &[(&str, &str)] = &[
    ("A", "Anvilborn"),
    ("B", "Base"),
    ("BW", "Baxar's War"),
    ("CP", "Chrysotic Plague"),
    ("NF", "Night Fusion"),
    ("SD", "Serrated Dawn"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiniatureSet {
    code: String,
    name: String,
}

impl MiniatureSet {
    pub fn new(code: &str, name: &str) -> Self {
        MiniatureSet {
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
