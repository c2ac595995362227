//! A single miniature row

use crate::error::{CoreError, Result};
use serde::Serialize;
use std::fmt;

// Column positions in the CSV export
const NAME: usize = 0;
const LINEAGE: usize = 1;
const ASPECT: usize = 2;
const SPAWN_COST: usize = 3;
const ASPECT_COST: usize = 4;
const POWER: usize = 5;
const DEFENSE: usize = 6;
const LIFE: usize = 7;
const ABILITIES: usize = 8;
const FLAVOR_TEXT: usize = 9;
const COLLECTOR_NUMBER: usize = 10;
const SET: usize = 11;
const RARITY: usize = 12;
const COLUMNS: usize = 13;

/// A Dreamblade miniature. Immutable once the catalogue is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Miniature {
    id: String,
    name: String,
    lineage: String,
    aspect: String,
    spawn_cost: String,
    aspect_cost: String,
    power: String,
    defense: String,
    life: String,
    abilities: String,
    flavor_text: String,
    collector_number: String,
    set_code: String,
    rarity: String,
    pub(super) next_id: Option<String>,
    pub(super) prev_id: Option<String>,
}

impl Miniature {
    pub(super) fn from_record(record: &csv::StringRecord, line: usize) -> Result<Self> {
        if record.len() < COLUMNS {
            return Err(CoreError::Catalogue(format!(
                "line {}: expected {} fields, found {}",
                line,
                COLUMNS,
                record.len()
            )));
        }
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();

        Ok(Miniature {
            id: id_from_name(&record[NAME]),
            name: field(NAME),
            lineage: field(LINEAGE),
            aspect: field(ASPECT),
            spawn_cost: field(SPAWN_COST),
            aspect_cost: field(ASPECT_COST),
            power: field(POWER),
            defense: field(DEFENSE),
            life: field(LIFE),
            abilities: field(ABILITIES),
            flavor_text: field(FLAVOR_TEXT),
            collector_number: field(COLLECTOR_NUMBER),
            set_code: field(SET),
            rarity: field(RARITY),
            next_id: None,
            prev_id: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lineage(&self) -> &str {
        &self.lineage
    }

    pub fn aspect(&self) -> &str {
        &self.aspect
    }

    pub fn spawn_cost(&self) -> &str {
        &self.spawn_cost
    }

    pub fn aspect_cost(&self) -> &str {
        &self.aspect_cost
    }

    pub fn power(&self) -> &str {
        &self.power
    }

    pub fn defense(&self) -> &str {
        &self.defense
    }

    pub fn life(&self) -> &str {
        &self.life
    }

    pub fn abilities(&self) -> &str {
        &self.abilities
    }

    pub fn flavor_text(&self) -> &str {
        &self.flavor_text
    }

    pub fn collector_number(&self) -> &str {
        &self.collector_number
    }

    /// Collector number as an integer, or -1 when it is not numeric (promos etc.)
    pub fn collector_number_as_int(&self) -> i64 {
        self.collector_number.trim().parse().unwrap_or(-1)
    }

    pub fn set_code(&self) -> &str {
        &self.set_code
    }

    pub fn rarity(&self) -> &str {
        &self.rarity
    }

    /// Next miniature in the same set by collector number
    pub fn next_id(&self) -> Option<&str> {
        self.next_id.as_deref()
    }

    /// Previous miniature in the same set by collector number
    pub fn prev_id(&self) -> Option<&str> {
        self.prev_id.as_deref()
    }
}

impl fmt::Display for Miniature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, {})",
            self.id, self.name, self.set_code, self.collector_number
        )
    }
}

/// Miniature IDs are the lowercased name with spaces as underscores
pub fn id_from_name(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}
