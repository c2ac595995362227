//! Miniature catalogue
//!
//! Read-only table of Dreamblade miniatures loaded from a CSV export at
//! startup, plus the fixed list of sets. Lookups are case-insensitive.

mod miniature;
mod set;

pub use miniature::Miniature;
pub use set::{MiniatureSet, SETS};

use crate::error::{CoreError, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// In-memory catalogue of miniatures and sets
#[derive(Debug, Clone)]
pub struct Catalogue {
    miniatures: Vec<Miniature>,
    /// Lowercase miniature ID → index into `miniatures`
    by_id: HashMap<String, usize>,
    /// Lowercase set code → indices sorted by collector number
    by_set: HashMap<String, Vec<usize>>,
    sets: Vec<MiniatureSet>,
}

impl Catalogue {
    /// Load the catalogue from a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            CoreError::Catalogue(format!("Unable to open data file {}: {}", path.display(), e))
        })?;
        let catalogue = Self::from_reader(file)?;
        tracing::info!(
            "Loaded {} miniatures from {}",
            catalogue.miniatures.len(),
            path.display()
        );
        Ok(catalogue)
    }

    /// Parse CSV records (header row first) into a catalogue
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut miniatures = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            // +2: one for the header, one for 1-based lines
            miniatures.push(Miniature::from_record(&record, index + 2)?);
        }

        Ok(Self::from_miniatures(miniatures))
    }

    fn from_miniatures(mut miniatures: Vec<Miniature>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_set: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, mini) in miniatures.iter().enumerate() {
            by_id.insert(mini.id().to_string(), i);
            by_set
                .entry(mini.set_code().to_lowercase())
                .or_default()
                .push(i);
        }

        for indices in by_set.values_mut() {
            // Stable: equal collector numbers keep file order
            indices.sort_by_key(|&i| miniatures[i].collector_number_as_int());

            for pair in indices.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                miniatures[prev].next_id = Some(miniatures[next].id().to_string());
                miniatures[next].prev_id = Some(miniatures[prev].id().to_string());
            }
        }

        Catalogue {
            miniatures,
            by_id,
            by_set,
            sets: SETS.iter().map(|(code, name)| MiniatureSet::new(code, name)).collect(),
        }
    }

    /// Look up a miniature by ID
    pub fn miniature(&self, id: &str) -> Option<&Miniature> {
        self.by_id
            .get(&id.to_lowercase())
            .map(|&i| &self.miniatures[i])
    }

    /// Miniatures in a set, ordered by collector number. `None` if no miniature has that set code.
    pub fn miniatures_in_set(&self, set_code: &str) -> Option<Vec<&Miniature>> {
        self.by_set
            .get(&set_code.to_lowercase())
            .map(|indices| indices.iter().map(|&i| &self.miniatures[i]).collect())
    }

    /// Look up a set by its code
    pub fn set(&self, code: &str) -> Option<&MiniatureSet> {
        self.sets.iter().find(|s| s.code().eq_ignore_ascii_case(code))
    }

    /// All sets, in declaration order
    pub fn sets(&self) -> &[MiniatureSet] {
        &self.sets
    }

    /// The set a miniature belongs to, if it is a known one
    pub fn set_of(&self, mini: &Miniature) -> Option<&MiniatureSet> {
        self.set(mini.set_code())
    }

    pub fn len(&self) -> usize {
        self.miniatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.miniatures.is_empty()
    }
}
