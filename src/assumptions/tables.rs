//! Nested rate tables keyed by age, sex, smoker status, policy year or term

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A rate table of arbitrary depth.
///
/// JSON form is a plain nested object, e.g. commission by policy year then
/// premium term: `{"1": {"1": 5.0, "3": 20.0}, "2": {"3": 5.0}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateTable {
    Rate(f64),
    Nested(BTreeMap<String, RateTable>),
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable::Nested(BTreeMap::new())
    }
}

impl RateTable {
    /// Descend by `keys`; `None` if any level is missing or the path does not
    /// end exactly on a rate
    pub fn lookup<K: AsRef<str>>(&self, keys: &[K]) -> Option<f64> {
        let mut node = self;
        for key in keys {
            match node {
                RateTable::Nested(children) => node = children.get(key.as_ref())?,
                RateTable::Rate(_) => return None,
            }
        }
        match node {
            RateTable::Rate(rate) => Some(*rate),
            RateTable::Nested(_) => None,
        }
    }

    /// Insert a rate at the given key path, creating levels as needed.
    /// A rate already sitting where a level is needed is replaced.
    pub fn insert<K: AsRef<str>>(&mut self, keys: &[K], rate: f64) {
        let Some((last, parents)) = keys.split_last() else {
            *self = RateTable::Rate(rate);
            return;
        };

        let mut node = self;
        for key in parents {
            node = node
                .children_mut()
                .entry(key.as_ref().to_string())
                .or_default();
        }
        node.children_mut()
            .insert(last.as_ref().to_string(), RateTable::Rate(rate));
    }

    fn children_mut(&mut self) -> &mut BTreeMap<String, RateTable> {
        if let RateTable::Rate(_) = self {
            *self = RateTable::default();
        }
        match self {
            RateTable::Nested(children) => children,
            RateTable::Rate(_) => unreachable!("rate node replaced above"),
        }
    }

    /// Build a table from a flat map of single-key rates (policy year -> rate)
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: ToString,
    {
        RateTable::Nested(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), RateTable::Rate(v)))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RateTable::Nested(children) if children.is_empty())
    }

    /// Load a table from CSV.
    ///
    /// Every column but the last is a key level (in header order), the last
    /// column is the rate:
    ///
    /// ```text
    /// Age,Sex,Rate
    /// 30,M,0.00091
    /// 30,F,0.00052
    /// ```
    pub fn load_csv(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let file = std::fs::File::open(path)?;
        Self::load_csv_from_reader(file, &name)
    }

    /// Load a table from any CSV reader; `name` is used in error messages
    pub fn load_csv_from_reader<R: Read>(reader: R, name: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut table = RateTable::default();

        for result in reader.records() {
            let record = result?;
            if record.len() < 2 {
                return Err(EngineError::InvalidTable {
                    table: name.to_string(),
                    reason: format!("expected key columns and a rate, got {} fields", record.len()),
                });
            }
            let keys: Vec<&str> = record.iter().take(record.len() - 1).map(str::trim).collect();
            let raw = record[record.len() - 1].trim();
            let rate: f64 = raw.parse().map_err(|_| EngineError::InvalidTable {
                table: name.to_string(),
                reason: format!("non-numeric rate '{}' for keys {:?}", raw, keys),
            })?;
            table.insert(&keys, rate);
        }

        Ok(table)
    }
}
