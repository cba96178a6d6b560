//! Keyed history containers.
//!
//! Layout mirrors the HDF5 output of the original driver scripts:
//! - `init_pT`: initial transverse momentum of every initialized quark
//! - `p-<step>`: `[E, px, py, pz]` per active particle
//! - `x-<step>`: `[x, y, z]` per active particle

use crate::error::SimError;
use lbtlgv_core::HistoryRecord;
use lbtlgv_env::RunId;
use std::path::Path;

/// Key of the initial-pT array.
pub const INITIAL_PT_KEY: &str = "init_pT";

/// Key of the run identifier.
pub const RUN_ID_KEY: &str = "run_id";

/// Destination for recorded transport history.
pub trait HistoryStore {
    /// Stores the initial-pT record.
    fn write_initial_pt(&mut self, initial_pt: &[f64]) -> Result<(), SimError>;

    /// Stores one recorded frame under its step keys.
    fn write_frame(&mut self, record: &HistoryRecord) -> Result<(), SimError>;

    /// Makes everything written so far durable.
    fn flush(&mut self) -> Result<(), SimError>;
}

/// Sled-backed history container.
///
/// Values are JSON-encoded arrays.
pub struct SledHistoryStore {
    db: sled::Db,
}

impl SledHistoryStore {
    /// Opens (or creates) a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P, run_id: RunId) -> Result<Self, SimError> {
        let db = sled::open(path)
            .map_err(|e| SimError::store(format!("Failed to open sled DB: {}", e)))?;
        let store = Self { db };
        store.put(RUN_ID_KEY, &run_id)?;
        Ok(store)
    }

    /// Creates a temporary store (for testing)
    #[cfg(test)]
    pub fn open_temp(run_id: RunId) -> Result<Self, SimError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| SimError::store(format!("Failed to open temp DB: {}", e)))?;
        let store = Self { db };
        store.put(RUN_ID_KEY, &run_id)?;
        Ok(store)
    }

    fn put<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), SimError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| SimError::store(format!("Encode {} failed: {}", key, e)))?;
        self.db
            .insert(key.as_bytes(), bytes)
            .map_err(|e| SimError::store(format!("Insert {} failed: {}", key, e)))?;
        Ok(())
    }

    /// Reads and decodes a stored value, `None` if the key is absent.
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SimError> {
        let Some(bytes) = self
            .db
            .get(key.as_bytes())
            .map_err(|e| SimError::store(format!("Read {} failed: {}", key, e)))?
        else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SimError::store(format!("Decode {} failed: {}", key, e)))
    }

    pub fn initial_pt(&self) -> Result<Option<Vec<f64>>, SimError> {
        self.get(INITIAL_PT_KEY)
    }

    pub fn momenta(&self, step: u64) -> Result<Option<Vec<[f64; 4]>>, SimError> {
        self.get(&format!("p-{}", step))
    }

    pub fn positions(&self, step: u64) -> Result<Option<Vec<[f64; 3]>>, SimError> {
        self.get(&format!("x-{}", step))
    }

    pub fn run_id(&self) -> Result<Option<RunId>, SimError> {
        self.get(RUN_ID_KEY)
    }
}

impl HistoryStore for SledHistoryStore {
    fn write_initial_pt(&mut self, initial_pt: &[f64]) -> Result<(), SimError> {
        self.put(INITIAL_PT_KEY, initial_pt)
    }

    fn write_frame(&mut self, record: &HistoryRecord) -> Result<(), SimError> {
        self.put(&record.momentum_key(), &record.momenta)?;
        self.put(&record.position_key(), &record.positions)
    }

    fn flush(&mut self) -> Result<(), SimError> {
        self.db
            .flush()
            .map_err(|e| SimError::store(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(step: u64) -> HistoryRecord {
        HistoryRecord {
            step,
            time: step as f64 * 0.1,
            ids: vec![0, 2],
            momenta: vec![[2.0, 1.0, 0.0, 1.0], [1.5, 0.0, 0.5, 0.0]],
            positions: vec![[0.0, 0.0, 0.0], [1.0, -1.0, 0.5]],
        }
    }

    #[test]
    fn test_sled_store_keys() {
        let mut store = SledHistoryStore::open_temp(RunId::from_seed(42)).unwrap();
        store.write_initial_pt(&[1.0, 2.5, 3.0]).unwrap();
        store.write_frame(&record(10)).unwrap();
        store.flush().unwrap();

        assert_eq!(store.initial_pt().unwrap(), Some(vec![1.0, 2.5, 3.0]));
        assert_eq!(store.momenta(10).unwrap(), Some(record(10).momenta));
        assert_eq!(store.positions(10).unwrap(), Some(record(10).positions));
        assert_eq!(store.momenta(11).unwrap(), None);
        assert_eq!(store.run_id().unwrap(), Some(RunId::from_seed(42)));
    }

    #[test]
    fn test_sled_store_overwrites_frame() {
        let mut store = SledHistoryStore::open_temp(RunId::from_seed(1)).unwrap();
        store.write_frame(&record(3)).unwrap();

        let mut updated = record(3);
        updated.momenta.pop();
        store.write_frame(&updated).unwrap();
        assert_eq!(store.momenta(3).unwrap().map(|m| m.len()), Some(1));
    }
}
