//! Single-document JSON export of a run's history.

use crate::error::SimError;
use crate::store::HistoryStore;
use lbtlgv_core::HistoryRecord;
use lbtlgv_env::RunId;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Complete run history: the same content as the keyed store, in one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonHistoryExport {
    pub run_id: RunId,

    /// Scenario or run-card label
    pub label: String,

    pub seed: u64,

    #[serde(rename = "init_pT")]
    pub initial_pt: Vec<f64>,

    pub frames: Vec<HistoryRecord>,

    /// Written by `flush`; `None` keeps the export in memory
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl JsonHistoryExport {
    /// Creates an in-memory export container.
    pub fn new(label: &str, seed: u64) -> Self {
        Self {
            run_id: RunId::from_seed(seed),
            label: label.to_string(),
            seed,
            initial_pt: Vec::new(),
            frames: Vec::new(),
            path: None,
        }
    }

    /// Writes to `path` on every flush.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Simulation time of the last frame.
    pub fn duration(&self) -> f64 {
        self.frames.last().map(|f| f.time).unwrap_or(0.0)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &Path) -> Result<(), SimError> {
        let file = File::create(path)
            .map_err(|e| SimError::store(format!("{}: {}", path.display(), e)))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SimError::store(format!("{}: {}", path.display(), e)))?;
        writer
            .flush()
            .map_err(|e| SimError::store(format!("{}: {}", path.display(), e)))
    }

    pub fn read_from_file(path: &Path) -> Result<Self, SimError> {
        let file = File::open(path)
            .map_err(|e| SimError::store(format!("{}: {}", path.display(), e)))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| SimError::store(format!("{}: {}", path.display(), e)))
    }
}

impl HistoryStore for JsonHistoryExport {
    fn write_initial_pt(&mut self, initial_pt: &[f64]) -> Result<(), SimError> {
        self.initial_pt = initial_pt.to_vec();
        Ok(())
    }

    fn write_frame(&mut self, record: &HistoryRecord) -> Result<(), SimError> {
        self.frames.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SimError> {
        match &self.path {
            Some(path) => self.write_to_file(path),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_export_round_trip_file() {
        let path = std::env::temp_dir().join(format!("lbtlgv-export-{}.json", std::process::id()));
        let mut export = JsonHistoryExport::new("static_lgv", 7).with_path(&path);
        export.write_initial_pt(&[1.0, 2.0]).unwrap();
        export
            .write_frame(&HistoryRecord {
                step: 5,
                time: 0.5,
                ids: vec![0, 1],
                momenta: vec![[2.0, 1.0, 0.0, 0.0], [3.0, 0.0, 2.0, 0.0]],
                positions: vec![[0.0; 3], [1.0, 1.0, 0.0]],
            })
            .unwrap();
        export.flush().unwrap();

        let back = JsonHistoryExport::read_from_file(&path).unwrap();
        assert_eq!(back.run_id, RunId::from_seed(7));
        assert_eq!(back.initial_pt, vec![1.0, 2.0]);
        assert_eq!(back.frames.len(), 1);
        assert_eq!(back.duration(), 0.5);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get("init_pT").is_some());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_json_export_in_memory_flush() {
        let mut export = JsonHistoryExport::new("x", 1);
        assert!(export.flush().is_ok());
        assert_eq!(export.duration(), 0.0);
    }
}
