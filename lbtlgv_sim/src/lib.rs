//! LBT-LGV Simulation Harness
//!
//! Runs the transport core from built-in scenarios or JSON run cards and
//! writes the recorded history into a keyed container.
//!
//! # Usage
//!
//! ```ignore
//! use lbtlgv_sim::{JsonHistoryExport, Runner, ScenarioId};
//!
//! let card = ScenarioId::StaticLgvEinstein.run_card(1000, 100, 10, None)?;
//! let mut export = JsonHistoryExport::new(&card.label, 42).with_path("history.json");
//! let result = Runner::new(card, 42).run(&mut export)?;
//! ```

mod error;
mod exporter;
mod runcard;
mod runner;
pub mod scenarios;
mod store;

pub use error::SimError;
pub use exporter::JsonHistoryExport;
pub use runcard::RunCard;
pub use runner::{RunResult, Runner};
pub use scenarios::ScenarioId;
pub use store::{HistoryStore, SledHistoryStore, INITIAL_PT_KEY, RUN_ID_KEY};
