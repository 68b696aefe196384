//! Analysis state management.

mod analysis;

pub use analysis::{AnalysisState, AnalysisStateStore};
