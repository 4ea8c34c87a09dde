pub mod config;
pub mod engine;
pub mod factors;
pub mod table;
pub mod transferability;
pub mod validation;

pub use config::*;
pub use engine::{calculate_score, FactorContribution, Pillar, ScoreBreakdown, Scorer};
pub use factors::{Bonus, FactorKind, FactorValue, RangeOp, Track};
pub use table::FactorTable;
pub use transferability::{calculate_transferability, TransferabilityBreakdown};
pub use validation::validate_table;
