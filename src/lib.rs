pub mod analysis;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod profile;
pub mod scoring;
pub mod wizard;

pub use error::{Result, ScoringError};
pub use profile::Profile;
pub use scoring::{calculate_score, FactorTable, ScoreBreakdown, Scorer};
