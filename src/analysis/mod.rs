pub mod insights;
pub mod optimize;
pub mod sweep;

pub use insights::{age_curve, recommendations, AgeCurve, AgeGroup, Insights, Standing};
pub use optimize::{optimize, Combination, SearchSpace};
pub use sweep::{sweep, sweep_range, SweepField, SweepRow, SweepValue};
