pub mod formatter;

pub use formatter::{
    format_age_curve, format_breakdown, format_breakdown_json, format_combinations, format_delta,
    format_insights, format_schedule, format_sweep_json, format_sweep_table, format_sweep_tsv,
    should_use_colors,
};
