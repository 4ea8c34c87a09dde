use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Factor table YAML used instead of the embedded official table
    pub table: Option<PathBuf>,
    /// Profile scored when no --profile or profile flags are given
    pub profile: Option<PathBuf>,
    pub score: ScoreConfig,
    pub sweep: SweepConfig,
    pub optimize: OptimizeConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreConfig {
    pub format: Option<ScoreFormat>,
    /// Print recommendations under the breakdown
    pub insights: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub format: Option<SweepFormat>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizeConfig {
    pub top: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScoreFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SweepFormat {
    #[default]
    Table,
    Tsv,
    Json,
}
