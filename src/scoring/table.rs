use anyhow::{Context, Result as AnyResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::config::{CapsConfig, FactorTableConfig, ScheduleEntry, TransferabilityConfig};
use super::factors::{FactorKind, FactorValue, RangeOp, Track};
use super::validation::{schedule_for, validate_table};
use crate::error::{Result, ScoringError};

#[derive(Debug, Clone)]
enum Matcher {
    Range(RangeOp),
    Key(String),
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    matcher: Matcher,
    without_spouse: u32,
    with_spouse: Option<u32>,
}

impl CompiledEntry {
    fn points(&self, track: Track) -> u32 {
        match track {
            Track::WithoutSpouse => self.without_spouse,
            Track::WithSpouse => self.with_spouse.unwrap_or(self.without_spouse),
        }
    }
}

/// Immutable, versioned point schedules keyed by (kind, track, value).
///
/// Built once from a [`FactorTableConfig`] and never mutated afterwards, so a
/// table can be shared across threads behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct FactorTable {
    config: FactorTableConfig,
    schedules: HashMap<FactorKind, Vec<CompiledEntry>>,
}

impl Default for FactorTable {
    fn default() -> Self {
        Self::official()
    }
}

impl FactorTable {
    /// The embedded official schedule.
    pub fn official() -> Self {
        Self::compile(FactorTableConfig::default())
    }

    /// Validate and compile a table configuration.
    pub fn from_config(config: FactorTableConfig) -> Result<Self> {
        validate_table(&config).map_err(|errors| ScoringError::InvalidTable { errors })?;
        Ok(Self::compile(config))
    }

    /// Load a table from a YAML file. Fields missing from the file keep their
    /// official values.
    pub fn load(path: &Path) -> AnyResult<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read factor table at {}", path.display()))?;
        let config: FactorTableConfig = serde_saphyr::from_str(&content).with_context(|| {
            format!("Failed to parse factor table: invalid YAML in {}", path.display())
        })?;
        Self::from_config(config)
            .with_context(|| format!("Factor table {} failed validation", path.display()))
    }

    // Entries that fail to parse are skipped; `from_config` rejects them first.
    fn compile(config: FactorTableConfig) -> Self {
        let mut schedules = HashMap::new();
        for kind in FactorKind::ALL {
            let entries = schedule_for(&config, kind)
                .iter()
                .filter_map(|entry| compile_entry(kind, entry))
                .collect();
            schedules.insert(kind, entries);
        }
        Self { config, schedules }
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn config(&self) -> &FactorTableConfig {
        &self.config
    }

    pub fn caps(&self) -> &CapsConfig {
        &self.config.caps
    }

    pub fn transferability(&self) -> &TransferabilityConfig {
        &self.config.transferability
    }

    /// Raw schedule rows for a kind, in table order.
    pub fn entries(&self, kind: FactorKind) -> &[ScheduleEntry] {
        schedule_for(&self.config, kind)
    }

    /// Points for `value` in the `kind` schedule on the given track.
    ///
    /// Fails with `UnknownCategory` when the value has no entry, or when the
    /// value is of the wrong shape for the kind (e.g. an education level
    /// looked up in the age schedule). Zero is only returned when the
    /// schedule itself says zero.
    pub fn lookup(&self, kind: FactorKind, track: Track, value: FactorValue) -> Result<u32> {
        let shape_ok = match value {
            FactorValue::Years(_) => kind.is_numeric(),
            FactorValue::Education(_) => {
                matches!(kind, FactorKind::Education | FactorKind::SpouseEducation)
            }
            FactorValue::Clb(_) => matches!(
                kind,
                FactorKind::FirstLanguage | FactorKind::SecondLanguage | FactorKind::SpouseLanguage
            ),
            FactorValue::Bonus(_) => kind == FactorKind::Additional,
        };
        if !shape_ok {
            return Err(ScoringError::unknown(kind, value));
        }

        let key = value.key();
        self.schedules
            .get(&kind)
            .and_then(|entries| {
                entries.iter().find(|entry| match (&entry.matcher, value) {
                    (Matcher::Range(range), FactorValue::Years(n)) => range.matches(n),
                    (Matcher::Key(k), _) => *k == key,
                    _ => false,
                })
            })
            .map(|entry| entry.points(track))
            .ok_or_else(|| ScoringError::unknown(kind, value))
    }
}

fn compile_entry(kind: FactorKind, entry: &ScheduleEntry) -> Option<CompiledEntry> {
    let matcher = if kind.is_numeric() {
        Matcher::Range(RangeOp::parse(&entry.key).ok()?)
    } else {
        Matcher::Key(entry.key.trim().to_string())
    };
    Some(CompiledEntry {
        matcher,
        without_spouse: entry.points,
        with_spouse: entry.with_spouse,
    })
}
