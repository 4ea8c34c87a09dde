use anyhow::bail;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScoringError};
use crate::profile::{ClbBand, EducationLevel, LanguageScores, Profile};
use crate::scoring::{FactorKind, ScoreBreakdown, Scorer};

/// Profile field varied by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepField {
    Age,
    Education,
    Language,
    CanadianExperience,
    ForeignExperience,
}

impl SweepField {
    pub const ALL: [SweepField; 5] = [
        SweepField::Age,
        SweepField::Education,
        SweepField::Language,
        SweepField::CanadianExperience,
        SweepField::ForeignExperience,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SweepField::Age => "age",
            SweepField::Education => "education",
            SweepField::Language => "language",
            SweepField::CanadianExperience => "canadian_experience",
            SweepField::ForeignExperience => "foreign_experience",
        }
    }

    /// Default numeric domain. Education always sweeps every level.
    pub fn default_range(&self) -> (u32, u32) {
        match self {
            SweepField::Age => (18, 45),
            SweepField::Education => (0, EducationLevel::ALL.len() as u32 - 1),
            SweepField::Language => (4, 10),
            SweepField::CanadianExperience => (0, 5),
            SweepField::ForeignExperience => (0, 3),
        }
    }

    /// Values of the domain `from..=to`. Education ignores the bounds.
    pub fn domain(&self, from: u32, to: u32) -> Vec<SweepValue> {
        match self {
            SweepField::Education => EducationLevel::ALL
                .iter()
                .map(|level| SweepValue::Education(*level))
                .collect(),
            _ => (from..=to).map(SweepValue::Number).collect(),
        }
    }
}

impl fmt::Display for SweepField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "age" => Ok(SweepField::Age),
            "education" => Ok(SweepField::Education),
            "language" | "clb" => Ok(SweepField::Language),
            "canadian_experience" | "canadian" => Ok(SweepField::CanadianExperience),
            "foreign_experience" | "foreign" => Ok(SweepField::ForeignExperience),
            _ => bail!(
                "Unknown sweep field '{}'. Expected one of: age, education, language, canadian_experience, foreign_experience",
                s
            ),
        }
    }
}

/// One point of a sweep domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SweepValue {
    Number(u32),
    Education(EducationLevel),
}

impl fmt::Display for SweepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepValue::Number(n) => write!(f, "{}", n),
            SweepValue::Education(level) => f.write_str(level.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub value: SweepValue,
    pub result: Result<ScoreBreakdown>,
}

impl SweepRow {
    pub fn total(&self) -> Option<u32> {
        self.result.as_ref().ok().map(|b| b.total)
    }
}

/// Copy of `base` with `field` set to `value`.
pub fn apply(base: &Profile, field: SweepField, value: SweepValue) -> Result<Profile> {
    let mut profile = base.clone();
    match (field, value) {
        (SweepField::Age, SweepValue::Number(n)) => profile.age = n,
        (SweepField::CanadianExperience, SweepValue::Number(n)) => {
            profile.canadian_experience_years = n
        }
        (SweepField::ForeignExperience, SweepValue::Number(n)) => {
            profile.foreign_experience_years = n
        }
        (SweepField::Language, SweepValue::Number(n)) => {
            let level = u8::try_from(n).map_err(|_| {
                ScoringError::unknown(FactorKind::FirstLanguage, n)
            })?;
            let band = ClbBand::from_level(FactorKind::FirstLanguage, level)?;
            profile.first_language.scores = LanguageScores::uniform(band);
        }
        (SweepField::Education, SweepValue::Education(level)) => profile.education = level,
        (field, value) => {
            return Err(ScoringError::invalid_profile(format!(
                "{}: cannot be set to '{}'",
                field, value
            )))
        }
    }
    Ok(profile)
}

/// Score `base` once per value of the domain with `field` varied.
///
/// A failing row keeps its error and the sweep moves on.
pub fn sweep(
    scorer: &Scorer,
    base: &Profile,
    field: SweepField,
    values: &[SweepValue],
) -> Vec<SweepRow> {
    tracing::debug!("Sweeping {} over {} values", field, values.len());

    values
        .iter()
        .map(|value| {
            let result = apply(base, field, *value).and_then(|p| scorer.score(&p));
            if let Err(ref e) = result {
                tracing::warn!("Sweep {}={} failed: {}", field, value, e);
            }
            SweepRow {
                value: *value,
                result,
            }
        })
        .collect()
}

/// Sweep over `from..=to`, or the field's default domain.
pub fn sweep_range(
    scorer: &Scorer,
    base: &Profile,
    field: SweepField,
    from: Option<u32>,
    to: Option<u32>,
) -> Vec<SweepRow> {
    let (default_from, default_to) = field.default_range();
    let values = field.domain(from.unwrap_or(default_from), to.unwrap_or(default_to));
    sweep(scorer, base, field, &values)
}
