use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::profile::{CanadianStudy, ClbBand, EducationLevel};

/// Which point schedule a lookup reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Age,
    Education,
    FirstLanguage,
    SecondLanguage,
    CanadianExperience,
    ForeignExperience,
    SpouseEducation,
    SpouseLanguage,
    SpouseCanadianExperience,
    Additional,
}

impl FactorKind {
    pub const ALL: [FactorKind; 10] = [
        FactorKind::Age,
        FactorKind::Education,
        FactorKind::FirstLanguage,
        FactorKind::SecondLanguage,
        FactorKind::CanadianExperience,
        FactorKind::ForeignExperience,
        FactorKind::SpouseEducation,
        FactorKind::SpouseLanguage,
        FactorKind::SpouseCanadianExperience,
        FactorKind::Additional,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FactorKind::Age => "age",
            FactorKind::Education => "education",
            FactorKind::FirstLanguage => "first_language",
            FactorKind::SecondLanguage => "second_language",
            FactorKind::CanadianExperience => "canadian_experience",
            FactorKind::ForeignExperience => "foreign_experience",
            FactorKind::SpouseEducation => "spouse_education",
            FactorKind::SpouseLanguage => "spouse_language",
            FactorKind::SpouseCanadianExperience => "spouse_canadian_experience",
            FactorKind::Additional => "additional",
        }
    }

    /// Kinds whose schedule is keyed by a number of years.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FactorKind::Age
                | FactorKind::CanadianExperience
                | FactorKind::ForeignExperience
                | FactorKind::SpouseCanadianExperience
        )
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FactorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        match FactorKind::ALL.iter().find(|k| k.name() == key) {
            Some(kind) => Ok(*kind),
            None => bail!("Unknown factor '{}'", s),
        }
    }
}

/// With-spouse vs. without-spouse variant of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    WithoutSpouse,
    WithSpouse,
}

impl Track {
    pub fn for_spouse(has_spouse: bool) -> Self {
        if has_spouse {
            Track::WithSpouse
        } else {
            Track::WithoutSpouse
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::WithoutSpouse => f.write_str("without spouse"),
            Track::WithSpouse => f.write_str("with spouse"),
        }
    }
}

/// Bonuses in the additional-points pillar. A job offer has no variant: it
/// is accepted on the profile but has no schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bonus {
    ProvincialNomination,
    SiblingInCanada,
    CanadianStudy(CanadianStudy),
    FrenchWithWeakEnglish,
    FrenchWithEnglish,
}

impl Bonus {
    pub fn name(&self) -> &'static str {
        match self {
            Bonus::ProvincialNomination => "provincial_nomination",
            Bonus::SiblingInCanada => "sibling_in_canada",
            Bonus::CanadianStudy(CanadianStudy::OneOrTwoYear) => "canadian_study_one_or_two_year",
            Bonus::CanadianStudy(CanadianStudy::ThreeYearOrLonger) => {
                "canadian_study_three_year_or_longer"
            }
            Bonus::FrenchWithWeakEnglish => "french_with_weak_english",
            Bonus::FrenchWithEnglish => "french_with_english",
        }
    }
}

/// A discrete input to a schedule lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorValue {
    Years(u32),
    Education(EducationLevel),
    Clb(ClbBand),
    Bonus(Bonus),
}

impl FactorValue {
    /// Key string matched against categorical schedule entries.
    pub fn key(&self) -> String {
        match self {
            FactorValue::Years(n) => n.to_string(),
            FactorValue::Education(level) => level.name().to_string(),
            FactorValue::Clb(band) => band.name().to_string(),
            FactorValue::Bonus(bonus) => bonus.name().to_string(),
        }
    }
}

impl fmt::Display for FactorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeOp {
    LessThan(u32),
    LessEqual(u32),
    GreaterThan(u32),
    GreaterEqual(u32),
    Equal(u32),
    Between(u32, u32), // Inclusive range: N-M
}

impl RangeOp {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(val) = s.strip_prefix(">=") {
            Ok(RangeOp::GreaterEqual(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix("<=") {
            Ok(RangeOp::LessEqual(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix('>') {
            Ok(RangeOp::GreaterThan(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix('<') {
            Ok(RangeOp::LessThan(val.trim().parse()?))
        } else if let Some(val) = s.strip_suffix('+') {
            // "5+" reads as "5 or more"
            Ok(RangeOp::GreaterEqual(val.trim().parse()?))
        } else if s.contains('-') && !s.starts_with('-') {
            let parts: Vec<&str> = s.split('-').collect();
            if parts.len() == 2 {
                let low: u32 = parts[0].trim().parse()?;
                let high: u32 = parts[1].trim().parse()?;
                if low > high {
                    bail!("Empty range: {}", s)
                }
                Ok(RangeOp::Between(low, high))
            } else {
                bail!("Invalid range format: {}", s)
            }
        } else {
            Ok(RangeOp::Equal(s.parse()?))
        }
    }

    pub fn matches(&self, value: u32) -> bool {
        match self {
            RangeOp::LessThan(n) => value < *n,
            RangeOp::LessEqual(n) => value <= *n,
            RangeOp::GreaterThan(n) => value > *n,
            RangeOp::GreaterEqual(n) => value >= *n,
            RangeOp::Equal(n) => value == *n,
            RangeOp::Between(low, high) => value >= *low && value <= *high,
        }
    }
}
