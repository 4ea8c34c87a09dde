use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScoringError};
use crate::scoring::FactorKind;

/// Oldest age accepted as a well-formed profile.
pub const MAX_AGE: u32 = 120;

/// Highest level on the Canadian Language Benchmark scale.
pub const MAX_CLB_LEVEL: u8 = 12;

/// Highest completed education, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "less_than_secondary")]
    LessThanSecondary,
    #[serde(rename = "secondary")]
    Secondary,
    #[serde(rename = "one_year_post_secondary")]
    OneYearPostSecondary,
    #[serde(rename = "two_year_post_secondary")]
    TwoYearPostSecondary,
    #[serde(rename = "bachelor_3_year")]
    ThreeYearBachelor,
    #[serde(rename = "bachelor_4_year")]
    FourYearBachelor,
    #[serde(rename = "two_or_more_credentials")]
    TwoOrMoreCredentials,
    #[serde(rename = "master")]
    Master,
    #[serde(rename = "professional")]
    Professional,
    #[serde(rename = "doctoral")]
    Doctoral,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 10] = [
        EducationLevel::LessThanSecondary,
        EducationLevel::Secondary,
        EducationLevel::OneYearPostSecondary,
        EducationLevel::TwoYearPostSecondary,
        EducationLevel::ThreeYearBachelor,
        EducationLevel::FourYearBachelor,
        EducationLevel::TwoOrMoreCredentials,
        EducationLevel::Master,
        EducationLevel::Professional,
        EducationLevel::Doctoral,
    ];

    /// Canonical key used in factor tables and profile files.
    pub fn name(&self) -> &'static str {
        match self {
            EducationLevel::LessThanSecondary => "less_than_secondary",
            EducationLevel::Secondary => "secondary",
            EducationLevel::OneYearPostSecondary => "one_year_post_secondary",
            EducationLevel::TwoYearPostSecondary => "two_year_post_secondary",
            EducationLevel::ThreeYearBachelor => "bachelor_3_year",
            EducationLevel::FourYearBachelor => "bachelor_4_year",
            EducationLevel::TwoOrMoreCredentials => "two_or_more_credentials",
            EducationLevel::Master => "master",
            EducationLevel::Professional => "professional",
            EducationLevel::Doctoral => "doctoral",
        }
    }

    /// Human-readable label for tables and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            EducationLevel::LessThanSecondary => "Less than secondary",
            EducationLevel::Secondary => "Secondary (high school)",
            EducationLevel::OneYearPostSecondary => "One-year post-secondary",
            EducationLevel::TwoYearPostSecondary => "Two-year post-secondary",
            EducationLevel::ThreeYearBachelor => "Bachelor's (3 years)",
            EducationLevel::FourYearBachelor => "Bachelor's (4+ years)",
            EducationLevel::TwoOrMoreCredentials => "Two or more credentials",
            EducationLevel::Master => "Master's",
            EducationLevel::Professional => "Professional degree",
            EducationLevel::Doctoral => "Doctoral (PhD)",
        }
    }

    /// Any credential of one year or longer after secondary school.
    pub fn is_post_secondary(&self) -> bool {
        *self >= EducationLevel::OneYearPostSecondary
    }

    /// Two or more credentials, or a graduate-level degree.
    pub fn is_advanced(&self) -> bool {
        *self >= EducationLevel::TwoOrMoreCredentials
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EducationLevel {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        EducationLevel::ALL
            .iter()
            .copied()
            .find(|level| level.name() == key)
            .ok_or_else(|| ScoringError::unknown(FactorKind::Education, s.trim()))
    }
}

/// Canadian Language Benchmark band. Levels that score identically in every
/// schedule are still kept apart so tables can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClbBand {
    #[serde(rename = "below_4")]
    BelowFour,
    #[serde(rename = "clb_4")]
    Four,
    #[serde(rename = "clb_5")]
    Five,
    #[serde(rename = "clb_6")]
    Six,
    #[serde(rename = "clb_7")]
    Seven,
    #[serde(rename = "clb_8")]
    Eight,
    #[serde(rename = "clb_9")]
    Nine,
    #[serde(rename = "clb_10_plus")]
    TenPlus,
}

impl ClbBand {
    pub const ALL: [ClbBand; 8] = [
        ClbBand::BelowFour,
        ClbBand::Four,
        ClbBand::Five,
        ClbBand::Six,
        ClbBand::Seven,
        ClbBand::Eight,
        ClbBand::Nine,
        ClbBand::TenPlus,
    ];

    /// Map a raw CLB test level (0-12) to its band. `kind` names the
    /// language factor reported when the level is out of range.
    pub fn from_level(kind: FactorKind, level: u8) -> Result<Self> {
        match level {
            0..=3 => Ok(ClbBand::BelowFour),
            4 => Ok(ClbBand::Four),
            5 => Ok(ClbBand::Five),
            6 => Ok(ClbBand::Six),
            7 => Ok(ClbBand::Seven),
            8 => Ok(ClbBand::Eight),
            9 => Ok(ClbBand::Nine),
            10..=MAX_CLB_LEVEL => Ok(ClbBand::TenPlus),
            _ => Err(ScoringError::unknown(kind, format!("CLB {}", level))),
        }
    }

    /// Lowest CLB level inside the band.
    pub fn level(&self) -> u8 {
        match self {
            ClbBand::BelowFour => 0,
            ClbBand::Four => 4,
            ClbBand::Five => 5,
            ClbBand::Six => 6,
            ClbBand::Seven => 7,
            ClbBand::Eight => 8,
            ClbBand::Nine => 9,
            ClbBand::TenPlus => 10,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClbBand::BelowFour => "below_4",
            ClbBand::Four => "clb_4",
            ClbBand::Five => "clb_5",
            ClbBand::Six => "clb_6",
            ClbBand::Seven => "clb_7",
            ClbBand::Eight => "clb_8",
            ClbBand::Nine => "clb_9",
            ClbBand::TenPlus => "clb_10_plus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClbBand::BelowFour => "CLB 3 or below",
            ClbBand::Four => "CLB 4",
            ClbBand::Five => "CLB 5",
            ClbBand::Six => "CLB 6",
            ClbBand::Seven => "CLB 7",
            ClbBand::Eight => "CLB 8",
            ClbBand::Nine => "CLB 9",
            ClbBand::TenPlus => "CLB 10+",
        }
    }
}

impl fmt::Display for ClbBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClbBand {
    type Err = ScoringError;

    /// Accepts band names ("clb_9") or bare levels ("9").
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        if let Ok(level) = key.parse::<u8>() {
            return ClbBand::from_level(FactorKind::FirstLanguage, level);
        }
        ClbBand::ALL
            .iter()
            .copied()
            .find(|band| band.name() == key)
            .ok_or_else(|| ScoringError::unknown(FactorKind::FirstLanguage, s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficialLanguage {
    English,
    French,
}

impl OfficialLanguage {
    pub fn other(&self) -> Self {
        match self {
            OfficialLanguage::English => OfficialLanguage::French,
            OfficialLanguage::French => OfficialLanguage::English,
        }
    }
}

impl fmt::Display for OfficialLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfficialLanguage::English => f.write_str("english"),
            OfficialLanguage::French => f.write_str("french"),
        }
    }
}

impl FromStr for OfficialLanguage {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(OfficialLanguage::English),
            "french" | "fr" => Ok(OfficialLanguage::French),
            _ => Err(ScoringError::unknown(FactorKind::FirstLanguage, s.trim())),
        }
    }
}

/// Test result in the four language abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageScores {
    pub speaking: ClbBand,
    pub listening: ClbBand,
    pub reading: ClbBand,
    pub writing: ClbBand,
}

impl LanguageScores {
    /// Same band in every ability.
    pub fn uniform(band: ClbBand) -> Self {
        Self {
            speaking: band,
            listening: band,
            reading: band,
            writing: band,
        }
    }

    pub fn bands(&self) -> [ClbBand; 4] {
        [self.speaking, self.listening, self.reading, self.writing]
    }

    /// Weakest of the four abilities.
    pub fn min(&self) -> ClbBand {
        self.bands().into_iter().min().unwrap_or(ClbBand::BelowFour)
    }

    pub fn all_at_least(&self, band: ClbBand) -> bool {
        self.min() >= band
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageProficiency {
    pub language: OfficialLanguage,
    pub scores: LanguageScores,
}

impl LanguageProficiency {
    pub fn english(scores: LanguageScores) -> Self {
        Self {
            language: OfficialLanguage::English,
            scores,
        }
    }

    pub fn french(scores: LanguageScores) -> Self {
        Self {
            language: OfficialLanguage::French,
            scores,
        }
    }
}

/// Length of a post-secondary credential earned in Canada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanadianStudy {
    OneOrTwoYear,
    ThreeYearOrLonger,
}

impl FromStr for CanadianStudy {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "one_or_two_year" | "short" => Ok(CanadianStudy::OneOrTwoYear),
            "three_year_or_longer" | "long" => Ok(CanadianStudy::ThreeYearOrLonger),
            _ => Err(ScoringError::unknown(FactorKind::Additional, s.trim())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpouseProfile {
    pub education: EducationLevel,
    /// Spouse's first official language result, if tested.
    pub language: Option<LanguageScores>,
    pub canadian_experience_years: u32,
}

/// A validated applicant profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub age: u32,
    pub has_spouse: bool,
    pub education: EducationLevel,
    pub first_language: LanguageProficiency,
    pub second_language: Option<LanguageProficiency>,
    pub canadian_experience_years: u32,
    pub foreign_experience_years: u32,
    pub spouse: Option<SpouseProfile>,
    /// Accepted for input compatibility; never worth points.
    pub job_offer: bool,
    pub provincial_nomination: bool,
    pub canadian_study: Option<CanadianStudy>,
    pub certificate_of_qualification: bool,
    pub sibling_in_canada: bool,
}

impl Profile {
    /// Single applicant with no experience or extras.
    pub fn new(age: u32, education: EducationLevel, first_language: LanguageProficiency) -> Self {
        Self {
            age,
            has_spouse: false,
            education,
            first_language,
            second_language: None,
            canadian_experience_years: 0,
            foreign_experience_years: 0,
            spouse: None,
            job_offer: false,
            provincial_nomination: false,
            canadian_study: None,
            certificate_of_qualification: false,
            sibling_in_canada: false,
        }
    }

    /// Result for the given official language, whichever slot it is in.
    pub fn language_result(&self, language: OfficialLanguage) -> Option<&LanguageScores> {
        if self.first_language.language == language {
            Some(&self.first_language.scores)
        } else {
            self.second_language
                .as_ref()
                .filter(|l| l.language == language)
                .map(|l| &l.scores)
        }
    }
}
