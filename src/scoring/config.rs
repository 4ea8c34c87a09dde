use serde::{Deserialize, Serialize};

/// Version label of the embedded schedule (job offer points removed).
pub const OFFICIAL_VERSION: &str = "2025-03";

/// Serializable factor table.
///
/// Every schedule is a list of entries. Numeric schedules (age, years of
/// experience) use range keys and the first matching entry wins; the other
/// schedules use the canonical variant name as key. Any field missing from a
/// YAML file falls back to the official value, so a table file only needs the
/// parts it changes.
///
/// Example YAML:
/// ```yaml
/// version: "custom"
/// age:
///   - { key: "<18", points: 0 }
///   - { key: "18-29", points: 110, with_spouse: 100 }
///   - { key: ">=45", points: 0 }
/// additional:
///   - { key: provincial_nomination, points: 600 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FactorTableConfig {
    pub version: String,
    pub age: Vec<ScheduleEntry>,
    pub education: Vec<ScheduleEntry>,
    pub first_language: Vec<ScheduleEntry>,
    pub second_language: Vec<ScheduleEntry>,
    pub canadian_experience: Vec<ScheduleEntry>,
    /// Foreign experience earns nothing on its own; it only feeds
    /// skill transferability.
    pub foreign_experience: Vec<ScheduleEntry>,
    pub spouse_education: Vec<ScheduleEntry>,
    pub spouse_language: Vec<ScheduleEntry>,
    pub spouse_canadian_experience: Vec<ScheduleEntry>,
    pub additional: Vec<ScheduleEntry>,
    pub transferability: TransferabilityConfig,
    pub caps: CapsConfig,
}

/// One row of a schedule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScheduleEntry {
    /// Range expression ("<18", "18-29", ">=5", "5+") or variant name
    pub key: String,

    /// Points without spouse, or for both tracks if `with_spouse` is absent
    pub points: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_spouse: Option<u32>,
}

/// Point grids for the skill-transferability combinations.
///
/// Rows are the tier of the first factor (`lower`, `upper`); within a row,
/// `partial` and `full` are the tiers of the second factor.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TransferabilityConfig {
    pub education_language: TierGrid,
    pub education_canadian_experience: TierGrid,
    pub foreign_experience_language: TierGrid,
    pub foreign_experience_canadian_experience: TierGrid,
    pub certificate_language: TierPair,
    /// Ceiling for each combination rule
    pub rule_cap: u32,
    /// Ceiling for the whole pillar
    pub cap: u32,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TierGrid {
    pub lower: TierPair,
    pub upper: TierPair,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TierPair {
    pub partial: u32,
    pub full: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CapsConfig {
    pub core_without_spouse: u32,
    pub core_with_spouse: u32,
    pub second_language_without_spouse: u32,
    pub second_language_with_spouse: u32,
    pub spouse: u32,
    pub additional: u32,
    pub total: u32,
}

impl Default for CapsConfig {
    fn default() -> Self {
        Self {
            core_without_spouse: 500,
            core_with_spouse: 460,
            second_language_without_spouse: 24,
            second_language_with_spouse: 22,
            spouse: 40,
            additional: 600,
            total: 1200,
        }
    }
}

impl Default for TransferabilityConfig {
    fn default() -> Self {
        let standard = TierGrid {
            lower: TierPair {
                partial: 13,
                full: 25,
            },
            upper: TierPair {
                partial: 25,
                full: 50,
            },
        };
        Self {
            education_language: standard,
            education_canadian_experience: standard,
            foreign_experience_language: standard,
            foreign_experience_canadian_experience: standard,
            certificate_language: TierPair {
                partial: 25,
                full: 50,
            },
            rule_cap: 50,
            cap: 100,
        }
    }
}

fn entry(key: &str, points: u32, with_spouse: u32) -> ScheduleEntry {
    ScheduleEntry {
        key: key.to_string(),
        points,
        with_spouse: Some(with_spouse),
    }
}

fn flat(key: &str, points: u32) -> ScheduleEntry {
    ScheduleEntry {
        key: key.to_string(),
        points,
        with_spouse: None,
    }
}

impl Default for FactorTableConfig {
    fn default() -> Self {
        Self {
            version: OFFICIAL_VERSION.to_string(),
            age: vec![
                flat("<18", 0),
                entry("18-29", 110, 100),
                entry("30", 105, 95),
                entry("31", 99, 90),
                entry("32", 94, 85),
                entry("33", 88, 80),
                entry("34", 83, 75),
                entry("35", 77, 70),
                entry("36", 72, 65),
                entry("37", 66, 60),
                entry("38", 61, 55),
                entry("39", 55, 50),
                entry("40", 50, 45),
                entry("41", 39, 35),
                entry("42", 28, 25),
                entry("43", 17, 15),
                entry("44", 6, 5),
                flat(">=45", 0),
            ],
            education: vec![
                flat("less_than_secondary", 0),
                entry("secondary", 30, 28),
                entry("one_year_post_secondary", 90, 84),
                entry("two_year_post_secondary", 98, 91),
                entry("bachelor_3_year", 112, 105),
                entry("bachelor_4_year", 120, 112),
                entry("two_or_more_credentials", 128, 119),
                entry("master", 135, 126),
                entry("professional", 135, 126),
                entry("doctoral", 150, 140),
            ],
            first_language: vec![
                flat("below_4", 0),
                flat("clb_4", 6),
                flat("clb_5", 6),
                entry("clb_6", 9, 8),
                entry("clb_7", 17, 16),
                entry("clb_8", 23, 22),
                entry("clb_9", 31, 29),
                entry("clb_10_plus", 34, 32),
            ],
            second_language: vec![
                flat("below_4", 0),
                flat("clb_4", 0),
                flat("clb_5", 1),
                flat("clb_6", 1),
                flat("clb_7", 3),
                flat("clb_8", 3),
                flat("clb_9", 6),
                flat("clb_10_plus", 6),
            ],
            canadian_experience: vec![
                flat("0", 0),
                entry("1", 40, 35),
                entry("2", 53, 46),
                entry("3", 64, 56),
                entry("4", 72, 63),
                entry(">=5", 80, 70),
            ],
            foreign_experience: vec![flat(">=0", 0)],
            spouse_education: vec![
                flat("less_than_secondary", 0),
                flat("secondary", 2),
                flat("one_year_post_secondary", 6),
                flat("two_year_post_secondary", 7),
                flat("bachelor_3_year", 8),
                flat("bachelor_4_year", 8),
                flat("two_or_more_credentials", 9),
                flat("master", 10),
                flat("professional", 10),
                flat("doctoral", 10),
            ],
            spouse_language: vec![
                flat("below_4", 0),
                flat("clb_4", 0),
                flat("clb_5", 1),
                flat("clb_6", 1),
                flat("clb_7", 3),
                flat("clb_8", 3),
                flat("clb_9", 5),
                flat("clb_10_plus", 5),
            ],
            spouse_canadian_experience: vec![
                flat("0", 0),
                flat("1", 5),
                flat("2", 7),
                flat("3", 8),
                flat("4", 9),
                flat(">=5", 10),
            ],
            additional: vec![
                flat("provincial_nomination", 600),
                flat("sibling_in_canada", 15),
                flat("canadian_study_one_or_two_year", 15),
                flat("canadian_study_three_year_or_longer", 30),
                flat("french_with_weak_english", 25),
                flat("french_with_english", 50),
            ],
            transferability: TransferabilityConfig::default(),
            caps: CapsConfig::default(),
        }
    }
}
