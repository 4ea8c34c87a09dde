use serde::Serialize;

use super::config::{TierGrid, TierPair, TransferabilityConfig};
use crate::profile::{ClbBand, Profile};

/// First-language band every ability must reach for the language rules.
const LANGUAGE_PARTIAL: ClbBand = ClbBand::Seven;
/// Band in every ability that moves the language rules to full points.
const LANGUAGE_FULL: ClbBand = ClbBand::Nine;
/// Lowest band accepted by the certificate-of-qualification rule.
const CERTIFICATE_MINIMUM: ClbBand = ClbBand::Five;
/// Years of foreign experience that reach the upper tier.
const FOREIGN_UPPER_YEARS: u32 = 3;
/// Years of Canadian experience that earn full points.
const CANADIAN_FULL_YEARS: u32 = 2;

/// Sub-scores of the skill-transferability pillar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferabilityBreakdown {
    pub education_language: u32,
    pub education_canadian_experience: u32,
    pub foreign_experience_language: u32,
    pub foreign_experience_canadian_experience: u32,
    pub certificate_language: u32,
    /// Sum of the sub-scores after the pillar cap
    pub total: u32,
}

impl TransferabilityBreakdown {
    /// Sub-scores with their labels, in evaluation order.
    pub fn rules(&self) -> [(&'static str, u32); 5] {
        [
            ("Education x language", self.education_language),
            ("Education x Canadian experience", self.education_canadian_experience),
            ("Foreign experience x language", self.foreign_experience_language),
            (
                "Foreign experience x Canadian experience",
                self.foreign_experience_canadian_experience,
            ),
            ("Certificate x language", self.certificate_language),
        ]
    }

    pub fn uncapped_sum(&self) -> u32 {
        self.rules().iter().map(|(_, points)| points).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Partial,
    Full,
}

fn grid_points(grid: &TierGrid, tier: Tier, level: Level) -> u32 {
    let row = match tier {
        Tier::Lower => &grid.lower,
        Tier::Upper => &grid.upper,
    };
    pair_points(row, level)
}

fn pair_points(pair: &TierPair, level: Level) -> u32 {
    match level {
        Level::Partial => pair.partial,
        Level::Full => pair.full,
    }
}

fn education_tier(profile: &Profile) -> Option<Tier> {
    if profile.education.is_advanced() {
        Some(Tier::Upper)
    } else if profile.education.is_post_secondary() {
        Some(Tier::Lower)
    } else {
        None
    }
}

fn foreign_tier(profile: &Profile) -> Option<Tier> {
    match profile.foreign_experience_years {
        0 => None,
        n if n >= FOREIGN_UPPER_YEARS => Some(Tier::Upper),
        _ => Some(Tier::Lower),
    }
}

fn language_level(profile: &Profile) -> Option<Level> {
    let weakest = profile.first_language.scores.min();
    if weakest >= LANGUAGE_FULL {
        Some(Level::Full)
    } else if weakest >= LANGUAGE_PARTIAL {
        Some(Level::Partial)
    } else {
        None
    }
}

fn canadian_level(profile: &Profile) -> Option<Level> {
    match profile.canadian_experience_years {
        0 => None,
        n if n >= CANADIAN_FULL_YEARS => Some(Level::Full),
        _ => Some(Level::Partial),
    }
}

/// Compute the skill-transferability pillar.
///
/// Each rule reads the profile on its own; a rule's gate failing only zeroes
/// that rule. Every rule is capped at `rule_cap` and the sum at `cap`.
pub fn calculate_transferability(
    profile: &Profile,
    config: &TransferabilityConfig,
) -> TransferabilityBreakdown {
    let cap_rule = |points: u32| points.min(config.rule_cap);

    let education_language = match (education_tier(profile), language_level(profile)) {
        (Some(tier), Some(level)) => grid_points(&config.education_language, tier, level),
        _ => 0,
    };

    let education_canadian_experience = match (education_tier(profile), canadian_level(profile)) {
        (Some(tier), Some(level)) => {
            grid_points(&config.education_canadian_experience, tier, level)
        }
        _ => 0,
    };

    let foreign_experience_language = match (foreign_tier(profile), language_level(profile)) {
        (Some(tier), Some(level)) => {
            grid_points(&config.foreign_experience_language, tier, level)
        }
        _ => 0,
    };

    let foreign_experience_canadian_experience =
        match (foreign_tier(profile), canadian_level(profile)) {
            (Some(tier), Some(level)) => {
                grid_points(&config.foreign_experience_canadian_experience, tier, level)
            }
            _ => 0,
        };

    let certificate_language = if profile.certificate_of_qualification {
        let weakest = profile.first_language.scores.min();
        if weakest >= LANGUAGE_PARTIAL {
            pair_points(&config.certificate_language, Level::Full)
        } else if weakest >= CERTIFICATE_MINIMUM {
            pair_points(&config.certificate_language, Level::Partial)
        } else {
            0
        }
    } else {
        0
    };

    let mut breakdown = TransferabilityBreakdown {
        education_language: cap_rule(education_language),
        education_canadian_experience: cap_rule(education_canadian_experience),
        foreign_experience_language: cap_rule(foreign_experience_language),
        foreign_experience_canadian_experience: cap_rule(foreign_experience_canadian_experience),
        certificate_language: cap_rule(certificate_language),
        total: 0,
    };
    breakdown.total = breakdown.uncapped_sum().min(config.cap);
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{EducationLevel, LanguageProficiency, LanguageScores};

    fn sample_profile(education: EducationLevel, clb: ClbBand) -> Profile {
        Profile::new(
            28,
            education,
            LanguageProficiency::english(LanguageScores::uniform(clb)),
        )
    }

    fn calc(profile: &Profile) -> TransferabilityBreakdown {
        calculate_transferability(profile, &TransferabilityConfig::default())
    }

    #[test]
    fn test_no_combinations_scores_zero() {
        let profile = sample_profile(EducationLevel::Secondary, ClbBand::Six);
        assert_eq!(calc(&profile), TransferabilityBreakdown::default());
    }

    #[test]
    fn test_education_language_tiers() {
        let bachelor_7 = sample_profile(EducationLevel::FourYearBachelor, ClbBand::Seven);
        let bachelor_9 = sample_profile(EducationLevel::FourYearBachelor, ClbBand::Nine);
        let master_7 = sample_profile(EducationLevel::Master, ClbBand::Eight);
        let master_9 = sample_profile(EducationLevel::Master, ClbBand::TenPlus);

        assert_eq!(calc(&bachelor_7).education_language, 13);
        assert_eq!(calc(&bachelor_9).education_language, 25);
        assert_eq!(calc(&master_7).education_language, 25);
        assert_eq!(calc(&master_9).education_language, 50);
    }

    #[test]
    fn test_language_gate_uses_weakest_skill() {
        let mut profile = sample_profile(EducationLevel::Doctoral, ClbBand::TenPlus);
        profile.foreign_experience_years = 3;
        profile.first_language.scores.writing = ClbBand::Six;

        let result = calc(&profile);
        assert_eq!(result.education_language, 0);
        assert_eq!(result.foreign_experience_language, 0);
    }

    #[test]
    fn test_education_canadian_experience() {
        let mut profile = sample_profile(EducationLevel::OneYearPostSecondary, ClbBand::Five);
        profile.canadian_experience_years = 1;
        assert_eq!(calc(&profile).education_canadian_experience, 13);

        profile.canadian_experience_years = 2;
        assert_eq!(calc(&profile).education_canadian_experience, 25);

        profile.education = EducationLevel::Master;
        assert_eq!(calc(&profile).education_canadian_experience, 50);
    }

    #[test]
    fn test_education_canadian_experience_requires_post_secondary() {
        let mut profile = sample_profile(EducationLevel::Secondary, ClbBand::Nine);
        profile.canadian_experience_years = 5;
        assert_eq!(calc(&profile).education_canadian_experience, 0);
    }

    #[test]
    fn test_foreign_experience_language() {
        let mut profile = sample_profile(EducationLevel::Secondary, ClbBand::Seven);
        profile.foreign_experience_years = 1;
        assert_eq!(calc(&profile).foreign_experience_language, 13);

        profile.foreign_experience_years = 3;
        assert_eq!(calc(&profile).foreign_experience_language, 25);

        profile.first_language = LanguageProficiency::english(LanguageScores::uniform(ClbBand::Nine));
        assert_eq!(calc(&profile).foreign_experience_language, 50);
    }

    #[test]
    fn test_foreign_experience_canadian_experience() {
        let mut profile = sample_profile(EducationLevel::Secondary, ClbBand::BelowFour);
        profile.foreign_experience_years = 2;
        assert_eq!(calc(&profile).foreign_experience_canadian_experience, 0);

        profile.canadian_experience_years = 1;
        assert_eq!(calc(&profile).foreign_experience_canadian_experience, 13);

        profile.canadian_experience_years = 4;
        assert_eq!(calc(&profile).foreign_experience_canadian_experience, 25);

        profile.foreign_experience_years = 6;
        assert_eq!(calc(&profile).foreign_experience_canadian_experience, 50);
    }

    #[test]
    fn test_certificate_of_qualification() {
        let mut profile = sample_profile(EducationLevel::Secondary, ClbBand::Four);
        profile.certificate_of_qualification = true;
        assert_eq!(calc(&profile).certificate_language, 0);

        profile.first_language = LanguageProficiency::english(LanguageScores::uniform(ClbBand::Five));
        assert_eq!(calc(&profile).certificate_language, 25);

        profile.first_language = LanguageProficiency::english(LanguageScores::uniform(ClbBand::Seven));
        assert_eq!(calc(&profile).certificate_language, 50);

        profile.certificate_of_qualification = false;
        assert_eq!(calc(&profile).certificate_language, 0);
    }

    #[test]
    fn test_pillar_capped_at_100() {
        let mut profile = sample_profile(EducationLevel::Doctoral, ClbBand::TenPlus);
        profile.canadian_experience_years = 5;
        profile.foreign_experience_years = 5;
        profile.certificate_of_qualification = true;

        let result = calc(&profile);
        assert_eq!(result.uncapped_sum(), 250);
        assert_eq!(result.total, 100);
    }

    #[test]
    fn test_rule_cap_applies_per_rule() {
        let mut config = TransferabilityConfig::default();
        config.education_language.upper.full = 80;
        config.cap = 500;

        let profile = sample_profile(EducationLevel::Master, ClbBand::Nine);
        let result = calculate_transferability(&profile, &config);
        assert_eq!(result.education_language, 50);
        assert_eq!(result.total, 50);
    }
}
