use super::types::{Profile, MAX_AGE};
use crate::error::{Result, ScoringError};

/// Check a profile before any scoring math runs.
/// Collects every problem so callers can report them together.
pub fn validate_profile(profile: &Profile) -> Result<()> {
    let mut errors = Vec::new();

    if profile.age > MAX_AGE {
        errors.push(format!("age: {} is not a plausible age", profile.age));
    }

    if profile.canadian_experience_years > profile.age {
        errors.push(format!(
            "canadian_experience_years: {} exceeds age {}",
            profile.canadian_experience_years, profile.age
        ));
    }

    if profile.foreign_experience_years > profile.age {
        errors.push(format!(
            "foreign_experience_years: {} exceeds age {}",
            profile.foreign_experience_years, profile.age
        ));
    }

    match (profile.has_spouse, &profile.spouse) {
        (true, None) => {
            errors.push("spouse: has_spouse is set but spouse details are missing".to_string())
        }
        (false, Some(_)) => {
            errors.push("spouse: details are present but has_spouse is not set".to_string())
        }
        (true, Some(spouse)) if spouse.canadian_experience_years > MAX_AGE => {
            errors.push(format!(
                "spouse.canadian_experience_years: {} is not plausible",
                spouse.canadian_experience_years
            ));
        }
        _ => {}
    }

    if let Some(ref second) = profile.second_language {
        if second.language == profile.first_language.language {
            errors.push(format!(
                "second_language: must differ from the first language ({})",
                profile.first_language.language
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ScoringError::InvalidProfile { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{
        ClbBand, EducationLevel, LanguageProficiency, LanguageScores, SpouseProfile,
    };

    fn sample_profile() -> Profile {
        Profile::new(
            30,
            EducationLevel::FourYearBachelor,
            LanguageProficiency::english(LanguageScores::uniform(ClbBand::Eight)),
        )
    }

    fn errors_of(profile: &Profile) -> Vec<String> {
        match validate_profile(profile) {
            Err(ScoringError::InvalidProfile { errors }) => errors,
            other => panic!("expected InvalidProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_profile() {
        assert!(validate_profile(&sample_profile()).is_ok());
    }

    #[test]
    fn test_implausible_age() {
        let mut profile = sample_profile();
        profile.age = 200;
        let errors = errors_of(&profile);
        assert!(errors[0].starts_with("age:"));
    }

    #[test]
    fn test_experience_exceeds_age() {
        let mut profile = sample_profile();
        profile.canadian_experience_years = 31;
        let errors = errors_of(&profile);
        assert!(errors[0].contains("canadian_experience_years"));
    }

    #[test]
    fn test_spouse_flag_without_details() {
        let mut profile = sample_profile();
        profile.has_spouse = true;
        let errors = errors_of(&profile);
        assert!(errors[0].contains("spouse details are missing"));
    }

    #[test]
    fn test_spouse_details_without_flag() {
        let mut profile = sample_profile();
        profile.spouse = Some(SpouseProfile {
            education: EducationLevel::Master,
            language: None,
            canadian_experience_years: 0,
        });
        let errors = errors_of(&profile);
        assert!(errors[0].contains("has_spouse is not set"));
    }

    #[test]
    fn test_second_language_must_differ() {
        let mut profile = sample_profile();
        profile.second_language = Some(LanguageProficiency::english(LanguageScores::uniform(
            ClbBand::Five,
        )));
        let errors = errors_of(&profile);
        assert!(errors[0].starts_with("second_language"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut profile = sample_profile();
        profile.age = 150; // Error 1
        profile.has_spouse = true; // Error 2
        profile.foreign_experience_years = 10; // still below age, no error
        let errors = errors_of(&profile);
        assert_eq!(errors.len(), 2);
    }
}
