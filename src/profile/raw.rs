use anyhow::Context;
use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

use super::types::{
    CanadianStudy, ClbBand, EducationLevel, LanguageProficiency, LanguageScores,
    OfficialLanguage, Profile, SpouseProfile, MAX_CLB_LEVEL,
};
use super::validation::validate_profile;
use crate::error::{Result, ScoringError};
use crate::scoring::FactorKind;

/// Profile as written by a user: plain integers and strings.
///
/// `into_profile` is the schema check that turns it into a [`Profile`].
///
/// Example YAML:
/// ```yaml
/// age: 28
/// education: master
/// first_language: { language: english, all: 9 }
/// canadian_experience: 3
/// foreign_experience: 2
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RawProfile {
    pub age: i64,
    pub has_spouse: bool,
    pub education: String,
    pub first_language: RawLanguage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_language: Option<RawLanguage>,
    pub canadian_experience: i64,
    pub foreign_experience: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spouse: Option<RawSpouse>,
    pub job_offer: bool,
    pub provincial_nomination: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canadian_study: Option<String>,
    pub certificate_of_qualification: bool,
    pub sibling_in_canada: bool,
}

/// CLB levels per ability. `all` fills any ability left out.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RawLanguage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaking: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listening: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writing: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RawSpouse {
    pub education: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<RawLanguage>,
    pub canadian_experience: i64,
}

impl RawLanguage {
    /// Same level in every ability.
    pub fn uniform(language: OfficialLanguage, level: u8) -> Self {
        Self {
            language: Some(language.to_string()),
            all: Some(level as i64),
            ..Self::default()
        }
    }
}

/// Reads field values, collecting domain errors. Unknown categories abort
/// immediately since they mean the input does not fit the schema at all.
struct Checker {
    errors: Vec<String>,
}

impl Checker {
    fn years(&mut self, field: &str, value: i64) -> u32 {
        match u32::try_from(value) {
            Ok(v) => v,
            Err(_) if value < 0 => {
                self.errors
                    .push(format!("{}: must be non-negative, got {}", field, value));
                0
            }
            Err(_) => {
                self.errors.push(format!("{}: {} is out of range", field, value));
                0
            }
        }
    }

    fn band(&mut self, kind: FactorKind, field: &str, value: Option<i64>) -> Result<ClbBand> {
        let Some(level) = value else {
            self.errors.push(format!("{}: missing CLB level", field));
            return Ok(ClbBand::BelowFour);
        };
        if level < 0 {
            self.errors
                .push(format!("{}: must be non-negative, got {}", field, level));
            return Ok(ClbBand::BelowFour);
        }
        if level > MAX_CLB_LEVEL as i64 {
            return Err(ScoringError::unknown(kind, format!("CLB {}", level)));
        }
        ClbBand::from_level(kind, level as u8)
    }

    fn education(&mut self, kind: FactorKind, field: &str, name: &str) -> Result<EducationLevel> {
        if name.trim().is_empty() {
            self.errors.push(format!("{}: missing", field));
            return Ok(EducationLevel::LessThanSecondary);
        }
        name.parse::<EducationLevel>()
            .map_err(|_| ScoringError::unknown(kind, name.trim()))
    }

    fn scores(&mut self, kind: FactorKind, field: &str, raw: &RawLanguage) -> Result<LanguageScores> {
        let pick = |v: Option<i64>| v.or(raw.all);
        Ok(LanguageScores {
            speaking: self.band(kind, &format!("{}.speaking", field), pick(raw.speaking))?,
            listening: self.band(kind, &format!("{}.listening", field), pick(raw.listening))?,
            reading: self.band(kind, &format!("{}.reading", field), pick(raw.reading))?,
            writing: self.band(kind, &format!("{}.writing", field), pick(raw.writing))?,
        })
    }
}

fn language_of(kind: FactorKind, raw: &RawLanguage, default: OfficialLanguage) -> Result<OfficialLanguage> {
    match raw.language.as_deref() {
        None => Ok(default),
        Some(name) => name
            .parse::<OfficialLanguage>()
            .map_err(|_| ScoringError::unknown(kind, name)),
    }
}

impl RawProfile {
    /// Validate and convert into a strongly-typed [`Profile`].
    ///
    /// Out-of-domain numbers (negative years, missing abilities, implausible
    /// ages) are collected into `InvalidProfile`; names that match no
    /// variant fail with `UnknownCategory`.
    pub fn into_profile(&self) -> Result<Profile> {
        let mut check = Checker { errors: Vec::new() };

        let age = check.years("age", self.age);
        let education = check.education(FactorKind::Education, "education", &self.education)?;

        let first_language = LanguageProficiency {
            language: language_of(
                FactorKind::FirstLanguage,
                &self.first_language,
                OfficialLanguage::English,
            )?,
            scores: check.scores(FactorKind::FirstLanguage, "first_language", &self.first_language)?,
        };

        let second_language = match self.second_language {
            Some(ref raw) => Some(LanguageProficiency {
                language: language_of(
                    FactorKind::SecondLanguage,
                    raw,
                    first_language.language.other(),
                )?,
                scores: check.scores(FactorKind::SecondLanguage, "second_language", raw)?,
            }),
            None => None,
        };

        let canadian_experience_years = check.years("canadian_experience", self.canadian_experience);
        let foreign_experience_years = check.years("foreign_experience", self.foreign_experience);

        let spouse = match self.spouse {
            Some(ref raw) => Some(SpouseProfile {
                education: check.education(
                    FactorKind::SpouseEducation,
                    "spouse.education",
                    &raw.education,
                )?,
                language: match raw.language {
                    Some(ref lang) => {
                        Some(check.scores(FactorKind::SpouseLanguage, "spouse.language", lang)?)
                    }
                    None => None,
                },
                canadian_experience_years: check
                    .years("spouse.canadian_experience", raw.canadian_experience),
            }),
            None => None,
        };

        let canadian_study = match self.canadian_study.as_deref() {
            None | Some("") | Some("none") => None,
            Some(name) => Some(name.parse::<CanadianStudy>()?),
        };

        if !check.errors.is_empty() {
            return Err(ScoringError::InvalidProfile {
                errors: check.errors,
            });
        }

        let profile = Profile {
            age,
            has_spouse: self.has_spouse,
            education,
            first_language,
            second_language,
            canadian_experience_years,
            foreign_experience_years,
            spouse,
            job_offer: self.job_offer,
            provincial_nomination: self.provincial_nomination,
            canadian_study,
            certificate_of_qualification: self.certificate_of_qualification,
            sibling_in_canada: self.sibling_in_canada,
        };
        validate_profile(&profile)?;
        Ok(profile)
    }
}

fn raw_scores(language: Option<OfficialLanguage>, scores: &LanguageScores) -> RawLanguage {
    RawLanguage {
        language: language.map(|l| l.to_string()),
        all: None,
        speaking: Some(scores.speaking.level() as i64),
        listening: Some(scores.listening.level() as i64),
        reading: Some(scores.reading.level() as i64),
        writing: Some(scores.writing.level() as i64),
    }
}

impl From<&Profile> for RawProfile {
    fn from(profile: &Profile) -> Self {
        Self {
            age: profile.age as i64,
            has_spouse: profile.has_spouse,
            education: profile.education.name().to_string(),
            first_language: raw_scores(
                Some(profile.first_language.language),
                &profile.first_language.scores,
            ),
            second_language: profile
                .second_language
                .as_ref()
                .map(|l| raw_scores(Some(l.language), &l.scores)),
            canadian_experience: profile.canadian_experience_years as i64,
            foreign_experience: profile.foreign_experience_years as i64,
            spouse: profile.spouse.as_ref().map(|s| RawSpouse {
                education: s.education.name().to_string(),
                language: s.language.as_ref().map(|l| raw_scores(None, l)),
                canadian_experience: s.canadian_experience_years as i64,
            }),
            job_offer: profile.job_offer,
            provincial_nomination: profile.provincial_nomination,
            canadian_study: profile.canadian_study.map(|s| match s {
                CanadianStudy::OneOrTwoYear => "one_or_two_year".to_string(),
                CanadianStudy::ThreeYearOrLonger => "three_year_or_longer".to_string(),
            }),
            certificate_of_qualification: profile.certificate_of_qualification,
            sibling_in_canada: profile.sibling_in_canada,
        }
    }
}

/// Load a raw profile from a YAML file.
pub fn load_profile(path: &Path) -> anyhow::Result<RawProfile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile at {}", path.display()))?;
    let raw: RawProfile = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse profile: invalid YAML in {}", path.display()))?;
    Ok(raw)
}

/// Save a raw profile as YAML atomically.
///
/// The file is either fully written or left untouched. Parent directories
/// are created when missing.
pub fn save_profile(path: &Path, raw: &RawProfile) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let yaml = serde_saphyr::to_string(raw)
        .map_err(|e| anyhow::anyhow!("Failed to serialize profile: {}", e))?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .context("Failed to write profile")?;
    file.commit().context("Failed to save profile")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn sample_raw() -> RawProfile {
        RawProfile {
            age: 28,
            education: "master".to_string(),
            first_language: RawLanguage::uniform(OfficialLanguage::English, 9),
            canadian_experience: 3,
            ..RawProfile::default()
        }
    }

    #[test]
    fn test_into_profile_basic() {
        let profile = sample_raw().into_profile().unwrap();
        assert_eq!(profile.age, 28);
        assert_eq!(profile.education, EducationLevel::Master);
        assert_eq!(profile.first_language.scores, LanguageScores::uniform(ClbBand::Nine));
        assert_eq!(profile.canadian_experience_years, 3);
        assert!(!profile.has_spouse);
    }

    #[test]
    fn test_per_ability_overrides_all() {
        let mut raw = sample_raw();
        raw.first_language.writing = Some(6);
        let profile = raw.into_profile().unwrap();
        assert_eq!(profile.first_language.scores.writing, ClbBand::Six);
        assert_eq!(profile.first_language.scores.speaking, ClbBand::Nine);
    }

    #[test]
    fn test_negative_years_rejected() {
        let mut raw = sample_raw();
        raw.canadian_experience = -1;
        raw.age = -5;
        let err = raw.into_profile().unwrap_err();
        match err {
            ScoringError::InvalidProfile { errors } => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].contains("age: must be non-negative"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_ability_rejected() {
        let mut raw = sample_raw();
        raw.first_language = RawLanguage {
            speaking: Some(9),
            ..RawLanguage::default()
        };
        let err = raw.into_profile().unwrap_err();
        match err {
            ScoringError::InvalidProfile { errors } => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_education_is_unknown_category() {
        let mut raw = sample_raw();
        raw.education = "wizardry".to_string();
        let err = raw.into_profile().unwrap_err();
        assert_eq!(
            err,
            ScoringError::UnknownCategory {
                kind: FactorKind::Education,
                value: "wizardry".to_string()
            }
        );
    }

    #[test]
    fn test_missing_education_is_invalid_profile() {
        let raw: RawProfile = serde_saphyr::from_str(
            r#"
age: 30
first_language: { all: 8 }
"#,
        )
        .unwrap();
        let err = raw.into_profile().unwrap_err();
        assert_eq!(
            err,
            ScoringError::InvalidProfile {
                errors: vec!["education: missing".to_string()]
            }
        );
    }

    #[test]
    fn test_clb_above_scale_is_unknown_category() {
        let mut raw = sample_raw();
        raw.first_language.all = Some(14);
        let err = raw.into_profile().unwrap_err();
        assert!(matches!(
            err,
            ScoringError::UnknownCategory {
                kind: FactorKind::FirstLanguage,
                ..
            }
        ));
    }

    #[test]
    fn test_spouse_without_flag_rejected() {
        let mut raw = sample_raw();
        raw.spouse = Some(RawSpouse {
            education: "secondary".to_string(),
            language: None,
            canadian_experience: 0,
        });
        let err = raw.into_profile().unwrap_err();
        assert!(matches!(err, ScoringError::InvalidProfile { .. }));
    }

    #[test]
    fn test_second_language_defaults_to_other_language() {
        let mut raw = sample_raw();
        raw.second_language = Some(RawLanguage {
            all: Some(7),
            ..RawLanguage::default()
        });
        let profile = raw.into_profile().unwrap();
        let second = profile.second_language.unwrap();
        assert_eq!(second.language, OfficialLanguage::French);
        assert_eq!(second.scores.min(), ClbBand::Seven);
    }

    #[test]
    fn test_canadian_study_parse() {
        let mut raw = sample_raw();
        raw.canadian_study = Some("three_year_or_longer".to_string());
        let profile = raw.into_profile().unwrap();
        assert_eq!(profile.canadian_study, Some(CanadianStudy::ThreeYearOrLonger));

        raw.canadian_study = Some("none".to_string());
        assert_eq!(raw.into_profile().unwrap().canadian_study, None);

        raw.canadian_study = Some("forever".to_string());
        assert!(matches!(
            raw.into_profile().unwrap_err(),
            ScoringError::UnknownCategory { .. }
        ));
    }

    #[test]
    fn test_yaml_parse() {
        let yaml = r#"
age: 34
has_spouse: true
education: bachelor_4_year
first_language:
  language: french
  speaking: 10
  listening: 9
  reading: 9
  writing: 8
canadian_experience: 1
spouse:
  education: master
  language: { all: 8 }
  canadian_experience: 2
job_offer: true
"#;
        let raw: RawProfile = serde_saphyr::from_str(yaml).unwrap();
        let profile = raw.into_profile().unwrap();
        assert_eq!(profile.first_language.language, OfficialLanguage::French);
        assert_eq!(profile.first_language.scores.speaking, ClbBand::TenPlus);
        let spouse = profile.spouse.unwrap();
        assert_eq!(spouse.education, EducationLevel::Master);
        assert_eq!(spouse.language.unwrap().min(), ClbBand::Eight);
        assert!(profile.job_offer);
    }

    #[test]
    fn test_yaml_unknown_field_rejected() {
        let result: std::result::Result<RawProfile, _> =
            serde_saphyr::from_str("age: 30\nshoe_size: 44\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_profile_converts_back() {
        let profile = sample_raw().into_profile().unwrap();
        let raw = RawProfile::from(&profile);
        assert_eq!(raw.into_profile().unwrap(), profile);
    }

    #[test]
    fn test_load_profile_file() {
        let temp_path = env::temp_dir().join("crs_calc_test_profile.yaml");
        std::fs::write(
            &temp_path,
            "age: 40\neducation: doctoral\nfirst_language: { all: 10 }\n",
        )
        .unwrap();

        let raw = load_profile(&temp_path).unwrap();
        let profile = raw.into_profile().unwrap();
        assert_eq!(profile.age, 40);
        assert_eq!(profile.education, EducationLevel::Doctoral);

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = env::temp_dir().join("crs_calc_test_save_dir");
        let temp_path = dir.join("profile.yaml");
        let _ = std::fs::remove_dir_all(&dir);

        let mut raw = sample_raw();
        raw.sibling_in_canada = true;
        raw.canadian_study = Some("three_year_or_longer".to_string());
        save_profile(&temp_path, &raw).unwrap();

        let loaded = load_profile(&temp_path).unwrap();
        assert_eq!(loaded.into_profile().unwrap(), raw.into_profile().unwrap());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
