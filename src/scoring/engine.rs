use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::factors::{Bonus, FactorKind, FactorValue, Track};
use super::table::FactorTable;
use super::transferability::{calculate_transferability, TransferabilityBreakdown};
use crate::error::Result;
use crate::profile::{
    validate_profile, ClbBand, EducationLevel, LanguageScores, OfficialLanguage, Profile,
};

/// The four top-level score categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Core,
    Spouse,
    Transferability,
    Additional,
}

impl Pillar {
    pub const ALL: [Pillar; 4] = [
        Pillar::Core,
        Pillar::Spouse,
        Pillar::Transferability,
        Pillar::Additional,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Pillar::Core => "core",
            Pillar::Spouse => "spouse",
            Pillar::Transferability => "transferability",
            Pillar::Additional => "additional",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Pillar::Core => "Core / human capital",
            Pillar::Spouse => "Spouse factors",
            Pillar::Transferability => "Skill transferability",
            Pillar::Additional => "Additional points",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorContribution {
    pub pillar: Pillar,
    pub label: String,       // e.g. "Age", "Education", "Provincial nomination"
    pub description: String, // e.g. "28 years", "CLB 9/9/9/9"
    pub points: u32,         // Points before pillar caps
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub version: String,
    pub track: Track,
    pub core: u32,
    pub spouse: u32,
    pub transferability: u32,
    pub additional: u32,
    pub total: u32,
    pub transferability_detail: TransferabilityBreakdown,
    pub factors: Vec<FactorContribution>,
}

impl ScoreBreakdown {
    /// Capped points per pillar.
    pub fn pillar(&self, pillar: Pillar) -> u32 {
        match pillar {
            Pillar::Core => self.core,
            Pillar::Spouse => self.spouse,
            Pillar::Transferability => self.transferability,
            Pillar::Additional => self.additional,
        }
    }

    pub fn pillars(&self) -> BTreeMap<Pillar, u32> {
        Pillar::ALL.iter().map(|p| (*p, self.pillar(*p))).collect()
    }

    /// Uncapped points of a single factor by label, if it was scored.
    pub fn factor(&self, label: &str) -> Option<u32> {
        self.factors
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.points)
    }

    /// Points of a factor, zero if it did not apply.
    pub fn factor_or_zero(&self, label: &str) -> u32 {
        self.factor(label).unwrap_or(0)
    }
}

struct Collector {
    factors: Vec<FactorContribution>,
}

impl Collector {
    fn push(&mut self, pillar: Pillar, label: &str, description: String, points: u32) -> u32 {
        self.factors.push(FactorContribution {
            pillar,
            label: label.to_string(),
            description,
            points,
        });
        points
    }
}

fn describe_scores(scores: &LanguageScores) -> String {
    let levels: Vec<String> = scores
        .bands()
        .iter()
        .map(|b| match b {
            ClbBand::BelowFour => "<4".to_string(),
            ClbBand::TenPlus => "10+".to_string(),
            other => other.level().to_string(),
        })
        .collect();
    format!("CLB {}", levels.join("/"))
}

fn language_points(
    table: &FactorTable,
    kind: FactorKind,
    track: Track,
    scores: &LanguageScores,
) -> Result<u32> {
    scores
        .bands()
        .into_iter()
        .map(|band| table.lookup(kind, track, FactorValue::Clb(band)))
        .sum()
}

fn french_bonus(profile: &Profile) -> Option<Bonus> {
    let french = profile.language_result(OfficialLanguage::French)?;
    if !french.all_at_least(ClbBand::Seven) {
        return None;
    }
    match profile.language_result(OfficialLanguage::English) {
        Some(english) if english.all_at_least(ClbBand::Five) => Some(Bonus::FrenchWithEnglish),
        _ => Some(Bonus::FrenchWithWeakEnglish),
    }
}

/// Score a profile against a factor table.
///
/// The profile is validated first; nothing is computed for an invalid
/// profile. Pillars are capped individually and the total is capped again.
pub fn calculate_score(profile: &Profile, table: &FactorTable) -> Result<ScoreBreakdown> {
    validate_profile(profile)?;

    let track = Track::for_spouse(profile.has_spouse);
    let caps = table.caps();
    let mut c = Collector {
        factors: Vec::new(),
    };

    // Core / human capital
    let mut core_raw = c.push(
        Pillar::Core,
        "Age",
        format!("{} years", profile.age),
        table.lookup(FactorKind::Age, track, FactorValue::Years(profile.age))?,
    );
    core_raw += c.push(
        Pillar::Core,
        "Education",
        profile.education.label().to_string(),
        table.lookup(
            FactorKind::Education,
            track,
            FactorValue::Education(profile.education),
        )?,
    );
    core_raw += c.push(
        Pillar::Core,
        "First language",
        format!(
            "{} {}",
            profile.first_language.language,
            describe_scores(&profile.first_language.scores)
        ),
        language_points(
            table,
            FactorKind::FirstLanguage,
            track,
            &profile.first_language.scores,
        )?,
    );
    if let Some(ref second) = profile.second_language {
        let cap = match track {
            Track::WithoutSpouse => caps.second_language_without_spouse,
            Track::WithSpouse => caps.second_language_with_spouse,
        };
        let points =
            language_points(table, FactorKind::SecondLanguage, track, &second.scores)?.min(cap);
        core_raw += c.push(
            Pillar::Core,
            "Second language",
            format!("{} {}", second.language, describe_scores(&second.scores)),
            points,
        );
    }
    core_raw += c.push(
        Pillar::Core,
        "Canadian experience",
        format!("{} years", profile.canadian_experience_years),
        table.lookup(
            FactorKind::CanadianExperience,
            track,
            FactorValue::Years(profile.canadian_experience_years),
        )?,
    );
    let core_cap = match track {
        Track::WithoutSpouse => caps.core_without_spouse,
        Track::WithSpouse => caps.core_with_spouse,
    };
    let core = core_raw.min(core_cap);

    // Spouse factors
    let spouse = match (profile.has_spouse, &profile.spouse) {
        (true, Some(details)) => {
            let mut raw = c.push(
                Pillar::Spouse,
                "Spouse education",
                details.education.label().to_string(),
                table.lookup(
                    FactorKind::SpouseEducation,
                    track,
                    FactorValue::Education(details.education),
                )?,
            );
            if let Some(ref scores) = details.language {
                raw += c.push(
                    Pillar::Spouse,
                    "Spouse language",
                    describe_scores(scores),
                    language_points(table, FactorKind::SpouseLanguage, track, scores)?,
                );
            }
            raw += c.push(
                Pillar::Spouse,
                "Spouse Canadian experience",
                format!("{} years", details.canadian_experience_years),
                table.lookup(
                    FactorKind::SpouseCanadianExperience,
                    track,
                    FactorValue::Years(details.canadian_experience_years),
                )?,
            );
            raw.min(caps.spouse)
        }
        _ => 0,
    };

    // Skill transferability
    let detail = calculate_transferability(profile, table.transferability());
    for (label, points) in detail.rules() {
        if points > 0 {
            c.push(Pillar::Transferability, label, String::new(), points);
        }
    }
    let transferability = detail.total;

    // Additional points
    let mut bonuses = Vec::new();
    if profile.provincial_nomination {
        bonuses.push(("Provincial nomination", Bonus::ProvincialNomination));
    }
    if let Some(study) = profile.canadian_study {
        bonuses.push(("Canadian study", Bonus::CanadianStudy(study)));
    }
    if profile.sibling_in_canada {
        bonuses.push(("Sibling in Canada", Bonus::SiblingInCanada));
    }
    if let Some(bonus) = french_bonus(profile) {
        bonuses.push(("French language", bonus));
    }
    let mut additional_raw = 0;
    for (label, bonus) in bonuses {
        additional_raw += c.push(
            Pillar::Additional,
            label,
            bonus.name().replace('_', " "),
            table.lookup(FactorKind::Additional, track, FactorValue::Bonus(bonus))?,
        );
    }
    if profile.job_offer {
        c.push(
            Pillar::Additional,
            "Job offer",
            "no longer awarded points".to_string(),
            0,
        );
    }
    let additional = additional_raw.min(caps.additional);

    let total = (core + spouse + transferability + additional).min(caps.total);

    Ok(ScoreBreakdown {
        version: table.version().to_string(),
        track,
        core,
        spouse,
        transferability,
        additional,
        total,
        transferability_detail: detail,
        factors: c.factors,
    })
}

/// Scoring entry point with its factor table injected at construction.
///
/// Cloning is cheap and clones share the same table, so a `Scorer` can be
/// handed to any number of threads.
#[derive(Debug, Clone)]
pub struct Scorer {
    table: Arc<FactorTable>,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(FactorTable::official())
    }
}

impl Scorer {
    pub fn new(table: FactorTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &FactorTable {
        &self.table
    }

    pub fn score(&self, profile: &Profile) -> Result<ScoreBreakdown> {
        calculate_score(profile, &self.table)
    }

    pub fn explain_age(&self, track: Track, age: u32) -> Result<u32> {
        self.table
            .lookup(FactorKind::Age, track, FactorValue::Years(age))
    }

    pub fn explain_education(&self, track: Track, level: EducationLevel) -> Result<u32> {
        self.table
            .lookup(FactorKind::Education, track, FactorValue::Education(level))
    }

    /// Points for one ability at the given band.
    pub fn explain_first_language(&self, track: Track, band: ClbBand) -> Result<u32> {
        self.table
            .lookup(FactorKind::FirstLanguage, track, FactorValue::Clb(band))
    }

    /// Second-language points do not depend on the track; only the cap does.
    pub fn explain_second_language(&self, band: ClbBand) -> Result<u32> {
        self.table.lookup(
            FactorKind::SecondLanguage,
            Track::WithoutSpouse,
            FactorValue::Clb(band),
        )
    }

    pub fn explain_canadian_experience(&self, track: Track, years: u32) -> Result<u32> {
        self.table
            .lookup(FactorKind::CanadianExperience, track, FactorValue::Years(years))
    }

    pub fn explain_foreign_experience(&self, years: u32) -> Result<u32> {
        self.table.lookup(
            FactorKind::ForeignExperience,
            Track::WithoutSpouse,
            FactorValue::Years(years),
        )
    }

    pub fn explain_spouse_education(&self, level: EducationLevel) -> Result<u32> {
        self.table.lookup(
            FactorKind::SpouseEducation,
            Track::WithSpouse,
            FactorValue::Education(level),
        )
    }

    pub fn explain_spouse_language(&self, band: ClbBand) -> Result<u32> {
        self.table
            .lookup(FactorKind::SpouseLanguage, Track::WithSpouse, FactorValue::Clb(band))
    }

    pub fn explain_spouse_canadian_experience(&self, years: u32) -> Result<u32> {
        self.table.lookup(
            FactorKind::SpouseCanadianExperience,
            Track::WithSpouse,
            FactorValue::Years(years),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoringError;
    use crate::profile::{CanadianStudy, LanguageProficiency, SpouseProfile};
    use crate::scoring::FactorTableConfig;

    fn sample_profile(age: u32) -> Profile {
        Profile::new(
            age,
            EducationLevel::Master,
            LanguageProficiency::english(LanguageScores::uniform(ClbBand::Nine)),
        )
    }

    fn maximal_profile(age: u32) -> Profile {
        let mut profile = Profile::new(
            age,
            EducationLevel::Doctoral,
            LanguageProficiency::english(LanguageScores::uniform(ClbBand::TenPlus)),
        );
        profile.second_language = Some(LanguageProficiency::french(LanguageScores::uniform(
            ClbBand::Nine,
        )));
        profile.canadian_experience_years = 5;
        profile.foreign_experience_years = 3;
        profile.certificate_of_qualification = true;
        profile.provincial_nomination = true;
        profile.sibling_in_canada = true;
        profile.canadian_study = Some(CanadianStudy::ThreeYearOrLonger);
        profile
    }

    fn with_spouse(mut profile: Profile) -> Profile {
        profile.has_spouse = true;
        profile.spouse = Some(SpouseProfile {
            education: EducationLevel::Master,
            language: Some(LanguageScores::uniform(ClbBand::Nine)),
            canadian_experience_years: 5,
        });
        profile
    }

    fn scorer() -> Scorer {
        Scorer::default()
    }

    #[test]
    fn test_reference_example() {
        let mut profile = sample_profile(28);
        profile.canadian_experience_years = 3;

        let result = scorer().score(&profile).unwrap();
        assert_eq!(result.factor("Age"), Some(110));
        assert_eq!(result.factor("Education"), Some(135));
        assert_eq!(result.factor("First language"), Some(124));
        assert_eq!(result.factor("Canadian experience"), Some(64));
        assert_eq!(result.core, 433);
        assert_eq!(result.transferability_detail.education_language, 50);
        assert_eq!(result.transferability_detail.education_canadian_experience, 50);
        assert_eq!(result.transferability, 100);
        assert_eq!(result.spouse, 0);
        assert_eq!(result.additional, 0);
        assert_eq!(result.total, 533);
    }

    #[test]
    fn test_flat_age_points_18_to_29() {
        let scorer = scorer();
        for age in 18..=29 {
            let result = scorer.score(&maximal_profile(age)).unwrap();
            assert_eq!(result.factor("Age"), Some(110), "age {}", age);
        }
    }

    #[test]
    fn test_no_age_points_from_45() {
        let scorer = scorer();
        for age in 45..=64 {
            let result = scorer.score(&maximal_profile(age)).unwrap();
            assert_eq!(result.factor("Age"), Some(0), "age {}", age);
        }
    }

    #[test]
    fn test_age_points_non_increasing() {
        let scorer = scorer();
        for age in 29..45 {
            let now = scorer.score(&sample_profile(age)).unwrap().factor_or_zero("Age");
            let next = scorer.score(&sample_profile(age + 1)).unwrap().factor_or_zero("Age");
            assert!(now >= next, "age {} -> {}: {} < {}", age, age + 1, now, next);
        }
    }

    #[test]
    fn test_score_is_idempotent() {
        let scorer = scorer();
        let profile = with_spouse(maximal_profile(33));
        assert_eq!(scorer.score(&profile).unwrap(), scorer.score(&profile).unwrap());
    }

    #[test]
    fn test_age_delta_is_exact() {
        let scorer = scorer();
        let young = scorer.score(&maximal_profile(28)).unwrap();
        let old = scorer.score(&maximal_profile(50)).unwrap();

        assert_eq!(old.factor("Age"), Some(0));
        assert_eq!(young.total - old.total, 110);
        assert_eq!(young.total, 1200);
        assert_eq!(old.total, 1090);
    }

    #[test]
    fn test_core_pillar_ceiling_per_track() {
        let scorer = scorer();
        let single = scorer.score(&maximal_profile(25)).unwrap();
        assert_eq!(single.core, 500);

        let married = scorer.score(&with_spouse(maximal_profile(25))).unwrap();
        assert_eq!(married.track, Track::WithSpouse);
        assert_eq!(married.core, 460);
        assert_eq!(married.factor("Second language"), Some(22));
    }

    #[test]
    fn test_caps_hold_across_profiles() {
        let scorer = scorer();
        for age in [20, 30, 40, 50] {
            for education in EducationLevel::ALL {
                for band in [ClbBand::Five, ClbBand::Seven, ClbBand::TenPlus] {
                    for spouse in [false, true] {
                        let mut profile = maximal_profile(age);
                        profile.education = education;
                        profile.first_language.scores = LanguageScores::uniform(band);
                        if spouse {
                            profile = with_spouse(profile);
                        }
                        let result = scorer.score(&profile).unwrap();
                        let core_cap = if spouse { 460 } else { 500 };
                        assert!(result.core <= core_cap);
                        assert!(result.spouse <= 40);
                        assert!(result.transferability <= 100);
                        assert!(result.total <= 1200);
                        assert_eq!(
                            result.total,
                            (result.core + result.spouse + result.transferability + result.additional)
                                .min(1200)
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_custom_caps_applied() {
        let mut config = FactorTableConfig::default();
        config.caps.core_without_spouse = 300;
        config.caps.total = 350;
        let scorer = Scorer::new(FactorTable::from_config(config).unwrap());

        let result = scorer.score(&maximal_profile(25)).unwrap();
        assert_eq!(result.core, 300);
        assert_eq!(result.total, 350);
    }

    #[test]
    fn test_job_offer_never_changes_total() {
        let scorer = scorer();
        let profiles = [
            sample_profile(28),
            maximal_profile(35),
            with_spouse(maximal_profile(41)),
            sample_profile(60),
        ];
        for profile in profiles {
            let mut with_offer = profile.clone();
            with_offer.job_offer = true;
            let mut without_offer = profile;
            without_offer.job_offer = false;

            let a = scorer.score(&with_offer).unwrap();
            let b = scorer.score(&without_offer).unwrap();
            assert_eq!(a.total, b.total);
            assert_eq!(a.factor("Job offer"), Some(0));
        }
    }

    #[test]
    fn test_transferability_gated_below_clb_7() {
        let scorer = scorer();
        let mut profile = maximal_profile(30);
        profile.first_language.scores.listening = ClbBand::Six;

        let result = scorer.score(&profile).unwrap();
        assert_eq!(result.transferability_detail.education_language, 0);
        assert_eq!(result.transferability_detail.foreign_experience_language, 0);
        // Experience-only combinations still apply
        assert_eq!(result.transferability_detail.education_canadian_experience, 50);
    }

    #[test]
    fn test_explain_education_matches_score() {
        let scorer = scorer();
        for track in [Track::WithoutSpouse, Track::WithSpouse] {
            for level in EducationLevel::ALL {
                let mut profile = sample_profile(30);
                profile.education = level;
                if track == Track::WithSpouse {
                    profile = with_spouse(profile);
                }
                let scored = scorer.score(&profile).unwrap();
                assert_eq!(
                    scored.factor("Education"),
                    Some(scorer.explain_education(track, level).unwrap())
                );
            }
        }
    }

    #[test]
    fn test_explain_age_matches_score() {
        let scorer = scorer();
        for age in 17..=50 {
            let scored = scorer.score(&sample_profile(age)).unwrap();
            assert_eq!(
                scored.factor("Age"),
                Some(scorer.explain_age(Track::WithoutSpouse, age).unwrap())
            );
        }
    }

    #[test]
    fn test_spouse_pillar() {
        let scorer = scorer();
        let result = scorer.score(&with_spouse(sample_profile(30))).unwrap();
        // master 10 + CLB 9 (5 x 4) 20 + 5 years 10
        assert_eq!(result.factor("Spouse education"), Some(10));
        assert_eq!(result.factor("Spouse language"), Some(20));
        assert_eq!(result.factor("Spouse Canadian experience"), Some(10));
        assert_eq!(result.spouse, 40);
    }

    #[test]
    fn test_spouse_pillar_capped() {
        let mut config = FactorTableConfig::default();
        config.caps.spouse = 25;
        let scorer = Scorer::new(FactorTable::from_config(config).unwrap());
        let result = scorer.score(&with_spouse(sample_profile(30))).unwrap();
        assert_eq!(result.spouse, 25);
    }

    #[test]
    fn test_french_bonus_levels() {
        let scorer = scorer();

        let mut weak_english = Profile::new(
            30,
            EducationLevel::Secondary,
            LanguageProficiency::french(LanguageScores::uniform(ClbBand::Seven)),
        );
        let result = scorer.score(&weak_english).unwrap();
        assert_eq!(result.factor("French language"), Some(25));

        weak_english.second_language = Some(LanguageProficiency::english(
            LanguageScores::uniform(ClbBand::Five),
        ));
        let result = scorer.score(&weak_english).unwrap();
        assert_eq!(result.factor("French language"), Some(50));

        let mut low_french = sample_profile(30);
        low_french.second_language = Some(LanguageProficiency::french(LanguageScores::uniform(
            ClbBand::Six,
        )));
        assert_eq!(scorer.score(&low_french).unwrap().factor("French language"), None);
    }

    #[test]
    fn test_additional_points() {
        let scorer = scorer();
        let mut profile = sample_profile(30);
        profile.sibling_in_canada = true;
        profile.canadian_study = Some(CanadianStudy::OneOrTwoYear);
        let result = scorer.score(&profile).unwrap();
        assert_eq!(result.additional, 30);

        profile.provincial_nomination = true;
        profile.canadian_study = Some(CanadianStudy::ThreeYearOrLonger);
        let result = scorer.score(&profile).unwrap();
        // 600 + 30 + 15 capped at 600
        assert_eq!(result.additional, 600);
    }

    #[test]
    fn test_invalid_profile_fails_before_scoring() {
        let mut profile = sample_profile(30);
        profile.has_spouse = true;
        let err = scorer().score(&profile).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidProfile { .. }));
    }

    #[test]
    fn test_missing_category_propagates() {
        let mut config = FactorTableConfig::default();
        config.education.retain(|e| e.key != "master");
        let scorer = Scorer::new(FactorTable::from_config(config).unwrap());

        let err = scorer.score(&sample_profile(30)).unwrap_err();
        assert_eq!(
            err,
            ScoringError::UnknownCategory {
                kind: FactorKind::Education,
                value: "master".to_string()
            }
        );
    }

    #[test]
    fn test_pillars_map() {
        let result = scorer().score(&maximal_profile(28)).unwrap();
        let pillars = result.pillars();
        assert_eq!(pillars.len(), 4);
        assert_eq!(pillars[&Pillar::Core], 500);
        assert_eq!(pillars.values().sum::<u32>(), 1200);
    }

    #[test]
    fn test_concurrent_scoring() {
        let scorer = scorer();
        let expected = scorer.score(&maximal_profile(33)).unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let scorer = scorer.clone();
                    s.spawn(move || scorer.score(&maximal_profile(33)).unwrap())
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_version_reported() {
        let result = scorer().score(&sample_profile(30)).unwrap();
        assert_eq!(result.version, crate::scoring::OFFICIAL_VERSION);
    }

    #[test]
    fn test_table_versions_side_by_side() {
        let yaml = concat!(
            "version: \"2019-06\"\n",
            "additional:\n",
            "  - { key: provincial_nomination, points: 600 }\n",
            "  - { key: sibling_in_canada, points: 15 }\n",
            "  - { key: canadian_study_one_or_two_year, points: 15 }\n",
            "  - { key: canadian_study_three_year_or_longer, points: 30 }\n",
            "  - { key: french_with_weak_english, points: 15 }\n",
            "  - { key: french_with_english, points: 30 }\n",
        );
        let config: FactorTableConfig = serde_saphyr::from_str(yaml).unwrap();
        let older = Scorer::new(FactorTable::from_config(config).unwrap());
        let current = scorer();

        let mut profile = sample_profile(28);
        profile.second_language = Some(LanguageProficiency::french(LanguageScores::uniform(
            ClbBand::Seven,
        )));

        let old_result = older.score(&profile).unwrap();
        let new_result = current.score(&profile).unwrap();
        assert_eq!(old_result.version, "2019-06");
        assert_eq!(old_result.factor("French language"), Some(30));
        assert_eq!(new_result.factor("French language"), Some(50));
        assert_eq!(new_result.total - old_result.total, 20);
    }
}
