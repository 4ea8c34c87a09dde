use serde::Serialize;

use crate::profile::{ClbBand, EducationLevel, LanguageProficiency, LanguageScores, Profile};
use crate::scoring::Scorer;

/// Domains searched for the highest-scoring combinations.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    pub ages: Vec<u32>,
    pub education: Vec<EducationLevel>,
    pub language: Vec<ClbBand>,
    pub canadian_experience: Vec<u32>,
    pub foreign_experience_years: u32,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            ages: (25..=35).collect(),
            education: vec![
                EducationLevel::FourYearBachelor,
                EducationLevel::Master,
                EducationLevel::Doctoral,
            ],
            language: vec![ClbBand::Eight, ClbBand::Nine, ClbBand::TenPlus],
            canadian_experience: (2..=5).collect(),
            foreign_experience_years: 2,
        }
    }
}

impl SearchSpace {
    pub fn size(&self) -> usize {
        self.ages.len() * self.education.len() * self.language.len() * self.canadian_experience.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Combination {
    pub age: u32,
    pub education: EducationLevel,
    pub language: ClbBand,
    pub canadian_experience_years: u32,
    pub total: u32,
}

fn combination_profile(
    space: &SearchSpace,
    age: u32,
    education: EducationLevel,
    language: ClbBand,
    canadian: u32,
) -> Profile {
    let mut profile = Profile::new(
        age,
        education,
        LanguageProficiency::english(LanguageScores::uniform(language)),
    );
    profile.canadian_experience_years = canadian;
    profile.foreign_experience_years = space.foreign_experience_years;
    profile
}

/// Score every combination in `space` and keep the `top` best.
///
/// Ties keep the enumeration order (age, education, language, experience).
/// Combinations that fail to score are skipped.
pub fn optimize(scorer: &Scorer, space: &SearchSpace, top: usize) -> Vec<Combination> {
    tracing::debug!("Searching {} combinations", space.size());

    let mut combinations = Vec::with_capacity(space.size());
    for &age in &space.ages {
        for &education in &space.education {
            for &language in &space.language {
                for &canadian in &space.canadian_experience {
                    let profile = combination_profile(space, age, education, language, canadian);
                    match scorer.score(&profile) {
                        Ok(breakdown) => combinations.push(Combination {
                            age,
                            education,
                            language,
                            canadian_experience_years: canadian,
                            total: breakdown.total,
                        }),
                        Err(e) => tracing::warn!(
                            "Skipping age={} education={} clb={} canadian={}: {}",
                            age,
                            education,
                            language.name(),
                            canadian,
                            e
                        ),
                    }
                }
            }
        }
    }

    // Stable sort so ties keep enumeration order
    combinations.sort_by(|a, b| b.total.cmp(&a.total));
    combinations.truncate(top);
    combinations
}
