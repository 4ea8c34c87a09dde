use std::collections::HashSet;

use super::config::{FactorTableConfig, ScheduleEntry, TierGrid, TierPair};
use super::factors::{FactorKind, RangeOp};
use crate::profile::{ClbBand, EducationLevel, MAX_AGE};

/// Ceiling for any single point value or cap. Keeps every sum the engine
/// computes far away from `u32` overflow.
const MAX_POINTS: u32 = 10_000;

const BONUS_KEYS: [&str; 6] = [
    "provincial_nomination",
    "sibling_in_canada",
    "canadian_study_one_or_two_year",
    "canadian_study_three_year_or_longer",
    "french_with_weak_english",
    "french_with_english",
];

/// Validate a factor table at load time.
/// Returns all validation errors at once (not just the first).
///
/// Categorical schedules may leave variants out; looking one of those up
/// fails with `UnknownCategory` at scoring time. Keys that name no variant
/// at all are rejected here.
pub fn validate_table(config: &FactorTableConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.version.trim().is_empty() {
        errors.push("table.version: must not be empty".to_string());
    }

    for kind in FactorKind::ALL {
        let entries = schedule_for(config, kind);
        validate_points(kind, entries, &mut errors);
        if kind.is_numeric() {
            validate_numeric(kind, entries, &mut errors);
        } else {
            validate_categorical(kind, entries, allowed_keys(kind), &mut errors);
        }
    }

    let caps = &config.caps;
    for (name, value) in [
        ("core_without_spouse", caps.core_without_spouse),
        ("core_with_spouse", caps.core_with_spouse),
        ("spouse", caps.spouse),
        ("additional", caps.additional),
        ("total", caps.total),
    ] {
        if value == 0 {
            errors.push(format!("table.caps.{}: must be greater than zero", name));
        }
    }
    for (name, value) in [
        ("core_without_spouse", caps.core_without_spouse),
        ("core_with_spouse", caps.core_with_spouse),
        ("second_language_without_spouse", caps.second_language_without_spouse),
        ("second_language_with_spouse", caps.second_language_with_spouse),
        ("spouse", caps.spouse),
        ("additional", caps.additional),
        ("total", caps.total),
    ] {
        check_ceiling(&format!("table.caps.{}", name), value, &mut errors);
    }

    let t = &config.transferability;
    if t.rule_cap == 0 {
        errors.push("table.transferability.rule_cap: must be greater than zero".to_string());
    }
    if t.cap == 0 {
        errors.push("table.transferability.cap: must be greater than zero".to_string());
    }
    check_ceiling("table.transferability.rule_cap", t.rule_cap, &mut errors);
    check_ceiling("table.transferability.cap", t.cap, &mut errors);
    for (name, grid) in [
        ("education_language", &t.education_language),
        ("education_canadian_experience", &t.education_canadian_experience),
        ("foreign_experience_language", &t.foreign_experience_language),
        (
            "foreign_experience_canadian_experience",
            &t.foreign_experience_canadian_experience,
        ),
    ] {
        validate_grid(name, grid, &mut errors);
    }
    validate_pair("certificate_language", &t.certificate_language, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub(crate) fn schedule_for(config: &FactorTableConfig, kind: FactorKind) -> &[ScheduleEntry] {
    match kind {
        FactorKind::Age => &config.age,
        FactorKind::Education => &config.education,
        FactorKind::FirstLanguage => &config.first_language,
        FactorKind::SecondLanguage => &config.second_language,
        FactorKind::CanadianExperience => &config.canadian_experience,
        FactorKind::ForeignExperience => &config.foreign_experience,
        FactorKind::SpouseEducation => &config.spouse_education,
        FactorKind::SpouseLanguage => &config.spouse_language,
        FactorKind::SpouseCanadianExperience => &config.spouse_canadian_experience,
        FactorKind::Additional => &config.additional,
    }
}

fn allowed_keys(kind: FactorKind) -> Vec<&'static str> {
    match kind {
        FactorKind::Education | FactorKind::SpouseEducation => {
            EducationLevel::ALL.iter().map(|l| l.name()).collect()
        }
        FactorKind::FirstLanguage | FactorKind::SecondLanguage | FactorKind::SpouseLanguage => {
            ClbBand::ALL.iter().map(|b| b.name()).collect()
        }
        FactorKind::Additional => BONUS_KEYS.to_vec(),
        _ => Vec::new(),
    }
}

fn check_ceiling(field: &str, value: u32, errors: &mut Vec<String>) {
    if value > MAX_POINTS {
        errors.push(format!(
            "{}: {} exceeds the maximum of {} points",
            field, value, MAX_POINTS
        ));
    }
}

fn validate_points(kind: FactorKind, entries: &[ScheduleEntry], errors: &mut Vec<String>) {
    for (i, entry) in entries.iter().enumerate() {
        check_ceiling(&format!("table.{}[{}].points", kind, i), entry.points, errors);
        if let Some(with_spouse) = entry.with_spouse {
            check_ceiling(
                &format!("table.{}[{}].with_spouse", kind, i),
                with_spouse,
                errors,
            );
        }
    }
}

fn validate_numeric(kind: FactorKind, entries: &[ScheduleEntry], errors: &mut Vec<String>) {
    let mut ranges = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        match RangeOp::parse(&entry.key) {
            Ok(range) => ranges.push(range),
            Err(e) => errors.push(format!(
                "table.{}[{}].key: invalid range '{}' - {}",
                kind, i, entry.key, e
            )),
        }
    }

    // Every plausible value must land in some entry
    if let Some(gap) = (0..=MAX_AGE).find(|v| !ranges.iter().any(|r| r.matches(*v))) {
        errors.push(format!("table.{}: no entry covers {}", kind, gap));
    }
}

fn validate_categorical(
    kind: FactorKind,
    entries: &[ScheduleEntry],
    allowed: Vec<&'static str>,
    errors: &mut Vec<String>,
) {
    let mut seen = HashSet::new();
    for (i, entry) in entries.iter().enumerate() {
        let key = entry.key.trim();
        if !allowed.iter().any(|k| *k == key) {
            errors.push(format!(
                "table.{}[{}].key: unknown category '{}'",
                kind, i, entry.key
            ));
        } else if !seen.insert(key) {
            errors.push(format!(
                "table.{}[{}].key: duplicate category '{}'",
                kind, i, entry.key
            ));
        }
    }
}

fn validate_grid(name: &str, grid: &TierGrid, errors: &mut Vec<String>) {
    validate_pair(&format!("{}.lower", name), &grid.lower, errors);
    validate_pair(&format!("{}.upper", name), &grid.upper, errors);
}

fn validate_pair(name: &str, pair: &TierPair, errors: &mut Vec<String>) {
    check_ceiling(
        &format!("table.transferability.{}.partial", name),
        pair.partial,
        errors,
    );
    check_ceiling(&format!("table.transferability.{}.full", name), pair.full, errors);
    if pair.partial > pair.full {
        errors.push(format!(
            "table.transferability.{}: partial ({}) exceeds full ({})",
            name, pair.partial, pair.full
        ));
    }
}
