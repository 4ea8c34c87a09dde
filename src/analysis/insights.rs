use serde::Serialize;

use crate::error::Result;
use crate::scoring::{ScoreBreakdown, Scorer, Track};

/// Totals at or above this are very competitive.
pub const EXCELLENT_SCORE: u32 = 500;
/// Typical lower bound of recent draw cutoffs.
pub const TYPICAL_CUTOFF: u32 = 470;
pub const MODERATE_SCORE: u32 = 430;

/// Age bands used to summarise the age curve.
const AGE_GROUPS: [(u32, u32); 5] = [(18, 25), (26, 30), (31, 35), (36, 40), (41, 45)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Excellent,
    Good,
    Moderate,
    Low,
}

impl Standing {
    pub fn for_total(total: u32) -> Self {
        if total >= EXCELLENT_SCORE {
            Standing::Excellent
        } else if total >= TYPICAL_CUTOFF {
            Standing::Good
        } else if total >= MODERATE_SCORE {
            Standing::Moderate
        } else {
            Standing::Low
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Standing::Excellent => "Excellent score, very competitive for Express Entry",
            Standing::Good => "Good score, a good chance in Express Entry draws",
            Standing::Moderate => "Moderate score, consider improvements to be more competitive",
            Standing::Low => "Low score, significant improvements needed to be competitive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeGroup {
    pub from: u32,
    pub to: u32,
    pub mean: f64,
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeCurve {
    pub track: Track,
    pub points: Vec<(u32, u32)>,
    /// Highest age still receiving the maximum age points.
    pub last_age_at_max: u32,
    pub max_points: u32,
    /// Largest single-year loss and the age at which it applies.
    pub steepest_drop: Option<(u32, u32)>,
    pub groups: Vec<AgeGroup>,
}

/// Age points for 18..=45 on one track, with summary facts.
pub fn age_curve(scorer: &Scorer, track: Track) -> Result<AgeCurve> {
    let points = (18..=45)
        .map(|age| scorer.explain_age(track, age).map(|p| (age, p)))
        .collect::<Result<Vec<_>>>()?;

    let max_points = points.iter().map(|(_, p)| *p).max().unwrap_or(0);
    let last_age_at_max = points
        .iter()
        .filter(|(_, p)| *p == max_points)
        .map(|(age, _)| *age)
        .max()
        .unwrap_or(18);

    let mut steepest_drop: Option<(u32, u32)> = None;
    for pair in points.windows(2) {
        let ((_, before), (age, after)) = (pair[0], pair[1]);
        let drop = before.saturating_sub(after);
        if drop > 0 && steepest_drop.map_or(true, |(_, d)| drop > d) {
            steepest_drop = Some((age, drop));
        }
    }

    let groups = AGE_GROUPS
        .iter()
        .filter_map(|&(from, to)| {
            let in_group: Vec<u32> = points
                .iter()
                .filter(|(age, _)| *age >= from && *age <= to)
                .map(|(_, p)| *p)
                .collect();
            if in_group.is_empty() {
                return None;
            }
            Some(AgeGroup {
                from,
                to,
                mean: in_group.iter().sum::<u32>() as f64 / in_group.len() as f64,
                min: in_group.iter().copied().min().unwrap_or(0),
                max: in_group.iter().copied().max().unwrap_or(0),
            })
        })
        .collect();

    Ok(AgeCurve {
        track,
        points,
        last_age_at_max,
        max_points,
        steepest_drop,
        groups,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub standing: Standing,
    pub above_typical_cutoff: bool,
    pub recommendations: Vec<String>,
}

/// Improvement hints for a scored profile.
pub fn recommendations(breakdown: &ScoreBreakdown, age: u32) -> Insights {
    let standing = Standing::for_total(breakdown.total);
    let mut recommendations = Vec::new();

    let language = breakdown.factor_or_zero("First language");
    if language < 120 {
        recommendations.push(
            "Improve first-language results to CLB 9 or higher in every ability".to_string(),
        );
    }
    if age >= 30 {
        recommendations.push("Apply soon: age points decline every year from 30".to_string());
    }
    if breakdown.factor_or_zero("Education") < 120 {
        recommendations.push("Additional education would add core points".to_string());
    }
    if breakdown.transferability < 50 {
        recommendations.push(
            "Work on skill transferability: education, language and experience combinations"
                .to_string(),
        );
    }
    if breakdown.additional == 0 {
        recommendations.push(
            "A provincial nomination or strong French results add points outside the core"
                .to_string(),
        );
    }

    Insights {
        standing,
        above_typical_cutoff: breakdown.total >= TYPICAL_CUTOFF,
        recommendations,
    }
}
