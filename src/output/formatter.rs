use owo_colors::OwoColorize;
use serde_json::json;
use std::io::IsTerminal;

use crate::analysis::{AgeCurve, Combination, Insights, Standing, SweepField, SweepRow};
use crate::scoring::{FactorKind, FactorTable, Pillar, ScoreBreakdown};

const LABEL_WIDTH: usize = 42;
const POINTS_WIDTH: usize = 5;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a point difference with an explicit sign ("+5", "-11", "0")
pub fn format_delta(delta: i64) -> String {
    if delta > 0 {
        format!("+{}", delta)
    } else {
        delta.to_string()
    }
}

/// Format a score breakdown grouped by pillar.
///
/// Factor lines show uncapped points; pillar lines show points after caps.
pub fn format_breakdown(breakdown: &ScoreBreakdown, use_colors: bool) -> String {
    let mut lines = Vec::new();

    let header = format!(
        "CRS score breakdown (table {}, {})",
        breakdown.version, breakdown.track
    );
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });

    for pillar in Pillar::ALL {
        let factors: Vec<_> = breakdown
            .factors
            .iter()
            .filter(|f| f.pillar == pillar)
            .collect();
        if factors.is_empty() && breakdown.pillar(pillar) == 0 {
            continue;
        }

        let pillar_line = format!(
            "{:<width$}{:>points$}",
            pillar.label(),
            breakdown.pillar(pillar),
            width = LABEL_WIDTH + 2,
            points = POINTS_WIDTH
        );
        lines.push(String::new());
        lines.push(if use_colors {
            pillar_line.cyan().to_string()
        } else {
            pillar_line
        });

        for factor in factors {
            let mut line = format!(
                "  {:<width$}{:>points$}",
                factor.label,
                factor.points,
                width = LABEL_WIDTH,
                points = POINTS_WIDTH
            );
            if !factor.description.is_empty() {
                line.push_str("  ");
                if use_colors {
                    line.push_str(&factor.description.dimmed().to_string());
                } else {
                    line.push_str(&factor.description);
                }
            }
            lines.push(line);
        }
    }

    let total_line = format!(
        "{:<width$}{:>points$}",
        "Total",
        breakdown.total,
        width = LABEL_WIDTH + 2,
        points = POINTS_WIDTH
    );
    lines.push(String::new());
    lines.push(if use_colors {
        total_line.bold().green().to_string()
    } else {
        total_line
    });

    lines.join("\n")
}

pub fn format_breakdown_json(breakdown: &ScoreBreakdown) -> serde_json::Result<String> {
    serde_json::to_string_pretty(breakdown)
}

/// Format standing and recommendations as a bulleted list
pub fn format_insights(insights: &Insights, use_colors: bool) -> String {
    let standing = insights.standing.message();
    let mut lines = vec![if use_colors {
        match insights.standing {
            Standing::Excellent | Standing::Good => standing.green().to_string(),
            Standing::Moderate => standing.yellow().to_string(),
            Standing::Low => standing.red().to_string(),
        }
    } else {
        standing.to_string()
    }];

    lines.push(format!(
        "Your score is {} typical draw cutoffs",
        if insights.above_typical_cutoff {
            "above"
        } else {
            "below"
        }
    ));

    for recommendation in &insights.recommendations {
        lines.push(format!("  - {}", recommendation));
    }
    lines.join("\n")
}

/// Format one schedule of a table with both track columns.
pub fn format_schedule(table: &FactorTable, kind: FactorKind, use_colors: bool) -> String {
    let entries = table.entries(kind);
    if entries.is_empty() {
        return format!("No entries for {}.", kind);
    }

    let header = format!(
        "{:<36}{:>9}{:>9}",
        kind.name(),
        "single",
        "spouse"
    );
    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    for entry in entries {
        let with_spouse = entry.with_spouse.unwrap_or(entry.points);
        lines.push(format!(
            "{:<36}{:>9}{:>9}",
            entry.key, entry.points, with_spouse
        ));
    }
    lines.join("\n")
}

/// Format sweep rows as an indexed table with the change from the previous row.
pub fn format_sweep_table(field: SweepField, rows: &[SweepRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No sweep values.".to_string();
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let header = format!(
        "{:>3} {:<26}{:>7}{:>7}",
        "#",
        field.name(),
        "total",
        "delta"
    );
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });

    let mut previous: Option<u32> = None;
    for (idx, row) in rows.iter().enumerate() {
        let index_str = format!("{:>2}.", idx + 1);
        let value = row.value.to_string();
        match &row.result {
            Ok(breakdown) => {
                let delta = previous
                    .map(|p| format_delta(breakdown.total as i64 - p as i64))
                    .unwrap_or_default();
                previous = Some(breakdown.total);
                if use_colors {
                    lines.push(format!(
                        "{} {:<26}{:>7}{:>7}",
                        index_str.dimmed(),
                        value,
                        breakdown.total.bold(),
                        delta
                    ));
                } else {
                    lines.push(format!(
                        "{} {:<26}{:>7}{:>7}",
                        index_str, value, breakdown.total, delta
                    ));
                }
            }
            Err(e) => {
                previous = None;
                let message = format!("error: {}", e);
                if use_colors {
                    lines.push(format!("{} {:<26}  {}", index_str.dimmed(), value, message.red()));
                } else {
                    lines.push(format!("{} {:<26}  {}", index_str, value, message));
                }
            }
        }
    }
    lines.join("\n")
}

/// Format sweep rows as tab-separated values for scripting
/// Columns: value, total, core, spouse, transferability, additional (no headers)
/// Failed rows carry the error message in the second column.
pub fn format_sweep_tsv(rows: &[SweepRow]) -> String {
    rows.iter()
        .map(|row| match &row.result {
            Ok(b) => format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                row.value, b.total, b.core, b.spouse, b.transferability, b.additional
            ),
            Err(e) => format!("{}\terror: {}", row.value, e),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_sweep_json(field: SweepField, rows: &[SweepRow]) -> serde_json::Result<String> {
    let rows: Vec<_> = rows
        .iter()
        .map(|row| match &row.result {
            Ok(breakdown) => json!({
                "value": row.value,
                "breakdown": breakdown,
            }),
            Err(e) => json!({
                "value": row.value,
                "error": e.to_string(),
            }),
        })
        .collect();
    serde_json::to_string_pretty(&json!({ "field": field, "rows": rows }))
}

/// Format optimization results as a ranked table
pub fn format_combinations(combinations: &[Combination], use_colors: bool) -> String {
    if combinations.is_empty() {
        return "No combinations scored.".to_string();
    }

    combinations
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            let index_str = format!("{:>2}.", idx + 1);
            let total = format!("{:>5}", c.total);
            let detail = format!(
                "age {:<3} {:<40} {:<12} {} yrs Canadian",
                c.age,
                c.education.label(),
                c.language.label(),
                c.canadian_experience_years
            );
            if use_colors {
                format!("{} {}  {}", index_str.dimmed(), total.bold(), detail)
            } else {
                format!("{} {}  {}", index_str, total, detail)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the age curve summary
pub fn format_age_curve(curve: &AgeCurve, use_colors: bool) -> String {
    let mut lines = Vec::new();
    let header = format!("Age points ({})", curve.track);
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });
    lines.push(format!(
        "  Maximum age points ({}) are awarded up to age {}",
        curve.max_points, curve.last_age_at_max
    ));
    if let Some((age, drop)) = curve.steepest_drop {
        lines.push(format!(
            "  Steepest decline ({} points) occurs at age {}",
            drop, age
        ));
    }
    for group in &curve.groups {
        lines.push(format!(
            "  {:>2}-{:<2}  avg {:>5.1}  min {:>3}  max {:>3}",
            group.from, group.to, group.mean, group.min, group.max
        ));
    }
    lines.join("\n")
}
