use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::analysis::recommendations;
use crate::output::{format_breakdown, format_insights};
use crate::profile::{
    save_profile, CanadianStudy, ClbBand, EducationLevel, LanguageProficiency, LanguageScores,
    OfficialLanguage, Profile, RawProfile, SpouseProfile, MAX_AGE, MAX_CLB_LEVEL,
};
use crate::scoring::{FactorKind, ScoreBreakdown, Scorer};

/// Line-oriented question/answer session over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text).context("Failed to write output")
    }

    /// Prompt user with a message and return their trimmed input.
    fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{}", message).context("Failed to write output")?;
        self.output.flush().context("Failed to flush stdout")?;
        let mut input = String::new();
        let read = self
            .input
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            bail!("Input ended before the calculator finished");
        }
        Ok(input.trim().to_string())
    }

    /// Prompt user with a message and a default value. Returns default if input is empty.
    fn prompt_with_default(&mut self, message: &str, default: &str) -> Result<String> {
        let input = self.prompt(&format!("{} [{}]: ", message, default))?;
        if input.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(input)
        }
    }

    /// Prompt user with a yes/no question. Returns bool based on input and default.
    fn prompt_yes_no(&mut self, message: &str, default_yes: bool) -> Result<bool> {
        let hint = if default_yes { "Y/n" } else { "y/N" };
        let input = self.prompt(&format!("{} [{}]: ", message, hint))?;
        let input = input.to_lowercase();
        if input.is_empty() {
            Ok(default_yes)
        } else {
            Ok(input == "y" || input == "yes")
        }
    }

    /// Ask for a whole number until one inside `range` is given.
    fn prompt_number(
        &mut self,
        message: &str,
        default: Option<u32>,
        range: RangeInclusive<u32>,
    ) -> Result<u32> {
        loop {
            let input = match default {
                Some(d) => self.prompt_with_default(message, &d.to_string())?,
                None => self.prompt(&format!("{}: ", message))?,
            };
            match input.parse::<u32>() {
                Ok(n) if range.contains(&n) => return Ok(n),
                Ok(_) => self.say(&format!(
                    "  Invalid: must be between {} and {}. Try again.",
                    range.start(),
                    range.end()
                ))?,
                Err(_) => self.say("  Invalid: must be a whole number. Try again.")?,
            }
        }
    }

    /// Numbered menu. `default` is a 0-based index into `options`.
    fn prompt_choice<T: Copy>(
        &mut self,
        message: &str,
        options: &[(T, &str)],
        default: Option<usize>,
    ) -> Result<T> {
        self.say(message)?;
        for (idx, (_, label)) in options.iter().enumerate() {
            self.say(&format!("  {:>2}. {}", idx + 1, label))?;
        }
        let chosen = self.prompt_number(
            "Choice",
            default.map(|d| d as u32 + 1),
            1..=options.len() as u32,
        )?;
        Ok(options[chosen as usize - 1].0)
    }

    fn prompt_education(&mut self, message: &str) -> Result<EducationLevel> {
        let options: Vec<(EducationLevel, &str)> = EducationLevel::ALL
            .iter()
            .map(|level| (*level, level.label()))
            .collect();
        self.prompt_choice(message, &options, None)
    }

    fn prompt_band(&mut self, kind: FactorKind, ability: &str) -> Result<ClbBand> {
        let level = self.prompt_number(
            &format!("  {} (CLB 0-{})", ability, MAX_CLB_LEVEL),
            None,
            0..=MAX_CLB_LEVEL as u32,
        )?;
        Ok(ClbBand::from_level(kind, level as u8)?)
    }

    /// One level for every ability, or each ability on its own.
    fn prompt_scores(&mut self, kind: FactorKind, label: &str) -> Result<LanguageScores> {
        loop {
            let input = self.prompt(&format!(
                "{} CLB level in all abilities (blank to enter each): ",
                label
            ))?;
            if input.is_empty() {
                return Ok(LanguageScores {
                    speaking: self.prompt_band(kind, "Speaking")?,
                    listening: self.prompt_band(kind, "Listening")?,
                    reading: self.prompt_band(kind, "Reading")?,
                    writing: self.prompt_band(kind, "Writing")?,
                });
            }
            match input.parse::<u8>() {
                Ok(level) if level <= MAX_CLB_LEVEL => {
                    return Ok(LanguageScores::uniform(ClbBand::from_level(kind, level)?))
                }
                _ => self.say(&format!(
                    "  Invalid: must be a CLB level between 0 and {}. Try again.",
                    MAX_CLB_LEVEL
                ))?,
            }
        }
    }
}

/// Ask every question needed to build a profile.
pub fn collect_profile<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> Result<Profile> {
    let age = p.prompt_number("Age", None, 0..=MAX_AGE)?;
    let has_spouse = p.prompt_yes_no(
        "Is a spouse or common-law partner coming with you to Canada?",
        false,
    )?;
    let education = p.prompt_education("Highest level of education")?;

    let language = p.prompt_choice(
        "First official language",
        &[
            (OfficialLanguage::English, "English"),
            (OfficialLanguage::French, "French"),
        ],
        Some(0),
    )?;
    let first_scores = p.prompt_scores(FactorKind::FirstLanguage, "First language")?;

    let other = language.other();
    let second_language = if p.prompt_yes_no(&format!("Do you have {} test results?", other), false)? {
        Some(LanguageProficiency {
            language: other,
            scores: p.prompt_scores(FactorKind::SecondLanguage, "Second language")?,
        })
    } else {
        None
    };

    let canadian_experience_years =
        p.prompt_number("Years of skilled work experience in Canada", Some(0), 0..=age)?;
    let foreign_experience_years =
        p.prompt_number("Years of foreign skilled work experience", Some(0), 0..=age)?;
    let certificate_of_qualification = p.prompt_yes_no(
        "Certificate of qualification from a Canadian province or territory?",
        false,
    )?;

    let spouse = if has_spouse {
        let education = p.prompt_education("Spouse's highest level of education")?;
        let language = if p.prompt_yes_no("Does your spouse have official language test results?", false)? {
            Some(p.prompt_scores(FactorKind::SpouseLanguage, "Spouse")?)
        } else {
            None
        };
        let canadian_experience_years = p.prompt_number(
            "Spouse's years of skilled work experience in Canada",
            Some(0),
            0..=MAX_AGE,
        )?;
        Some(SpouseProfile {
            education,
            language,
            canadian_experience_years,
        })
    } else {
        None
    };

    let provincial_nomination = p.prompt_yes_no("Nominated by a province or territory?", false)?;
    let sibling_in_canada =
        p.prompt_yes_no("Brother or sister living in Canada as a citizen or PR?", false)?;
    let canadian_study = p.prompt_choice(
        "Post-secondary education completed in Canada",
        &[
            (None, "None"),
            (Some(CanadianStudy::OneOrTwoYear), "One or two year credential"),
            (Some(CanadianStudy::ThreeYearOrLonger), "Three years or longer"),
        ],
        Some(0),
    )?;
    let job_offer = p.prompt_yes_no("Valid job offer? (no longer awarded points)", false)?;

    Ok(Profile {
        age,
        has_spouse,
        education,
        first_language: LanguageProficiency {
            language,
            scores: first_scores,
        },
        second_language,
        canadian_experience_years,
        foreign_experience_years,
        spouse,
        job_offer,
        provincial_nomination,
        canadian_study,
        certificate_of_qualification,
        sibling_in_canada,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalcOutcome {
    pub profile: Profile,
    pub breakdown: ScoreBreakdown,
    pub saved_to: Option<PathBuf>,
}

/// Default location offered when saving a profile (~/.config/crs-calc/profile.yaml)
pub fn default_profile_path() -> PathBuf {
    crate::config::get_config_dir().join("profile.yaml")
}

/// Run the calculator session: questions, breakdown, recommendations and an
/// optional save of the answers.
pub fn run_calculator_with<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    scorer: &Scorer,
    save_default: &Path,
    use_colors: bool,
) -> Result<CalcOutcome> {
    p.say("CRS Score Calculator")?;
    p.say("====================")?;
    p.say("")?;

    let profile = collect_profile(p)?;
    let breakdown = scorer
        .score(&profile)
        .context("Failed to score the entered profile")?;

    p.say("")?;
    p.say(&format_breakdown(&breakdown, use_colors))?;
    p.say("")?;
    p.say(&format_insights(
        &recommendations(&breakdown, profile.age),
        use_colors,
    ))?;
    p.say("")?;

    let mut saved_to = None;
    if p.prompt_yes_no("Save this profile as YAML?", false)? {
        let path_str = p.prompt_with_default(
            "Where should the profile be saved?",
            &save_default.display().to_string(),
        )?;
        let path = PathBuf::from(&path_str);

        let write = !path.exists()
            || p.prompt_yes_no(
                &format!("Profile already exists at {}. Overwrite?", path.display()),
                false,
            )?;
        if write {
            save_profile(&path, &RawProfile::from(&profile))?;
            p.say(&format!("Profile written to {}", path.display()))?;
            tracing::debug!("Saved profile to {}", path.display());
            saved_to = Some(path);
        } else {
            p.say("Not saved.")?;
        }
    }

    Ok(CalcOutcome {
        profile,
        breakdown,
        saved_to,
    })
}

/// Interactive calculator on stdin/stdout.
pub fn run_calculator(scorer: &Scorer, use_colors: bool) -> Result<CalcOutcome> {
    let stdin = std::io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
    run_calculator_with(&mut prompter, scorer, &default_profile_path(), use_colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::load_profile;
    use std::env;
    use std::io::Cursor;

    fn prompter(script: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    // age, spouse, education, language, CLB, second language, Canadian years,
    // foreign years, certificate, nomination, sibling, study, job offer
    const SINGLE_MASTER: &str = "28\nn\n8\n\n9\nn\n3\n\nn\nn\nn\n\ny\n";

    #[test]
    fn test_collect_simple_profile() {
        let mut p = prompter(SINGLE_MASTER);
        let profile = collect_profile(&mut p).unwrap();

        assert_eq!(profile.age, 28);
        assert!(!profile.has_spouse);
        assert_eq!(profile.education, EducationLevel::Master);
        assert_eq!(profile.first_language.language, OfficialLanguage::English);
        assert_eq!(profile.first_language.scores, LanguageScores::uniform(ClbBand::Nine));
        assert_eq!(profile.canadian_experience_years, 3);
        assert_eq!(profile.foreign_experience_years, 0);
        assert_eq!(profile.canadian_study, None);
        assert!(profile.job_offer);
    }

    #[test]
    fn test_invalid_answers_are_asked_again() {
        let script = format!("abc\n200\n{}", SINGLE_MASTER);
        let mut p = prompter(&script);
        let profile = collect_profile(&mut p).unwrap();
        assert_eq!(profile.age, 28);

        let output = String::from_utf8(p.into_output()).unwrap();
        assert!(output.contains("must be a whole number"));
        assert!(output.contains("must be between 0 and 120"));
    }

    #[test]
    fn test_per_ability_scores_and_spouse() {
        let script = concat!(
            "33\n", "y\n", "6\n", "2\n", // age, spouse, bachelor 4-year, French
            "\n", "7\n", "8\n", "9\n", "10\n", // per-ability French levels
            "y\n", "5\n", // English as second language
            "1\n", "4\n", "y\n", // Canadian, foreign, certificate
            "8\n", "y\n", "7\n", "2\n", // spouse: master, CLB 7, 2 years
            "y\n", "y\n", "3\n", "n\n", // nomination, sibling, long study, no job offer
        );
        let mut p = prompter(script);
        let profile = collect_profile(&mut p).unwrap();

        assert!(profile.has_spouse);
        assert_eq!(profile.first_language.language, OfficialLanguage::French);
        assert_eq!(profile.first_language.scores.speaking, ClbBand::Seven);
        assert_eq!(profile.first_language.scores.writing, ClbBand::TenPlus);
        let second = profile.second_language.unwrap();
        assert_eq!(second.language, OfficialLanguage::English);
        assert_eq!(second.scores, LanguageScores::uniform(ClbBand::Five));
        let spouse = profile.spouse.unwrap();
        assert_eq!(spouse.education, EducationLevel::Master);
        assert_eq!(spouse.canadian_experience_years, 2);
        assert_eq!(profile.canadian_study, Some(CanadianStudy::ThreeYearOrLonger));
        assert!(profile.provincial_nomination);
    }

    #[test]
    fn test_experience_bounded_by_age() {
        // 25 years in Canada at age 20 is refused, then 2 accepted
        let script = "20\nn\n6\n\n8\nn\n25\n2\n\nn\nn\nn\n\nn\n";
        let mut p = prompter(script);
        let profile = collect_profile(&mut p).unwrap();
        assert_eq!(profile.canadian_experience_years, 2);
    }

    #[test]
    fn test_input_ending_early_is_error() {
        let mut p = prompter("28\n");
        let err = collect_profile(&mut p).unwrap_err();
        assert!(err.to_string().contains("Input ended"));
    }

    #[test]
    fn test_calculator_prints_breakdown() {
        let script = format!("{}n\n", SINGLE_MASTER);
        let mut p = prompter(&script);
        let outcome = run_calculator_with(
            &mut p,
            &Scorer::default(),
            &env::temp_dir().join("crs_calc_test_unused.yaml"),
            false,
        )
        .unwrap();

        assert_eq!(outcome.breakdown.total, 533);
        assert_eq!(outcome.saved_to, None);
        let output = String::from_utf8(p.into_output()).unwrap();
        assert!(output.contains("Core / human capital"));
        assert!(output.contains("Excellent score"));
    }

    #[test]
    fn test_calculator_saves_profile() {
        let path = env::temp_dir().join("crs_calc_test_wizard_profile.yaml");
        let _ = std::fs::remove_file(&path);

        let script = format!("{}y\n\n", SINGLE_MASTER);
        let mut p = prompter(&script);
        let outcome = run_calculator_with(&mut p, &Scorer::default(), &path, false).unwrap();

        assert_eq!(outcome.saved_to.as_deref(), Some(path.as_path()));
        let saved = load_profile(&path).unwrap().into_profile().unwrap();
        assert_eq!(saved, outcome.profile);

        let _ = std::fs::remove_file(&path);
    }
}
