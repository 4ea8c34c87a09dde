use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Instant;

use crs_calc::analysis::{self, SearchSpace, SweepField};
use crs_calc::config::{Config, ScoreFormat, SweepFormat};
use crs_calc::output;
use crs_calc::profile::{load_profile, Profile, RawLanguage, RawProfile, RawSpouse};
use crs_calc::scoring::{FactorKind, FactorTable, Scorer, Track};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_SCORING: i32 = 1;
const EXIT_CONFIG: i32 = 4;

const DEFAULT_TOP: usize = 20;

#[derive(Args, Debug, Default)]
struct ProfileArgs {
    /// Profile YAML file (defaults to `profile` in the config file)
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Age in years
    #[arg(long)]
    age: Option<i64>,

    /// Education level (e.g. master, bachelor_4_year, doctoral)
    #[arg(long)]
    education: Option<String>,

    /// First-language CLB level in all four abilities
    #[arg(long)]
    clb: Option<i64>,

    /// First official language (english or french)
    #[arg(long)]
    language: Option<String>,

    /// Second-language CLB level in all four abilities
    #[arg(long)]
    second_clb: Option<i64>,

    /// Years of skilled work experience in Canada
    #[arg(long)]
    canadian_experience: Option<i64>,

    /// Years of foreign skilled work experience
    #[arg(long)]
    foreign_experience: Option<i64>,

    /// Spouse education level; implies an accompanying spouse
    #[arg(long)]
    spouse_education: Option<String>,

    /// Spouse CLB level in all four abilities
    #[arg(long, requires = "spouse_education")]
    spouse_clb: Option<i64>,

    /// Spouse years of skilled work experience in Canada
    #[arg(long, requires = "spouse_education")]
    spouse_canadian_experience: Option<i64>,

    /// Certificate of qualification from a Canadian province or territory
    #[arg(long)]
    certificate: bool,

    /// Provincial or territorial nomination
    #[arg(long)]
    provincial_nomination: bool,

    /// Brother or sister living in Canada
    #[arg(long)]
    sibling: bool,

    /// Canadian post-secondary study (one_or_two_year or three_year_or_longer)
    #[arg(long)]
    canadian_study: Option<String>,

    /// Valid job offer (accepted, awards no points)
    #[arg(long)]
    job_offer: bool,
}

impl ProfileArgs {
    fn has_required_fields(&self) -> bool {
        self.age.is_some() && self.education.is_some() && self.clb.is_some()
    }

    /// Overlay the flags that were given on top of `raw`.
    fn apply(&self, mut raw: RawProfile) -> RawProfile {
        if let Some(age) = self.age {
            raw.age = age;
        }
        if let Some(ref education) = self.education {
            raw.education = education.clone();
        }
        if let Some(level) = self.clb {
            raw.first_language = RawLanguage {
                language: raw.first_language.language.take(),
                all: Some(level),
                ..RawLanguage::default()
            };
        }
        if let Some(ref language) = self.language {
            raw.first_language.language = Some(language.clone());
        }
        if let Some(level) = self.second_clb {
            raw.second_language = Some(RawLanguage {
                all: Some(level),
                ..RawLanguage::default()
            });
        }
        if let Some(years) = self.canadian_experience {
            raw.canadian_experience = years;
        }
        if let Some(years) = self.foreign_experience {
            raw.foreign_experience = years;
        }
        if let Some(ref education) = self.spouse_education {
            raw.has_spouse = true;
            raw.spouse = Some(RawSpouse {
                education: education.clone(),
                language: self.spouse_clb.map(|level| RawLanguage {
                    all: Some(level),
                    ..RawLanguage::default()
                }),
                canadian_experience: self.spouse_canadian_experience.unwrap_or(0),
            });
        }
        if let Some(ref study) = self.canadian_study {
            raw.canadian_study = Some(study.clone());
        }
        raw.certificate_of_qualification |= self.certificate;
        raw.provincial_nomination |= self.provincial_nomination;
        raw.sibling_in_canada |= self.sibling;
        raw.job_offer |= self.job_offer;
        raw
    }

    /// Build the profile from --profile (or the configured one) plus flags.
    fn resolve(&self, config: &Config) -> Result<Profile> {
        let path = self.profile.clone().or_else(|| config.profile.clone());
        let base = match path {
            Some(path) => {
                tracing::debug!("Loading profile from {}", path.display());
                load_profile(&path)?
            }
            None if self.has_required_fields() => RawProfile::default(),
            None => bail!(
                "No profile given. Pass --profile FILE, set `profile` in the config file, or give --age, --education and --clb"
            ),
        };
        Ok(self.apply(base).into_profile()?)
    }
}

#[derive(Args, Debug, Default)]
struct ScoreArgs {
    #[command(flatten)]
    profile: ProfileArgs,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<ScoreFormat>,

    /// Print recommendations under the breakdown
    #[arg(short, long)]
    insights: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a profile and print the breakdown (default if no subcommand)
    Score(ScoreArgs),
    /// Print the point schedule of one factor for both tracks
    Explain {
        /// Factor name (age, education, first_language, second_language,
        /// canadian_experience, foreign_experience, spouse_education,
        /// spouse_language, spouse_canadian_experience, additional)
        factor: FactorKind,
    },
    /// Score a profile repeatedly with one field varied
    Sweep {
        /// Field to vary (age, education, language, canadian_experience, foreign_experience)
        field: SweepField,

        /// First value of the sweep
        #[arg(long)]
        from: Option<u32>,

        /// Last value of the sweep (inclusive)
        #[arg(long)]
        to: Option<u32>,

        #[command(flatten)]
        profile: ProfileArgs,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<SweepFormat>,
    },
    /// List the highest-scoring combinations of age, education, language and experience
    Optimize {
        /// Number of combinations to show
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },
    /// Interactive calculator
    Calc,
    /// Print the active factor table as YAML, or validate a table file
    Table {
        /// Validate this table file instead of printing
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "crs-calc")]
#[command(about = "Express Entry CRS score calculator", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/crs-calc/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Factor table YAML to score with (defaults to the official table)
    #[arg(long, global = true)]
    table: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn exit_with(code: i32, context: &str, error: impl Display) -> ! {
    eprintln!("{}: {:#}", context, error);
    std::process::exit(code);
}

fn main() {
    let cli = Cli::parse();
    crs_calc::logging::init_cli_logger(cli.verbose);

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Score(ScoreArgs::default()));
    let start_time = Instant::now();

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match crs_calc::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, "Config error", e),
    };

    // Load and validate the factor table at startup
    let table = match cli.table.or_else(|| config.table.clone()) {
        Some(path) => match FactorTable::load(&path) {
            Ok(t) => t,
            Err(e) => exit_with(EXIT_CONFIG, "Factor table error", e),
        },
        None => FactorTable::official(),
    };
    tracing::debug!("Using factor table version {}", table.version());

    let scorer = Scorer::new(table);
    let use_colors = output::should_use_colors();

    match command {
        Commands::Score(args) => {
            let profile = match args.profile.resolve(&config) {
                Ok(p) => p,
                Err(e) => exit_with(EXIT_CONFIG, "Profile error", e),
            };
            let breakdown = match scorer.score(&profile) {
                Ok(b) => b,
                Err(e) => exit_with(EXIT_SCORING, "Scoring error", e),
            };

            match args.format.or(config.score.format).unwrap_or_default() {
                ScoreFormat::Table => {
                    println!("{}", output::format_breakdown(&breakdown, use_colors));
                    if args.insights || config.score.insights.unwrap_or(false) {
                        let insights = analysis::recommendations(&breakdown, profile.age);
                        println!();
                        println!("{}", output::format_insights(&insights, use_colors));
                    }
                }
                ScoreFormat::Json => match output::format_breakdown_json(&breakdown) {
                    Ok(json) => println!("{}", json),
                    Err(e) => exit_with(EXIT_SCORING, "Failed to serialize breakdown", e),
                },
            }
        }
        Commands::Explain { factor } => {
            println!(
                "{}",
                output::format_schedule(scorer.table(), factor, use_colors)
            );
            if factor == FactorKind::Age {
                for track in [Track::WithoutSpouse, Track::WithSpouse] {
                    match analysis::age_curve(&scorer, track) {
                        Ok(curve) => {
                            println!();
                            println!("{}", output::format_age_curve(&curve, use_colors));
                        }
                        Err(e) => exit_with(EXIT_SCORING, "Scoring error", e),
                    }
                }
            }
        }
        Commands::Sweep {
            field,
            from,
            to,
            profile,
            format,
        } => {
            let base = match profile.resolve(&config) {
                Ok(p) => p,
                Err(e) => exit_with(EXIT_CONFIG, "Profile error", e),
            };
            let rows = analysis::sweep_range(&scorer, &base, field, from, to);

            match format.or(config.sweep.format).unwrap_or_default() {
                SweepFormat::Table => {
                    println!("{}", output::format_sweep_table(field, &rows, use_colors))
                }
                SweepFormat::Tsv => println!("{}", output::format_sweep_tsv(&rows)),
                SweepFormat::Json => match output::format_sweep_json(field, &rows) {
                    Ok(json) => println!("{}", json),
                    Err(e) => exit_with(EXIT_SCORING, "Failed to serialize sweep", e),
                },
            }

            let failed = rows.iter().filter(|r| r.result.is_err()).count();
            tracing::debug!("Sweep finished: {} rows, {} failed", rows.len(), failed);
            if !rows.is_empty() && failed == rows.len() {
                eprintln!("Every sweep value failed to score.");
                std::process::exit(EXIT_SCORING);
            }
        }
        Commands::Optimize { top } => {
            let top = top.or(config.optimize.top).unwrap_or(DEFAULT_TOP);
            let combinations = analysis::optimize(&scorer, &SearchSpace::default(), top);
            println!("{}", output::format_combinations(&combinations, use_colors));
        }
        Commands::Calc => {
            if let Err(e) = crs_calc::wizard::run_calculator(&scorer, use_colors) {
                exit_with(EXIT_SCORING, "Calculator error", e);
            }
        }
        Commands::Table { check } => match check {
            Some(path) => match FactorTable::load(&path) {
                Ok(table) => println!(
                    "{}: valid factor table (version {})",
                    path.display(),
                    table.version()
                ),
                Err(e) => exit_with(EXIT_CONFIG, "Factor table error", e),
            },
            None => match serde_saphyr::to_string(scorer.table().config()) {
                Ok(yaml) => print!("{}", yaml),
                Err(e) => exit_with(EXIT_CONFIG, "Failed to serialize factor table", e),
            },
        },
    }

    tracing::debug!("Done in {:?}", start_time.elapsed());
    std::process::exit(EXIT_SUCCESS);
}
