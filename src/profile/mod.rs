pub mod raw;
pub mod types;
pub mod validation;

pub use raw::{load_profile, save_profile, RawLanguage, RawProfile, RawSpouse};
pub use types::{
    CanadianStudy, ClbBand, EducationLevel, LanguageProficiency, LanguageScores,
    OfficialLanguage, Profile, SpouseProfile, MAX_AGE, MAX_CLB_LEVEL,
};
pub use validation::validate_profile;
