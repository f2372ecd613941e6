use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::energy::parse_birth_date;
use crate::error::DietError;

pub const BIRTH_DATE_MESSAGE: &str = "🔺 생년월일을 정확하게 입력해주세요. (YYMMDD 형식)";
pub const GENDER_MESSAGE: &str = "🔺 성별은 '남' 또는 '여'로 정확히 입력해주세요.";
pub const HEIGHT_MESSAGE: &str = "🔺 신장을 정확하게 입력해주세요.";
pub const WEIGHT_MESSAGE: &str = "🔺 몸무게는 숫자로만 정확하게 입력해주세요.";
pub const GOAL_WEIGHT_MESSAGE: &str = "🔺 목표 체중은 숫자로만 정확하게 입력해주세요.";

pub const MIN_HEIGHT_CM: f64 = 100.0;
pub const MAX_HEIGHT_CM: f64 = 300.0;
/// Exclusive upper bound for body and goal weight.
pub const MAX_WEIGHT_KG: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse a user-typed gender token. Only `남`/`남자` and `여`/`여자` are recognized.
    pub fn from_token(token: &str) -> Result<Self, DietError> {
        match token.trim() {
            "남" | "남자" => Ok(Self::Male),
            "여" | "여자" => Ok(Self::Female),
            other => Err(DietError::InvalidGender(other.to_string())),
        }
    }

    /// Storage form, as written to the `users.gender` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    #[must_use]
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "남",
            Self::Female => "여",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    /// Order in which a day's menu is planned.
    pub const ALL: [MealSlot; 3] = [Self::Breakfast, Self::Lunch, Self::Dinner];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "아침",
            Self::Lunch => "점심",
            Self::Dinner => "저녁",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: i64,
    pub user_key: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub goal_weight_kg: f64,
    pub bmr: f64,
    pub updated_on: NaiveDate,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_key: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub goal_weight_kg: f64,
    pub bmr: f64,
    pub updated_on: NaiveDate,
}

impl From<&Profile> for NewProfile {
    fn from(profile: &Profile) -> Self {
        Self {
            user_key: profile.user_key.clone(),
            birth_date: profile.birth_date,
            gender: profile.gender,
            height_cm: profile.height_cm,
            weight_kg: profile.weight_kg,
            goal_weight_kg: profile.goal_weight_kg,
            bmr: profile.bmr,
            updated_on: profile.updated_on,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Weight,
    Goal,
}

impl HistoryKind {
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Weight => "weight_history",
            Self::Goal => "goal_weight_history",
        }
    }

    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Weight => "weight_kg",
            Self::Goal => "goal_weight_kg",
        }
    }
}

/// One append-only weight or goal-weight log row.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub user_key: String,
    pub kind: HistoryKind,
    pub value_kg: f64,
    pub date: NaiveDate,
}

/// Raw profile fields as typed by the user, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub birth_date: String,
    pub gender: String,
    pub height: String,
    pub weight: String,
    pub goal_weight: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedProfile {
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub goal_weight_kg: f64,
}

/// Parse a positive, finite number such as `"72"` or `" 68.5 "`.
#[must_use]
pub fn parse_measurement(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// A measurement that is also a plausible body weight.
fn parse_weight_kg(raw: &str) -> Option<f64> {
    parse_measurement(raw).filter(|w| *w < MAX_WEIGHT_KG)
}

/// Validate every profile field at once so the user sees all problems together.
pub fn validate_profile_input(
    input: &ProfileInput,
    today: NaiveDate,
) -> Result<ValidatedProfile, DietError> {
    let mut errors = Vec::new();

    let birth_date = parse_birth_date(&input.birth_date, today).ok();
    if birth_date.is_none() {
        errors.push(BIRTH_DATE_MESSAGE.to_string());
    }
    let gender = Gender::from_token(&input.gender).ok();
    if gender.is_none() {
        errors.push(GENDER_MESSAGE.to_string());
    }
    let height = parse_measurement(&input.height)
        .filter(|h| (MIN_HEIGHT_CM..MAX_HEIGHT_CM).contains(h));
    if height.is_none() {
        errors.push(HEIGHT_MESSAGE.to_string());
    }
    let weight = parse_weight_kg(&input.weight);
    if weight.is_none() {
        errors.push(WEIGHT_MESSAGE.to_string());
    }
    let goal_weight = parse_weight_kg(&input.goal_weight);
    if goal_weight.is_none() {
        errors.push(GOAL_WEIGHT_MESSAGE.to_string());
    }

    match (birth_date, gender, height, weight, goal_weight) {
        (Some(birth_date), Some(gender), Some(height_cm), Some(weight_kg), Some(goal_weight_kg)) => {
            Ok(ValidatedProfile {
                birth_date,
                gender,
                height_cm,
                weight_kg,
                goal_weight_kg,
            })
        }
        _ => Err(DietError::InvalidInput(errors)),
    }
}

pub fn validate_weight(raw: &str) -> Result<f64, DietError> {
    parse_weight_kg(raw).ok_or_else(|| DietError::InvalidInput(vec![WEIGHT_MESSAGE.to_string()]))
}

pub fn validate_goal_weight(raw: &str) -> Result<f64, DietError> {
    parse_weight_kg(raw)
        .ok_or_else(|| DietError::InvalidInput(vec![GOAL_WEIGHT_MESSAGE.to_string()]))
}

/// Render a kilogram value without a trailing `.0` for whole numbers.
#[must_use]
pub fn format_kg(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn valid_input() -> ProfileInput {
        ProfileInput {
            birth_date: "950310".to_string(),
            gender: "여".to_string(),
            height: "165".to_string(),
            weight: "60".to_string(),
            goal_weight: "55".to_string(),
        }
    }

    #[test]
    fn test_gender_tokens() {
        assert_eq!(Gender::from_token("남").unwrap(), Gender::Male);
        assert_eq!(Gender::from_token("남자").unwrap(), Gender::Male);
        assert_eq!(Gender::from_token("여").unwrap(), Gender::Female);
        assert_eq!(Gender::from_token(" 여자 ").unwrap(), Gender::Female);
    }

    #[test]
    fn test_gender_rejects_other_tokens() {
        for token in ["male", "female", "M", "", "기타", "남성"] {
            assert!(
                matches!(Gender::from_token(token), Err(DietError::InvalidGender(_))),
                "{token} should be rejected"
            );
        }
    }

    #[test]
    fn test_gender_db_roundtrip() {
        for gender in [Gender::Male, Gender::Female] {
            assert_eq!(Gender::from_db(gender.as_str()), Some(gender));
        }
        assert_eq!(Gender::from_db("남"), None);
    }

    #[test]
    fn test_validate_profile_input_ok() {
        let valid = validate_profile_input(&valid_input(), today()).unwrap();
        assert_eq!(valid.birth_date, NaiveDate::from_ymd_opt(1995, 3, 10).unwrap());
        assert_eq!(valid.gender, Gender::Female);
        assert!((valid.height_cm - 165.0).abs() < f64::EPSILON);
        assert!((valid.weight_kg - 60.0).abs() < f64::EPSILON);
        assert!((valid.goal_weight_kg - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_profile_input_collects_every_error() {
        let input = ProfileInput {
            birth_date: "95-03-10".to_string(),
            gender: "x".to_string(),
            height: "99".to_string(),
            weight: "sixty".to_string(),
            goal_weight: "-5".to_string(),
        };
        let Err(DietError::InvalidInput(errors)) = validate_profile_input(&input, today()) else {
            panic!("expected InvalidInput");
        };
        assert_eq!(
            errors,
            vec![
                BIRTH_DATE_MESSAGE,
                GENDER_MESSAGE,
                HEIGHT_MESSAGE,
                WEIGHT_MESSAGE,
                GOAL_WEIGHT_MESSAGE
            ]
        );
    }

    #[test]
    fn test_validate_profile_input_single_error() {
        let mut input = valid_input();
        input.height = "1650".to_string();
        let Err(DietError::InvalidInput(errors)) = validate_profile_input(&input, today()) else {
            panic!("expected InvalidInput");
        };
        assert_eq!(errors, vec![HEIGHT_MESSAGE]);
    }

    #[test]
    fn test_height_lower_bound() {
        let mut input = valid_input();
        input.height = "100".to_string();
        assert!(validate_profile_input(&input, today()).is_ok());
        input.height = "99.9".to_string();
        assert!(validate_profile_input(&input, today()).is_err());
    }

    #[test]
    fn test_parse_measurement() {
        assert_eq!(parse_measurement("72"), Some(72.0));
        assert_eq!(parse_measurement(" 68.5 "), Some(68.5));
        assert_eq!(parse_measurement("0"), None);
        assert_eq!(parse_measurement("-3"), None);
        assert_eq!(parse_measurement("NaN"), None);
        assert_eq!(parse_measurement("inf"), None);
        assert_eq!(parse_measurement(""), None);
    }

    #[test]
    fn test_validate_weight_messages() {
        let Err(DietError::InvalidInput(errors)) = validate_weight("abc") else {
            panic!("expected InvalidInput");
        };
        assert_eq!(errors, vec![WEIGHT_MESSAGE]);
        let Err(DietError::InvalidInput(errors)) = validate_goal_weight("") else {
            panic!("expected InvalidInput");
        };
        assert_eq!(errors, vec![GOAL_WEIGHT_MESSAGE]);
    }

    #[test]
    fn test_weight_upper_bound() {
        assert_eq!(validate_weight("499.9").unwrap(), 499.9);
        assert!(validate_weight("500").is_err());
        assert!(validate_goal_weight("1e18").is_err());

        let mut input = valid_input();
        input.weight = "1e18".to_string();
        input.goal_weight = "2e18".to_string();
        let Err(DietError::InvalidInput(errors)) = validate_profile_input(&input, today()) else {
            panic!("expected InvalidInput");
        };
        assert_eq!(errors, vec![WEIGHT_MESSAGE, GOAL_WEIGHT_MESSAGE]);
    }

    #[test]
    fn test_format_kg() {
        assert_eq!(format_kg(70.0), "70");
        assert_eq!(format_kg(68.5), "68.5");
        assert_eq!(format_kg(-2.0), "-2");
    }

    #[test]
    fn test_history_kind_tables() {
        assert_eq!(HistoryKind::Weight.table(), "weight_history");
        assert_eq!(HistoryKind::Goal.table(), "goal_weight_history");
    }
}
