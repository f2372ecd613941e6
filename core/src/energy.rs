//! Age and basal metabolic rate.
//!
//! BMR uses the Harris–Benedict form `c0 + c1·weight + c2·height − c3·age`, with one
//! coefficient quadruple per [`Gender`]. Deployments may override the quadruples and the
//! activity multiplier through [`EnergySettings`].

use std::str::FromStr;

use anyhow::{Context, bail};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::DietError;
use crate::models::Gender;

pub const DEFAULT_ACTIVITY_MULTIPLIER: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BmrCoefficients {
    pub constant: f64,
    pub weight: f64,
    pub height: f64,
    pub age: f64,
}

impl BmrCoefficients {
    pub const MALE: Self = Self {
        constant: 66.0,
        weight: 13.75,
        height: 5.0,
        age: 6.8,
    };

    pub const FEMALE: Self = Self {
        constant: 655.0,
        weight: 9.56,
        height: 1.85,
        age: 4.68,
    };
}

/// Parses `"66, 13.75 , 5, 6.8"`: four comma-separated numbers in
/// constant, weight, height, age order.
impl FromStr for BmrCoefficients {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .with_context(|| format!("Invalid BMR coefficient '{}'", part.trim()))
            })
            .collect::<anyhow::Result<Vec<f64>>>()?;
        let [constant, weight, height, age] = values[..] else {
            bail!(
                "Expected 4 BMR coefficients (constant, weight, height, age), got {}",
                values.len()
            );
        };
        Ok(Self {
            constant,
            weight,
            height,
            age,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergySettings {
    pub male: BmrCoefficients,
    pub female: BmrCoefficients,
    pub activity_multiplier: f64,
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            male: BmrCoefficients::MALE,
            female: BmrCoefficients::FEMALE,
            activity_multiplier: DEFAULT_ACTIVITY_MULTIPLIER,
        }
    }
}

impl EnergySettings {
    #[must_use]
    pub fn coefficients(&self, gender: Gender) -> BmrCoefficients {
        match gender {
            Gender::Male => self.male,
            Gender::Female => self.female,
        }
    }
}

/// Parse a birth date typed as `YYMMDD`, or `YYYYMMDD` as delivered by profile sync.
///
/// A two-digit year is read as 20YY unless that lands after `today`, in which case it is 19YY.
pub fn parse_birth_date(text: &str, today: NaiveDate) -> Result<NaiveDate, DietError> {
    let text = text.trim();
    let invalid = || DietError::InvalidBirthDate(text.to_string());

    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let field = |range: std::ops::Range<usize>| -> Result<u32, DietError> {
        text[range].parse().map_err(|_| invalid())
    };

    match text.len() {
        6 => {
            let (yy, month, day) = (field(0..2)?, field(2..4)?, field(4..6)?);
            let yy = i32::try_from(yy).map_err(|_| invalid())?;
            match NaiveDate::from_ymd_opt(2000 + yy, month, day) {
                Some(date) if date <= today => Ok(date),
                _ => NaiveDate::from_ymd_opt(1900 + yy, month, day).ok_or_else(invalid),
            }
        }
        8 => {
            let year = i32::try_from(field(0..4)?).map_err(|_| invalid())?;
            let date = NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)
                .ok_or_else(invalid)?;
            if date > today {
                return Err(invalid());
            }
            Ok(date)
        }
        _ => Err(invalid()),
    }
}

/// Whole years between `birth_date` and `today`; one less while this year's birthday is ahead.
#[must_use]
pub fn age(birth_date: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

#[must_use]
pub fn bmr(
    age: u32,
    gender: Gender,
    height_cm: f64,
    weight_kg: f64,
    settings: &EnergySettings,
) -> f64 {
    let c = settings.coefficients(gender);
    c.constant + c.weight * weight_kg + c.height * height_cm - c.age * f64::from(age)
}
