use serde::Serialize;

use crate::energy::EnergySettings;
use crate::models::MealSlot;

/// Daily surplus or deficit applied when the goal weight differs from the current weight.
pub const GOAL_ADJUSTMENT_KCAL: i64 = 500;

pub const BREAKFAST_SHARE: f64 = 0.3;
pub const LUNCH_SHARE: f64 = 0.4;
pub const DINNER_SHARE: f64 = 0.3;

/// `round(bmr × activity_multiplier)`, ties to even.
#[must_use]
pub fn daily_calories(bmr: f64, activity_multiplier: f64) -> i64 {
    (bmr * activity_multiplier).round_ties_even() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalDirection {
    Gain,
    Lose,
    Maintain,
}

impl GoalDirection {
    #[must_use]
    pub fn from_weights(current_kg: f64, goal_kg: f64) -> Self {
        if goal_kg > current_kg {
            Self::Gain
        } else if goal_kg < current_kg {
            Self::Lose
        } else {
            Self::Maintain
        }
    }

    #[must_use]
    pub fn adjustment(self) -> i64 {
        match self {
            Self::Gain => GOAL_ADJUSTMENT_KCAL,
            Self::Lose => -GOAL_ADJUSTMENT_KCAL,
            Self::Maintain => 0,
        }
    }
}

/// Per-meal calorie targets. Each share is rounded on its own, so the three
/// parts may sum to a value one or two kcal away from the daily total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MealTargets {
    pub breakfast: i64,
    pub lunch: i64,
    pub dinner: i64,
}

impl MealTargets {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn split(total: i64) -> Self {
        let share = |ratio: f64| (total as f64 * ratio).round_ties_even() as i64;
        Self {
            breakfast: share(BREAKFAST_SHARE),
            lunch: share(LUNCH_SHARE),
            dinner: share(DINNER_SHARE),
        }
    }

    #[must_use]
    pub fn for_slot(&self, slot: MealSlot) -> i64 {
        match slot {
            MealSlot::Breakfast => self.breakfast,
            MealSlot::Lunch => self.lunch,
            MealSlot::Dinner => self.dinner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyBudget {
    /// Calories to hold the current weight, before any goal adjustment.
    pub maintenance: i64,
    pub direction: GoalDirection,
    pub total: i64,
    pub targets: MealTargets,
}

impl DailyBudget {
    #[must_use]
    pub fn new(bmr: f64, current_kg: f64, goal_kg: f64, settings: &EnergySettings) -> Self {
        let maintenance = daily_calories(bmr, settings.activity_multiplier);
        let direction = GoalDirection::from_weights(current_kg, goal_kg);
        let total = maintenance.saturating_add(direction.adjustment());
        Self {
            maintenance,
            direction,
            total,
            targets: MealTargets::split(total),
        }
    }
}
