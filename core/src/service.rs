use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::budget::{DailyBudget, daily_calories};
use crate::catalog::MenuCatalog;
use crate::db::Database;
use crate::energy::{self, EnergySettings};
use crate::error::DietError;
use crate::models::{
    HistoryKind, HistoryRecord, NewProfile, Profile, ProfileInput, validate_goal_weight,
    validate_profile_input, validate_weight,
};
use crate::recommend::{MealPlan, plan_day};

/// Persistence seam for profiles and their weight/goal history.
///
/// [`Database`] is the production implementation; tests can substitute their own.
pub trait ProfileStore: Send {
    fn get_profile(&self, user_key: &str) -> Result<Option<Profile>>;
    fn upsert_profile(&self, profile: &NewProfile) -> Result<Profile>;
    fn record_history(
        &self,
        user_key: &str,
        kind: HistoryKind,
        value_kg: f64,
        date: NaiveDate,
    ) -> Result<HistoryRecord>;
    fn history(&self, user_key: &str, kind: HistoryKind) -> Result<Vec<HistoryRecord>>;
    fn list_profiles(&self) -> Result<Vec<Profile>>;
}

impl ProfileStore for Database {
    fn get_profile(&self, user_key: &str) -> Result<Option<Profile>> {
        Database::get_profile(self, user_key)
    }

    fn upsert_profile(&self, profile: &NewProfile) -> Result<Profile> {
        Database::upsert_profile(self, profile)
    }

    fn record_history(
        &self,
        user_key: &str,
        kind: HistoryKind,
        value_kg: f64,
        date: NaiveDate,
    ) -> Result<HistoryRecord> {
        Database::record_history(self, user_key, kind, value_kg, date)
    }

    fn history(&self, user_key: &str, kind: HistoryKind) -> Result<Vec<HistoryRecord>> {
        Database::history(self, user_key, kind)
    }

    fn list_profiles(&self) -> Result<Vec<Profile>> {
        Database::list_profiles(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub profile: Profile,
    pub age: u32,
    /// Maintenance calories, before any goal adjustment.
    pub daily_calories: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightChange {
    pub previous_kg: f64,
    pub current_kg: f64,
    pub goal_kg: f64,
    pub profile: Profile,
}

impl WeightChange {
    /// Positive when weight went up.
    #[must_use]
    pub fn difference(&self) -> f64 {
        self.current_kg - self.previous_kg
    }

    /// Goal minus current weight; negative when there is weight left to lose.
    #[must_use]
    pub fn remaining_to_goal(&self) -> f64 {
        self.goal_kg - self.current_kg
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyMenu {
    pub current_weight_kg: f64,
    pub goal_weight_kg: f64,
    pub budget: DailyBudget,
    pub plan: MealPlan,
}

pub struct DietService<S = Database> {
    store: S,
    settings: EnergySettings,
    catalog: Arc<MenuCatalog>,
}

impl DietService<Database> {
    pub fn open(path: &Path, settings: EnergySettings, catalog: Arc<MenuCatalog>) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Self::with_store(db, settings, catalog))
    }

    pub fn new_in_memory(settings: EnergySettings, catalog: Arc<MenuCatalog>) -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_store(db, settings, catalog))
    }
}

impl<S: ProfileStore> DietService<S> {
    pub fn with_store(store: S, settings: EnergySettings, catalog: Arc<MenuCatalog>) -> Self {
        Self {
            store,
            settings,
            catalog,
        }
    }

    fn require_profile(&self, user_key: &str) -> Result<Profile, DietError> {
        self.store
            .get_profile(user_key)?
            .ok_or(DietError::ProfileMissing)
    }

    fn report(&self, profile: Profile, today: NaiveDate) -> ProfileReport {
        ProfileReport {
            age: energy::age(profile.birth_date, today),
            daily_calories: daily_calories(profile.bmr, self.settings.activity_multiplier),
            profile,
        }
    }

    // --- Profile ---

    /// Validate and store a full profile. Weight and goal history get a new row when the
    /// value is new or differs from what was stored.
    pub fn set_profile(
        &self,
        user_key: &str,
        input: &ProfileInput,
        today: NaiveDate,
    ) -> Result<ProfileReport, DietError> {
        let valid = validate_profile_input(input, today)?;
        let age = energy::age(valid.birth_date, today);
        let bmr = energy::bmr(
            age,
            valid.gender,
            valid.height_cm,
            valid.weight_kg,
            &self.settings,
        );

        let previous = self.store.get_profile(user_key)?;
        let saved = self.store.upsert_profile(&NewProfile {
            user_key: user_key.to_string(),
            birth_date: valid.birth_date,
            gender: valid.gender,
            height_cm: valid.height_cm,
            weight_kg: valid.weight_kg,
            goal_weight_kg: valid.goal_weight_kg,
            bmr,
            updated_on: today,
        })?;

        if changed(previous.as_ref().map(|p| p.weight_kg), saved.weight_kg) {
            self.store
                .record_history(user_key, HistoryKind::Weight, saved.weight_kg, today)?;
        }
        if changed(previous.as_ref().map(|p| p.goal_weight_kg), saved.goal_weight_kg) {
            self.store
                .record_history(user_key, HistoryKind::Goal, saved.goal_weight_kg, today)?;
        }

        tracing::info!(user = user_key, age, bmr, "Profile saved");
        Ok(self.report(saved, today))
    }

    pub fn profile_report(
        &self,
        user_key: &str,
        today: NaiveDate,
    ) -> Result<ProfileReport, DietError> {
        let profile = self.require_profile(user_key)?;
        Ok(self.report(profile, today))
    }

    pub fn list_profiles(&self) -> Result<Vec<Profile>, DietError> {
        Ok(self.store.list_profiles()?)
    }

    // --- Weight & goal ---

    /// Record a new current weight. BMR is recomputed from the stored birth date, gender and
    /// height so it always matches the stored weight.
    pub fn update_weight(
        &self,
        user_key: &str,
        raw: &str,
        today: NaiveDate,
    ) -> Result<WeightChange, DietError> {
        let weight_kg = validate_weight(raw)?;
        let profile = self.require_profile(user_key)?;
        let previous_kg = profile.weight_kg;

        let age = energy::age(profile.birth_date, today);
        let bmr = energy::bmr(
            age,
            profile.gender,
            profile.height_cm,
            weight_kg,
            &self.settings,
        );
        let mut update = NewProfile::from(&profile);
        update.weight_kg = weight_kg;
        update.bmr = bmr;
        update.updated_on = today;

        let saved = self.store.upsert_profile(&update)?;
        self.store
            .record_history(user_key, HistoryKind::Weight, weight_kg, today)?;

        tracing::info!(user = user_key, previous_kg, weight_kg, "Weight updated");
        Ok(WeightChange {
            previous_kg,
            current_kg: saved.weight_kg,
            goal_kg: saved.goal_weight_kg,
            profile: saved,
        })
    }

    pub fn update_goal_weight(
        &self,
        user_key: &str,
        raw: &str,
        today: NaiveDate,
    ) -> Result<Profile, DietError> {
        let goal_kg = validate_goal_weight(raw)?;
        let profile = self.require_profile(user_key)?;

        let mut update = NewProfile::from(&profile);
        update.goal_weight_kg = goal_kg;
        update.updated_on = today;
        let saved = self.store.upsert_profile(&update)?;
        self.store
            .record_history(user_key, HistoryKind::Goal, goal_kg, today)?;

        tracing::info!(user = user_key, goal_kg, "Goal weight updated");
        Ok(saved)
    }

    pub fn weight_history(&self, user_key: &str) -> Result<Vec<HistoryRecord>, DietError> {
        self.require_profile(user_key)?;
        Ok(self.store.history(user_key, HistoryKind::Weight)?)
    }

    pub fn goal_history(&self, user_key: &str) -> Result<Vec<HistoryRecord>, DietError> {
        self.require_profile(user_key)?;
        Ok(self.store.history(user_key, HistoryKind::Goal)?)
    }

    // --- Menu ---

    /// Budget the day from the stored profile and pick one menu per meal.
    pub fn today_menu<R: Rng + ?Sized>(
        &self,
        user_key: &str,
        rng: &mut R,
    ) -> Result<DailyMenu, DietError> {
        let profile = self.require_profile(user_key)?;
        let budget = DailyBudget::new(
            profile.bmr,
            profile.weight_kg,
            profile.goal_weight_kg,
            &self.settings,
        );
        let plan = plan_day(&self.catalog, &budget.targets, rng);
        tracing::debug!(user = user_key, total = budget.total, "Planned today's menu");
        Ok(DailyMenu {
            current_weight_kg: profile.weight_kg,
            goal_weight_kg: profile.goal_weight_kg,
            budget,
            plan,
        })
    }
}

fn changed(previous: Option<f64>, current: f64) -> bool {
    previous.is_none_or(|p| (p - current).abs() > f64::EPSILON)
}
