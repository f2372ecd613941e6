use std::collections::HashSet;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::budget::MealTargets;
use crate::catalog::{MenuCatalog, MenuItem};
use crate::models::MealSlot;

/// Largest allowed distance, in kcal, between a menu and the slot target.
pub const CALORIE_TOLERANCE: i64 = 10;

/// Appended to the display name of menus served with rice.
pub const STAPLE_SIDE: &str = "잡곡밥";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuPick {
    /// Catalog name, used for exclusion.
    pub name: String,
    pub display_name: String,
    pub calories: u32,
}

impl MenuPick {
    fn from_item(item: &MenuItem) -> Self {
        let display_name = if item.with_rice {
            format!("{} + {STAPLE_SIDE}", item.name)
        } else {
            item.name.clone()
        };
        Self {
            name: item.name.clone(),
            display_name,
            calories: item.calories,
        }
    }
}

fn passes_slot_filter(item: &MenuItem, slot: MealSlot) -> bool {
    // Only breakfast is restricted; lunch and dinner draw from the whole catalog.
    match slot {
        MealSlot::Breakfast => item.eligible_for(MealSlot::Breakfast),
        MealSlot::Lunch | MealSlot::Dinner => true,
    }
}

/// Pick one menu near `calorie_target` for `slot`, skipping anything in `already_chosen`.
///
/// Returns `None` when no menu qualifies.
pub fn recommend<R: Rng + ?Sized>(
    catalog: &MenuCatalog,
    calorie_target: i64,
    slot: MealSlot,
    already_chosen: &HashSet<String>,
    rng: &mut R,
) -> Option<MenuPick> {
    let candidates: Vec<&MenuItem> = catalog
        .menus()
        .iter()
        .filter(|item| item.calorie_gap(calorie_target) <= CALORIE_TOLERANCE)
        .filter(|item| passes_slot_filter(item, slot))
        .filter(|item| !already_chosen.contains(&item.name))
        .collect();

    tracing::debug!(
        slot = slot.as_str(),
        target = calorie_target,
        candidates = candidates.len(),
        "Selecting menu"
    );

    let Some(item) = candidates.choose(rng) else {
        tracing::warn!(
            slot = slot.as_str(),
            target = calorie_target,
            "No menu within calorie tolerance"
        );
        return None;
    };
    Some(MenuPick::from_item(item))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealPlan {
    pub breakfast: Option<MenuPick>,
    pub lunch: Option<MenuPick>,
    pub dinner: Option<MenuPick>,
}

impl MealPlan {
    #[must_use]
    pub fn get(&self, slot: MealSlot) -> Option<&MenuPick> {
        match slot {
            MealSlot::Breakfast => self.breakfast.as_ref(),
            MealSlot::Lunch => self.lunch.as_ref(),
            MealSlot::Dinner => self.dinner.as_ref(),
        }
    }
}

/// Plan breakfast, lunch and dinner in that order. No menu appears twice in one plan.
pub fn plan_day<R: Rng + ?Sized>(
    catalog: &MenuCatalog,
    targets: &MealTargets,
    rng: &mut R,
) -> MealPlan {
    let mut chosen = HashSet::new();
    let mut pick = |slot: MealSlot| {
        let picked = recommend(catalog, targets.for_slot(slot), slot, &chosen, &mut *rng);
        if let Some(p) = &picked {
            chosen.insert(p.name.clone());
        }
        picked
    };
    let breakfast = pick(MealSlot::Breakfast);
    let lunch = pick(MealSlot::Lunch);
    let dinner = pick(MealSlot::Dinner);
    MealPlan {
        breakfast,
        lunch,
        dinner,
    }
}
