use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use bapsang_core::DietService;
use bapsang_core::budget::GoalDirection;
use bapsang_core::models::{MealSlot, format_kg};
use bapsang_core::service::DailyMenu;

use crate::replies::NO_MENU_FOUND;

use super::helpers::describe_error;

pub(crate) fn cmd_menu(svc: &DietService, user: &str, seed: Option<u64>, json: bool) -> Result<()> {
    let menu = match seed {
        Some(seed) => svc.today_menu(user, &mut StdRng::seed_from_u64(seed)),
        None => svc.today_menu(user, &mut rand::rng()),
    }
    .map_err(|e| describe_error(e, user))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&menu)?);
    } else {
        print_menu(&menu);
    }
    Ok(())
}

fn direction_label(direction: GoalDirection) -> &'static str {
    match direction {
        GoalDirection::Gain => "gain",
        GoalDirection::Lose => "lose",
        GoalDirection::Maintain => "maintain",
    }
}

fn print_menu(menu: &DailyMenu) {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "Meal")]
        meal: &'static str,
        #[tabled(rename = "Target kcal")]
        target: i64,
        #[tabled(rename = "Menu")]
        menu: String,
        #[tabled(rename = "kcal")]
        calories: String,
    }

    let budget = &menu.budget;
    println!(
        "Weight {} kg, goal {} kg ({})",
        format_kg(menu.current_weight_kg),
        format_kg(menu.goal_weight_kg),
        direction_label(budget.direction)
    );
    println!(
        "Daily budget: {} kcal (maintenance {} kcal)",
        budget.total, budget.maintenance
    );

    let rows: Vec<MealRow> = MealSlot::ALL
        .iter()
        .map(|&slot| {
            let pick = menu.plan.get(slot);
            MealRow {
                meal: slot.as_str(),
                target: budget.targets.for_slot(slot),
                menu: pick.map_or_else(|| NO_MENU_FOUND.to_string(), |p| p.display_name.clone()),
                calories: pick.map_or_else(|| "-".to_string(), |p| p.calories.to_string()),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
