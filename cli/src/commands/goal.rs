use anyhow::Result;
use chrono::NaiveDate;

use bapsang_core::DietService;
use bapsang_core::models::format_kg;

use super::helpers::{describe_error, print_history_table};

pub(crate) fn cmd_goal_set(
    svc: &DietService,
    user: &str,
    value: &str,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let profile = svc
        .update_goal_weight(user, value, date)
        .map_err(|e| describe_error(e, user))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!(
            "Goal weight set to {} kg (current {} kg)",
            format_kg(profile.goal_weight_kg),
            format_kg(profile.weight_kg)
        );
    }

    Ok(())
}

pub(crate) fn cmd_goal_history(svc: &DietService, user: &str, json: bool) -> Result<()> {
    let records = svc
        .goal_history(user)
        .map_err(|e| describe_error(e, user))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        eprintln!("No goal changes recorded.");
    } else {
        print_history_table(&records, "Goal (kg)");
    }

    Ok(())
}
