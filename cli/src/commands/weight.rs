use anyhow::Result;
use chrono::NaiveDate;

use bapsang_core::DietService;
use bapsang_core::models::format_kg;

use super::helpers::{describe_error, print_history_table, tidy};

pub(crate) fn cmd_weight_log(
    svc: &DietService,
    user: &str,
    value: &str,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let change = svc
        .update_weight(user, value, date)
        .map_err(|e| describe_error(e, user))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&change)?);
    } else {
        let diff = tidy(change.difference());
        println!(
            "Logged {} kg for {} ({}{} kg)",
            format_kg(change.current_kg),
            date.format("%Y-%m-%d"),
            if diff > 0.0 { "+" } else { "" },
            format_kg(diff),
        );
        let remaining = tidy(change.remaining_to_goal());
        if remaining.abs() < f64::EPSILON {
            println!("  Goal of {} kg reached", format_kg(change.goal_kg));
        } else {
            println!(
                "  {} kg to go (goal {} kg)",
                format_kg(remaining.abs()),
                format_kg(change.goal_kg)
            );
        }
    }

    Ok(())
}

pub(crate) fn cmd_weight_history(svc: &DietService, user: &str, json: bool) -> Result<()> {
    let records = svc
        .weight_history(user)
        .map_err(|e| describe_error(e, user))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        eprintln!("No weight entries found. Use `bapsang weight log` to record your weight.");
    } else {
        print_history_table(&records, "Weight (kg)");
    }

    Ok(())
}
