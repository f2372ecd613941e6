use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use bapsang_core::DietService;
use bapsang_core::models::format_kg;

use super::helpers::{describe_error, truncate};

pub(crate) fn cmd_users(svc: &DietService, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct UserRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "User")]
        user: String,
        #[tabled(rename = "Gender")]
        gender: &'static str,
        #[tabled(rename = "Height")]
        height: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Goal")]
        goal: String,
        #[tabled(rename = "BMR")]
        bmr: String,
        #[tabled(rename = "Updated")]
        updated: String,
    }

    let profiles = svc
        .list_profiles()
        .map_err(|e| describe_error(e, "*"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    if profiles.is_empty() {
        eprintln!("No profiles stored yet.");
        return Ok(());
    }

    let rows: Vec<UserRow> = profiles
        .iter()
        .map(|p| UserRow {
            id: p.id,
            user: truncate(&p.user_key, 20),
            gender: p.gender.as_str(),
            height: format_kg(p.height_cm),
            weight: format_kg(p.weight_kg),
            goal: format_kg(p.goal_weight_kg),
            bmr: format!("{:.1}", p.bmr),
            updated: p.updated_on.format("%Y-%m-%d").to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!("{} profile(s)", profiles.len());

    Ok(())
}
