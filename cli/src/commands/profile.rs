use anyhow::Result;
use chrono::NaiveDate;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use bapsang_core::DietService;
use bapsang_core::models::{ProfileInput, format_kg};
use bapsang_core::service::ProfileReport;

use super::helpers::describe_error;

pub(crate) fn cmd_profile_set(
    svc: &DietService,
    user: &str,
    input: &ProfileInput,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let report = svc
        .set_profile(user, input, today)
        .map_err(|e| describe_error(e, user))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Saved profile for '{user}'");
        print_report(&report);
    }
    Ok(())
}

pub(crate) fn cmd_profile_show(
    svc: &DietService,
    user: &str,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let report = svc
        .profile_report(user, today)
        .map_err(|e| describe_error(e, user))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ProfileReport) {
    #[derive(Tabled)]
    struct FieldRow {
        #[tabled(rename = "Field")]
        field: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let p = &report.profile;
    let rows = vec![
        FieldRow {
            field: "Birth date",
            value: p.birth_date.format("%Y-%m-%d").to_string(),
        },
        FieldRow {
            field: "Age",
            value: report.age.to_string(),
        },
        FieldRow {
            field: "Gender",
            value: p.gender.as_str().to_string(),
        },
        FieldRow {
            field: "Height",
            value: format!("{} cm", format_kg(p.height_cm)),
        },
        FieldRow {
            field: "Weight",
            value: format!("{} kg", format_kg(p.weight_kg)),
        },
        FieldRow {
            field: "Goal weight",
            value: format!("{} kg", format_kg(p.goal_weight_kg)),
        },
        FieldRow {
            field: "BMR",
            value: format!("{:.1} kcal", p.bmr),
        },
        FieldRow {
            field: "Daily calories",
            value: format!("{} kcal", report.daily_calories),
        },
    ];

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
