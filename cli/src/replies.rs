use std::fmt::Write;

use bapsang_core::models::{HistoryRecord, MealSlot, Profile, format_kg};
use bapsang_core::recommend::MenuPick;
use bapsang_core::service::{DailyMenu, ProfileReport, WeightChange};

use crate::kakao::{QuickReply, SkillResponse};

pub const MENU_HEADER: &str = "🧑🏻‍🍳 오늘의 식단";
pub const NO_MENU_FOUND: &str = "조건에 맞는 메뉴를 찾지 못했어요";
pub const EMPTY_WEIGHT_HISTORY: &str = "체중 변경 이력이 없어요.";
pub const MISSING_PROFILE: &str = "신체 정보 설정을 먼저 진행해주세요.";
pub const INVALID_INPUT_HEADER: &str = "⛔️입력에 실패하였습니다. 정확한 정보를 다시 입력해주세요.";

/// Round to one decimal place for display.
fn tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn body_summary(profile: &Profile, daily_calories: i64, age: u32) -> String {
    format!(
        "📏 키 {}cm\n⚖️ 체중 {}kg\n🎯 목표 체중 {}kg\n\n하루 권장 칼로리는 {daily_calories}kcal입니다.\n(나이 {age}세, 성별 {}자 기준)",
        format_kg(profile.height_cm),
        format_kg(profile.weight_kg),
        format_kg(profile.goal_weight_kg),
        profile.gender.label(),
    )
}

pub fn profile_saved(report: &ProfileReport) -> SkillResponse {
    let text = format!(
        "🔔 입력해주신 정보를 기반으로 매일 새로운 <오늘의 식단🧑🏻‍🍳>을 추천해드릴게요!\n\n{}",
        body_summary(&report.profile, report.daily_calories, report.age)
    );
    SkillResponse::text(text).with_quick_replies(vec![
        QuickReply::message("신체 정보 수정", "신체 정보를 수정하고 싶어요."),
        QuickReply::message("오늘의 식단🧑🏻‍🍳", "🧑🏻‍🍳 오늘의 식단을 추천해주세요!"),
    ])
}

pub fn profile_info(report: &ProfileReport) -> SkillResponse {
    SkillResponse::text(format!(
        "고객님의 정보를 알려드릴게요😃\n\n{}",
        body_summary(&report.profile, report.daily_calories, report.age)
    ))
}

pub fn weight_changed(change: &WeightChange) -> SkillResponse {
    let diff = tenth(change.difference());
    let movement = if diff > 0.0 {
        format!("+{}kg 증가했", format_kg(diff))
    } else if diff < 0.0 {
        format!("-{}kg 감소했", format_kg(diff.abs()))
    } else {
        "변동없".to_string()
    };
    let remaining = tenth(change.remaining_to_goal()).abs();
    let text = format!(
        "⚖️ 체중이 {}kg에서 {}kg로 {movement}어요!\n\n⚽️ 목표까지 {}kg 남았어요. 목표 달성까지 화이탱!",
        format_kg(change.previous_kg),
        format_kg(change.current_kg),
        format_kg(remaining),
    );
    SkillResponse::text(text).with_quick_replies(vec![
        QuickReply::message("목표 체중 수정", "목표를 수정할래요!"),
        QuickReply::message("체중 변화 살펴보기", "지금까지의 체중 변화를 보고싶어요!"),
    ])
}

pub fn goal_updated(profile: &Profile) -> SkillResponse {
    SkillResponse::text(format!(
        "🎯 목표 체중이 {}kg로 업데이트 되었습니다.",
        format_kg(profile.goal_weight_kg)
    ))
    .with_quick_replies(vec![QuickReply::message(
        "목표 변화 살펴보기",
        "지금까지 세웠던 목표를 살펴볼래요!",
    )])
}

/// One `YYMMDD value kg` line per record.
#[must_use]
pub fn history_lines(records: &[HistoryRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{} {}kg", r.date.format("%y%m%d"), format_kg(r.value_kg)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn weight_history(records: &[HistoryRecord]) -> SkillResponse {
    if records.is_empty() {
        return SkillResponse::text(EMPTY_WEIGHT_HISTORY);
    }
    SkillResponse::text(format!("⚖️ 체중 변경 히스토리 \n\n{}", history_lines(records)))
}

pub fn goal_history(records: &[HistoryRecord]) -> SkillResponse {
    SkillResponse::text(format!(
        "🎯 목표 체중 변경 히스토리 \n\n{}",
        history_lines(records)
    ))
}

fn slot_icon(slot: MealSlot) -> &'static str {
    match slot {
        MealSlot::Breakfast => "🍳",
        MealSlot::Lunch => "🌞",
        MealSlot::Dinner => "🍽️",
    }
}

fn pick_line(pick: Option<&MenuPick>) -> &str {
    pick.map_or(NO_MENU_FOUND, |p| p.display_name.as_str())
}

#[must_use]
pub fn menu_text(menu: &DailyMenu) -> String {
    let mut text = format!("{MENU_HEADER}\n\n");
    let _ = writeln!(
        text,
        "고객님의 현재 체중은 {}kg, 목표 체중은 {}kg이에요!",
        format_kg(menu.current_weight_kg),
        format_kg(menu.goal_weight_kg)
    );
    let _ = write!(
        text,
        "목표를 달성하기 위해 제안해드리는 하루 권장 칼로리는 {}kcal랍니다.",
        menu.budget.total
    );
    for slot in MealSlot::ALL {
        let _ = write!(
            text,
            "\n\n{} {} {}kcal\n﹡{}",
            slot_icon(slot),
            slot.label(),
            menu.budget.targets.for_slot(slot),
            pick_line(menu.plan.get(slot))
        );
    }
    text
}

pub fn today_menu(menu: &DailyMenu) -> SkillResponse {
    SkillResponse::text(menu_text(menu)).with_quick_replies(vec![QuickReply::message(
        "다른 식단 추천받기",
        "🧑🏻‍🍳 오늘의 식단 다시 추천해주세요!",
    )])
}

pub fn invalid_input(errors: &[String]) -> SkillResponse {
    SkillResponse::text(format!("{INVALID_INPUT_HEADER}\n\n{}", errors.join("\n")))
        .with_quick_replies(vec![
            QuickReply::message("신체 정보 수정", "신체 정보를 다시 입력하고 싶어요."),
            QuickReply::message("종료", "종료할래요."),
        ])
}

pub fn missing_profile() -> SkillResponse {
    SkillResponse::text(MISSING_PROFILE).with_quick_replies(vec![
        QuickReply::message("신체 정보 설정", "신체 정보를 설정할래요!"),
        QuickReply::message("종료", "종료"),
    ])
}
