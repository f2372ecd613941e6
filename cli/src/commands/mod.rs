mod goal;
mod helpers;
mod menu;
mod profile;
mod users;
mod weight;

pub(crate) use helpers::parse_date;
pub(crate) use goal::{cmd_goal_history, cmd_goal_set};
pub(crate) use menu::cmd_menu;
pub(crate) use profile::{cmd_profile_set, cmd_profile_show};
pub(crate) use users::cmd_users;
pub(crate) use weight::{cmd_weight_history, cmd_weight_log};
