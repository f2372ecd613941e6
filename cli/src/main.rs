mod commands;
mod config;
mod kakao;
mod replies;
mod server;
mod telemetry;

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    cmd_goal_history, cmd_goal_set, cmd_menu, cmd_profile_set, cmd_profile_show, cmd_users,
    cmd_weight_history, cmd_weight_log, parse_date,
};
use crate::config::Config;
use bapsang_core::DietService;
use bapsang_core::models::ProfileInput;

#[derive(Parser)]
#[command(
    name = "bapsang",
    version,
    about = "Daily calorie budgets and meal picks, as a chatbot skill server or CLI",
    long_about = "\n\n   밥상 bapsang
        what should I eat today?
"
)]
struct Cli {
    /// User key the command acts on
    #[arg(short, long, global = true, default_value = "local")]
    user: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chatbot skill server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication on the admin endpoints
        #[arg(long)]
        no_auth: bool,
    },
    /// Set or show body information
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Track the goal weight
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Recommend today's breakfast, lunch and dinner
    Menu {
        /// Seed for a reproducible pick
        #[arg(long)]
        seed: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List every stored profile
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Store birth date, gender, height, weight and goal weight
    Set {
        /// Birth date as YYMMDD (or YYYYMMDD)
        #[arg(long)]
        birth_date: String,
        /// 남/남자 or 여/여자
        #[arg(long)]
        gender: String,
        /// Height in cm
        #[arg(long)]
        height: String,
        /// Current weight in kg
        #[arg(long)]
        weight: String,
        /// Goal weight in kg
        #[arg(long)]
        goal_weight: String,
        /// Date the profile is recorded on (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored profile with age and daily calories
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Record the current weight
    Log {
        /// Weight in kg
        value: String,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight history
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Change the goal weight
    Set {
        /// Goal weight in kg
        value: String,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show goal weight history
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let default_level = if matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    telemetry::init(config.log_level.as_deref().unwrap_or(default_level))?;

    let catalog = Arc::new(config.load_catalog()?);
    let svc = DietService::open(&config.db_path, config.energy, catalog)?;
    let user = cli.user.as_str();

    match cli.command {
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                let (key, created) = config.load_or_create_api_key()?;
                if created {
                    eprintln!("Generated admin API key: {key}");
                }
                Some(key)
            };
            server::start_server(svc, port, &bind, api_key).await
        }
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                birth_date,
                gender,
                height,
                weight,
                goal_weight,
                date,
                json,
            } => {
                let input = ProfileInput {
                    birth_date,
                    gender,
                    height,
                    weight,
                    goal_weight,
                };
                cmd_profile_set(&svc, user, &input, parse_date(date)?, json)
            }
            ProfileCommands::Show { json } => cmd_profile_show(&svc, user, parse_date(None)?, json),
        },
        Commands::Weight { command } => match command {
            WeightCommands::Log { value, date, json } => {
                cmd_weight_log(&svc, user, &value, parse_date(date)?, json)
            }
            WeightCommands::History { json } => cmd_weight_history(&svc, user, json),
        },
        Commands::Goal { command } => match command {
            GoalCommands::Set { value, date, json } => {
                cmd_goal_set(&svc, user, &value, parse_date(date)?, json)
            }
            GoalCommands::History { json } => cmd_goal_history(&svc, user, json),
        },
        Commands::Menu { seed, json } => cmd_menu(&svc, user, seed, json),
        Commands::Users { json } => cmd_users(&svc, json),
    }
}
