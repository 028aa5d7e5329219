use clap::{Arg, ArgAction, Command};
use color_eyre::Result;
use std::sync::Arc;

mod adapters;
mod application;
mod domain;
mod ports;

use adapters::{
    api::{ApiClient, HttpTaskRepository},
    cache::TaskCache,
    cli::run_browse,
    config::{FileConfigStore, TokenStore},
};
use application::{AppError, FeedBoard, FeedKind, TaskService};
use domain::{group_by_date, TaskDraft, TaskId, TaskPatch, TaskPriority, TaskStatus};
use ports::{ConfigStore, TaskRepository};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Log to file; stdout is reserved for command output.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("taskboard-cli.log")?;

    tracing_subscriber::fmt()
        .with_writer(Arc::new(log_file))
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let matches = build_cli().get_matches();

    let config_store = Arc::new(FileConfigStore::new().map_err(AppError::from)?);
    let mut config = config_store.load_config().await.map_err(AppError::from)?;

    // Command line overrides are persisted, like the rest of the config.
    if let Some(url) = matches.get_one::<String>("api-url") {
        config.api_base_url = url.clone();
    }
    if let Some(user) = matches.get_one::<String>("user") {
        config.username = Some(user.clone());
    }
    config_store
        .save_config(&config)
        .await
        .map_err(AppError::from)?;

    let tokens = Arc::new(TokenStore::new(
        config_store.get_api_token().await.map_err(AppError::from)?,
    ));

    // Credential lifecycle commands run before any API wiring.
    match matches.subcommand() {
        Some(("login", login_matches)) => {
            let token = login_matches
                .get_one::<String>("token")
                .cloned()
                .or_else(|| std::env::var("TASKBOARD_TOKEN").ok())
                .ok_or_else(|| {
                    eprintln!("No token given. Pass --token or set TASKBOARD_TOKEN.");
                    AppError::AuthenticationRequired
                })?;
            config_store
                .set_api_token(&token)
                .await
                .map_err(AppError::from)?;
            tokens.set(token);
            println!("Token stored.");
            return Ok(());
        }
        Some(("logout", _)) => {
            config_store
                .clear_api_token()
                .await
                .map_err(AppError::from)?;
            tokens.clear();
            println!("Token cleared.");
            return Ok(());
        }
        _ => {}
    }

    let api_client = ApiClient::new(config.api_base_url.clone(), tokens);
    let repo: Arc<dyn TaskRepository> = Arc::new(HttpTaskRepository::new(api_client));
    let board = Arc::new(FeedBoard::new(repo.clone(), config.page_size));
    let service = TaskService::new(
        repo,
        board.clone(),
        TaskCache::new(config.cache_ttl_seconds),
        config.username.clone().unwrap_or_default(),
    );

    match matches.subcommand() {
        Some(("tasks", tasks_matches)) => match tasks_matches.subcommand() {
            Some(("list", m)) => {
                board.reset(FeedKind::Mine, None);
                load(&board, FeedKind::Mine, m.get_flag("all")).await;
                print_feed(&board, FeedKind::Mine, m.get_flag("grouped"))?;
            }
            Some(("others", m)) => {
                board.reset(
                    FeedKind::OthersIncoming,
                    Some(chrono::Local::now().date_naive()),
                );
                load(&board, FeedKind::OthersIncoming, m.get_flag("all")).await;
                print_feed(&board, FeedKind::OthersIncoming, m.get_flag("grouped"))?;
            }
            Some(("history", m)) => {
                board.reset(FeedKind::History, None);
                load(&board, FeedKind::History, m.get_flag("all")).await;
                print_feed(&board, FeedKind::History, m.get_flag("grouped"))?;
            }
            Some(("date", m)) => {
                let date: chrono::NaiveDate = parse_arg(m, "date")?;
                board.reset(FeedKind::DateMine, Some(date));
                board.reset(FeedKind::DateOthers, Some(date));
                if m.get_flag("all") {
                    board.load_all(FeedKind::DateMine).await;
                    board.load_all(FeedKind::DateOthers).await;
                } else {
                    // One combined call fills both sub-feeds.
                    board.load_next(FeedKind::DateMine).await;
                }
                let out = serde_json::json!({
                    "userTasks": board.tasks(FeedKind::DateMine),
                    "otherTasks": board.tasks(FeedKind::DateOthers),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            Some(("get", m)) => {
                let id = TaskId(parse_arg(m, "id")?);
                let task = service.get_task(id, false).await?;
                println!("{}", serde_json::to_string_pretty(&task)?);
            }
            Some(("assign", m)) => {
                let draft = TaskDraft {
                    assigned_user: m.get_one::<String>("to").cloned().expect("required"),
                    date: parse_arg(m, "date")?,
                    description: m
                        .get_one::<String>("description")
                        .cloned()
                        .expect("required"),
                    status: opt_parse::<TaskStatus>(m, "status")?.unwrap_or(TaskStatus::Pending),
                    priority: opt_parse::<TaskPriority>(m, "priority")?
                        .unwrap_or(TaskPriority::Medium),
                };
                let created = service.assign(&draft).await?;
                println!("{}", serde_json::to_string_pretty(&created)?);
            }
            Some(("update", m)) => {
                let id = TaskId(parse_arg(m, "id")?);
                let patch = TaskPatch {
                    assigned_user: m.get_one::<String>("to").cloned(),
                    date: opt_parse(m, "date")?,
                    description: m.get_one::<String>("description").cloned(),
                    status: opt_parse(m, "status")?,
                    priority: opt_parse(m, "priority")?,
                };
                let updated = service.update_task(id, &patch).await?;
                println!("{}", serde_json::to_string_pretty(&updated)?);
            }
            Some(("delete", m)) => {
                let id = TaskId(parse_arg(m, "id")?);
                service.delete_task(id).await?;
                println!("Deleted task {id}");
            }
            _ => {
                eprintln!("Unknown tasks subcommand (see --help)");
                std::process::exit(1);
            }
        },
        Some(("calendar", m)) => {
            let month_arg = m.get_one::<String>("month").expect("required");
            let (year, month) = month_arg
                .split_once('-')
                .and_then(|(y, mo)| Some((y.parse().ok()?, mo.parse().ok()?)))
                .ok_or_else(|| AppError::Application(format!("invalid month: {month_arg}")))?;
            let index = service.calendar_index(year, month).await?;
            println!("{}", serde_json::to_string_pretty(&index)?);
        }
        Some(("staff", _)) => {
            let mut staff = service.staff().await?;
            // Managers first, server order otherwise.
            staff.sort_by_key(|s| !s.is_manager());
            println!("{}", serde_json::to_string_pretty(&staff)?);
        }
        Some(("browse", _)) | None => {
            run_browse(&service, &board).await?;
        }
        _ => {
            eprintln!("Unknown command (see --help)");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn load(board: &FeedBoard, kind: FeedKind, all: bool) {
    if all {
        board.load_all(kind).await;
    } else {
        board.load_next(kind).await;
    }
}

fn print_feed(board: &FeedBoard, kind: FeedKind, grouped: bool) -> Result<()> {
    let tasks = board.tasks(kind);
    if grouped {
        println!("{}", serde_json::to_string_pretty(&group_by_date(&tasks))?);
    } else {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    }
    Ok(())
}

fn parse_arg<T>(matches: &clap::ArgMatches, name: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = matches.get_one::<String>(name).expect("required arg");
    raw.parse()
        .map_err(|e| AppError::Application(format!("invalid {name} `{raw}`: {e}")))
}

fn opt_parse<T>(matches: &clap::ArgMatches, name: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match matches.get_one::<String>(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| AppError::Application(format!("invalid {name} `{raw}`: {e}"))),
        None => Ok(None),
    }
}

fn build_cli() -> Command {
    let all = Arg::new("all")
        .long("all")
        .action(ArgAction::SetTrue)
        .help("Drain every page instead of only the first");
    let grouped = Arg::new("grouped")
        .long("grouped")
        .action(ArgAction::SetTrue)
        .help("Group output into date buckets");

    Command::new("taskboard")
        .version("0.1.0")
        .about("A terminal client for the task-assignment backend")
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .value_name("URL")
                .help("API base URL (persisted)")
                .global(true),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("USERNAME")
                .help("Username used to classify calendar tasks (persisted)")
                .global(true),
        )
        .subcommand(
            Command::new("login").about("Store the API bearer token").arg(
                Arg::new("token")
                    .long("token")
                    .value_name("TOKEN")
                    .help("Bearer token (or set TASKBOARD_TOKEN)"),
            ),
        )
        .subcommand(Command::new("logout").about("Clear the stored token"))
        .subcommand(
            Command::new("tasks")
                .about("Task operations")
                .subcommand(
                    Command::new("list")
                        .about("List your upcoming tasks")
                        .arg(all.clone())
                        .arg(grouped.clone()),
                )
                .subcommand(
                    Command::new("others")
                        .about("List others' incoming tasks (managers)")
                        .arg(all.clone())
                        .arg(grouped.clone()),
                )
                .subcommand(
                    Command::new("history")
                        .about("List past tasks")
                        .arg(all.clone())
                        .arg(grouped),
                )
                .subcommand(
                    Command::new("date")
                        .about("List tasks for one day (yours and others')")
                        .arg(Arg::new("date").required(true).value_name("YYYY-MM-DD"))
                        .arg(all),
                )
                .subcommand(
                    Command::new("get")
                        .about("Fetch a single task")
                        .arg(Arg::new("id").required(true)),
                )
                .subcommand(
                    Command::new("assign")
                        .about("Assign a new task")
                        .arg(Arg::new("to").long("to").required(true).value_name("USER"))
                        .arg(
                            Arg::new("date")
                                .long("date")
                                .required(true)
                                .value_name("YYYY-MM-DD"),
                        )
                        .arg(
                            Arg::new("description")
                                .long("desc")
                                .required(true)
                                .value_name("TEXT"),
                        )
                        .arg(Arg::new("status").long("status").value_name("STATUS"))
                        .arg(Arg::new("priority").long("priority").value_name("PRIORITY")),
                )
                .subcommand(
                    Command::new("update")
                        .about("Update fields of a task")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("to").long("to").value_name("USER"))
                        .arg(Arg::new("date").long("date").value_name("YYYY-MM-DD"))
                        .arg(Arg::new("description").long("desc").value_name("TEXT"))
                        .arg(Arg::new("status").long("status").value_name("STATUS"))
                        .arg(Arg::new("priority").long("priority").value_name("PRIORITY")),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a task")
                        .arg(Arg::new("id").required(true)),
                ),
        )
        .subcommand(
            Command::new("calendar")
                .about("Month presence index for calendar highlighting")
                .arg(Arg::new("month").required(true).value_name("YYYY-MM")),
        )
        .subcommand(Command::new("staff").about("List staff members"))
        .subcommand(Command::new("browse").about("Interactive session (default)"))
}
