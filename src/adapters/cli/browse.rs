use std::io::{BufRead, Write};

use chrono::{Datelike, Local, NaiveDate};

use crate::application::{
    AppResult, FeedBoard, FeedKind, NavEvent, Navigator, Route, TaskService,
};
use crate::domain::{group_by_date, Task, TaskId};

/// Interactive line-driven session over the navigation state machine:
/// dashboard, task detail, date view and history, with load-more and delete
/// wired through the feed board.
pub async fn run_browse(service: &TaskService, board: &FeedBoard) -> AppResult<()> {
    match service.current_username() {
        "" => println!("taskboard (no username set; `--user` enables calendar grouping)"),
        user => println!("taskboard — signed in as {user}"),
    }

    let mut nav = Navigator::new();
    enter_route(service, board, nav.route()).await?;

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        line.clear();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break; // EOF
        }
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };

        let event = match command {
            "q" | "quit" => break,
            "help" => {
                print_help();
                continue;
            }
            "task" => match parts.next().and_then(|s| s.parse::<i64>().ok()) {
                Some(id) => Some(NavEvent::OpenTask(TaskId(id))),
                None => {
                    println!("usage: task <id>");
                    continue;
                }
            },
            "date" => match parts.next().and_then(|s| s.parse::<NaiveDate>().ok()) {
                Some(date) => Some(NavEvent::OpenDate(date)),
                None => {
                    println!("usage: date <yyyy-mm-dd>");
                    continue;
                }
            },
            "history" => Some(NavEvent::OpenHistory),
            "next" => Some(NavEvent::ShiftDate(1)),
            "prev" => Some(NavEvent::ShiftDate(-1)),
            "back" => Some(NavEvent::Back),
            "home" => Some(NavEvent::Home),
            "more" => {
                load_more(board, nav.route(), parts.next()).await;
                show_route(service, board, nav.route()).await?;
                continue;
            }
            "del" => {
                match parts.next().and_then(|s| s.parse::<i64>().ok()) {
                    Some(id) => match service.delete_task(TaskId(id)).await {
                        Ok(()) => {
                            println!("Deleted task {id}");
                            show_route(service, board, nav.route()).await?;
                        }
                        Err(e) => println!("Failed to delete task: {e}"),
                    },
                    None => println!("usage: del <id>"),
                }
                continue;
            }
            "cal" => {
                let (year, month) = match parts.next().map(parse_year_month) {
                    Some(Some(ym)) => ym,
                    Some(None) => {
                        println!("usage: cal <yyyy-mm>");
                        continue;
                    }
                    None => {
                        let today = Local::now().date_naive();
                        (today.year(), today.month())
                    }
                };
                match service.calendar_index(year, month).await {
                    Ok(index) => {
                        for (date, day) in &index {
                            if !day.has_any() {
                                continue;
                            }
                            println!(
                                "{date}  own: {:<3} other: {}",
                                day.own.len(),
                                day.other.len()
                            );
                        }
                    }
                    Err(e) => println!("Calendar fetch failed: {e}"),
                }
                continue;
            }
            "day" => {
                // Flat listing for one day, like clicking a calendar cell.
                match parts.next().and_then(|s| s.parse::<NaiveDate>().ok()) {
                    Some(date) => match service.tasks_on(date).await {
                        Ok(tasks) => {
                            println!("== All tasks on {date} ==");
                            if tasks.is_empty() {
                                println!("  (no tasks)");
                            }
                            for task in &tasks {
                                print_task_row(task);
                            }
                        }
                        Err(e) => println!("Day fetch failed: {e}"),
                    },
                    None => println!("usage: day <yyyy-mm-dd>"),
                }
                continue;
            }
            other => {
                println!("Unknown command: {other} (try `help`)");
                continue;
            }
        };

        if let Some(event) = event {
            let before = nav.route();
            let after = nav.dispatch(event);
            if after != before {
                enter_route(service, board, after).await?;
            }
        }
    }

    Ok(())
}

/// Entering a route resets its feeds (feed identity follows the route
/// parameter) and loads the first page.
async fn enter_route(service: &TaskService, board: &FeedBoard, route: Route) -> AppResult<()> {
    match route {
        Route::Dashboard => {
            board.reset(FeedKind::Mine, None);
            board.reset(FeedKind::OthersIncoming, Some(Local::now().date_naive()));
            board.load_next(FeedKind::Mine).await;
            // Manager-only; non-managers just get a logged 403 and an empty
            // section.
            board.load_next(FeedKind::OthersIncoming).await;
        }
        Route::DateTasks(date) => {
            board.reset(FeedKind::DateMine, Some(date));
            board.reset(FeedKind::DateOthers, Some(date));
            // One combined call fills both sub-feeds.
            board.load_next(FeedKind::DateMine).await;
        }
        Route::History => {
            board.reset(FeedKind::History, None);
            board.load_next(FeedKind::History).await;
        }
        Route::TaskDetail(_) => {}
    }
    show_route(service, board, route).await
}

async fn show_route(service: &TaskService, board: &FeedBoard, route: Route) -> AppResult<()> {
    match route {
        Route::Dashboard => {
            println!("== My Tasks ==");
            print_grouped(board, FeedKind::Mine);
            println!("== Others' Incoming ==");
            print_grouped(board, FeedKind::OthersIncoming);
        }
        Route::DateTasks(date) => {
            println!("== Tasks on {date} ==");
            println!("-- mine --");
            print_feed(board, FeedKind::DateMine);
            println!("-- others --");
            print_feed(board, FeedKind::DateOthers);
        }
        Route::History => {
            println!("== History ==");
            print_grouped(board, FeedKind::History);
        }
        Route::TaskDetail(id) => match service.get_task(id, true).await {
            Ok(task) => println!(
                "{}",
                serde_json::to_string_pretty(&task)
                    .unwrap_or_else(|_| "<unprintable>".to_string())
            ),
            Err(e) => println!("Failed to load task {id}: {e}"),
        },
    }
    Ok(())
}

async fn load_more(board: &FeedBoard, route: Route, section: Option<&str>) {
    let kind = match (route, section) {
        (Route::Dashboard, Some("others")) => FeedKind::OthersIncoming,
        (Route::Dashboard, _) => FeedKind::Mine,
        (Route::DateTasks(_), Some("others")) => FeedKind::DateOthers,
        (Route::DateTasks(_), _) => FeedKind::DateMine,
        (Route::History, _) => FeedKind::History,
        (Route::TaskDetail(_), _) => {
            println!("Nothing to load here");
            return;
        }
    };
    if !board.load_next(kind).await {
        println!("No more pages");
    }
}

fn print_grouped(board: &FeedBoard, kind: FeedKind) {
    let state = board.state(kind);
    if state.items.is_empty() {
        println!("  (no tasks)");
        return;
    }
    for bucket in group_by_date(&state.items) {
        println!("  {}", bucket.date);
        for task in &bucket.tasks {
            print!("  ");
            print_task_row(task);
        }
    }
    if state.has_more {
        println!("  ... more available (`more`)");
    }
}

fn print_feed(board: &FeedBoard, kind: FeedKind) {
    let state = board.state(kind);
    if state.items.is_empty() {
        println!("  (no tasks)");
        return;
    }
    for task in &state.items {
        print_task_row(task);
    }
    if state.has_more {
        println!("  ... more available (`more`)");
    }
}

fn print_task_row(task: &Task) {
    let done = if task.is_completed() { "x" } else { " " };
    println!(
        "  [{done}] #{:<5} {:<12} [{} / {}] {}",
        task.id, task.assigned_user, task.priority, task.status, task.description
    );
}

fn parse_year_month(s: &str) -> Option<(i32, u32)> {
    let (y, m) = s.split_once('-')?;
    Some((y.parse().ok()?, m.parse().ok()?))
}

fn print_help() {
    println!("Commands:");
    println!("  task <id>        open a task");
    println!("  date <date>      open a day (yyyy-mm-dd)");
    println!("  history          open task history");
    println!("  next / prev      shift the open day");
    println!("  back / home      navigate back / to the dashboard");
    println!("  more [others]    load the next page of the visible feed");
    println!("  del <id>         delete a task");
    println!("  cal [yyyy-mm]    calendar presence for a month");
    println!("  day <date>       flat list of everyone's tasks on a day");
    println!("  quit             exit");
}
