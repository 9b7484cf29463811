use anyhow::{bail, Context};
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coinwatch_client::config::ClientConfig;
use coinwatch_client::jobs::live_update::{LiveEvent, LiveUpdateDriver, LiveUpdateHandle, PauseReason};
use coinwatch_client::services::push_channel::PushChannel;
use coinwatch_client::views::board::Board;
use coinwatch_client::views::detail::CoinDetail;
use coinwatch_client::views::favorites::favorite_cards;
use coinwatch_client::views::forms::{PasswordChangeForm, RegistrationForm};
use coinwatch_client::views::news::{categories, filter_news, ALL_CATEGORIES};
use coinwatch_client::views::notification::Notices;
use coinwatch_client::views::terminal;
use coinwatch_client::ClientState;

const USAGE: &str = "\
Usage: coinwatch <command> [args]

Commands:
  live                                   live price board
  login <email> <password>
  register <username> <email> <password> <confirm>
  logout
  profile
  update-profile <username> <email>
  change-password <current> <new> <confirm>
  coin <id>
  favorites
  favorite <id>
  unfavorite <id>
  news [category] [page] [size]";

const LIVE_HELP: &str = "n/p page  g N go to page  /text filter  *ID star  h/s hide/show  q quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coinwatch_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    };

    let config = ClientConfig::from_env().context("Invalid configuration")?;
    tracing::debug!("Using backend {}", config.api_url);
    let state = ClientState::from_config(config)?;
    let rest = &args[1..];

    match command.as_str() {
        "live" => run_live(state).await?,
        "login" => {
            let [email, password] = take_args::<2>(rest)?;
            state.backend.login(email, password).await?;
            println!("Logged in as {}", email);
            println!("{}", terminal::render_auth_gate(state.session.auth_gate()));
        }
        "register" => {
            let [username, email, password, confirm] = take_args::<4>(rest)?;
            let form = RegistrationForm {
                username: username.clone(),
                email: email.clone(),
                password: password.clone(),
                confirm_password: confirm.clone(),
            };
            form.validate()?;
            state.backend.register(username, email, password).await?;
            println!("Registration successful, you can now log in");
        }
        "logout" => {
            state.backend.logout().await?;
            println!("{}", terminal::render_auth_gate(state.session.auth_gate()));
        }
        "profile" => {
            let Some(profile) = state.backend.verify_session().await? else {
                bail!("Not logged in");
            };
            println!("Username: {}", profile.username);
            println!("Email:    {}", profile.email);
            if let Some(created) = profile.date_time_of_created {
                println!("Member since {}", created.format("%Y-%m-%d"));
            }
            let favorites = state.backend.list_favorites().await?;
            println!("{}", terminal::render_favorites(&favorite_cards(&favorites)));
        }
        "update-profile" => {
            let [username, email] = take_args::<2>(rest)?;
            let ack = state.backend.update_profile(username, email).await?;
            println!("{}", ack.message.unwrap_or_default());
        }
        "change-password" => {
            let [current, new, confirm] = take_args::<3>(rest)?;
            let form = PasswordChangeForm {
                current_password: current.clone(),
                new_password: new.clone(),
                confirm_password: confirm.clone(),
            };
            form.validate()?;
            println!("Password change is not available yet");
        }
        "coin" => {
            let [id] = take_args::<1>(rest)?;
            let coin = state.backend.get_currency(id).await?;
            println!("{}", terminal::render_detail(&CoinDetail::from_coin(&coin)));
        }
        "favorites" => {
            let favorites = state.backend.list_favorites().await?;
            println!("{}", terminal::render_favorites(&favorite_cards(&favorites)));
        }
        "favorite" => {
            let [id] = take_args::<1>(rest)?;
            state.backend.add_favorite(id).await?;
            let status = state.backend.favorite_status(id).await?;
            println!("{} favorite: {}", status.coin_id, status.is_favorite);
        }
        "unfavorite" => {
            let [id] = take_args::<1>(rest)?;
            state.backend.remove_favorite(id).await?;
            let favorites = state.backend.list_favorites().await?;
            println!("{}", terminal::render_favorites(&favorite_cards(&favorites)));
        }
        "news" => {
            let category = rest.first().map(String::as_str).unwrap_or(ALL_CATEGORIES);
            let page: u32 = parse_arg(rest.get(1), 0)?;
            let size: u32 = parse_arg(rest.get(2), 20)?;
            let news = state.backend.list_news(page, size).await?;
            println!("Categories: {} {}", ALL_CATEGORIES, categories(&news.content).join(" "));
            println!("{}", terminal::render_news(&filter_news(&news.content, category)));
            println!("Page {}/{} ({} items)", news.number + 1, news.total_pages.max(1), news.total_elements);
        }
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn take_args<const N: usize>(rest: &[String]) -> anyhow::Result<[&String; N]> {
    if rest.len() < N {
        bail!("Expected {} argument(s)\n\n{}", N, USAGE);
    }
    Ok(std::array::from_fn(|i| &rest[i]))
}

fn parse_arg(raw: Option<&String>, default: u32) -> anyhow::Result<u32> {
    match raw {
        Some(raw) => raw.parse().with_context(|| format!("Invalid number: {}", raw)),
        None => Ok(default),
    }
}

async fn run_live(state: ClientState) -> anyhow::Result<()> {
    let config = &state.config;
    let (handle, mut events, driver_task) =
        LiveUpdateDriver::spawn(Arc::new(state.backend.clone()), config.poll.clone());
    let push = config
        .push
        .clone()
        .map(|push_config| PushChannel::start(push_config, handle.clone()));

    let mut board = Board::new(config.rows_per_page, config.highlight_duration);
    let mut notices = Notices::default();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut refresh = tokio::time::interval(Duration::from_millis(250));
    let mut stdin_open = true;

    println!("{}", LIVE_HELP);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(LiveEvent::Coins { coins, .. }) => {
                    board.apply_fetch(coins, Instant::now());
                    draw(&board, &mut notices);
                }
                Some(LiveEvent::FetchFailed { error, retry_in, .. }) => {
                    let message = match retry_in {
                        Some(delay) => format!("Error loading data: {} (retrying in {:?})", error, delay),
                        None => format!("Error loading data: {}", error),
                    };
                    notices.error(message, Instant::now());
                    draw(&board, &mut notices);
                }
                Some(LiveEvent::Paused(PauseReason::FetchFailed)) => {
                    notices.error("Live updates paused, press s to resume", Instant::now());
                    draw(&board, &mut notices);
                }
                Some(LiveEvent::Paused(PauseReason::Hidden)) => println!("Live updates paused"),
                Some(LiveEvent::Activated) => println!("Live updates active"),
                Some(LiveEvent::Stopped) | None => break,
            },
            line = stdin.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !handle_command(line.trim(), &mut board, &handle, &mut notices) {
                        handle.stop();
                    }
                }
                None => {
                    stdin_open = false;
                    handle.stop();
                }
            },
            _ = refresh.tick() => {
                let now = Instant::now();
                if board.table_mut().expire_highlights(now) > 0 {
                    draw(&board, &mut notices);
                }
            }
        }
    }

    if let Some(push) = push {
        push.stop();
    }
    driver_task.await.context("Live update task failed")?;
    Ok(())
}

/// Returns false when the user asked to quit.
fn handle_command(line: &str, board: &mut Board, handle: &LiveUpdateHandle, notices: &mut Notices) -> bool {
    let now = Instant::now();
    match line {
        "" => return true,
        "q" => return false,
        "h" => handle.set_visible(false),
        "s" => handle.set_visible(true),
        "n" | "p" => {
            let delta = if line == "n" { 1 } else { -1 };
            if board.change_page(delta, now).is_none() {
                notices.error("No more pages", now);
            }
        }
        _ if line.starts_with("g ") => match line[2..].trim().parse::<usize>() {
            Ok(page) => {
                if board.go_to_page(page, now).is_none() {
                    notices.error(format!("Page {} does not exist", page), now);
                }
            }
            Err(_) => notices.error(format!("Invalid page: {}", &line[2..]), now),
        },
        _ if line.starts_with('/') => {
            board.set_query(&line[1..], now);
        }
        _ if line.starts_with('*') => {
            let id = line[1..].trim();
            if board.toggle_star(id) {
                notices.success(format!("Starred {}", id), now);
            } else {
                notices.success(format!("Unstarred {}", id), now);
            }
        }
        _ => {
            notices.error(format!("Unknown command: {} ({})", line, LIVE_HELP), now);
        }
    }
    draw(board, notices);
    true
}

fn draw(board: &Board, notices: &mut Notices) {
    let now = Instant::now();
    println!("{}", terminal::render_board(board, now));
    let active = notices.active(now);
    if !active.is_empty() {
        println!("{}", terminal::render_notices(active));
    }
}
