//! radar: CultureRadar terminal client
//!
//! Usage:
//!   radar login <email> <password>   - Sign in and persist the session
//!   radar logout                     - Clear the persisted session
//!   radar event <id>                 - Show an event and its time slots
//!   radar toggle <event> <slot>      - Toggle attendance on a time slot
//!   radar agenda [year month]        - Show the participation calendar
//!   radar rate <event> <1-5> [text]  - Rate a past event

use std::sync::Arc;

use chrono::{Datelike, Local};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use radar_agenda::{
    AgendaBackend, GatePolicy, ParticipationCoordinator, RatingFlow, ToggleOutcome, calendar,
};
use radar_api::{ApiClient, Credentials, Participation};
use radar_core::{Config, SessionManager, SessionUser};

enum Command {
    Login { email: String, password: String },
    Logout,
    Event { event_id: i64 },
    Toggle { event_id: i64, occurrence_id: i64 },
    Agenda { year: i32, month: u32 },
    Rate { event_id: i64, score: u8, comment: Option<String> },
    Help,
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let command = match parse_args() {
        Some(command) => command,
        None => {
            print_help();
            std::process::exit(2);
        }
    };

    match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("radar {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    let session = Arc::new(SessionManager::new(&config.session.db_path)?);
    let client = ApiClient::new(&config.api.base_url);
    debug!("Using API at {}", client.base_url());
    let backend: Arc<dyn AgendaBackend> = Arc::new(client.clone());

    match command {
        Command::Login { email, password } => {
            let response = client.login(&Credentials { email, password }).await?;
            let user = SessionUser {
                id: response.user.id,
                email: response.user.email,
                nom: response.user.nom,
                role: response.user.role,
            };
            session.login(response.access_token, user)?;
            println!("Connecté.");
        }
        Command::Logout => {
            session.logout()?;
            println!("Déconnecté.");
        }
        Command::Event { event_id } => {
            show_event(&config, backend, session, event_id).await?;
        }
        Command::Toggle {
            event_id,
            occurrence_id,
        } => {
            toggle_slot(&config, backend, session, event_id, occurrence_id).await?;
        }
        Command::Agenda { year, month } => {
            show_agenda(backend, session, year, month).await?;
        }
        Command::Rate {
            event_id,
            score,
            comment,
        } => {
            rate_event(&config, backend, session, event_id, score, comment).await?;
        }
        // handled before config load
        Command::Help | Command::Version => {}
    }

    Ok(())
}

async fn show_event(
    config: &Config,
    backend: Arc<dyn AgendaBackend>,
    session: Arc<SessionManager>,
    event_id: i64,
) -> anyhow::Result<()> {
    let gate = GatePolicy::new(&config.gating, &session);
    let coordinator = ParticipationCoordinator::new(backend, session, gate);
    coordinator.initialize(event_id).await?;

    let event = coordinator
        .event()
        .ok_or_else(|| anyhow::anyhow!("event {event_id} did not load"))?;
    println!("{} (#{})", event.titre, event.id);
    if let Some(lieu) = &event.lieu {
        let commune = event.commune.as_deref().unwrap_or("");
        println!("  {lieu} {commune}");
    }
    if let Some(description) = &event.description {
        println!("  {description}");
    }

    for group in coordinator.month_groups() {
        println!("\n{}:", group.label);
        for occ in &group.items {
            let mark = if coordinator.is_selected(occ.id) { "x" } else { " " };
            let local = occ.debut.with_timezone(&Local);
            println!("  [{mark}] #{} {}", occ.id, local.format("%d/%m/%Y %H:%M"));
        }
    }
    Ok(())
}

async fn toggle_slot(
    config: &Config,
    backend: Arc<dyn AgendaBackend>,
    session: Arc<SessionManager>,
    event_id: i64,
    occurrence_id: i64,
) -> anyhow::Result<()> {
    let gate = GatePolicy::new(&config.gating, &session);
    let coordinator = ParticipationCoordinator::new(backend, session, gate);
    coordinator.initialize(event_id).await?;

    match coordinator.toggle(occurrence_id).await {
        Ok(ToggleOutcome::Joined { .. }) => println!("Créneau ajouté à votre agenda."),
        Ok(ToggleOutcome::Cancelled) => println!("Créneau retiré de votre agenda."),
        Ok(ToggleOutcome::SlotInPast) => println!("Ce créneau est passé."),
        Ok(ToggleOutcome::AlreadyPending) | Ok(ToggleOutcome::Stale) => {}
        Err(e) => report(e),
    }
    Ok(())
}

async fn show_agenda(
    backend: Arc<dyn AgendaBackend>,
    session: Arc<SessionManager>,
    year: i32,
    month: u32,
) -> anyhow::Result<()> {
    let Some(token) = session.token() else {
        println!("Connecte-toi d'abord: radar login <email> <password>");
        return Ok(());
    };

    // future and past participations together fill the calendar
    let mut rows = backend.my_participations(&token, true).await?;
    rows.extend(backend.my_participations(&token, false).await?);

    let items_by_day = calendar::group_by_day(&rows, |p: &Participation| {
        p.occurrence_debut
            .map(|d| d.with_timezone(&Local).date_naive())
    });

    let today = Local::now().date_naive();
    let grid = calendar::build_month_grid(year, month, &items_by_day, today)
        .ok_or_else(|| anyhow::anyhow!("invalid month: {year}-{month}"))?;

    println!("{}", grid.label);
    println!("lu  ma  me  je  ve  sa  di");
    for week in grid.cells.chunks(7) {
        let row: Vec<String> = week
            .iter()
            .map(|cell| {
                if !cell.in_month {
                    "   ".to_string()
                } else {
                    let mark = if cell.items.is_empty() { ' ' } else { '*' };
                    format!("{:2}{}", cell.date.day(), mark)
                }
            })
            .collect();
        println!("{}", row.join(" "));
    }

    let selected = grid.selected;
    if let Some(items) = items_by_day.get(&selected) {
        println!("\n{} :", calendar::day_key(selected));
        for p in items {
            let titre = p.evenement_titre.as_deref().unwrap_or("(sans titre)");
            println!("  {} (participation {})", titre, p.id);
        }
    }
    Ok(())
}

async fn rate_event(
    config: &Config,
    backend: Arc<dyn AgendaBackend>,
    session: Arc<SessionManager>,
    event_id: i64,
    score: u8,
    comment: Option<String>,
) -> anyhow::Result<()> {
    let gate = GatePolicy::new(&config.gating, &session);
    let flow = RatingFlow::new(backend, session, gate);

    let summary = flow.load(event_id).await?;
    if let Some(mine) = &summary.mine {
        println!("Votre note actuelle : {}", mine.rating);
    }

    match flow.submit(event_id, Some(score), comment).await {
        Ok(average) => {
            let avg = average.average.unwrap_or(score as f64);
            println!("Note enregistrée. Moyenne : {:.1} ({} vote(s))", avg, average.count);
        }
        Err(e) => report(e),
    }
    Ok(())
}

fn report(error: radar_agenda::AgendaError) {
    if let Some(redirect) = error.redirect() {
        println!("Action refusée, rendez-vous sur {}", redirect.path());
    } else {
        println!("{}", error);
    }
}

fn parse_args() -> Option<Command> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut it = args.iter();

    let command = match it.next().map(String::as_str) {
        Some("login") => Command::Login {
            email: it.next()?.clone(),
            password: it.next()?.clone(),
        },
        Some("logout") => Command::Logout,
        Some("event") => Command::Event {
            event_id: it.next()?.parse().ok()?,
        },
        Some("toggle") => Command::Toggle {
            event_id: it.next()?.parse().ok()?,
            occurrence_id: it.next()?.parse().ok()?,
        },
        Some("agenda") => {
            let today = Local::now().date_naive();
            let year = match it.next() {
                Some(y) => y.parse().ok()?,
                None => today.year(),
            };
            let month = match it.next() {
                Some(m) => m.parse().ok()?,
                None => today.month(),
            };
            Command::Agenda { year, month }
        }
        Some("rate") => {
            let event_id = it.next()?.parse().ok()?;
            let score = it.next()?.parse().ok()?;
            let rest: Vec<String> = it.cloned().collect();
            let comment = if rest.is_empty() {
                None
            } else {
                Some(rest.join(" "))
            };
            Command::Rate {
                event_id,
                score,
                comment,
            }
        }
        Some("--help") | Some("-h") | Some("help") => Command::Help,
        Some("--version") | Some("-v") => Command::Version,
        _ => return None,
    };
    Some(command)
}

fn print_help() {
    println!("radar - CultureRadar terminal client");
    println!();
    println!("Usage:");
    println!("  radar login <email> <password>   Sign in and persist the session");
    println!("  radar logout                     Clear the persisted session");
    println!("  radar event <id>                 Show an event and its time slots");
    println!("  radar toggle <event> <slot>      Toggle attendance on a time slot");
    println!("  radar agenda [year month]        Show the participation calendar");
    println!("  radar rate <event> <1-5> [text]  Rate a past event");
    println!();
    println!("Environment Variables:");
    println!("  RADAR_API_BASE               API base URL");
    println!("  RADAR_REQUIRE_SUBSCRIPTION   Gate slot toggles on a subscription");
    println!("  RADAR_SESSION_DB             Path to the local session database");
}
