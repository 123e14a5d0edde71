use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

use graph_cal_bridge::{calendar::EventForm, sync::DateRange, SyncEngine};

pub const USAGE: &str = "\
Usage: graph-cal-bridge <command>

Commands:
  calendars <account>
  create-calendar <account> <name>
  delete-calendar <account> <calendar>
  categories <account>
  events <user> <YYYY-MM-DD> <YYYY-MM-DD>
  event <account> <calendar> <event>
  create-event <form.json>
  update-event <form.json>
  delete-event <account> <calendar> <event>";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Calendars { account_id: String },
    CreateCalendar { account_id: String, name: String },
    DeleteCalendar { account_id: String, calendar_id: String },
    Categories { account_id: String },
    Events { user_id: String, range: DateRange },
    Event { account_id: String, calendar_id: String, event_id: String },
    CreateEvent { form: PathBuf },
    UpdateEvent { form: PathBuf },
    DeleteEvent { account_id: String, calendar_id: String, event_id: String },
    Help,
}

pub fn parse_cli(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let Some(name) = args.next() else {
        return Ok(Command::Help);
    };

    let command = match name.as_str() {
        "calendars" => Command::Calendars {
            account_id: next_arg(&mut args, "account")?,
        },
        "create-calendar" => Command::CreateCalendar {
            account_id: next_arg(&mut args, "account")?,
            name: next_arg(&mut args, "name")?,
        },
        "delete-calendar" => Command::DeleteCalendar {
            account_id: next_arg(&mut args, "account")?,
            calendar_id: next_arg(&mut args, "calendar")?,
        },
        "categories" => Command::Categories {
            account_id: next_arg(&mut args, "account")?,
        },
        "events" => {
            let user_id = next_arg(&mut args, "user")?;
            let start = parse_date(&next_arg(&mut args, "start")?)?;
            let end = parse_date(&next_arg(&mut args, "end")?)?;
            if end < start {
                return Err(format!("End date {} is before start date {}", end, start));
            }
            Command::Events {
                user_id,
                range: DateRange::new(start, end),
            }
        }
        "event" => Command::Event {
            account_id: next_arg(&mut args, "account")?,
            calendar_id: next_arg(&mut args, "calendar")?,
            event_id: next_arg(&mut args, "event")?,
        },
        "create-event" => Command::CreateEvent {
            form: PathBuf::from(next_arg(&mut args, "form.json")?),
        },
        "update-event" => Command::UpdateEvent {
            form: PathBuf::from(next_arg(&mut args, "form.json")?),
        },
        "delete-event" => Command::DeleteEvent {
            account_id: next_arg(&mut args, "account")?,
            calendar_id: next_arg(&mut args, "calendar")?,
            event_id: next_arg(&mut args, "event")?,
        },
        "--help" | "-h" | "help" => Command::Help,
        _ => return Err(format!("Unknown command: {}", name)),
    };

    if let Some(extra) = args.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }

    Ok(command)
}

fn next_arg(args: &mut impl Iterator<Item = String>, name: &str) -> Result<String, String> {
    args.next()
        .ok_or_else(|| format!("Missing argument <{}>", name))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD.", value))
}

pub async fn run_command(command: Command, engine: &SyncEngine) -> anyhow::Result<()> {
    match command {
        Command::Calendars { account_id } => print_json(&engine.list_calendars(&account_id).await?),
        Command::CreateCalendar { account_id, name } => {
            print_json(&engine.create_calendar(&account_id, &name).await?)
        }
        Command::DeleteCalendar {
            account_id,
            calendar_id,
        } => {
            engine.delete_calendar(&account_id, &calendar_id).await?;
            print_json(&serde_json::json!({ "deleted": calendar_id }))
        }
        Command::Categories { account_id } => print_json(&engine.categories(&account_id).await?),
        Command::Events { user_id, range } => print_json(&engine.list_events(&user_id, range).await?),
        Command::Event {
            account_id,
            calendar_id,
            event_id,
        } => print_json(
            &engine
                .retrieve_event(&account_id, &calendar_id, &event_id)
                .await?,
        ),
        Command::CreateEvent { form } => {
            let form = read_form(&form)?;
            print_json(&engine.create_event(&form).await?)
        }
        Command::UpdateEvent { form } => {
            let form = read_form(&form)?;
            print_json(&engine.update_event(&form).await?)
        }
        Command::DeleteEvent {
            account_id,
            calendar_id,
            event_id,
        } => {
            engine
                .delete_event(&account_id, &calendar_id, &event_id)
                .await?;
            print_json(&serde_json::json!({ "deleted": event_id }))
        }
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
    }
}

fn read_form(path: &Path) -> anyhow::Result<EventForm> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event form {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid event form {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
