//! `cadence`: command-line client for the Cadence habit tracker.
//!
//! # Usage
//!
//! ```text
//! cadence --url http://localhost:7420 --user alice --password secret habits
//! cadence --config ~/.config/cadence/cli.toml check 3f2a --date 2024-05-01
//! ```
//!
//! Habits may be named by full id, id prefix, or exact (case-insensitive)
//! name.

mod client;

use anyhow::{Context, Result, bail};
use cadence_core::{
  habit::{Comparison, Habit, HabitKind, NewHabit},
  progress::{DayEntry, Progress, ProgressInput},
  schedule::{DayOfWeek, MonthDay, RepeatRule},
  streak::StreakHistory,
};
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Args as ClapArgs, Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cadence", about = "Command-line client for the Cadence habit tracker")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the cadence server (default: http://localhost:7420).
  #[arg(long, env = "CADENCE_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "CADENCE_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "CADENCE_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List habits, highest priority first.
  Habits {
    /// Show archived habits instead.
    #[arg(long)]
    archived: bool,
    /// Only one-off tasks.
    #[arg(long, conflicts_with = "no_tasks")]
    tasks: bool,
    /// Only repeating habits.
    #[arg(long)]
    no_tasks: bool,
  },
  /// Create a habit.
  Add(AddArgs),
  /// Toggle a yes-or-no habit for a day: done, then missed, then cleared.
  Check {
    habit: String,
    /// Defaults to today.
    #[arg(long)]
    date:  Option<NaiveDate>,
  },
  /// Log numeric, timed, or checklist progress for a day.
  Log(LogArgs),
  /// Show a habit's streak and completed runs.
  Streak { habit: String },
  Archive { habit: String },
  Unarchive { habit: String },
  /// Delete a habit and all of its history.
  Rm { habit: String },
  /// Show logged days.
  History {
    /// Defaults to six days before `--to`.
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Defaults to today.
    #[arg(long)]
    to:   Option<NaiveDate>,
  },
  /// List categories, or add one with `--add`.
  Categories {
    #[arg(long, value_name = "NAME")]
    add:   Option<String>,
    #[arg(long, default_value = "apps")]
    icon:  String,
    #[arg(long, default_value = "slateblue")]
    color: String,
  },
}

#[derive(ClapArgs, Debug)]
struct AddArgs {
  name: String,

  #[arg(long, default_value = "")]
  description: String,

  /// First scheduled day; defaults to today.
  #[arg(long)]
  start: Option<NaiveDate>,

  #[arg(long)]
  end: Option<NaiveDate>,

  /// Repeat on these weekdays, e.g. `mon,thu`.
  #[arg(long, value_delimiter = ',', group = "repeat")]
  weekdays: Vec<DayOfWeek>,

  /// Repeat on these days of the month, e.g. `1,15`.
  #[arg(long, value_delimiter = ',', group = "repeat")]
  monthdays: Vec<u32>,

  /// Repeat on these days of the year, e.g. `"March 3,December 24"`.
  #[arg(long, value_delimiter = ',', group = "repeat")]
  yeardays: Vec<MonthDay>,

  /// Do not repeat; a one-off on the start date.
  #[arg(long, group = "repeat")]
  once: bool,

  /// Numeric goal, e.g. `--count 8 --unit glasses`.
  #[arg(long, group = "kind")]
  count: Option<f64>,

  #[arg(long)]
  unit: Option<String>,

  /// Timer goal in minutes.
  #[arg(long, group = "kind")]
  minutes: Option<u32>,

  /// Checklist item; repeat for each item.
  #[arg(long = "item", group = "kind")]
  items: Vec<String>,

  /// How logged values compare to the goal.
  #[arg(long, default_value_t = Comparison::AtLeast)]
  comparison: Comparison,

  #[arg(long, default_value_t = 1)]
  priority: i32,

  /// List as a task rather than a habit.
  #[arg(long)]
  task: bool,

  #[arg(long)]
  category: Option<Uuid>,
}

#[derive(ClapArgs, Debug)]
#[command(group = ArgGroup::new("value").required(true))]
struct LogArgs {
  habit: String,

  /// Defaults to today.
  #[arg(long)]
  date: Option<NaiveDate>,

  #[arg(long, group = "value")]
  count: Option<f64>,

  /// Replace the logged time.
  #[arg(long, group = "value")]
  minutes: Option<u32>,

  /// Add to the time already logged.
  #[arg(long, group = "value")]
  add_minutes: Option<u32>,

  /// Ticked checklist items, zero-based, e.g. `0,2`.
  #[arg(long, value_delimiter = ',', group = "value")]
  tick: Vec<usize>,
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

const DEFAULT_URL: &str = "http://localhost:7420";

impl ConfigFile {
  /// Flags (or their env vars) win over the file, which wins over defaults.
  /// Empty file values count as unset.
  fn into_api_config(self, args: &Args) -> ApiConfig {
    fn pick(flag: Option<&String>, file: String) -> Option<String> {
      flag.cloned().or_else(|| (!file.is_empty()).then_some(file))
    }

    ApiConfig {
      base_url: pick(args.url.as_ref(), self.url).unwrap_or_else(|| DEFAULT_URL.to_string()),
      username: pick(args.user.as_ref(), self.username).unwrap_or_default(),
      password: pick(args.password.as_ref(), self.password).unwrap_or_default(),
    }
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let api_config = file_cfg.into_api_config(&args);
  tracing::debug!(url = %api_config.base_url, "connecting");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  let today = Local::now().date_naive();

  match command {
    Command::Habits {
      archived,
      tasks,
      no_tasks,
    } => {
      let filter = match (tasks, no_tasks) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
      };
      let habits = client.list_habits(archived, filter).await?;
      if habits.is_empty() {
        println!("no habits");
      }
      for habit in &habits {
        println!("{}", habit_line(habit));
      }
    }

    Command::Add(add) => {
      let habit = client.create_habit(&add.into_new_habit(today)?).await?;
      println!("created {}", habit_line(&habit));
    }

    Command::Check { habit, date } => {
      let id = resolve(client, &habit).await?;
      let date = date.unwrap_or(today);
      let outcome = client.record_progress(id, date, ProgressInput::Toggle).await?;
      let state = match &outcome.entry {
        Some(entry) if entry.completed => "done",
        Some(_) => "missed",
        None => "cleared",
      };
      println!("{date}: {state} (streak {})", outcome.analytics.streak());
    }

    Command::Log(log) => {
      let id = resolve(client, &log.habit).await?;
      let date = log.date.unwrap_or(today);
      let input = log.input()?;
      let outcome = client.record_progress(id, date, input).await?;
      let entry = outcome
        .entry
        .context("server cleared the day instead of logging it")?;
      println!(
        "{date}: {} {} (streak {})",
        progress_text(entry.progress.as_ref()),
        if entry.completed { "✓" } else { "✗" },
        outcome.analytics.streak()
      );
    }

    Command::Streak { habit } => {
      let id = resolve(client, &habit).await?;
      print_streak(&client.streak(id).await?);
    }

    Command::Archive { habit } => {
      let id = resolve(client, &habit).await?;
      let habit = client.set_archived(id, true).await?;
      println!("archived {}", habit.name);
    }

    Command::Unarchive { habit } => {
      let id = resolve(client, &habit).await?;
      let habit = client.set_archived(id, false).await?;
      println!("restored {}", habit.name);
    }

    Command::Rm { habit } => {
      let id = resolve(client, &habit).await?;
      client.delete_habit(id).await?;
      println!("deleted {id}");
    }

    Command::History { from, to } => {
      let to = to.unwrap_or(today);
      let from = from.unwrap_or(to - chrono::Days::new(6));
      let entries = client.history(from, to).await?;
      let names = habit_names(client).await?;
      print_history(&entries, &names);
    }

    Command::Categories { add, icon, color } => {
      if let Some(name) = add {
        let category = client.add_category(&name, &icon, &color).await?;
        println!("added {} ({})", category.name, category.category_id);
      } else {
        for c in client.list_categories().await? {
          let marker = if c.is_custom { "*" } else { " " };
          println!("{marker} {:<20} {:<20} {}", c.name, c.icon, c.category_id);
        }
      }
    }
  }

  Ok(())
}

// ─── Argument conversion ─────────────────────────────────────────────────────

impl AddArgs {
  fn into_new_habit(self, today: NaiveDate) -> Result<NewHabit> {
    let repeat = if self.once {
      RepeatRule::NoRepeat
    } else if !self.weekdays.is_empty() {
      RepeatRule::DaysOfWeek(self.weekdays.into_iter().collect())
    } else if !self.monthdays.is_empty() {
      RepeatRule::DaysOfMonth(self.monthdays.into_iter().collect())
    } else if !self.yeardays.is_empty() {
      RepeatRule::DaysOfYear(self.yeardays.into_iter().collect())
    } else {
      RepeatRule::EveryDay
    };

    let kind = if let Some(goal) = self.count {
      HabitKind::Numeric {
        goal,
        unit: self.unit.unwrap_or_default(),
        comparison: self.comparison,
      }
    } else if let Some(minutes) = self.minutes {
      HabitKind::Timer {
        goal_seconds: minutes
          .checked_mul(60)
          .context("timer goal is too large")?,
        comparison:   self.comparison,
      }
    } else if !self.items.is_empty() {
      HabitKind::Checklist { items: self.items }
    } else {
      HabitKind::YesOrNo
    };

    let habit = NewHabit {
      name: self.name,
      description: self.description,
      kind,
      category_id: self.category,
      repeat,
      start_date: self.start.unwrap_or(today),
      end_date: self.end,
      priority: self.priority,
      is_task: self.task,
    };
    habit.validate()?;
    Ok(habit)
  }
}

impl LogArgs {
  fn input(&self) -> Result<ProgressInput> {
    let seconds = |minutes: u32| minutes.checked_mul(60).context("too many minutes");
    if let Some(count) = self.count {
      Ok(ProgressInput::Count(count))
    } else if let Some(minutes) = self.minutes {
      Ok(ProgressInput::Time(seconds(minutes)?))
    } else if let Some(minutes) = self.add_minutes {
      Ok(ProgressInput::AddTime(seconds(minutes)?))
    } else if !self.tick.is_empty() {
      Ok(ProgressInput::Checklist(self.tick.clone()))
    } else {
      bail!("nothing to log; pass --count, --minutes, --add-minutes or --tick")
    }
  }
}

// ─── Habit lookup ────────────────────────────────────────────────────────────

/// Accept a full id, a unique id prefix, or an exact name.
async fn resolve(client: &ApiClient, key: &str) -> Result<Uuid> {
  if let Ok(id) = key.parse::<Uuid>() {
    return Ok(id);
  }

  let mut habits = client.list_habits(false, None).await?;
  habits.extend(client.list_habits(true, None).await?);

  let by_name: Vec<_> = habits
    .iter()
    .filter(|h| h.name.eq_ignore_ascii_case(key))
    .collect();
  if let [habit] = by_name.as_slice() {
    return Ok(habit.habit_id);
  }

  let key = key.to_ascii_lowercase();
  let by_prefix: Vec<_> = habits
    .iter()
    .filter(|h| h.habit_id.to_string().starts_with(&key))
    .collect();
  match by_prefix.as_slice() {
    [habit] => Ok(habit.habit_id),
    [] if by_name.is_empty() => bail!("no habit matches {key:?}"),
    _ => bail!("{key:?} is ambiguous; use more of the id"),
  }
}

async fn habit_names(client: &ApiClient) -> Result<Vec<(Uuid, String)>> {
  let mut habits = client.list_habits(false, None).await?;
  habits.extend(client.list_habits(true, None).await?);
  Ok(habits.into_iter().map(|h| (h.habit_id, h.name)).collect())
}

// ─── Output ──────────────────────────────────────────────────────────────────

fn short_id(id: Uuid) -> String { id.simple().to_string()[..8].to_owned() }

fn habit_line(habit: &Habit) -> String {
  let task = if habit.is_task { " [task]" } else { "" };
  format!(
    "{}  {:<24} {:<28} streak {}{task}",
    short_id(habit.habit_id),
    habit.name,
    habit.repeat.to_string(),
    habit.analytics.streak()
  )
}

fn progress_text(progress: Option<&Progress>) -> String {
  match progress {
    None => "-".to_owned(),
    Some(Progress::Done) => "done".to_owned(),
    Some(Progress::Count(n)) => n.to_string(),
    Some(Progress::Time(secs)) => format!("{}m{:02}s", secs / 60, secs % 60),
    Some(Progress::Checklist(ticked)) => format!("{} ticked", ticked.len()),
  }
}

fn print_streak(history: &StreakHistory) {
  println!("current streak: {}", history.streak());
  for span in history.intervals() {
    println!(
      "  occurrences {:>4}..={:<4} completed {}",
      span.start, span.end, span.completed
    );
  }
}

fn print_history(entries: &[DayEntry], names: &[(Uuid, String)]) {
  if entries.is_empty() {
    println!("nothing logged");
    return;
  }
  let mut current = None;
  for entry in entries {
    if current != Some(entry.date) {
      println!("{}", entry.date.format("%a %Y-%m-%d"));
      current = Some(entry.date);
    }
    let name = names
      .iter()
      .find(|(id, _)| *id == entry.habit_id)
      .map_or("(deleted)", |(_, n)| n.as_str());
    println!(
      "  {} {:<24} {}",
      if entry.completed { "✓" } else { "✗" },
      name,
      progress_text(entry.progress.as_ref())
    );
  }
}
