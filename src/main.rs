use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;
use taskquest::filter::{self, Filter};
use taskquest::timer::{CRITICAL_SECS, WARNING_SECS};
use taskquest::{
    Action, Config, DraftEdit, FileStorage, MemoryStorage, Outcome, Priority, Session, StorageKind, Task, TaskDraft,
    TaskStore, Ticker, Urgency,
};
use tracing::Level;

#[derive(Parser)]
#[command(name = "taskquest")]
#[command(about = "taskquest - timed task tracker with a persistent task blob")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Directory holding the task blob (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session length in seconds (overrides config)
    #[arg(long)]
    duration: Option<u64>,

    /// Keep tasks in memory only
    #[arg(long)]
    memory: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks
    List {
        /// Case-insensitive search over title, description and priority
        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long)]
        priority: Option<Priority>,

        /// Only completed tasks
        #[arg(long, conflicts_with = "pending")]
        completed: bool,

        /// Only pending tasks
        #[arg(long)]
        pending: bool,
    },

    /// Add a task
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long, default_value = "medium")]
        priority: Priority,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_due)]
        due: Option<DateTime<Utc>>,
    },

    /// Edit a task by id (or unique id prefix)
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        priority: Option<Priority>,

        #[arg(long, value_parser = parse_due)]
        due: Option<DateTime<Utc>>,

        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        no_due: bool,
    },

    /// Toggle a task's completed flag
    Toggle { id: String },

    /// Delete a task
    Delete { id: String },

    /// Delete every task
    Clear,

    /// Show task counts
    Stats,

    /// Run an interactive timed session
    Session,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let config = load_config(&cli)?;
    let mut session = open_session(&config)?;

    match cli.command {
        Commands::List {
            query,
            priority,
            completed,
            pending,
        } => {
            let mut filters = Vec::new();
            if let Some(query) = query {
                filters.push(Filter::Text(query));
            }
            if let Some(priority) = priority {
                filters.push(Filter::Priority(priority));
            }
            if completed {
                filters.push(Filter::Completed);
            }
            if pending {
                filters.push(Filter::Pending);
            }

            let tasks = filter::filter_all(session.store().tasks(), &filters);
            if tasks.is_empty() {
                println!("No tasks found");
            }
            for task in tasks {
                print_task(task);
            }
        }
        Commands::Add {
            title,
            description,
            priority,
            due,
        } => {
            let draft = TaskDraft {
                title,
                description: description.unwrap_or_default(),
                priority: Some(priority),
                due_date: due,
            };
            expect_applied(session.apply(Action::SubmitForm(draft)))?;
            if let Some(task) = session.store().tasks().last() {
                println!("Added task {}", task.id);
            }
        }
        Commands::Edit {
            id,
            title,
            description,
            priority,
            due,
            no_due,
        } => {
            let id = resolve_id(&session, &id);
            if session.apply(Action::BeginEdit(id.clone())) == Outcome::Ignored {
                return Err(eyre!("Task not found: {}", id));
            }

            let mut edits = Vec::new();
            if let Some(title) = title {
                edits.push(DraftEdit::Title(title));
            }
            if let Some(description) = description {
                edits.push(DraftEdit::Description(description));
            }
            if let Some(priority) = priority {
                edits.push(DraftEdit::Priority(Some(priority)));
            }
            if due.is_some() || no_due {
                edits.push(DraftEdit::DueDate(due));
            }
            for edit in edits {
                session.apply(Action::EditDraft(edit));
            }

            expect_applied(session.apply(Action::SubmitDraft))?;
            println!("Updated task {}", id);
        }
        Commands::Toggle { id } => {
            let id = resolve_id(&session, &id);
            if session.apply(Action::ToggleComplete(id.clone())) == Outcome::Ignored {
                return Err(eyre!("Task not found: {}", id));
            }
            if let Some(task) = session.store().find_by_id(&id) {
                print_task(task);
            }
        }
        Commands::Delete { id } => {
            let id = resolve_id(&session, &id);
            if session.apply(Action::DeleteTask(id.clone())) == Outcome::Ignored {
                return Err(eyre!("Task not found: {}", id));
            }
            println!("Deleted task {}", id);
        }
        Commands::Clear => {
            session.apply(Action::ResetSession);
            println!("All tasks deleted");
        }
        Commands::Stats => {
            let stats = session.view().stats;
            println!("Total:     {}", stats.total);
            println!("Pending:   {}", stats.pending);
            println!("Completed: {}", stats.completed);
        }
        Commands::Session => run_session(&mut session, config.tick_interval())?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(duration) = cli.duration {
        config.session_seconds = duration;
    }
    if cli.memory {
        config.storage = StorageKind::Memory;
    }
    Ok(config)
}

fn open_session(config: &Config) -> Result<Session> {
    let store = match config.storage {
        StorageKind::File => {
            let storage = FileStorage::open(config.data_dir()).context("Failed to open task storage")?;
            TaskStore::open(storage)
        }
        StorageKind::Memory => TaskStore::open(MemoryStorage::new()),
    };
    Ok(Session::new(store, config.session_seconds))
}

fn expect_applied(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Rejected(errors) => Err(eyre!("Invalid task: {}", errors)),
        _ => Ok(()),
    }
}

/// Expand a unique id prefix to the full id; anything else is returned as typed
fn resolve_id(session: &Session, input: &str) -> String {
    let mut matches = session.store().tasks().iter().filter(|t| t.id.starts_with(input));
    match (matches.next(), matches.next()) {
        (Some(task), None) => task.id.clone(),
        _ => input.to_string(),
    }
}

fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| format!("Invalid date: {}", s));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("Invalid date: {} (expected YYYY-MM-DD)", s))
}

fn print_task(task: &Task) {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let title = if task.completed {
        task.title.strikethrough().dimmed().to_string()
    } else {
        task.title.bold().to_string()
    };
    let priority = match task.priority {
        Priority::High => task.priority.label().red(),
        Priority::Medium => task.priority.label().yellow(),
        Priority::Low => task.priority.label().green(),
    };

    print!("{} {} ({})", check, title, priority);
    if let Some(due) = task.due_date {
        print!("  due {}", due.with_timezone(&Local).format("%d/%m/%Y"));
    }
    println!("  {}", task.id.dimmed());

    if let Some(description) = &task.description {
        println!("      {}", description);
    }
}

// ============================================================================
// Interactive session
// ============================================================================

enum Event {
    Line(String),
    /// Carries the generation of the ticker that sent it
    Tick(u64),
    Eof,
}

/// The running ticker plus a generation counter
///
/// Cancelling does not drain ticks already sitting in the channel, so every
/// schedule or cancel bumps the generation and ticks from older ones are dropped.
struct TickSchedule {
    ticker: Option<Ticker>,
    generation: u64,
}

impl TickSchedule {
    fn new() -> Self {
        Self {
            ticker: None,
            generation: 0,
        }
    }

    fn schedule(&mut self, interval: Duration, tx: &Sender<Event>) {
        self.cancel();
        let generation = self.generation;
        self.ticker = Some(Ticker::start(interval, tx.clone(), move || Event::Tick(generation)));
    }

    fn cancel(&mut self) {
        if let Some(mut old) = self.ticker.take() {
            old.cancel();
        }
        self.generation += 1;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.ticker.is_some() && generation == self.generation
    }
}

enum ShellCommand {
    Act(Action),
    List,
    Time,
    Help,
    Quit,
}

fn run_session(session: &mut Session, interval: Duration) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    let input = tx.clone();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if input.send(Event::Line(line)).is_err() {
                return;
            }
        }
        let _ = input.send(Event::Eof);
    });

    let mut ticks = TickSchedule::new();
    print_help();
    render(session);

    loop {
        match rx.recv().context("Event channel closed")? {
            Event::Tick(generation) => {
                if !ticks.is_current(generation) {
                    continue;
                }
                let outcome = session.apply(Action::Tick);
                match outcome {
                    Outcome::Ignored => continue,
                    Outcome::CancelTicks => println!("{}", "Time is up!".red().bold()),
                    _ => {
                        let remaining = session.timer().remaining();
                        if remaining == WARNING_SECS || remaining == CRITICAL_SECS {
                            println!("{}", format!("{} remaining", session.timer().display()).yellow());
                        }
                    }
                }
                handle_outcome(outcome, &mut ticks, &tx, interval);
            }
            Event::Line(line) => match parse_command(session, &line) {
                Ok(ShellCommand::Quit) => break,
                Ok(ShellCommand::Help) => print_help(),
                Ok(ShellCommand::List) => render(session),
                Ok(ShellCommand::Time) => print_time(session),
                Ok(ShellCommand::Act(action)) => {
                    let outcome = session.apply(action);
                    handle_outcome(outcome, &mut ticks, &tx, interval);
                    render(session);
                }
                Err(msg) => println!("{}", msg.red()),
            },
            Event::Eof => break,
        }
    }

    ticks.cancel();
    Ok(())
}

fn handle_outcome(outcome: Outcome, ticks: &mut TickSchedule, tx: &Sender<Event>, interval: Duration) {
    match outcome {
        Outcome::ScheduleTicks => ticks.schedule(interval, tx),
        Outcome::CancelTicks => ticks.cancel(),
        Outcome::Rejected(errors) => {
            for (field, msg) in errors.iter() {
                println!("{} {}", format!("{}:", field.as_str()).red(), msg);
            }
        }
        Outcome::Ignored => println!("{}", "Nothing to do".dimmed()),
        Outcome::Applied => {}
    }
}

fn parse_command(session: &Session, line: &str) -> Result<ShellCommand, String> {
    let trimmed = line.trim_start();
    let (cmd, rest) = match trimmed.split_once(' ') {
        Some((cmd, rest)) => (cmd, rest),
        None => (trimmed.trim_end(), ""),
    };
    let arg = rest.trim();

    let require = |what: &str| -> Result<String, String> {
        if arg.is_empty() {
            Err(format!("Usage: {} <{}>", cmd, what))
        } else {
            Ok(resolve_id(session, arg))
        }
    };

    let command = match cmd {
        "start" => ShellCommand::Act(Action::StartSession),
        "reset" => ShellCommand::Act(Action::ResetSession),
        "add" => ShellCommand::Act(Action::BeginAdd),
        "edit" => ShellCommand::Act(Action::BeginEdit(require("id")?)),
        "toggle" => ShellCommand::Act(Action::ToggleComplete(require("id")?)),
        "delete" => ShellCommand::Act(Action::DeleteTask(require("id")?)),
        "title" => ShellCommand::Act(Action::EditDraft(DraftEdit::Title(arg.to_string()))),
        "desc" => ShellCommand::Act(Action::EditDraft(DraftEdit::Description(arg.to_string()))),
        "priority" => {
            let priority = arg.parse::<Priority>()?;
            ShellCommand::Act(Action::EditDraft(DraftEdit::Priority(Some(priority))))
        }
        "due" => {
            let due = match arg {
                "" | "none" => None,
                value => Some(parse_due(value)?),
            };
            ShellCommand::Act(Action::EditDraft(DraftEdit::DueDate(due)))
        }
        "save" => ShellCommand::Act(Action::SubmitDraft),
        "cancel" => ShellCommand::Act(Action::CancelForm),
        // Query is kept verbatim, including surrounding spaces
        "search" => ShellCommand::Act(Action::Search(rest.to_string())),
        "clear-search" => ShellCommand::Act(Action::ClearSearch),
        "list" | "ls" => ShellCommand::List,
        "time" => ShellCommand::Time,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        "" => ShellCommand::List,
        other => return Err(format!("Unknown command: {} (try 'help')", other)),
    };
    Ok(command)
}

fn print_time(session: &Session) {
    let view = session.view();
    let display = format!("Time remaining: {}", view.time_display);
    let display = match view.urgency {
        Urgency::Critical => display.red().bold(),
        Urgency::Warning => display.yellow(),
        Urgency::Normal => display.normal(),
    };
    println!("{}", display);
    if view.expired {
        println!("{}", "Time is up!".red().bold());
    }
}

fn render(session: &Session) {
    let view = session.view();

    println!();
    if view.active {
        print_time(session);
    } else {
        println!("{}", "Session not started (type 'start')".dimmed());
    }
    println!(
        "{} total, {} pending, {} completed",
        view.stats.total, view.stats.pending, view.stats.completed
    );

    if view.is_searching {
        println!("Search {:?}: {} of {} tasks", view.search_query, view.stats.filtered, view.stats.total);
    }

    if !view.has_tasks {
        println!("{}", "No tasks yet (type 'add')".dimmed());
    } else if !view.has_filtered_results {
        println!("{}", "No tasks match your search".dimmed());
    }
    for task in &view.tasks {
        print_task(task);
    }

    if let Some(form) = view.form {
        let heading = if form.is_editing() { "Edit Task" } else { "Add New Task" };
        println!("{}", heading.cyan().bold());
        println!("  title:    {}", form.draft.title);
        println!("  desc:     {}", form.draft.description);
        println!(
            "  priority: {}",
            form.draft.priority.map(|p| p.label()).unwrap_or("-")
        );
        println!(
            "  due:      {}",
            form.draft
                .due_date
                .map(|d| d.with_timezone(&Local).format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        for (field, msg) in form.errors.iter() {
            println!("  {} {}", format!("{}:", field.as_str()).red(), msg);
        }
        println!("{}", "('save' to submit, 'cancel' to discard)".dimmed());
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  start | reset                 begin or reset the timed session");
    println!("  add | edit <id>               open the task form");
    println!("  title|desc|priority|due <v>   fill in the form ('due none' clears)");
    println!("  save | cancel                 submit or discard the form");
    println!("  toggle <id> | delete <id>     complete/uncomplete or remove a task");
    println!("  search <text> | clear-search  filter the list");
    println!("  list | time | help | quit");
}
