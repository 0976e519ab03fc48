//! Definition of console commands and their dispatch.

use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::{
    config::Config,
    database::Database,
    endpoints::{
        handle_add_expense, handle_add_person, handle_attendance, handle_check,
        handle_delete_expense, handle_edit_expense, handle_edit_person, handle_items,
        handle_list_expenses, handle_list_people, handle_payers, handle_remove_person,
        handle_retry, handle_set_balance, handle_summary, handle_toggle_meal, LedgerOutcome,
    },
    error::{user_message, InputError},
    ledger::{merge, Deltas},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    AddPerson(String),
    EditPerson(String),
    RemovePerson(String),
    People,
    SetBalance(String),
    Expense(String),
    Edit(String),
    Delete(String),
    Retry,
    List(String),
    Summary(String),
    Items(String),
    Payers(String),
    Meal(String),
    Attendance(String),
    Check,
    Quit,
}

type Constructor = fn(String) -> Command;

/// Names, description and constructor of every command. Both the parser and
/// the help message read this table; the first name is the main one.
const COMMANDS: [(&[&str], &str, Constructor); 18] = [
    (&["/help"], "shows this message.", |_| Command::Help),
    (
        &["/addperson"],
        "/addperson name [starting=amount] [phone=number] [joined=YYYY-MM-DD] [- address]",
        Command::AddPerson,
    ),
    (
        &["/editperson"],
        "/editperson name [name=new_name] [phone=number] [joined=YYYY-MM-DD] [- address]; \
         an empty phone= or a lone - clears the field.",
        Command::EditPerson,
    ),
    (
        &["/removeperson"],
        "/removeperson name; expenses referencing the person are kept.",
        Command::RemovePerson,
    ),
    (&["/people"], "list all people with their balance.", |_| Command::People),
    (
        &["/setbalance"],
        "/setbalance name amount overwrites the balance of a person.",
        Command::SetBalance,
    ),
    (
        &["/expense", "/e"],
        "add a new expense; format: rice 2x150 [YYYY-MM-DD] paid ali/200 bilal for ali bilal chacha",
        Command::Expense,
    ),
    (
        &["/edit"],
        "/edit <id> <expense> replaces the expense with the given ID.",
        Command::Edit,
    ),
    (
        &["/delete"],
        "/delete <id> deletes the expense with the given ID; to find the ID, use /list.",
        Command::Delete,
    ),
    (
        &["/retry"],
        "write again the balance changes that failed so far.",
        |_| Command::Retry,
    ),
    (
        &["/list"],
        "/list [query] shows the expenses matching the query, newest first.",
        Command::List,
    ),
    (
        &["/summary"],
        "/summary [daily|monthly|all|from..to] shows what everybody paid and owes.",
        Command::Summary,
    ),
    (
        &["/items"],
        "/items [period] shows the total spent on each item.",
        Command::Items,
    ),
    (
        &["/payers"],
        "/payers [period] shows the total paid by each person.",
        Command::Payers,
    ),
    (
        &["/meal"],
        "/meal name breakfast|lunch|dinner [YYYY-MM-DD] toggles the attendance of a meal.",
        Command::Meal,
    ),
    (
        &["/attendance"],
        "/attendance [period] shows the meals of each person.",
        Command::Attendance,
    ),
    (&["/check"], "compare the balances with the expenses.", |_| Command::Check),
    (&["/quit", "/exit"], "exit.", |_| Command::Quit),
];

impl Command {
    /// Parse a line typed by the user. Empty lines are ignored.
    pub fn parse(line: &str) -> Result<Option<Command>, InputError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim().to_string()),
            None => (line, String::new()),
        };

        let lowercase_name = name.to_lowercase();
        let (_, _, constructor) = COMMANDS
            .iter()
            .find(|(names, _, _)| names.contains(&lowercase_name.as_str()))
            .ok_or_else(|| InputError::unknown_command(name))?;
        Ok(Some(constructor(args)))
    }

    pub fn descriptions() -> String {
        let labels: Vec<_> = COMMANDS
            .iter()
            .map(|(names, _, _)| names.join(", "))
            .collect();
        let width = labels.iter().map(|l| l.len()).max().unwrap_or(0);

        let mut result =
            "This program keeps track of the shared expenses of a mess. Supported commands:\n"
                .to_string();
        for (label, (_, description, _)) in labels.iter().zip(COMMANDS.iter()) {
            result += &format!("{label:width$} - {description}\n");
        }
        result
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

/// State of a console session.
pub struct Session<D: Database> {
    database: Arc<Mutex<D>>,
    config: Config,
    /// Balance changes that could not be written so far, waiting for `/retry`.
    pending: Deltas,
}

impl<D: Database> Session<D> {
    pub fn new(database: Arc<Mutex<D>>, config: Config) -> Self {
        Session {
            database,
            config,
            pending: Deltas::new(),
        }
    }

    /// Run a line typed by the user and produce the reply.
    ///
    /// Errors are logged and turned into a message for the user.
    pub async fn execute(&mut self, line: &str, today: NaiveDate) -> Option<Reply> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return None,
            Err(e) => return Some(Reply::Text(e.to_string())),
        };
        debug!("Executing {:?}", command);

        if command == Command::Quit {
            return Some(Reply::Quit);
        }

        let reply = match self.dispatch(command, today).await {
            Ok(text) => text,
            Err(e) => {
                if e.downcast_ref::<InputError>().is_some() {
                    warn!("Invalid input: {e}");
                } else {
                    error!("Cannot execute `{line}`: {e:#}");
                }
                user_message(&e)
            }
        };
        Some(Reply::Text(reply))
    }

    async fn dispatch(&mut self, command: Command, today: NaiveDate) -> anyhow::Result<String> {
        let database = &self.database;
        let config = &self.config;

        match command {
            Command::Help => Ok(Command::descriptions()),
            Command::AddPerson(args) => {
                let person_id = handle_add_person(&args, config, database).await?;
                Ok(format!("Person added with ID {person_id}"))
            }
            Command::EditPerson(args) => {
                handle_edit_person(&args, database).await?;
                Ok("Person updated".to_string())
            }
            Command::RemovePerson(args) => {
                handle_remove_person(&args, database).await?;
                Ok("Person removed".to_string())
            }
            Command::People => handle_list_people(database).await,
            Command::SetBalance(args) => {
                handle_set_balance(&args, database).await?;
                Ok("Balance updated".to_string())
            }
            Command::Expense(args) => {
                let outcome = handle_add_expense(&args, today, database).await?;
                Ok(record_outcome(&mut self.pending, outcome, "Expense added"))
            }
            Command::Edit(args) => {
                let outcome = handle_edit_expense(&args, config, today, database).await?;
                Ok(record_outcome(&mut self.pending, outcome, "Expense updated"))
            }
            Command::Delete(args) => {
                let outcome = handle_delete_expense(&args, config, today, database).await?;
                Ok(record_outcome(&mut self.pending, outcome, "Expense deleted"))
            }
            Command::Retry => {
                if self.pending.is_empty() {
                    return Ok("Nothing to retry".to_string());
                }
                let outcome = handle_retry(&self.pending, database).await?;
                // Whatever fails again is recorded anew.
                self.pending.clear();
                Ok(record_outcome(&mut self.pending, outcome, "Balances updated"))
            }
            Command::List(args) => handle_list_expenses(&args, database).await,
            Command::Summary(args) => handle_summary(&args, today, database).await,
            Command::Items(args) => handle_items(&args, today, database).await,
            Command::Payers(args) => handle_payers(&args, today, database).await,
            Command::Meal(args) => {
                let present = handle_toggle_meal(&args, today, database).await?;
                Ok(if present {
                    "Marked as present".to_string()
                } else {
                    "Marked as absent".to_string()
                })
            }
            Command::Attendance(args) => handle_attendance(&args, today, database).await,
            Command::Check => handle_check(database).await,
            Command::Quit => Ok(String::new()),
        }
    }
}

/// Remember the changes that failed, together with the ones that failed
/// earlier, so that they can be retried.
fn record_outcome(pending: &mut Deltas, outcome: LedgerOutcome, success: &str) -> String {
    *pending = merge(pending, &outcome.report.failed_deltas());

    let mut reply = match outcome.expense_id {
        Some(expense_id) => format!("{success} (ID {expense_id})"),
        None => success.to_string(),
    };
    if let Some(warning) = outcome.warning {
        info!("Operation completed partially: {} failed writes", pending.len());
        reply += "\n";
        reply += &warning;
    }
    reply
}
