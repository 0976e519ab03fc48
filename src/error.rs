use thiserror::Error;

use crate::formatter::format_amount;
use crate::types::{Amount, ExpenseId};

/// User input that does not satisfy the rules of the ledger.
///
/// Nothing is written to the stores when one of these is returned.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid syntax for an expense; example of valid syntax: rice 2x150 paid ali/300 for ali bilal")]
    InvalidExpenseSyntax(String),

    #[error("invalid expense: {0}")]
    InvalidExpense(String, String),

    #[error(
        "contributions must equal total price (contributed {}, total {})",
        format_amount(*.contributed),
        format_amount(*.total)
    )]
    ContributionMismatch { contributed: Amount, total: Amount },

    #[error("invalid person name `{0}`: names cannot be empty, cannot start with `-`, cannot contain spaces, `/` or `=` and cannot be `paid` or `for`")]
    InvalidPersonName(String),

    #[error("a person named `{0}` already exists")]
    DuplicatePerson(String),

    #[error("`{0}` is not a registered person")]
    UnregisteredPerson(String),

    #[error("starting balances are disabled; new people always start at zero")]
    StartingBalanceNotAllowed,

    #[error("there is no expense with ID {0}")]
    UnknownExpense(ExpenseId),

    #[error("only expenses dated today can be changed; expense {0} is dated {1}")]
    NotEditableToday(ExpenseId, String),

    #[error("invalid amount `{0}`: expected a number like 12 or 12.50")]
    InvalidAmount(String),

    #[error("invalid date `{0}`: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid meal `{0}`: expected breakfast, lunch or dinner")]
    InvalidMeal(String),

    #[error("invalid period `{0}`: expected daily, monthly, all or <from>..<to>")]
    InvalidPeriod(String),

    #[error("invalid field `{0}`: expected name=, starting=, phone= or joined=")]
    InvalidField(String),

    #[error("invalid value `{0}` for expense ID: expected an integer")]
    InvalidExpenseId(String),

    #[error("unknown command `{0}`; type /help for the list of commands")]
    UnknownCommand(String),

    #[error("missing arguments. Format must be '{0}'")]
    MissingArguments(&'static str),
}

impl InputError {
    // TODO: it should be possible to improve nom error messages.
    pub fn invalid_expense_syntax(e: nom::Err<nom::error::Error<&str>>) -> Self {
        InputError::InvalidExpenseSyntax(e.to_string())
    }

    pub fn invalid_expense(reason: &str, expense: String) -> Self {
        InputError::InvalidExpense(reason.to_string(), expense)
    }

    pub fn contribution_mismatch(contributed: Amount, total: Amount) -> Self {
        InputError::ContributionMismatch { contributed, total }
    }

    pub fn invalid_person_name(name: &str) -> Self {
        InputError::InvalidPersonName(name.to_string())
    }

    pub fn duplicate_person(name: &str) -> Self {
        InputError::DuplicatePerson(name.to_string())
    }

    pub fn unregistered_person(name: &str) -> Self {
        InputError::UnregisteredPerson(name.to_string())
    }

    pub fn invalid_amount(amount: &str) -> Self {
        InputError::InvalidAmount(amount.to_string())
    }

    pub fn invalid_date(date: &str) -> Self {
        InputError::InvalidDate(date.to_string())
    }

    pub fn invalid_meal(meal: &str) -> Self {
        InputError::InvalidMeal(meal.to_string())
    }

    pub fn invalid_period(period: &str) -> Self {
        InputError::InvalidPeriod(period.to_string())
    }

    pub fn unknown_command(command: &str) -> Self {
        InputError::UnknownCommand(command.to_string())
    }

    pub fn invalid_field(field: &str) -> Self {
        InputError::InvalidField(field.to_string())
    }

    pub fn invalid_expense_id(id: &str) -> Self {
        InputError::InvalidExpenseId(id.to_string())
    }
}

/// A failure of the underlying store.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("{message}: {cause:#}")]
    Query { message: String, cause: anyhow::Error },

    #[error("concurrent modification: {0}")]
    Concurrency(String),
}

impl DatabaseError {
    pub fn new<T: AsRef<str>>(message: T, cause: anyhow::Error) -> Self {
        DatabaseError::Query {
            message: message.as_ref().to_string(),
            cause,
        }
    }

    pub fn concurrency(message: &str) -> Self {
        DatabaseError::Concurrency(message.to_string())
    }
}

/// Message shown to the user when something goes wrong.
///
/// Input errors are shown as they are, while other errors are logged in full
/// and replaced by a generic message.
pub fn user_message(e: &anyhow::Error) -> String {
    if let Some(input_error) = e.downcast_ref::<InputError>() {
        input_error.to_string()
    } else if e.downcast_ref::<DatabaseError>().is_some() {
        "cannot query the database, please try again later".to_string()
    } else {
        "an unexpected error occurred".to_string()
    }
}
