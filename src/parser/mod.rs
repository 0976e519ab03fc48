//! Parse the user input.

mod expense;

use chrono::NaiveDate;

pub use expense::parse_full_expense;

use crate::error::InputError;
use crate::types::{Amount, DateRange, ExpenseId, MealType};

/// Optional details of a person, as typed by the user.
///
/// The syntax is `<name> [name=<new name>] [starting=<amount>] [phone=<phone>]
/// [joined=<date>] [- <address>]`. An empty `phone=` or a lone `-` gives an
/// empty string, which clears the field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersonFields {
    pub name: String,
    pub new_name: Option<String>,
    pub initial_balance: Option<Amount>,
    pub phone: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub address: Option<String>,
}

pub fn parse_person_fields(s: &str) -> Result<PersonFields, InputError> {
    let s = s.trim();
    let (fields, address) = match (s.split_once(" - "), s.strip_suffix(" -")) {
        (Some((fields, address)), _) => (fields, Some(address.trim())),
        (None, Some(fields)) => (fields, Some("")),
        (None, None) => (s, None),
    };

    let mut parts = fields.split_whitespace();
    let name = parts
        .next()
        .ok_or(InputError::MissingArguments("<name> [field=value]... [- address]"))?;

    let mut result = PersonFields {
        name: name.to_string(),
        address: address.map(|a| a.to_string()),
        ..Default::default()
    };

    for part in parts {
        match part.split_once('=') {
            Some(("name", value)) => result.new_name = Some(value.to_string()),
            Some(("starting", value)) => result.initial_balance = Some(parse_amount_arg(value)?),
            Some(("phone", value)) => result.phone = Some(value.to_string()),
            Some(("joined", value)) => result.joining_date = Some(parse_date_arg(value)?),
            _ => return Err(InputError::invalid_field(part)),
        }
    }

    Ok(result)
}

/// Parse a whole string as an amount.
pub fn parse_amount_arg(s: &str) -> Result<Amount, InputError> {
    match expense::parse_amount(s.trim()) {
        Ok(("", amount)) => Ok(amount),
        _ => Err(InputError::invalid_amount(s)),
    }
}

/// Parse a whole string as a date.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, InputError> {
    match expense::parse_date(s.trim()) {
        Ok(("", date)) => Ok(date),
        _ => Err(InputError::invalid_date(s)),
    }
}

pub fn parse_expense_id(s: &str) -> Result<ExpenseId, InputError> {
    s.trim()
        .parse()
        .map_err(|_| InputError::invalid_expense_id(s))
}

pub fn parse_meal_type(s: &str) -> Result<MealType, InputError> {
    MealType::from_name(s).ok_or_else(|| InputError::invalid_meal(s))
}

/// Parse a period relative to *today*.
///
/// Accepts `daily`, `monthly`, `all` (also the empty string) or an explicit range
/// `<from>..<to>`, where either date can be left out.
pub fn parse_period(s: &str, today: NaiveDate) -> Result<DateRange, InputError> {
    match s.trim().to_lowercase().as_str() {
        "" | "all" => Ok(DateRange::all()),
        "daily" => Ok(DateRange::daily(today)),
        "monthly" => Ok(DateRange::monthly(today)),
        other => match other.split_once("..") {
            Some((start, end)) => {
                let parse_bound = |b: &str| -> Result<Option<NaiveDate>, InputError> {
                    if b.is_empty() {
                        Ok(None)
                    } else {
                        parse_date_arg(b).map(Some)
                    }
                };
                Ok(DateRange::new(parse_bound(start)?, parse_bound(end)?))
            }
            None => Err(InputError::invalid_period(s)),
        },
    }
}
