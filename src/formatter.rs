//! Produce the strings that are printed on the console.
//! The formatting consists in aligning columns, adding a few emojis
//! and composing the actual output string.

use std::collections::HashMap;
use std::iter::repeat;

use crate::ledger::{Discrepancy, LedgerReport};
use crate::summary::{AttendanceSummary, PersonSummary};
use crate::types::{Amount, Person, PersonId, SavedExpense};

pub const INCONSISTENT_BALANCES: &str = "some balances may be inconsistent, retry";

const NOTHING_TO_SHOW: &str = "Nothing to show!";

/// Names of people, indexed by ID.
pub type Names = HashMap<PersonId, String>;

pub fn names_of(people: &[Person]) -> Names {
    people.iter().map(|p| (p.id, p.name.clone())).collect()
}

/// The name of a person, or a placeholder if the person does not exist anymore.
pub fn person_name(names: &Names, person_id: PersonId) -> String {
    names
        .get(&person_id)
        .cloned()
        .unwrap_or_else(|| format!("unknown #{}", person_id))
}

/// Format hundredths as a decimal number with two digits, e.g. -1.50.
pub fn format_amount(amount: Amount) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let absolute = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, absolute / 100, absolute % 100)
}

pub fn format_person(person: &Person) -> String {
    let mut result = format!(
        "{}: {} (balance {})",
        person.id,
        person.name,
        format_amount(person.balance)
    );
    if let Some(date) = person.joining_date {
        result += &format!(", joined {}", date);
    }
    if let Some(phone) = &person.phone {
        result += &format!(", phone {}", phone);
    }
    if let Some(address) = &person.address {
        result += &format!(", {}", address);
    }
    result
}

pub fn format_people(people: &[Person]) -> String {
    if people.is_empty() {
        NOTHING_TO_SHOW.to_string()
    } else {
        people
            .iter()
            .map(format_person)
            .fold(String::new(), |a, b| a + &b + "\n")
    }
}

pub fn format_list_expenses(expenses: &[&SavedExpense], names: &Names) -> String {
    if expenses.is_empty() {
        NOTHING_TO_SHOW.to_string()
    } else {
        expenses
            .iter()
            .map(|e| format_expense(e, names))
            .fold(String::new(), |a, b| a + &b + "\n")
    }
}

pub fn format_expense(saved: &SavedExpense, names: &Names) -> String {
    let expense = &saved.expense;
    let contributors = expense
        .contributed_by
        .iter()
        .map(|c| format!("{}/{}", person_name(names, c.person_id), format_amount(c.amount)))
        .collect::<Vec<_>>()
        .join(" ");
    let consumers = expense
        .consumed_by
        .iter()
        .map(|id| person_name(names, *id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut result = format!(
        "💰  {}: {} {} {}x{} = {}",
        saved.id,
        expense.date,
        expense.item_name,
        expense.quantity,
        format_amount(expense.price_per_unit),
        format_amount(expense.total_price()),
    );
    if !contributors.is_empty() {
        result += &format!(" paid {}", contributors);
    }
    if !consumers.is_empty() {
        result += &format!(" for {}", consumers);
    }
    result
}

/// Describe the balance changes that could not be written, if any.
pub fn format_report(report: &LedgerReport, names: &Names) -> Option<String> {
    if report.is_complete() {
        return None;
    }

    let mut result = format!("⚠️  {}\n", INCONSISTENT_BALANCES);
    for (person_id, delta) in &report.missing {
        result += &format!(
            "- {} does not exist anymore, skipped {}\n",
            person_name(names, *person_id),
            format_amount(*delta)
        );
    }
    for failed in &report.failed {
        result += &format!(
            "- cannot update {} by {}\n",
            person_name(names, failed.person_id),
            format_amount(failed.delta)
        );
    }
    Some(result)
}

pub fn format_summary(summary: &[PersonSummary]) -> String {
    if summary.is_empty() {
        return NOTHING_TO_SHOW.to_string();
    }

    let labels: Vec<_> = summary
        .iter()
        .map(|row| {
            row.name
                .clone()
                .unwrap_or_else(|| format!("unknown #{}", row.person_id))
        })
        .collect();
    let width = max_length(&labels);

    summary
        .iter()
        .zip(labels.iter())
        .map(|(row, label)| {
            format!(
                "{}  paid {}  owes {}  net {}  ({} expenses)",
                pad(label, width),
                format_amount(row.contributed),
                format_amount(row.owed),
                format_amount(row.net),
                row.expense_count
            )
        })
        .fold(String::new(), |a, b| a + &b + "\n")
}

/// One line per key, with the amounts aligned.
pub fn format_totals<T: AsRef<str>>(totals: &[(T, Amount)]) -> String {
    if totals.is_empty() {
        return NOTHING_TO_SHOW.to_string();
    }

    let width = max_length(totals.iter().map(|(k, _)| k));
    totals
        .iter()
        .map(|(key, amount)| format!("{}  {}", pad(key.as_ref(), width), format_amount(*amount)))
        .fold(String::new(), |a, b| a + &b + "\n")
}

pub fn format_attendance(attendance: &AttendanceSummary) -> String {
    if attendance.rows.is_empty() {
        return NOTHING_TO_SHOW.to_string();
    }

    let labels: Vec<_> = attendance
        .rows
        .iter()
        .map(|row| {
            row.name
                .clone()
                .unwrap_or_else(|| format!("unknown #{}", row.person_id))
        })
        .collect();
    let width = max_length(&labels);

    let mut result = attendance
        .rows
        .iter()
        .zip(labels.iter())
        .map(|(row, label)| {
            let total = match row.max_meals {
                Some(max) => format!("{}/{}", row.total, max),
                None => row.total.to_string(),
            };
            format!(
                "{}  breakfast {}  lunch {}  dinner {}  total {}  days {}",
                pad(label, width),
                row.breakfast,
                row.lunch,
                row.dinner,
                total,
                row.days_present
            )
        })
        .fold(String::new(), |a, b| a + &b + "\n");

    result += &format!("meals: {}", attendance.total_meals);
    if let Some(average) = attendance.average_meals_per_day {
        result += &format!(", {:.1} per day", average);
    }
    result + "\n"
}

pub fn format_discrepancies(discrepancies: &[Discrepancy]) -> String {
    if discrepancies.is_empty() {
        "All clean!".to_string()
    } else {
        discrepancies
            .iter()
            .map(|d| {
                format!(
                    "- {}: stored {}, expected {}",
                    d.name,
                    format_amount(d.stored),
                    format_amount(d.expected)
                )
            })
            .fold(String::new(), |a, b| a + &b + "\n")
    }
}

fn max_length<T: AsRef<str>, I: IntoIterator<Item = T>>(labels: I) -> usize {
    labels
        .into_iter()
        .map(|l| l.as_ref().chars().count())
        .max()
        .unwrap_or(0)
}

// Pad with spaces so that the following columns are aligned.
fn pad(label: &str, target_length: usize) -> String {
    let length = label.chars().count();
    if length < target_length {
        label.to_string() + &make_string_of_char(' ', target_length - length)
    } else {
        label.to_string()
    }
}

fn make_string_of_char(c: char, length: usize) -> String {
    repeat(c).take(length).collect::<String>()
}
