//! Core implementation of console handlers.
//!
//! This is split from `commands` because these methods are the largest subset
//! of logic that can be tested without simulating a console.
//!
//! Every handler keeps the database locked for its whole duration, so that
//! the ledger operations are serialized.

use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info};
use tokio::sync::Mutex;

use crate::{
    config::Config,
    database::Database,
    error::{DatabaseError, InputError},
    formatter::{
        format_amount, format_attendance, format_discrepancies, format_list_expenses, format_people,
        format_report, format_summary, format_totals, names_of, person_name,
    },
    ledger::{self, Deltas, LedgerReport},
    parser::{
        parse_amount_arg, parse_date_arg, parse_expense_id, parse_full_expense, parse_meal_type,
        parse_period, parse_person_fields,
    },
    summary::{
        compute_attendance, compute_summary, search_expenses, totals_by_contributor,
        totals_by_item,
    },
    types::{DateRange, ExpenseId, NewPerson, PersonId, SavedExpense},
    validator::{
        find_registered_person, resolve_expense, validate_expense, validate_name_is_free,
        validate_new_person, validate_person_name,
    },
};

/// Result of an operation that changed the balances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerOutcome {
    pub expense_id: Option<ExpenseId>,
    pub report: LedgerReport,
    /// Warning to show to the user if some balances could not be written.
    pub warning: Option<String>,
}

pub async fn handle_add_person<D: Database>(
    payload: &str,
    config: &Config,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<PersonId> {
    let fields = parse_person_fields(payload)?;
    if let Some(new_name) = &fields.new_name {
        return Err(InputError::invalid_field(&format!("name={new_name}")).into());
    }

    let person = NewPerson {
        name: fields.name,
        initial_balance: fields.initial_balance.unwrap_or(0),
        joining_date: fields.joining_date,
        address: fields.address.filter(|a| !a.is_empty()),
        phone: fields.phone.filter(|p| !p.is_empty()),
    };
    validate_new_person(&person, config)?;
    debug!("Adding person: {:#?}", person);

    let mut database = database.lock().await;
    validate_name_is_free(&person.name, None, &*database)?;
    let person_id = database.add_person(&person)?;
    info!("Added person {} with ID {person_id}", person.name);
    Ok(person_id)
}

pub async fn handle_edit_person<D: Database>(
    payload: &str,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<()> {
    let fields = parse_person_fields(payload)?;
    if let Some(balance) = fields.initial_balance {
        return Err(InputError::invalid_field(&format!("starting={}", format_amount(balance))).into());
    }

    let mut database = database.lock().await;
    let person = find_registered_person(&fields.name, &*database)?;

    let new_name = fields.new_name.unwrap_or_else(|| person.name.clone());
    validate_person_name(&new_name)?;
    validate_name_is_free(&new_name, Some(person.id), &*database)?;

    let details = NewPerson {
        name: new_name,
        initial_balance: person.initial_balance,
        joining_date: fields.joining_date.or(person.joining_date),
        address: updated_field(fields.address, person.address),
        phone: updated_field(fields.phone, person.phone),
    };
    debug!("Editing person {}: {:#?}", person.id, details);

    if !database.update_person_details(person.id, &details)? {
        return Err(DatabaseError::concurrency("person was removed while editing").into());
    }
    Ok(())
}

/// A field left out keeps its value, while an empty one is cleared.
fn updated_field(typed: Option<String>, current: Option<String>) -> Option<String> {
    match typed {
        Some(value) if value.is_empty() => None,
        Some(value) => Some(value),
        None => current,
    }
}

pub async fn handle_remove_person<D: Database>(
    name: &str,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<()> {
    let name = name.trim();
    let mut database = database.lock().await;
    let person = find_registered_person(name, &*database)?;

    info!(
        "Removing person {} with balance {}: expenses referencing it are kept",
        person.name, person.balance
    );
    database.remove_person(person.id)?;
    Ok(())
}

pub async fn handle_list_people<D: Database>(database: &Arc<Mutex<D>>) -> anyhow::Result<String> {
    let people = database.lock().await.list_all()?;
    Ok(format_people(&people))
}

pub async fn handle_set_balance<D: Database>(
    payload: &str,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<()> {
    let (name, balance) = payload
        .trim()
        .split_once(char::is_whitespace)
        .ok_or(InputError::MissingArguments("<name> <amount>"))?;
    let balance = parse_amount_arg(balance)?;

    let mut database = database.lock().await;
    let person = find_registered_person(name, &*database)?;
    info!(
        "Setting balance of {} from {} to {balance}",
        person.name, person.balance
    );
    database.set_balance(person.id, balance)?;
    Ok(())
}

/// Save a new expense and update the balances of the people involved.
///
/// An expense without a date is dated *today*.
pub async fn handle_add_expense<D: Database>(
    payload: &str,
    today: NaiveDate,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<LedgerOutcome> {
    let parsed = parse_full_expense(payload)?;

    let mut database = database.lock().await;
    let expense = resolve_expense(&parsed, today, &*database)?;
    validate_expense(&expense)?;

    let expense_id = database.create_expense(&expense)?;
    debug!("Saved expense with ID {expense_id}");
    let report = ledger::apply_new_expense(&mut *database, &expense)?;

    make_outcome(Some(expense_id), report, &*database)
}

/// Replace an expense, moving the balances accordingly.
///
/// The payload is the ID of the expense followed by the new expense. If the new
/// expense has no date, it keeps the date of the old one.
pub async fn handle_edit_expense<D: Database>(
    payload: &str,
    config: &Config,
    today: NaiveDate,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<LedgerOutcome> {
    let (expense_id, payload) = payload
        .trim()
        .split_once(char::is_whitespace)
        .ok_or(InputError::MissingArguments("<expense ID> <expense>"))?;
    let expense_id = parse_expense_id(expense_id)?;
    let parsed = parse_full_expense(payload)?;

    let mut database = database.lock().await;
    let old = find_changeable_expense(expense_id, config, today, &*database)?;
    let new = resolve_expense(&parsed, old.expense.date, &*database)?;
    validate_expense(&new)?;

    if !database.update_expense(expense_id, &new)? {
        return Err(DatabaseError::concurrency("expense was deleted while editing").into());
    }
    let report = ledger::edit_expense(&mut *database, &old.expense, &new)?;

    make_outcome(Some(expense_id), report, &*database)
}

/// Delete an expense and revert its balance changes.
pub async fn handle_delete_expense<D: Database>(
    expense_id: &str,
    config: &Config,
    today: NaiveDate,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<LedgerOutcome> {
    let expense_id = parse_expense_id(expense_id)?;

    let mut database = database.lock().await;
    let old = find_changeable_expense(expense_id, config, today, &*database)?;

    if !database.delete_expense(expense_id)? {
        return Err(DatabaseError::concurrency("expense was already deleted").into());
    }
    let report = ledger::revert_expense(&mut *database, &old.expense);

    make_outcome(Some(expense_id), report, &*database)
}

/// Apply again the balance changes that could not be written.
pub async fn handle_retry<D: Database>(
    deltas: &Deltas,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<LedgerOutcome> {
    let mut database = database.lock().await;
    info!("Retrying {} balance changes", deltas.len());
    let report = ledger::apply_deltas(&mut *database, deltas);
    make_outcome(None, report, &*database)
}

fn find_changeable_expense<D: Database>(
    expense_id: ExpenseId,
    config: &Config,
    today: NaiveDate,
    database: &D,
) -> anyhow::Result<SavedExpense> {
    let saved = database
        .get_expense(expense_id)?
        .ok_or(InputError::UnknownExpense(expense_id))?;

    if config.restrict_changes_to_today && saved.expense.date != today {
        return Err(InputError::NotEditableToday(expense_id, saved.expense.date.to_string()).into());
    }
    Ok(saved)
}

fn make_outcome<D: Database>(
    expense_id: Option<ExpenseId>,
    report: LedgerReport,
    database: &D,
) -> anyhow::Result<LedgerOutcome> {
    let warning = if report.is_complete() {
        None
    } else {
        let names = names_of(&database.list_all()?);
        format_report(&report, &names)
    };

    Ok(LedgerOutcome {
        expense_id,
        report,
        warning,
    })
}

/// List the expenses matching the query, newest first.
pub async fn handle_list_expenses<D: Database>(
    query: &str,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<String> {
    debug!("Listing expenses matching: {query}");
    let database = database.lock().await;
    let expenses = database.query_expenses(&DateRange::all())?;
    let names = names_of(&database.list_all()?);

    let found = search_expenses(&expenses, &names, query);
    Ok(format_list_expenses(&found, &names))
}

pub async fn handle_summary<D: Database>(
    period: &str,
    today: NaiveDate,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<String> {
    let range = parse_period(period, today)?;
    let database = database.lock().await;
    let people = database.list_all()?;
    let expenses = database.query_expenses(&range)?;

    let summary = compute_summary(&people, &expenses, &range);
    Ok(format_summary(&summary))
}

pub async fn handle_items<D: Database>(
    period: &str,
    today: NaiveDate,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<String> {
    let range = parse_period(period, today)?;
    let expenses = database.lock().await.query_expenses(&range)?;
    Ok(format_totals(&totals_by_item(&expenses, &range)))
}

pub async fn handle_payers<D: Database>(
    period: &str,
    today: NaiveDate,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<String> {
    let range = parse_period(period, today)?;
    let database = database.lock().await;
    let expenses = database.query_expenses(&range)?;
    let names = names_of(&database.list_all()?);

    let totals: Vec<_> = totals_by_contributor(&expenses, &range)
        .into_iter()
        .map(|(person_id, amount)| (person_name(&names, person_id), amount))
        .collect();
    Ok(format_totals(&totals))
}

/// Mark a person as present for a meal, or remove the mark if present.
///
/// The payload is `<name> <meal> [date]`. Returns whether the person is now
/// marked as present.
pub async fn handle_toggle_meal<D: Database>(
    payload: &str,
    today: NaiveDate,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<bool> {
    let parts: Vec<_> = payload.split_whitespace().collect();
    let (name, meal_type, date) = match parts.as_slice() {
        [name, meal] => (*name, parse_meal_type(meal)?, today),
        [name, meal, date] => (*name, parse_meal_type(meal)?, parse_date_arg(date)?),
        _ => return Err(InputError::MissingArguments("<name> <meal> [date]").into()),
    };

    let mut database = database.lock().await;
    let person = find_registered_person(name, &*database)?;
    let present = database.toggle_meal(person.id, meal_type, date)?;
    debug!(
        "Person {} is present for {meal_type} on {date}: {present}",
        person.name
    );
    Ok(present)
}

pub async fn handle_attendance<D: Database>(
    period: &str,
    today: NaiveDate,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<String> {
    let range = parse_period(period, today)?;
    let database = database.lock().await;
    let people = database.list_all()?;
    let meals = database.query_meals(&range)?;

    let attendance = compute_attendance(&people, &meals, &range);
    Ok(format_attendance(&attendance))
}

/// Compare the stored balances with the ones computed from the expenses.
pub async fn handle_check<D: Database>(database: &Arc<Mutex<D>>) -> anyhow::Result<String> {
    let database = database.lock().await;
    let people = database.list_all()?;
    let expenses = database.query_expenses(&DateRange::all())?;

    let discrepancies = ledger::check_consistency(&people, &expenses);
    Ok(format_discrepancies(&discrepancies))
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use crate::database::{sqlite::SqliteDatabase, ExpenseStore, PersonStore};
    use crate::types::Amount;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).expect("test")
    }

    fn make_database() -> (Arc<Mutex<SqliteDatabase>>, TempDir) {
        let dir = TempDir::new("mess_ledger").expect("test");
        let database = SqliteDatabase::new(dir.path().join("db.sqlite")).expect("test");
        (Arc::new(Mutex::new(database)), dir)
    }

    async fn add_people(database: &Arc<Mutex<SqliteDatabase>>) {
        let config = Config::new();
        for name in ["Ali", "Bilal", "Chacha"] {
            handle_add_person(name, &config, database)
                .await
                .expect("test");
        }
    }

    async fn balance_of(name: &str, database: &Arc<Mutex<SqliteDatabase>>) -> Amount {
        database
            .lock()
            .await
            .find_by_name(name)
            .expect("test")
            .expect("test")
            .balance
    }

    async fn balances(database: &Arc<Mutex<SqliteDatabase>>) -> Vec<Amount> {
        let mut result = vec![];
        for name in ["ali", "bilal", "chacha"] {
            result.push(balance_of(name, database).await);
        }
        result
    }

    fn input_error(e: anyhow::Error) -> InputError {
        e.downcast::<InputError>().expect("test")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_and_delete_expense() {
        let (database, _dir) = make_database();
        add_people(&database).await;

        let outcome = handle_add_expense("rice 1x300 paid ali for ali bilal", today(), &database)
            .await
            .expect("test");
        assert!(outcome.report.is_complete());
        assert_eq!(outcome.warning, None);
        assert_eq!(balances(&database).await, vec![15000, -15000, 0]);

        let saved = database
            .lock()
            .await
            .get_expense(outcome.expense_id.expect("test"))
            .expect("test")
            .expect("test");
        assert_eq!(saved.expense.date, today());

        let expense_id = outcome.expense_id.expect("test").to_string();
        handle_delete_expense(&expense_id, &Config::new(), today(), &database)
            .await
            .expect("test");
        assert_eq!(balances(&database).await, vec![0, 0, 0]);

        let e = handle_delete_expense(&expense_id, &Config::new(), today(), &database)
            .await
            .expect_err("test");
        assert!(matches!(input_error(e), InputError::UnknownExpense(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_expense_writes_nothing() {
        let (database, _dir) = make_database();
        add_people(&database).await;

        let e = handle_add_expense("rice 1x300 paid ali/290 for ali bilal", today(), &database)
            .await
            .expect_err("test");
        assert_eq!(input_error(e), InputError::contribution_mismatch(29000, 30000));

        let e = handle_add_expense("rice 1x300 paid ali for dawood", today(), &database)
            .await
            .expect_err("test");
        assert_eq!(input_error(e), InputError::unregistered_person("dawood"));

        let e = handle_add_expense("rice 300 paid ali", today(), &database)
            .await
            .expect_err("test");
        assert!(matches!(input_error(e), InputError::InvalidExpenseSyntax(_)));

        assert_eq!(balances(&database).await, vec![0, 0, 0]);
        assert!(database
            .lock()
            .await
            .query_expenses(&DateRange::all())
            .expect("test")
            .is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_amounts_that_wrap_around() {
        let (database, _dir) = make_database();
        add_people(&database).await;

        let e = handle_add_expense(
            "rice 1x300 paid ali/92233720368547758.07 bilal/92233720368547758.07 chacha/300.02 for ali",
            today(),
            &database,
        )
        .await
        .expect_err("test");
        assert!(matches!(
            input_error(e),
            InputError::InvalidExpense(reason, _) if reason == "the amounts are too large!"
        ));

        let e = handle_add_expense("gold 1x92233720368547758.07 paid ali", today(), &database)
            .await
            .expect_err("test");
        assert!(matches!(input_error(e), InputError::InvalidExpense(_, _)));

        assert_eq!(balances(&database).await, vec![0, 0, 0]);
        assert!(database
            .lock()
            .await
            .query_expenses(&DateRange::all())
            .expect("test")
            .is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_free_item() {
        let (database, _dir) = make_database();
        add_people(&database).await;

        let outcome = handle_add_expense("water 1x0 paid ali for ali bilal", today(), &database)
            .await
            .expect("test");
        assert!(outcome.report.is_complete());
        assert_eq!(balances(&database).await, vec![0, 0, 0]);

        let list = handle_list_expenses("water", &database).await.expect("test");
        assert_eq!(
            list,
            "💰  1: 2024-03-10 water 1x0.00 = 0.00 for Ali Bilal\n"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_expense_without_consumers() {
        let (database, _dir) = make_database();
        add_people(&database).await;

        handle_add_expense("gas 1x100 paid ali/60 bilal/40", today(), &database)
            .await
            .expect("test");
        assert_eq!(balances(&database).await, vec![6000, 4000, 0]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_edit_expense() {
        let (database, _dir) = make_database();
        add_people(&database).await;

        let outcome = handle_add_expense("rice 1x300 paid ali for ali bilal", today(), &database)
            .await
            .expect("test");
        let expense_id = outcome.expense_id.expect("test");

        handle_edit_expense(
            &format!("{expense_id} rice 1x300 paid ali for ali bilal chacha"),
            &Config::new(),
            today(),
            &database,
        )
        .await
        .expect("test");
        assert_eq!(balances(&database).await, vec![20000, -10000, -10000]);

        // An invalid edit leaves both the expense and the balances untouched.
        let e = handle_edit_expense(
            &format!("{expense_id} rice 1x300 paid ali/100 for ali"),
            &Config::new(),
            today(),
            &database,
        )
        .await
        .expect_err("test");
        assert_eq!(input_error(e), InputError::contribution_mismatch(10000, 30000));
        assert_eq!(balances(&database).await, vec![20000, -10000, -10000]);

        assert_eq!(handle_check(&database).await.expect("test"), "All clean!");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_changes_restricted_to_today() {
        let (database, _dir) = make_database();
        add_people(&database).await;

        let outcome = handle_add_expense(
            "rice 1x300 2024-03-01 paid ali for ali bilal",
            today(),
            &database,
        )
        .await
        .expect("test");
        let expense_id = outcome.expense_id.expect("test").to_string();

        let mut config = Config::new();
        config.restrict_changes_to_today = true;

        let e = handle_delete_expense(&expense_id, &config, today(), &database)
            .await
            .expect_err("test");
        assert!(matches!(input_error(e), InputError::NotEditableToday(_, _)));
        assert_eq!(balances(&database).await, vec![15000, -15000, 0]);

        let past = NaiveDate::from_ymd_opt(2024, 3, 1).expect("test");
        handle_delete_expense(&expense_id, &config, past, &database)
            .await
            .expect("test");
        assert_eq!(balances(&database).await, vec![0, 0, 0]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_removed_person_is_reported() {
        let (database, _dir) = make_database();
        add_people(&database).await;

        let outcome = handle_add_expense("rice 1x300 paid ali for ali bilal", today(), &database)
            .await
            .expect("test");
        handle_remove_person("bilal", &database).await.expect("test");

        let expense_id = outcome.expense_id.expect("test").to_string();
        let outcome = handle_delete_expense(&expense_id, &Config::new(), today(), &database)
            .await
            .expect("test");

        assert_eq!(outcome.report.applied.len(), 1);
        assert_eq!(outcome.report.missing.len(), 1);
        let warning = outcome.warning.expect("test");
        assert!(warning.contains("some balances may be inconsistent, retry"));
        assert_eq!(balance_of("ali", &database).await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_retry() {
        let (database, _dir) = make_database();
        add_people(&database).await;
        let ali = database
            .lock()
            .await
            .find_by_name("ali")
            .expect("test")
            .expect("test")
            .id;

        let deltas: Deltas = [(ali, 500)].into_iter().collect();
        let outcome = handle_retry(&deltas, &database).await.expect("test");
        assert!(outcome.report.is_complete());
        assert_eq!(outcome.expense_id, None);
        assert_eq!(balance_of("ali", &database).await, 500);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_people() {
        let (database, _dir) = make_database();
        let config = Config::new();

        handle_add_person("Ali starting=10 phone=123 - Block A", &config, &database)
            .await
            .expect("test");
        let e = handle_add_person("ali", &config, &database)
            .await
            .expect_err("test");
        assert_eq!(input_error(e), InputError::duplicate_person("ali"));

        let mut strict = Config::new();
        strict.allow_starting_balance = false;
        let e = handle_add_person("Bilal starting=5", &strict, &database)
            .await
            .expect_err("test");
        assert_eq!(input_error(e), InputError::StartingBalanceNotAllowed);

        handle_add_person("Bilal", &strict, &database)
            .await
            .expect("test");
        let e = handle_edit_person("bilal name=ALI", &database)
            .await
            .expect_err("test");
        assert_eq!(input_error(e), InputError::duplicate_person("ALI"));

        handle_edit_person("ali name=Ali_Khan joined=2024-01-01", &database)
            .await
            .expect("test");
        handle_set_balance("bilal -2.5", &database)
            .await
            .expect("test");

        let people = handle_list_people(&database).await.expect("test");
        assert_eq!(
            people,
            "1: Ali_Khan (balance 10.00), joined 2024-01-01, phone 123, Block A\n\
             2: Bilal (balance -2.50)\n"
        );

        handle_edit_person("ali_khan phone= -", &database)
            .await
            .expect("test");
        handle_edit_person("bilal phone=456 - Block B", &database)
            .await
            .expect("test");
        let people = handle_list_people(&database).await.expect("test");
        assert_eq!(
            people,
            "1: Ali_Khan (balance 10.00), joined 2024-01-01
             2: Bilal (balance -2.50), phone 456, Block B
"
        );

        handle_remove_person("ali_khan", &database)
            .await
            .expect("test");
        let e = handle_remove_person("ali_khan", &database)
            .await
            .expect_err("test");
        assert_eq!(input_error(e), InputError::unregistered_person("ali_khan"));

        assert_eq!(handle_check(&database).await.expect("test"), "All clean!");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reports() {
        let (database, _dir) = make_database();
        add_people(&database).await;

        handle_add_expense(
            "rice 1x300 2024-03-01 paid ali for ali bilal",
            today(),
            &database,
        )
        .await
        .expect("test");
        handle_add_expense("milk 2x45 paid chacha for ali bilal chacha", today(), &database)
            .await
            .expect("test");

        let summary = handle_summary("daily", today(), &database)
            .await
            .expect("test");
        assert_eq!(
            summary,
            "Ali     paid 0.00  owes 30.00  net -30.00  (1 expenses)\n\
             Bilal   paid 0.00  owes 30.00  net -30.00  (1 expenses)\n\
             Chacha  paid 90.00  owes 30.00  net 60.00  (1 expenses)\n"
        );

        let items = handle_items("", today(), &database).await.expect("test");
        assert_eq!(items, "rice  300.00\nmilk  90.00\n");

        let payers = handle_payers("all", today(), &database)
            .await
            .expect("test");
        assert_eq!(payers, "Ali     300.00\nChacha  90.00\n");

        let list = handle_list_expenses("rice", &database).await.expect("test");
        assert_eq!(
            list,
            "💰  1: 2024-03-01 rice 1x300.00 = 300.00 paid Ali/300.00 for Ali Bilal\n"
        );

        let e = handle_summary("weekly", today(), &database)
            .await
            .expect_err("test");
        assert_eq!(input_error(e), InputError::invalid_period("weekly"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_meals() {
        let (database, _dir) = make_database();
        add_people(&database).await;

        assert!(handle_toggle_meal("ali lunch", today(), &database)
            .await
            .expect("test"));
        assert!(handle_toggle_meal("ali dinner 2024-03-09", today(), &database)
            .await
            .expect("test"));
        assert!(handle_toggle_meal("bilal lunch", today(), &database)
            .await
            .expect("test"));
        assert!(!handle_toggle_meal("bilal lunch", today(), &database)
            .await
            .expect("test"));

        let e = handle_toggle_meal("ali brunch", today(), &database)
            .await
            .expect_err("test");
        assert_eq!(input_error(e), InputError::invalid_meal("brunch"));

        let attendance = handle_attendance("daily", today(), &database)
            .await
            .expect("test");
        assert_eq!(
            attendance,
            "Ali     breakfast 0  lunch 1  dinner 1  total 2/6  days 2\n\
             Bilal   breakfast 0  lunch 0  dinner 0  total 0/6  days 0\n\
             Chacha  breakfast 0  lunch 0  dinner 0  total 0/6  days 0\n\
             meals: 2, 1.0 per day\n"
        );
    }
}
