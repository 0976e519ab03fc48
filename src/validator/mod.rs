//! Functions that check the validity of user input.
//!
//! These functions are called after the parsing phase and execute
//! checks that are not easily done by the parser.

mod expense;

use chrono::NaiveDate;

use crate::config::Config;
use crate::database::PersonStore;
use crate::error::InputError;
use crate::ledger::compute_shares;
use crate::types::{Amount, Contribution, Expense, NewPerson, ParsedExpense, Person, PersonId};
pub use expense::validate_expense;

/// Words of the expense syntax, which therefore cannot be names.
const RESERVED_WORDS: [&str; 2] = ["paid", "for"];

/// A name cannot be empty and cannot be a keyword of the expense syntax. It cannot
/// contain whitespace, `/` (the separator between a contributor and its amount) or
/// `=` (the separator of person fields), and it cannot start with `-`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| c.is_whitespace() || c == '/' || c == '=')
        && !name.starts_with('-')
        && !RESERVED_WORDS.contains(&name.to_lowercase().as_str())
}

pub fn validate_person_name(name: &str) -> Result<(), InputError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(InputError::invalid_person_name(name))
    }
}

/// Check a person that is about to be created.
pub fn validate_new_person(person: &NewPerson, config: &Config) -> Result<(), InputError> {
    validate_person_name(&person.name)?;
    if person.initial_balance != 0 && !config.allow_starting_balance {
        return Err(InputError::StartingBalanceNotAllowed);
    }
    Ok(())
}

/// Verify that no active person other than *except* already uses the given name.
///
/// Takes the store itself, since the caller already holds the lock.
pub fn validate_name_is_free<D: PersonStore>(
    name: &str,
    except: Option<PersonId>,
    database: &D,
) -> anyhow::Result<()> {
    match database.find_by_name(name)? {
        Some(existing) if Some(existing.id) != except => {
            Err(InputError::duplicate_person(name).into())
        }
        _ => Ok(()),
    }
}

/// Get the active person with the given name.
pub fn find_registered_person<D: PersonStore>(
    name: &str,
    database: &D,
) -> anyhow::Result<Person> {
    match database.find_by_name(name)? {
        Some(person) => Ok(person),
        None => Err(InputError::unregistered_person(name).into()),
    }
}

/// Turn an expense typed by the user into an expense referencing people by ID.
///
/// Every name must belong to a registered person. Contributors without an amount
/// split in equal parts what the other contributors did not cover, and are
/// dropped if that leaves nothing to them. An expense without a date is dated
/// *default_date*.
pub fn resolve_expense<D: PersonStore>(
    parsed: &ParsedExpense,
    default_date: NaiveDate,
    database: &D,
) -> anyhow::Result<Expense> {
    let total = parsed.total_price().ok_or_else(|| {
        InputError::invalid_expense("the total price is too large!", format!("{:#?}", parsed))
    })?;

    let mut contributed_by = Vec::with_capacity(parsed.contributed_by.len());
    for contribution in &parsed.contributed_by {
        let person = find_registered_person(&contribution.name, database)?;
        contributed_by.push(Contribution::new(person.id, contribution.amount.unwrap_or(0)));
    }

    let mut consumed_by = Vec::with_capacity(parsed.consumed_by.len());
    for name in &parsed.consumed_by {
        consumed_by.push(find_registered_person(name, database)?.id);
    }

    let open_positions: Vec<usize> = parsed
        .contributed_by
        .iter()
        .enumerate()
        .filter(|(_, c)| c.amount.is_none())
        .map(|(i, _)| i)
        .collect();

    if !open_positions.is_empty() {
        let fixed = parsed
            .contributed_by
            .iter()
            .filter_map(|c| c.amount)
            .try_fold(0 as Amount, |a, b| a.checked_add(b))
            .ok_or_else(|| {
                InputError::invalid_expense("the amounts are too large!", format!("{:#?}", parsed))
            })?;
        if fixed > total {
            return Err(InputError::contribution_mismatch(fixed, total).into());
        }

        let open_ids: Vec<PersonId> = open_positions.iter().map(|&i| contributed_by[i].person_id).collect();
        for (&i, (_, amount)) in open_positions.iter().zip(compute_shares(total - fixed, &open_ids)) {
            contributed_by[i].amount = amount;
        }
    }

    // Contributors without an amount who end up paying nothing are left out,
    // as happens for free items.
    let contributed_by = contributed_by
        .into_iter()
        .zip(&parsed.contributed_by)
        .filter(|(contribution, typed)| typed.amount.is_some() || contribution.amount != 0)
        .map(|(contribution, _)| contribution)
        .collect();

    Ok(Expense {
        item_name: parsed.item_name.clone(),
        quantity: parsed.quantity,
        price_per_unit: parsed.price_per_unit,
        date: parsed.date.unwrap_or(default_date),
        contributed_by,
        consumed_by,
    })
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use crate::database::sqlite::SqliteDatabase;
    use crate::types::ParsedContribution;

    use super::*;

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("Ali"));
        assert!(is_valid_name("chacha_2"));
        assert!(is_valid_name("Zoë"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("ali khan"));
        assert!(!is_valid_name("ali/300"));
        assert!(!is_valid_name("-ali"));
        assert!(!is_valid_name("phone=1"));
        assert!(!is_valid_name("Paid"));
        assert!(!is_valid_name("for"));
    }

    #[test]
    fn test_validate_new_person() {
        let mut config = Config::new();
        let mut person = NewPerson::new("ali");
        person.initial_balance = 1000;
        assert!(validate_new_person(&person, &config).is_ok());

        config.allow_starting_balance = false;
        assert_eq!(
            validate_new_person(&person, &config),
            Err(InputError::StartingBalanceNotAllowed)
        );

        person.initial_balance = 0;
        assert!(validate_new_person(&person, &config).is_ok());

        let person = NewPerson::new("for");
        assert!(validate_new_person(&person, &config).is_err());
    }

    fn make_database() -> (SqliteDatabase, TempDir) {
        let dir = TempDir::new("mess_ledger").expect("test");
        let mut database = SqliteDatabase::new(dir.path().join("db.sqlite")).expect("test");
        for name in ["ali", "bilal", "chacha"] {
            database.add_person(&NewPerson::new(name)).expect("test");
        }
        (database, dir)
    }

    fn parsed_rice(contributed_by: Vec<ParsedContribution>, consumed_by: &[&str]) -> ParsedExpense {
        ParsedExpense {
            item_name: "rice".to_string(),
            quantity: 1,
            price_per_unit: 30001,
            date: None,
            contributed_by,
            consumed_by: consumed_by.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_resolve_expense() -> anyhow::Result<()> {
        let (database, _dir) = make_database();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("test");
        let ali = find_registered_person("ali", &database)?.id;
        let bilal = find_registered_person("bilal", &database)?.id;
        let chacha = find_registered_person("chacha", &database)?.id;

        let parsed = parsed_rice(
            vec![
                ParsedContribution::new("ali", None),
                ParsedContribution::new("bilal", Some(10000)),
                ParsedContribution::new("chacha", None),
            ],
            &["ali", "bilal"],
        );
        let expense = resolve_expense(&parsed, today, &database)?;

        assert_eq!(expense.date, today);
        assert_eq!(
            expense.contributed_by,
            vec![
                Contribution::new(ali, 10001),
                Contribution::new(bilal, 10000),
                Contribution::new(chacha, 10000)
            ]
        );
        assert_eq!(expense.consumed_by, vec![ali, bilal]);
        assert!(validate_expense(&expense).is_ok());
        Ok(())
    }

    #[test]
    fn test_resolve_invalid_expense() {
        let (database, _dir) = make_database();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("test");

        let parsed = parsed_rice(vec![ParsedContribution::new("dawood", None)], &[]);
        let error = resolve_expense(&parsed, today, &database).expect_err("test");
        assert_eq!(
            error.downcast_ref::<InputError>(),
            Some(&InputError::unregistered_person("dawood"))
        );

        let parsed = parsed_rice(
            vec![
                ParsedContribution::new("ali", Some(40000)),
                ParsedContribution::new("bilal", None),
            ],
            &[],
        );
        let error = resolve_expense(&parsed, today, &database).expect_err("test");
        assert_eq!(
            error.downcast_ref::<InputError>(),
            Some(&InputError::contribution_mismatch(40000, 30001))
        );

        let parsed = parsed_rice(
            vec![
                ParsedContribution::new("ali", Some(Amount::MAX)),
                ParsedContribution::new("bilal", Some(Amount::MAX)),
                ParsedContribution::new("chacha", None),
            ],
            &[],
        );
        let error = resolve_expense(&parsed, today, &database).expect_err("test");
        assert!(matches!(
            error.downcast_ref::<InputError>(),
            Some(InputError::InvalidExpense(reason, _)) if reason == "the amounts are too large!"
        ));
    }

    #[test]
    fn test_resolve_free_expense() -> anyhow::Result<()> {
        let (database, _dir) = make_database();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("test");
        let bilal = find_registered_person("bilal", &database)?.id;

        let mut parsed = parsed_rice(vec![ParsedContribution::new("ali", None)], &["ali"]);
        parsed.price_per_unit = 0;
        let expense = resolve_expense(&parsed, today, &database)?;
        assert!(expense.contributed_by.is_empty());
        assert!(validate_expense(&expense).is_ok());

        // The open contributor who is left with nothing is dropped.
        let parsed = parsed_rice(
            vec![
                ParsedContribution::new("ali", Some(30000)),
                ParsedContribution::new("bilal", None),
                ParsedContribution::new("chacha", None),
            ],
            &[],
        );
        let expense = resolve_expense(&parsed, today, &database)?;
        assert_eq!(expense.contributed_by.len(), 2);
        assert_eq!(expense.contributed_by[1], Contribution::new(bilal, 1));

        // A fixed amount of zero is still rejected.
        let mut parsed = parsed_rice(vec![ParsedContribution::new("ali", Some(0))], &[]);
        parsed.price_per_unit = 0;
        let expense = resolve_expense(&parsed, today, &database)?;
        assert!(validate_expense(&expense).is_err());
        Ok(())
    }
}
