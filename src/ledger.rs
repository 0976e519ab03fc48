//! The core of the ledger. It turns expenses into balance changes and keeps
//! the stored balances of people in line with the list of expenses.
//!
//! Every expense is split as follows:
//! - each contributor is credited with the amount they paid
//! - each consumer owes an equal share of the total price, whether or not
//!   they also contributed
//!
//! A person who both pays and consumes gets a single, net balance change.
//! Since the balance changes of one expense always sum to zero, money is only
//! ever moved between people, never created or destroyed.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::database::PersonStore;
use crate::error::InputError;
use crate::types::{Amount, Expense, Person, PersonId, SavedExpense};
use crate::validator::validate_expense;

/// Net balance change for each affected person.
pub type Deltas = BTreeMap<PersonId, Amount>;

/// Outcome of writing a set of balance changes to the person store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerReport {
    /// Changes that were written.
    pub applied: Vec<(PersonId, Amount)>,
    /// People that no longer exist: their change was skipped.
    pub missing: Vec<(PersonId, Amount)>,
    /// Changes the store failed to write, with the reason.
    pub failed: Vec<FailedUpdate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedUpdate {
    pub person_id: PersonId,
    pub delta: Amount,
    pub reason: String,
}

/// A person whose stored balance does not match the expenses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discrepancy {
    pub person_id: PersonId,
    pub name: String,
    pub stored: Amount,
    pub expected: Amount,
}

impl LedgerReport {
    /// True if every change was written.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }

    /// Changes that the caller may want to retry.
    pub fn failed_deltas(&self) -> Deltas {
        self.failed
            .iter()
            .map(|f| (f.person_id, f.delta))
            .collect()
    }
}

/// Split *total_price* in equal shares among the consumers.
///
/// Amounts are integers, so when the total cannot be split exactly the first
/// consumers in the list owe one hundredth more than the others. The shares
/// always sum to the total price.
pub fn compute_shares(total_price: Amount, consumed_by: &[PersonId]) -> Vec<(PersonId, Amount)> {
    if consumed_by.is_empty() {
        return vec![];
    }

    let consumers = consumed_by.len() as Amount;
    let single_quota = total_price.div_euclid(consumers);
    let remainder = total_price.rem_euclid(consumers);

    consumed_by
        .iter()
        .enumerate()
        .map(|(i, &person_id)| {
            let extra = if (i as Amount) < remainder { 1 } else { 0 };
            (person_id, single_quota + extra)
        })
        .collect()
}

/// Balance changes produced by an expense: contributions are credited,
/// shares are debited, one entry per person.
pub fn compute_deltas(expense: &Expense) -> Deltas {
    let mut deltas = Deltas::new();

    for contribution in &expense.contributed_by {
        *deltas.entry(contribution.person_id).or_insert(0) += contribution.amount;
    }

    for (person_id, share) in compute_shares(expense.total_price(), &expense.consumed_by) {
        *deltas.entry(person_id).or_insert(0) -= share;
    }

    deltas
}

/// The changes that undo the given ones.
pub fn invert(deltas: &Deltas) -> Deltas {
    deltas.iter().map(|(&p, &d)| (p, -d)).collect()
}

/// Combine two sets of changes into one change per person, dropping people
/// whose changes cancel out.
pub fn merge(first: &Deltas, second: &Deltas) -> Deltas {
    let mut result = first.clone();
    for (&person_id, &delta) in second {
        *result.entry(person_id).or_insert(0) += delta;
    }
    result.retain(|_, delta| *delta != 0);
    result
}

/// Write the changes to the store, one update per person.
///
/// A failure for one person does not stop the updates of the others: the
/// report tells exactly what was written. Nothing is retried. People whose
/// change is zero are not touched.
pub fn apply_deltas<S: PersonStore>(store: &mut S, deltas: &Deltas) -> LedgerReport {
    let mut report = LedgerReport::default();

    for (&person_id, &delta) in deltas.iter().filter(|(_, d)| **d != 0) {
        match store.adjust_balance(person_id, delta) {
            Ok(true) => report.applied.push((person_id, delta)),
            Ok(false) => {
                warn!("Person {person_id} does not exist anymore, skipping balance change of {delta}");
                report.missing.push((person_id, delta));
            }
            Err(e) => {
                warn!("Cannot change balance of person {person_id} by {delta}: {e}");
                report.failed.push(FailedUpdate {
                    person_id,
                    delta,
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

/// Credit the contributors and debit the consumers of a new expense.
///
/// The expense is validated first: if it is invalid, nothing is written. This is
/// not idempotent, so it must be called exactly once per expense.
pub fn apply_new_expense<S: PersonStore>(
    store: &mut S,
    expense: &Expense,
) -> Result<LedgerReport, InputError> {
    validate_expense(expense)?;
    info!(
        "Applying expense for {} ({} contributors, {} consumers)",
        expense.item_name,
        expense.contributed_by.len(),
        expense.consumed_by.len()
    );
    Ok(apply_deltas(store, &compute_deltas(expense)))
}

/// Undo the balance changes of an expense, e.g. because it was deleted.
pub fn revert_expense<S: PersonStore>(store: &mut S, expense: &Expense) -> LedgerReport {
    info!("Reverting expense for {}", expense.item_name);
    apply_deltas(store, &invert(&compute_deltas(expense)))
}

/// Replace the balance changes of *old* with those of *new*.
///
/// The new expense is validated before anything is written. Reverting the old
/// expense and applying the new one are merged, so each person gets exactly one
/// update with the net difference.
pub fn edit_expense<S: PersonStore>(
    store: &mut S,
    old: &Expense,
    new: &Expense,
) -> Result<LedgerReport, InputError> {
    validate_expense(new)?;
    info!("Editing expense for {} into {}", old.item_name, new.item_name);
    let deltas = merge(&invert(&compute_deltas(old)), &compute_deltas(new));
    Ok(apply_deltas(store, &deltas))
}

/// The balance every person should have given the expenses: initial balance
/// plus the changes of all expenses.
pub fn compute_expected_balances(people: &[Person], expenses: &[SavedExpense]) -> Deltas {
    let mut balances: Deltas = people.iter().map(|p| (p.id, p.initial_balance)).collect();

    for saved in expenses {
        for (person_id, delta) in compute_deltas(&saved.expense) {
            // Changes of people that no longer exist were never written.
            if let Some(balance) = balances.get_mut(&person_id) {
                *balance += delta;
            }
        }
    }

    balances
}

/// Find the people whose stored balance differs from the one computed from
/// the expenses.
pub fn check_consistency(people: &[Person], expenses: &[SavedExpense]) -> Vec<Discrepancy> {
    let expected = compute_expected_balances(people, expenses);

    people
        .iter()
        .filter_map(|p| {
            let expected = expected.get(&p.id).copied().unwrap_or(p.initial_balance);
            if expected != p.balance {
                Some(Discrepancy {
                    person_id: p.id,
                    name: p.name.clone(),
                    stored: p.balance,
                    expected,
                })
            } else {
                None
            }
        })
        .collect()
}
