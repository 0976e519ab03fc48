//! Checks on an expense whose people have already been resolved.
//!
//! These functions are called before anything is written, both by the
//! handlers and by the ledger itself.

use std::collections::HashSet;

use crate::error::InputError;
use crate::types::{Amount, Expense, MAX_TOTAL_PRICE};

/// Some sanity checks on the expense that was submitted.
///
/// List of checks:
/// - the item has a name
/// - the quantity is at least one, the price per unit is not negative and the
///   total price is not above `MAX_TOTAL_PRICE`
/// - every contributor paid a positive amount
/// - nobody appears twice as contributor or twice as consumer
/// - the contributions add up exactly to the total price
pub fn validate_expense(expense: &Expense) -> Result<(), InputError> {
    item_is_named(expense)?;
    quantity_and_price_in_range(expense)?;
    contributions_are_positive(expense)?;
    no_duplicate_people(expense)?;
    contributions_match_total(expense)?;
    Ok(())
}

fn item_is_named(expense: &Expense) -> Result<(), InputError> {
    if expense.item_name.trim().is_empty() {
        Err(InputError::invalid_expense(
            "the item has no name!",
            format!("{:#?}", expense),
        ))
    } else {
        Ok(())
    }
}

fn quantity_and_price_in_range(expense: &Expense) -> Result<(), InputError> {
    if expense.quantity == 0 {
        Err(InputError::invalid_expense(
            "the quantity must be at least one!",
            format!("{:#?}", expense),
        ))
    } else if expense.price_per_unit < 0 {
        Err(InputError::invalid_expense(
            "the price per unit cannot be negative!",
            format!("{:#?}", expense),
        ))
    } else if !expense
        .price_per_unit
        .checked_mul(Amount::from(expense.quantity))
        .map_or(false, |total| total <= MAX_TOTAL_PRICE)
    {
        Err(InputError::invalid_expense(
            "the total price is too large!",
            format!("{:#?}", expense),
        ))
    } else {
        Ok(())
    }
}

fn contributions_are_positive(expense: &Expense) -> Result<(), InputError> {
    if expense.contributed_by.iter().any(|c| c.amount <= 0) {
        Err(InputError::invalid_expense(
            "every contributor must pay a positive amount!",
            format!("{:#?}", expense),
        ))
    } else {
        Ok(())
    }
}

fn no_duplicate_people(expense: &Expense) -> Result<(), InputError> {
    let contributors_are_unique = all_unique(expense.contributed_by.iter().map(|c| c.person_id));
    let consumers_are_unique = all_unique(expense.consumed_by.iter().copied());

    if !contributors_are_unique {
        Err(InputError::invalid_expense(
            "there are contributors appearing multiple times!",
            format!("{:#?}", expense),
        ))
    } else if !consumers_are_unique {
        Err(InputError::invalid_expense(
            "there are consumers appearing multiple times!",
            format!("{:#?}", expense),
        ))
    } else {
        Ok(())
    }
}

fn contributions_match_total(expense: &Expense) -> Result<(), InputError> {
    let total: Amount = expense.total_price();
    let contributed: Amount = expense.total_contributed().ok_or_else(|| {
        InputError::invalid_expense("the amounts are too large!", format!("{:#?}", expense))
    })?;

    if contributed != total {
        Err(InputError::contribution_mismatch(contributed, total))
    } else {
        Ok(())
    }
}

fn all_unique<T: Eq + std::hash::Hash, I: Iterator<Item = T>>(items: I) -> bool {
    // A HashSet returns false upon insertion if the element is already present.
    let mut uniq = HashSet::new();
    items.into_iter().all(|x| uniq.insert(x))
}
