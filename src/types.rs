//! Data shared by the ledger, the stores and the console.

use std::fmt;

use chrono::{Months, NaiveDate};

/// Money is counted in hundredths of the currency unit.
pub type Amount = i64;

/// Largest total price accepted for a single expense, so that balances and
/// reports stay far from the limits of `Amount`.
pub const MAX_TOTAL_PRICE: Amount = 1_000_000_000_000_000;

pub type PersonId = i64;
pub type ExpenseId = i64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub balance: Amount,
    pub initial_balance: Amount,
    pub joining_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// A person that has not been saved yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub initial_balance: Amount,
    pub joining_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Money paid by one person toward an expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub person_id: PersonId,
    pub amount: Amount,
}

/// The facts of a purchase together with who paid and who consumed.
///
/// The consumers owe an equal share of the total price, whether or not
/// they also contributed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub item_name: String,
    pub quantity: u32,
    pub price_per_unit: Amount,
    pub date: NaiveDate,
    pub contributed_by: Vec<Contribution>,
    pub consumed_by: Vec<PersonId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedExpense {
    pub id: ExpenseId,
    pub expense: Expense,
}

/// An expense as typed by the user: people are still referenced by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedExpense {
    pub item_name: String,
    pub quantity: u32,
    pub price_per_unit: Amount,
    pub date: Option<NaiveDate>,
    pub contributed_by: Vec<ParsedContribution>,
    pub consumed_by: Vec<String>,
}

/// A contributor without an amount pays an equal part of what the others
/// did not cover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedContribution {
    pub name: String,
    pub amount: Option<Amount>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MealRecord {
    pub id: i64,
    pub person_id: PersonId,
    pub meal_type: MealType,
    pub date: NaiveDate,
}

/// An inclusive range of dates. A missing bound means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Expense {
    pub fn total_price(&self) -> Amount {
        self.price_per_unit * Amount::from(self.quantity)
    }

    /// The sum of the contributions, or None if it does not fit in an `Amount`.
    pub fn total_contributed(&self) -> Option<Amount> {
        self.contributed_by
            .iter()
            .try_fold(0 as Amount, |total, c| total.checked_add(c.amount))
    }
}

impl SavedExpense {
    pub fn new(id: ExpenseId, expense: Expense) -> SavedExpense {
        SavedExpense { id, expense }
    }
}

impl Contribution {
    pub fn new(person_id: PersonId, amount: Amount) -> Contribution {
        Contribution { person_id, amount }
    }
}

impl NewPerson {
    pub fn new(name: &str) -> NewPerson {
        NewPerson {
            name: name.to_string(),
            initial_balance: 0,
            joining_date: None,
            address: None,
            phone: None,
        }
    }
}

impl ParsedContribution {
    pub fn new(name: &str, amount: Option<Amount>) -> ParsedContribution {
        ParsedContribution {
            name: name.to_string(),
            amount,
        }
    }
}

impl ParsedExpense {
    /// None if the total does not fit in an amount.
    pub fn total_price(&self) -> Option<Amount> {
        self.price_per_unit.checked_mul(Amount::from(self.quantity))
    }
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
        }
    }

    pub fn from_name(name: &str) -> Option<MealType> {
        match name.trim().to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            _ => None,
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DateRange {
        DateRange { start, end }
    }

    pub fn all() -> DateRange {
        DateRange::default()
    }

    /// Everything since yesterday.
    pub fn daily(today: NaiveDate) -> DateRange {
        DateRange::new(today.pred_opt(), Some(today))
    }

    /// Everything since the same day of the previous month.
    pub fn monthly(today: NaiveDate) -> DateRange {
        DateRange::new(today.checked_sub_months(Months::new(1)), Some(today))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| s <= date) && self.end.map_or(true, |e| date <= e)
    }

    /// Number of days in the range, if it is bounded on both sides.
    pub fn days(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(s), Some(e)) if s <= e => Some((e - s).num_days() + 1),
            (Some(_), Some(_)) => Some(0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("test")
    }

    #[test]
    fn test_total_price() {
        let expense = Expense {
            item_name: "rice".to_string(),
            quantity: 3,
            price_per_unit: 10050,
            date: date(2024, 3, 1),
            contributed_by: vec![Contribution::new(1, 30150)],
            consumed_by: vec![1, 2],
        };
        assert_eq!(expense.total_price(), 30150);
        assert_eq!(expense.total_contributed(), Some(30150));

        let expense = Expense {
            contributed_by: vec![Contribution::new(1, Amount::MAX), Contribution::new(2, 1)],
            ..expense
        };
        assert_eq!(expense.total_contributed(), None);
    }

    #[test]
    fn test_date_range() {
        let today = date(2024, 3, 31);

        let daily = DateRange::daily(today);
        assert!(daily.contains(date(2024, 3, 30)));
        assert!(!daily.contains(date(2024, 3, 29)));
        assert_eq!(daily.days(), Some(2));

        let monthly = DateRange::monthly(today);
        assert_eq!(monthly.start, Some(date(2024, 2, 29)));
        assert!(!monthly.contains(date(2024, 4, 1)));

        assert!(DateRange::all().contains(date(1970, 1, 1)));
        assert_eq!(DateRange::all().days(), None);
    }

    #[test]
    fn test_meal_type_names() {
        assert_eq!(MealType::from_name(" Lunch "), Some(MealType::Lunch));
        assert_eq!(MealType::from_name("brunch"), None);
        assert_eq!(MealType::Dinner.to_string(), "dinner");
    }
}
