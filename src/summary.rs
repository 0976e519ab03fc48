//! Read-only reports computed from expenses and meals.
//!
//! Nothing here touches the stored balances: a summary restricted to a date range
//! can legitimately differ from the all-time balance of a person.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ledger::compute_shares;
use crate::types::{Amount, DateRange, MealRecord, MealType, Person, PersonId, SavedExpense};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersonSummary {
    pub person_id: PersonId,
    /// None if the person does not exist anymore.
    pub name: Option<String>,
    pub contributed: Amount,
    pub owed: Amount,
    pub net: Amount,
    pub expense_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttendanceRow {
    pub person_id: PersonId,
    pub name: Option<String>,
    pub breakfast: u32,
    pub lunch: u32,
    pub dinner: u32,
    pub total: u32,
    pub days_present: u32,
    /// Three meals a day, if the range is bounded.
    pub max_meals: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttendanceSummary {
    pub rows: Vec<AttendanceRow>,
    pub total_meals: u32,
    pub average_meals_per_day: Option<f64>,
}

/// Per person totals of the expenses in the range: what they paid, what they
/// owe and in how many expenses they appear.
///
/// There is one row for each person in *people*, in the same order, followed by
/// a row for each person referenced by the expenses but not in *people*.
pub fn compute_summary(
    people: &[Person],
    expenses: &[SavedExpense],
    range: &DateRange,
) -> Vec<PersonSummary> {
    let mut rows: BTreeMap<PersonId, PersonSummary> = BTreeMap::new();

    for saved in expenses.iter().filter(|e| range.contains(e.expense.date)) {
        let expense = &saved.expense;
        let mut involved = BTreeSet::new();

        for contribution in &expense.contributed_by {
            let row = summary_row(&mut rows, contribution.person_id);
            row.contributed += contribution.amount;
            involved.insert(contribution.person_id);
        }

        for (person_id, share) in compute_shares(expense.total_price(), &expense.consumed_by) {
            let row = summary_row(&mut rows, person_id);
            row.owed += share;
            involved.insert(person_id);
        }

        for person_id in involved {
            summary_row(&mut rows, person_id).expense_count += 1;
        }
    }

    let mut result = Vec::with_capacity(people.len());
    for person in people {
        let mut row = rows.remove(&person.id).unwrap_or_default();
        row.person_id = person.id;
        row.name = Some(person.name.clone());
        result.push(row);
    }
    result.extend(rows.into_values());

    for row in &mut result {
        row.net = row.contributed - row.owed;
    }
    result
}

fn summary_row(rows: &mut BTreeMap<PersonId, PersonSummary>, person_id: PersonId) -> &mut PersonSummary {
    rows.entry(person_id).or_insert_with(|| PersonSummary {
        person_id,
        ..Default::default()
    })
}

/// Total spent on each item in the range, largest first.
pub fn totals_by_item(expenses: &[SavedExpense], range: &DateRange) -> Vec<(String, Amount)> {
    let mut totals: HashMap<String, Amount> = HashMap::new();
    for saved in expenses.iter().filter(|e| range.contains(e.expense.date)) {
        *totals.entry(saved.expense.item_name.clone()).or_insert(0) += saved.expense.total_price();
    }
    sort_totals(totals.into_iter().collect())
}

/// Total paid by each contributor in the range, largest first.
pub fn totals_by_contributor(
    expenses: &[SavedExpense],
    range: &DateRange,
) -> Vec<(PersonId, Amount)> {
    let mut totals: HashMap<PersonId, Amount> = HashMap::new();
    for saved in expenses.iter().filter(|e| range.contains(e.expense.date)) {
        for contribution in &saved.expense.contributed_by {
            *totals.entry(contribution.person_id).or_insert(0) += contribution.amount;
        }
    }
    sort_totals(totals.into_iter().collect())
}

fn sort_totals<K: Ord>(mut totals: Vec<(K, Amount)>) -> Vec<(K, Amount)> {
    totals.sort_by(|(k1, a1), (k2, a2)| a2.cmp(a1).then_with(|| k1.cmp(k2)));
    totals
}

/// Expenses matching a case-insensitive query on the item name, the names of the
/// people involved or the quantity. An empty query matches everything.
pub fn search_expenses<'a>(
    expenses: &'a [SavedExpense],
    names: &HashMap<PersonId, String>,
    query: &str,
) -> Vec<&'a SavedExpense> {
    let query = query.trim().to_lowercase();
    expenses
        .iter()
        .filter(|saved| {
            if query.is_empty() {
                return true;
            }
            let expense = &saved.expense;
            let name_matches = |id: &PersonId| {
                names
                    .get(id)
                    .map_or(false, |n| n.to_lowercase().contains(&query))
            };
            expense.item_name.to_lowercase().contains(&query)
                || expense.quantity.to_string().contains(&query)
                || expense.contributed_by.iter().any(|c| name_matches(&c.person_id))
                || expense.consumed_by.iter().any(name_matches)
        })
        .collect()
}

/// Meals attended by each person in the range.
///
/// Rows follow the order of *people*; people with recorded meals that are not in
/// *people* come last.
pub fn compute_attendance(
    people: &[Person],
    meals: &[MealRecord],
    range: &DateRange,
) -> AttendanceSummary {
    let days = range.days();
    let max_meals = days.map(|d| (d * 3) as u32);

    let mut rows: BTreeMap<PersonId, AttendanceRow> = BTreeMap::new();
    let mut days_present: BTreeMap<PersonId, BTreeSet<_>> = BTreeMap::new();
    let mut total_meals = 0;

    for meal in meals.iter().filter(|m| range.contains(m.date)) {
        let row = rows.entry(meal.person_id).or_insert_with(|| AttendanceRow {
            person_id: meal.person_id,
            ..Default::default()
        });
        match meal.meal_type {
            MealType::Breakfast => row.breakfast += 1,
            MealType::Lunch => row.lunch += 1,
            MealType::Dinner => row.dinner += 1,
        }
        row.total += 1;
        total_meals += 1;
        days_present.entry(meal.person_id).or_default().insert(meal.date);
    }

    let mut result = Vec::with_capacity(people.len());
    for person in people {
        let mut row = rows.remove(&person.id).unwrap_or_default();
        row.person_id = person.id;
        row.name = Some(person.name.clone());
        result.push(row);
    }
    result.extend(rows.into_values());

    for row in &mut result {
        row.days_present = days_present.get(&row.person_id).map_or(0, |d| d.len() as u32);
        row.max_meals = max_meals;
    }

    AttendanceSummary {
        rows: result,
        total_meals,
        average_meals_per_day: days
            .filter(|&d| d > 0)
            .map(|d| f64::from(total_meals) / d as f64),
    }
}
