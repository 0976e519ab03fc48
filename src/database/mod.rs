//! Internal representation of data.

use chrono::NaiveDate;

use crate::{
    error::DatabaseError,
    types::{
        Amount, DateRange, Expense, ExpenseId, MealRecord, MealType, NewPerson, Person, PersonId,
        SavedExpense,
    },
};

type DatabaseResult<T> = Result<T, DatabaseError>;

pub mod sqlite;

/// Storage of people and their running balances.
pub trait PersonStore {
    /// Save a new person, whose balance starts at its initial balance.
    ///
    /// Returns the ID of the new person. Names must be unique among active people.
    fn add_person(&mut self, person: &NewPerson) -> DatabaseResult<PersonId>;

    /// Update name and details of a person. The balance is not touched.
    ///
    /// Returns false if the person does not exist.
    fn update_person_details(&mut self, person_id: PersonId, details: &NewPerson)
        -> DatabaseResult<bool>;

    /// Delete a person.
    ///
    /// The actual implementation could delete the person or just mark it as deleted.
    /// Expenses referencing the person are not touched. Returns false if the person
    /// did not exist.
    fn remove_person(&mut self, person_id: PersonId) -> DatabaseResult<bool>;

    /// Find an active person by name, ignoring case.
    fn find_by_name(&self, name: &str) -> DatabaseResult<Option<Person>>;

    fn find_by_id(&self, person_id: PersonId) -> DatabaseResult<Option<Person>>;

    /// Get the list of all active people, sorted by name.
    fn list_all(&self) -> DatabaseResult<Vec<Person>>;

    /// Atomically add *delta* to the balance of a person.
    ///
    /// Returns false if the person does not exist (anymore), in which case nothing
    /// is written.
    fn adjust_balance(&mut self, person_id: PersonId, delta: Amount) -> DatabaseResult<bool>;

    /// Overwrite the balance of a person with a manual value.
    ///
    /// The initial balance is shifted by the same amount, so that the balance can
    /// still be recomputed from the initial balance and the expenses.
    fn set_balance(&mut self, person_id: PersonId, balance: Amount) -> DatabaseResult<bool>;
}

/// Storage of expense records.
pub trait ExpenseStore {
    /// Save an expense and return its unique ID.
    fn create_expense(&mut self, expense: &Expense) -> DatabaseResult<ExpenseId>;

    /// Replace the expense with the given ID. Returns false if it does not exist.
    fn update_expense(&mut self, expense_id: ExpenseId, expense: &Expense) -> DatabaseResult<bool>;

    /// Delete the expense with the given ID. Returns false if it does not exist.
    fn delete_expense(&mut self, expense_id: ExpenseId) -> DatabaseResult<bool>;

    fn get_expense(&self, expense_id: ExpenseId) -> DatabaseResult<Option<SavedExpense>>;

    /// Get the expenses whose date falls in the range, newest first.
    fn query_expenses(&self, range: &DateRange) -> DatabaseResult<Vec<SavedExpense>>;
}

/// Storage of meal attendance.
pub trait MealStore {
    /// Record the meal if it was not recorded, remove it otherwise.
    ///
    /// Returns true if the person is now marked as present for the meal.
    fn toggle_meal(
        &mut self,
        person_id: PersonId,
        meal_type: MealType,
        date: NaiveDate,
    ) -> DatabaseResult<bool>;

    fn query_meals(&self, range: &DateRange) -> DatabaseResult<Vec<MealRecord>>;
}

/// Everything the handlers need from a storage backend.
pub trait Database: PersonStore + ExpenseStore + MealStore {}

impl<T: PersonStore + ExpenseStore + MealStore> Database for T {}
