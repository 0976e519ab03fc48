//! The implementation of a data storage using Sqlite.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use log::debug;
use rusqlite::{
    params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
    Connection, OptionalExtension, Row, ToSql,
};
use tokio::task::block_in_place;

use crate::{
    error::DatabaseError,
    types::{
        Amount, Contribution, DateRange, Expense, ExpenseId, MealRecord, MealType, NewPerson,
        Person, PersonId, SavedExpense,
    },
};

use super::{DatabaseResult, ExpenseStore, MealStore, PersonStore};

mod schema;

const PERSON_COLUMNS: &str =
    "id, name, balance, initial_balance, joining_date, address, phone";

const ACTIVE_EXPENSES_IN_RANGE: &str = "e.deleted_at IS NULL
     AND (?1 IS NULL OR e.date >= ?1) AND (?2 IS NULL OR e.date <= ?2)";

const ACTIVE_EXPENSE_BY_ID: &str = "e.deleted_at IS NULL AND e.id = ?1";

pub struct SqliteDatabase {
    connection: Connection,
}

impl SqliteDatabase {
    pub fn new<P: AsRef<Path>>(path: P) -> DatabaseResult<SqliteDatabase> {
        block_in_place(|| {
            let connection = Connection::open(path)
                .map_err(|e| DatabaseError::new("cannot open database", e.into()))?;
            schema::create_all_tables(&connection)
                .map_err(|e| DatabaseError::new("cannot create tables", e))?;
            Ok(SqliteDatabase { connection })
        })
    }
}

impl PersonStore for SqliteDatabase {
    fn add_person(&mut self, person: &NewPerson) -> DatabaseResult<PersonId> {
        debug!("Adding person named {}", person.name);
        let fn_impl = || -> anyhow::Result<PersonId> {
            let person_id: PersonId = self.connection.query_row(
                "INSERT INTO person (name, balance, initial_balance, joining_date, address, phone)
                 VALUES (?1, ?2, ?2, ?3, ?4, ?5) RETURNING id",
                params![
                    &person.name,
                    &person.initial_balance,
                    &person.joining_date,
                    &person.address,
                    &person.phone
                ],
                |row| row.get(0),
            )?;

            debug!("person_id is {person_id}");
            Ok(person_id)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot add person", e)))
    }

    fn update_person_details(
        &mut self,
        person_id: PersonId,
        details: &NewPerson,
    ) -> DatabaseResult<bool> {
        debug!("Updating details of person. Person ID: {person_id}");
        let fn_impl = || -> anyhow::Result<bool> {
            let num_updated_rows = self.connection.execute(
                "UPDATE person SET name = ?1, joining_date = ?2, address = ?3, phone = ?4
                 WHERE id = ?5 AND deleted_at IS NULL",
                params![
                    &details.name,
                    &details.joining_date,
                    &details.address,
                    &details.phone,
                    &person_id
                ],
            )?;
            Ok(num_updated_rows == 1)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot update person", e)))
    }

    fn remove_person(&mut self, person_id: PersonId) -> DatabaseResult<bool> {
        debug!("Removing person. Person ID: {person_id}");
        let fn_impl = || -> anyhow::Result<bool> {
            let num_updated_rows = self.connection.execute(
                "UPDATE person SET deleted_at = CURRENT_TIMESTAMP
                 WHERE id = ?1 AND deleted_at IS NULL",
                params![&person_id],
            )?;
            Ok(num_updated_rows == 1)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot remove person", e)))
    }

    fn find_by_name(&self, name: &str) -> DatabaseResult<Option<Person>> {
        let fn_impl = || -> anyhow::Result<Option<Person>> {
            let person = self
                .connection
                .query_row(
                    &format!(
                        "SELECT {PERSON_COLUMNS} FROM person
                         WHERE name = ?1 COLLATE NOCASE AND deleted_at IS NULL"
                    ),
                    params![&name],
                    person_from_row,
                )
                .optional()?;
            Ok(person)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot find person by name", e)))
    }

    fn find_by_id(&self, person_id: PersonId) -> DatabaseResult<Option<Person>> {
        let fn_impl = || -> anyhow::Result<Option<Person>> {
            let person = self
                .connection
                .query_row(
                    &format!(
                        "SELECT {PERSON_COLUMNS} FROM person
                         WHERE id = ?1 AND deleted_at IS NULL"
                    ),
                    params![&person_id],
                    person_from_row,
                )
                .optional()?;
            Ok(person)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot find person by ID", e)))
    }

    fn list_all(&self) -> DatabaseResult<Vec<Person>> {
        let fn_impl = || -> anyhow::Result<Vec<Person>> {
            let mut stmt = self.connection.prepare_cached(&format!(
                "SELECT {PERSON_COLUMNS} FROM person
                 WHERE deleted_at IS NULL ORDER BY name"
            ))?;

            let person_iter = stmt.query_map([], person_from_row)?;

            let people = person_iter.collect::<Result<_, _>>()?;
            Ok(people)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot list people", e)))
    }

    fn adjust_balance(&mut self, person_id: PersonId, delta: Amount) -> DatabaseResult<bool> {
        debug!("Adjusting balance. Person ID: {person_id}. Delta: {delta}");
        let fn_impl = || -> anyhow::Result<bool> {
            // The new balance must stay within the range of an i64, otherwise SQLite
            // would silently store it as a floating point number.
            let lowest = if delta < 0 { Amount::MIN - delta } else { Amount::MIN };
            let highest = if delta > 0 { Amount::MAX - delta } else { Amount::MAX };

            // A single statement, so that concurrent adjustments cannot overwrite each other.
            let num_updated_rows = self.connection.execute(
                "UPDATE person SET balance = balance + ?1
                 WHERE id = ?2 AND deleted_at IS NULL AND balance BETWEEN ?3 AND ?4",
                params![&delta, &person_id, &lowest, &highest],
            )?;
            if num_updated_rows == 1 {
                return Ok(true);
            }

            let exists: bool = self.connection.query_row(
                "SELECT EXISTS(SELECT 1 FROM person WHERE id = ?1 AND deleted_at IS NULL)",
                params![&person_id],
                |row| row.get(0),
            )?;
            if exists {
                Err(anyhow::anyhow!("the balance of person {person_id} would overflow"))
            } else {
                Ok(false)
            }
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot adjust balance", e)))
    }

    fn set_balance(&mut self, person_id: PersonId, balance: Amount) -> DatabaseResult<bool> {
        debug!("Setting balance. Person ID: {person_id}. Balance: {balance}");
        let fn_impl = || -> anyhow::Result<bool> {
            // The right-hand sides see the values from before the update.
            let num_updated_rows = self.connection.execute(
                "UPDATE person SET initial_balance = initial_balance + (?1 - balance), balance = ?1
                 WHERE id = ?2 AND deleted_at IS NULL",
                params![&balance, &person_id],
            )?;
            Ok(num_updated_rows == 1)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot set balance", e)))
    }
}

impl ExpenseStore for SqliteDatabase {
    fn create_expense(&mut self, expense: &Expense) -> DatabaseResult<ExpenseId> {
        let mut fn_impl = || -> anyhow::Result<ExpenseId> {
            let tx = self.connection.transaction()?;

            let expense_id: ExpenseId = {
                let mut insert_expense_stmt = tx.prepare_cached(
                    "INSERT INTO expense (item_name, quantity, price_per_unit, total_price, date)
                     VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
                )?;

                insert_expense_stmt.query_row(
                    params![
                        &expense.item_name,
                        &expense.quantity,
                        &expense.price_per_unit,
                        &expense.total_price(),
                        &expense.date
                    ],
                    |row| row.get(0),
                )?
            };

            debug!("expense_id is {expense_id}");

            insert_assignments(&tx, expense_id, expense)?;

            tx.commit()?;

            Ok(expense_id)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot create expense", e)))
    }

    fn update_expense(&mut self, expense_id: ExpenseId, expense: &Expense) -> DatabaseResult<bool> {
        debug!("Updating expense. Expense ID: {expense_id}");
        let mut fn_impl = || -> anyhow::Result<bool> {
            let tx = self.connection.transaction()?;

            let num_updated_rows = tx.execute(
                "UPDATE expense
                 SET item_name = ?1, quantity = ?2, price_per_unit = ?3, total_price = ?4, date = ?5
                 WHERE id = ?6 AND deleted_at IS NULL",
                params![
                    &expense.item_name,
                    &expense.quantity,
                    &expense.price_per_unit,
                    &expense.total_price(),
                    &expense.date,
                    &expense_id
                ],
            )?;
            if num_updated_rows == 0 {
                // Dropping the transaction rolls it back.
                return Ok(false);
            }

            tx.execute(
                "DELETE FROM contribution WHERE expense_id = ?1",
                params![&expense_id],
            )?;
            tx.execute(
                "DELETE FROM consumption WHERE expense_id = ?1",
                params![&expense_id],
            )?;
            insert_assignments(&tx, expense_id, expense)?;

            tx.commit()?;

            Ok(true)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot update expense", e)))
    }

    fn delete_expense(&mut self, expense_id: ExpenseId) -> DatabaseResult<bool> {
        debug!("Deleting expense. Expense ID: {expense_id}");
        let fn_impl = || -> anyhow::Result<bool> {
            let num_updated_rows = self.connection.execute(
                "UPDATE expense SET deleted_at = CURRENT_TIMESTAMP
                 WHERE id = ?1 AND deleted_at IS NULL",
                params![&expense_id],
            )?;
            Ok(num_updated_rows == 1)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot delete expense", e)))
    }

    fn get_expense(&self, expense_id: ExpenseId) -> DatabaseResult<Option<SavedExpense>> {
        let fn_impl = || -> anyhow::Result<Option<SavedExpense>> {
            let expenses = load_expenses(
                &self.connection,
                ACTIVE_EXPENSE_BY_ID,
                params![&expense_id],
            )?;
            Ok(expenses.into_iter().next())
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get expense", e)))
    }

    fn query_expenses(&self, range: &DateRange) -> DatabaseResult<Vec<SavedExpense>> {
        let fn_impl = || -> anyhow::Result<Vec<SavedExpense>> {
            load_expenses(
                &self.connection,
                ACTIVE_EXPENSES_IN_RANGE,
                params![&range.start, &range.end],
            )
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot query expenses", e)))
    }
}

impl MealStore for SqliteDatabase {
    fn toggle_meal(
        &mut self,
        person_id: PersonId,
        meal_type: MealType,
        date: NaiveDate,
    ) -> DatabaseResult<bool> {
        debug!("Toggling {meal_type} on {date}. Person ID: {person_id}");
        let mut fn_impl = || -> anyhow::Result<bool> {
            let tx = self.connection.transaction()?;

            let num_deleted_rows = tx.execute(
                "DELETE FROM meal WHERE person_id = ?1 AND meal_type = ?2 AND date = ?3",
                params![&person_id, &meal_type, &date],
            )?;
            let is_present = if num_deleted_rows == 0 {
                tx.execute(
                    "INSERT INTO meal (person_id, meal_type, date) VALUES (?1, ?2, ?3)",
                    params![&person_id, &meal_type, &date],
                )?;
                true
            } else {
                false
            };

            tx.commit()?;

            Ok(is_present)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot toggle meal", e)))
    }

    fn query_meals(&self, range: &DateRange) -> DatabaseResult<Vec<MealRecord>> {
        let fn_impl = || -> anyhow::Result<Vec<MealRecord>> {
            let mut stmt = self.connection.prepare_cached(
                "SELECT id, person_id, meal_type, date FROM meal
                 WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
                 ORDER BY date, id",
            )?;

            let meal_iter = stmt.query_map(params![&range.start, &range.end], |row| {
                Ok(MealRecord {
                    id: row.get(0)?,
                    person_id: row.get(1)?,
                    meal_type: row.get(2)?,
                    date: row.get(3)?,
                })
            })?;

            let meals = meal_iter.collect::<Result<_, _>>()?;
            Ok(meals)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot query meals", e)))
    }
}

impl ToSql for MealType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for MealType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| MealType::from_name(s).ok_or(FromSqlError::InvalidType))
    }
}

fn person_from_row(row: &Row) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        balance: row.get(2)?,
        initial_balance: row.get(3)?,
        joining_date: row.get(4)?,
        address: row.get(5)?,
        phone: row.get(6)?,
    })
}

fn insert_assignments(
    tx: &rusqlite::Transaction,
    expense_id: ExpenseId,
    expense: &Expense,
) -> anyhow::Result<()> {
    let mut insert_contribution_stmt = tx.prepare_cached(
        "INSERT INTO contribution (expense_id, position, person_id, amount)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, contribution) in expense.contributed_by.iter().enumerate() {
        insert_contribution_stmt.execute(params![
            &expense_id,
            &(position as i64),
            &contribution.person_id,
            &contribution.amount
        ])?;
    }

    let mut insert_consumption_stmt = tx.prepare_cached(
        "INSERT INTO consumption (expense_id, position, person_id) VALUES (?1, ?2, ?3)",
    )?;
    for (position, person_id) in expense.consumed_by.iter().enumerate() {
        insert_consumption_stmt.execute(params![&expense_id, &(position as i64), person_id])?;
    }

    Ok(())
}

/// Load the expenses matching *filter* (a condition on the `expense e` table)
/// with their contributions and consumptions, newest first.
fn load_expenses(
    connection: &Connection,
    filter: &str,
    params: &[&dyn ToSql],
) -> anyhow::Result<Vec<SavedExpense>> {
    let expenses = {
        let mut stmt = connection.prepare_cached(&format!(
            "SELECT e.id, e.item_name, e.quantity, e.price_per_unit, e.date FROM expense e
             WHERE {filter} ORDER BY e.date DESC, e.id DESC"
        ))?;
        let expense_iter = stmt.query_map(params, |row| {
            Ok(ExpenseQuery {
                id: row.get(0)?,
                item_name: row.get(1)?,
                quantity: row.get(2)?,
                price_per_unit: row.get(3)?,
                date: row.get(4)?,
            })
        })?;
        expense_iter.collect::<Result<Vec<_>, _>>()?
    };

    let contributions = {
        let mut stmt = connection.prepare_cached(&format!(
            "SELECT c.expense_id, c.person_id, c.amount FROM contribution c
             INNER JOIN expense e ON e.id = c.expense_id
             WHERE {filter} ORDER BY c.expense_id, c.position"
        ))?;
        let contribution_iter = stmt.query_map(params, |row| {
            Ok(ContributionQuery {
                expense_id: row.get(0)?,
                person_id: row.get(1)?,
                amount: row.get(2)?,
            })
        })?;
        contribution_iter.collect::<Result<Vec<_>, _>>()?
    };

    let consumptions = {
        let mut stmt = connection.prepare_cached(&format!(
            "SELECT c.expense_id, c.person_id FROM consumption c
             INNER JOIN expense e ON e.id = c.expense_id
             WHERE {filter} ORDER BY c.expense_id, c.position"
        ))?;
        let consumption_iter = stmt.query_map(params, |row| Ok((row.get(0)?, row.get(1)?)))?;
        consumption_iter.collect::<Result<Vec<_>, _>>()?
    };

    Ok(assemble_expenses(expenses, contributions, consumptions))
}

/// Attach contributions and consumptions to their expense, keeping the
/// order of the expenses and the order of the assignments.
fn assemble_expenses(
    expenses: Vec<ExpenseQuery>,
    contributions: Vec<ContributionQuery>,
    consumptions: Vec<(ExpenseId, PersonId)>,
) -> Vec<SavedExpense> {
    let mut contributed_by: HashMap<ExpenseId, Vec<Contribution>> = HashMap::new();
    for c in contributions {
        contributed_by
            .entry(c.expense_id)
            .or_default()
            .push(Contribution::new(c.person_id, c.amount));
    }

    let mut consumed_by: HashMap<ExpenseId, Vec<PersonId>> = HashMap::new();
    for (expense_id, person_id) in consumptions {
        consumed_by.entry(expense_id).or_default().push(person_id);
    }

    expenses
        .into_iter()
        .map(|e| {
            SavedExpense::new(
                e.id,
                Expense {
                    item_name: e.item_name,
                    quantity: e.quantity,
                    price_per_unit: e.price_per_unit,
                    date: e.date,
                    contributed_by: contributed_by.remove(&e.id).unwrap_or_default(),
                    consumed_by: consumed_by.remove(&e.id).unwrap_or_default(),
                },
            )
        })
        .collect()
}

struct ExpenseQuery {
    id: ExpenseId,
    item_name: String,
    quantity: u32,
    price_per_unit: Amount,
    date: NaiveDate,
}

struct ContributionQuery {
    expense_id: ExpenseId,
    person_id: PersonId,
    amount: Amount,
}

fn map_error<T: AsRef<str>>(message: T, e: anyhow::Error) -> DatabaseError {
    match e.downcast::<DatabaseError>() {
        Ok(e) => e,
        Err(e) => DatabaseError::new(message, e),
    }
}
