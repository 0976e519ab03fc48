const CREATE_PERSON_TABLE: &str = "CREATE TABLE IF NOT EXISTS person (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  balance INTEGER NOT NULL DEFAULT 0,
  initial_balance INTEGER NOT NULL DEFAULT 0,
  joining_date DATE,
  address TEXT,
  phone TEXT,
  created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
  deleted_at DATETIME
)";

// Names are only unique, ignoring case, among people that have not been deleted.
const CREATE_PERSON_NAME_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS person_active_name
  ON person (name COLLATE NOCASE) WHERE deleted_at IS NULL";

const CREATE_EXPENSE_TABLE: &str = "CREATE TABLE IF NOT EXISTS expense (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  item_name TEXT NOT NULL,
  quantity INTEGER NOT NULL,
  price_per_unit INTEGER NOT NULL,
  total_price INTEGER NOT NULL,
  date DATE NOT NULL,
  created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
  deleted_at DATETIME
)";

const CREATE_CONTRIBUTION_TABLE: &str = "CREATE TABLE IF NOT EXISTS contribution (
  expense_id INTEGER NOT NULL,
  position INTEGER NOT NULL,
  person_id INTEGER NOT NULL,
  amount INTEGER NOT NULL,
  UNIQUE(expense_id, person_id)
)";

const CREATE_CONSUMPTION_TABLE: &str = "CREATE TABLE IF NOT EXISTS consumption (
  expense_id INTEGER NOT NULL,
  position INTEGER NOT NULL,
  person_id INTEGER NOT NULL,
  UNIQUE(expense_id, person_id)
)";

const CREATE_MEAL_TABLE: &str = "CREATE TABLE IF NOT EXISTS meal (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  person_id INTEGER NOT NULL,
  meal_type TEXT NOT NULL,
  date DATE NOT NULL,
  UNIQUE(person_id, meal_type, date)
)";

pub fn create_all_tables(connection: &rusqlite::Connection) -> anyhow::Result<()> {
    connection.execute(CREATE_PERSON_TABLE, ())?;
    connection.execute(CREATE_PERSON_NAME_INDEX, ())?;
    connection.execute(CREATE_EXPENSE_TABLE, ())?;
    connection.execute(CREATE_CONTRIBUTION_TABLE, ())?;
    connection.execute(CREATE_CONSUMPTION_TABLE, ())?;
    connection.execute(CREATE_MEAL_TABLE, ())?;
    Ok(())
}
