//! Per-table staging arena with reconciling save
//!
//! An importer fetches a staging handle per destination table, stages rows
//! by natural key, then lets `save` reconcile the staged state against the
//! persisted table in one pass: new keys insert, changed rows update only
//! their changed columns, untouched rows optionally delete. Foreign keys
//! may be staged as natural keys and rewritten to surrogate ids through
//! `replace` before saving.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use rusqlite::Connection;
use tracing::debug;

use herbarium_core::{HerbariumError, HerbariumResult};

use crate::value::Value;

/// One row staged for upsert, keyed by its table's natural key
#[derive(Debug)]
pub struct StagedRow {
    table: &'static str,
    values: IndexMap<String, Value>,
    collisions: usize,
}

impl StagedRow {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            values: IndexMap::new(),
            collisions: 0,
        }
    }

    /// Stage a column value, last write wins.
    ///
    /// Overwriting an already-staged column with a different value is a
    /// collision: ambiguous source data, counted and logged but not fatal.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if let Some(old) = self.values.get(column) {
            if *old != value {
                self.collisions += 1;
                debug!(
                    target: "herbarium::staging",
                    "{}.{} staged twice with different values: {} -> {}",
                    self.table, column, old, value
                );
            }
        }
        self.values.insert(column.to_string(), value);
        self
    }

    /// Stage a column value without collision accounting.
    ///
    /// For deliberate second passes over already-staged rows, like the
    /// rank suffix appended to image alt text after all images are known.
    pub fn overwrite(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.values.insert(column.to_string(), value.into());
        self
    }

    /// Currently staged value of a column, if any
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }
}

/// Counts from one reconciling `save`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub collisions: usize,
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} deleted",
            self.inserted, self.updated, self.deleted
        )?;
        if self.collisions > 0 {
            write!(f, ", {} collisions", self.collisions)?;
        }
        Ok(())
    }
}

struct ExistingRow {
    id: i64,
    values: HashMap<String, Value>,
}

/// Staging handle for one destination table
pub struct Table<'t> {
    conn: &'t Connection,
    name: &'static str,
    key_columns: Vec<&'static str>,
    rows: IndexMap<Value, StagedRow>,
}

impl<'t> Table<'t> {
    pub(crate) fn new(conn: &'t Connection, name: &'static str, key_columns: &[&'static str]) -> Self {
        Self {
            conn,
            name,
            key_columns: key_columns.to_vec(),
            rows: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fetch or create the staged row for a natural key.
    ///
    /// The same key always returns the same in-memory row within a run;
    /// a fresh row comes back with its key columns pre-set.
    pub fn get(&mut self, key: &[Value]) -> &mut StagedRow {
        assert_eq!(
            key.len(),
            self.key_columns.len(),
            "table {} keyed by {} columns",
            self.name,
            self.key_columns.len()
        );
        let arena_key = if key.len() == 1 {
            key[0].clone()
        } else {
            Value::composite(key.iter().cloned())
        };
        let name = self.name;
        let key_columns = &self.key_columns;
        self.rows.entry(arena_key).or_insert_with(|| {
            let mut row = StagedRow::new(name);
            for (column, value) in key_columns.iter().zip(key) {
                row.values.insert((*column).to_string(), value.clone());
            }
            row
        })
    }

    /// Rewrite every staged value of a column through a natural-key → id map.
    ///
    /// `Null` passes through untouched. A non-null value missing from the
    /// map is unresolvable source data and fails the run.
    pub fn replace(&mut self, column: &str, map: &HashMap<Value, Value>) -> HerbariumResult<()> {
        for row in self.rows.values_mut() {
            if let Some(current) = row.values.get_mut(column) {
                if current.is_null() {
                    continue;
                }
                match map.get(current) {
                    Some(resolved) => *current = resolved.clone(),
                    None => {
                        return Err(HerbariumError::Unresolved(format!(
                            "{}.{}: no id for '{}'",
                            self.name, column, current
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    /// Iterate the staged rows in insertion order
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut StagedRow> {
        self.rows.values_mut()
    }

    /// Reconcile the staged rows against the persisted table.
    ///
    /// New keys insert; matching rows update only their changed columns;
    /// identical rows are left alone. With `delete_old`, persisted rows
    /// whose key was never staged this run are removed. Saving drains
    /// the staging arena.
    pub fn save(&mut self, delete_old: bool) -> HerbariumResult<SaveOutcome> {
        let mut columns: IndexSet<String> = IndexSet::new();
        for row in self.rows.values() {
            for column in row.values.keys() {
                columns.insert(column.clone());
            }
        }

        if columns.is_empty() {
            // Nothing staged. Only meaningful with delete_old, which then
            // clears the table outright.
            let mut outcome = SaveOutcome::default();
            if delete_old {
                outcome.deleted = self
                    .conn
                    .execute(&format!("DELETE FROM {}", self.name), [])?;
            }
            debug!(target: "herbarium::staging", "{}: {}", self.name, outcome);
            return Ok(outcome);
        }

        let column_list = columns
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let select = format!("SELECT id, {} FROM {}", column_list, self.name);

        let mut existing: HashMap<Vec<Value>, ExistingRow> = HashMap::new();
        {
            let mut stmt = self.conn.prepare(&select)?;
            let mut db_rows = stmt.query([])?;
            while let Some(db_row) = db_rows.next()? {
                let id: i64 = db_row.get(0)?;
                let mut values = HashMap::with_capacity(columns.len());
                for (i, column) in columns.iter().enumerate() {
                    let value: Value = db_row.get(i + 1)?;
                    values.insert(column.clone(), value);
                }
                let key = self
                    .key_columns
                    .iter()
                    .map(|c| values.get(*c).cloned().unwrap_or(Value::Null))
                    .collect::<Vec<_>>();
                existing.insert(key, ExistingRow { id, values });
            }
        }

        let staged: Vec<StagedRow> = self.rows.drain(..).map(|(_, row)| row).collect();
        let collisions = staged.iter().map(|row| row.collisions).sum();

        let mut outcome = SaveOutcome {
            collisions,
            ..SaveOutcome::default()
        };
        let mut touched: HashSet<i64> = HashSet::new();

        for row in staged {
            let key = self
                .key_columns
                .iter()
                .map(|c| row.values.get(*c).cloned().unwrap_or(Value::Null))
                .collect::<Vec<_>>();

            match existing.entry(key) {
                Entry::Occupied(mut entry) => {
                    let current = entry.get_mut();
                    let changed: Vec<(&String, &Value)> = row
                        .values
                        .iter()
                        .filter(|(column, value)| {
                            current.values.get(column.as_str()) != Some(*value)
                        })
                        .collect();
                    if !changed.is_empty() {
                        let assignments = changed
                            .iter()
                            .map(|(column, _)| format!("{} = ?", column))
                            .collect::<Vec<_>>()
                            .join(", ");
                        let sql =
                            format!("UPDATE {} SET {} WHERE id = ?", self.name, assignments);
                        let mut params: Vec<&dyn rusqlite::ToSql> =
                            Vec::with_capacity(changed.len() + 1);
                        for (_, value) in &changed {
                            params.push(*value);
                        }
                        params.push(&current.id);
                        self.conn
                            .prepare_cached(&sql)?
                            .execute(rusqlite::params_from_iter(params))?;
                        for (column, value) in &changed {
                            current
                                .values
                                .insert((*column).clone(), (*value).clone());
                        }
                        outcome.updated += 1;
                    }
                    touched.insert(current.id);
                }
                Entry::Vacant(entry) => {
                    let insert_columns =
                        row.values.keys().map(String::as_str).collect::<Vec<_>>();
                    let placeholders = vec!["?"; insert_columns.len()].join(", ");
                    let sql = format!(
                        "INSERT INTO {} ({}) VALUES ({})",
                        self.name,
                        insert_columns.join(", "),
                        placeholders
                    );
                    self.conn
                        .prepare_cached(&sql)?
                        .execute(rusqlite::params_from_iter(row.values.values()))?;
                    let id = self.conn.last_insert_rowid();
                    touched.insert(id);
                    outcome.inserted += 1;
                    entry.insert(ExistingRow {
                        id,
                        values: row.values.into_iter().collect(),
                    });
                }
            }
        }

        if delete_old {
            let stale: Vec<i64> = existing
                .values()
                .filter(|row| !touched.contains(&row.id))
                .map(|row| row.id)
                .collect();
            let delete = format!("DELETE FROM {} WHERE id = ?", self.name);
            let mut stmt = self.conn.prepare_cached(&delete)?;
            for id in stale {
                stmt.execute([id])?;
                outcome.deleted += 1;
            }
        }

        debug!(target: "herbarium::staging", "{}: {}", self.name, outcome);
        Ok(outcome)
    }
}

impl fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("key_columns", &self.key_columns)
            .field("staged", &self.rows.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE plant (
                id INTEGER PRIMARY KEY,
                slug TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL DEFAULT '',
                height REAL
            );
            CREATE TABLE leaf (
                id INTEGER PRIMARY KEY,
                plant_id INTEGER,
                form TEXT NOT NULL DEFAULT ''
            );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_get_is_idempotent_within_run() {
        let conn = test_conn();
        let db = Database::new(&conn);
        let mut plant = db.table("plant", &["slug"]);

        plant.get(&["acer".into()]).set("name", "Acer");
        plant.get(&["acer".into()]).set("height", 12.5);

        let outcome = plant.save(false).unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.collisions, 0);

        let name: String = conn
            .query_row("SELECT name FROM plant WHERE slug = 'acer'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Acer");
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let conn = test_conn();
        let db = Database::new(&conn);

        for _ in 0..2 {
            let mut plant = db.table("plant", &["slug"]);
            plant.get(&["acer".into()]).set("name", "Acer").set("height", 3.0);
            plant.get(&["quercus".into()]).set("name", "Quercus");
            plant.save(false).unwrap();
        }

        let mut plant = db.table("plant", &["slug"]);
        plant.get(&["acer".into()]).set("name", "Acer").set("height", 3.0);
        plant.get(&["quercus".into()]).set("name", "Quercus");
        let outcome = plant.save(false).unwrap();

        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.deleted, 0);
    }

    #[test]
    fn test_update_touches_only_changed_rows() {
        let conn = test_conn();
        let db = Database::new(&conn);

        let mut plant = db.table("plant", &["slug"]);
        plant.get(&["acer".into()]).set("name", "Acer");
        plant.get(&["quercus".into()]).set("name", "Quercus");
        plant.save(false).unwrap();

        let mut plant = db.table("plant", &["slug"]);
        plant.get(&["acer".into()]).set("name", "Acer rubrum");
        plant.get(&["quercus".into()]).set("name", "Quercus");
        let outcome = plant.save(false).unwrap();

        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.updated, 1);
    }

    #[test]
    fn test_delete_old_removes_untouched_rows() {
        let conn = test_conn();
        let db = Database::new(&conn);

        let mut plant = db.table("plant", &["slug"]);
        plant.get(&["acer".into()]);
        plant.get(&["quercus".into()]);
        plant.get(&["betula".into()]);
        plant.save(false).unwrap();

        let mut plant = db.table("plant", &["slug"]);
        plant.get(&["acer".into()]);
        let outcome = plant.save(true).unwrap();

        assert_eq!(outcome.deleted, 2);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM plant", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_save_with_nothing_staged_and_delete_old_clears_table() {
        let conn = test_conn();
        let db = Database::new(&conn);

        let mut plant = db.table("plant", &["slug"]);
        plant.get(&["acer".into()]);
        plant.save(false).unwrap();

        let mut plant = db.table("plant", &["slug"]);
        let outcome = plant.save(true).unwrap();
        assert_eq!(outcome.deleted, 1);
    }

    #[test]
    fn test_collision_is_counted_and_last_write_wins() {
        let conn = test_conn();
        let db = Database::new(&conn);
        let mut plant = db.table("plant", &["slug"]);

        plant.get(&["acer".into()]).set("name", "Acer");
        plant.get(&["acer".into()]).set("name", "Maple");
        // Same value again is not a collision
        plant.get(&["acer".into()]).set("name", "Maple");

        let outcome = plant.save(false).unwrap();
        assert_eq!(outcome.collisions, 1);

        let name: String = conn
            .query_row("SELECT name FROM plant WHERE slug = 'acer'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Maple");
    }

    #[test]
    fn test_replace_resolves_deferred_references() {
        let conn = test_conn();
        let db = Database::new(&conn);

        let mut plant = db.table("plant", &["slug"]);
        plant.get(&["acer".into()]).set("name", "Acer");
        plant.save(false).unwrap();

        let plant_map = db.map("plant", &["slug"], "id").unwrap();

        let mut leaf = db.table("leaf", &["plant_id", "form"]);
        leaf.get(&["acer".into(), "lobed".into()]);
        leaf.replace("plant_id", &plant_map).unwrap();
        leaf.save(false).unwrap();

        let plant_id: i64 = conn
            .query_row("SELECT plant_id FROM leaf WHERE form = 'lobed'", [], |r| r.get(0))
            .unwrap();
        let acer_id: i64 = conn
            .query_row("SELECT id FROM plant WHERE slug = 'acer'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(plant_id, acer_id);
    }

    #[test]
    fn test_replace_fails_on_unresolved_reference() {
        let conn = test_conn();
        let db = Database::new(&conn);

        let mut leaf = db.table("leaf", &["plant_id", "form"]);
        leaf.get(&["missing".into(), "lobed".into()]);

        let empty = HashMap::new();
        let err = leaf.replace("plant_id", &empty).unwrap_err();
        assert!(matches!(err, HerbariumError::Unresolved(_)));
    }

    #[test]
    fn test_replace_passes_null_through() {
        let conn = test_conn();
        let db = Database::new(&conn);

        let mut leaf = db.table("leaf", &["form"]);
        leaf.get(&["lobed".into()]).set("plant_id", Value::Null);

        let empty = HashMap::new();
        leaf.replace("plant_id", &empty).unwrap();
        leaf.save(false).unwrap();

        let plant_id: Option<i64> = conn
            .query_row("SELECT plant_id FROM leaf WHERE form = 'lobed'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(plant_id, None);
    }
}
