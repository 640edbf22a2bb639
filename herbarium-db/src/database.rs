//! Facade over an open SQLite connection for the import run

use std::collections::HashMap;

use rusqlite::Connection;

use herbarium_core::HerbariumResult;

use crate::table::Table;
use crate::value::Value;

/// Handle importers use to stage tables and resolve natural keys.
///
/// The connection is expected to sit inside the dispatcher's transaction;
/// the facade itself never commits.
pub struct Database<'t> {
    conn: &'t Connection,
}

impl<'t> Database<'t> {
    pub fn new(conn: &'t Connection) -> Self {
        Self { conn }
    }

    /// Direct connection access, for the few operations that work on
    /// persisted rows without a staging pass
    pub fn connection(&self) -> &'t Connection {
        self.conn
    }

    /// Staging handle for a destination table and its natural key
    pub fn table(&self, name: &'static str, key_columns: &[&'static str]) -> Table<'t> {
        Table::new(self.conn, name, key_columns)
    }

    /// Fresh natural-key → value mapping read from the persisted table.
    ///
    /// Multiple key columns produce `Value::Composite` keys, which is how
    /// range character values get resolved back to their ids.
    pub fn map(
        &self,
        table: &str,
        key_columns: &[&str],
        value_column: &str,
    ) -> HerbariumResult<HashMap<Value, Value>> {
        let sql = format!(
            "SELECT {}, {} FROM {}",
            key_columns.join(", "),
            value_column,
            table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut map = HashMap::new();
        while let Some(row) = rows.next()? {
            let key = if key_columns.len() == 1 {
                row.get::<_, Value>(0)?
            } else {
                let mut parts = Vec::with_capacity(key_columns.len());
                for i in 0..key_columns.len() {
                    parts.push(row.get::<_, Value>(i)?);
                }
                Value::Composite(parts)
            };
            let value: Value = row.get(key_columns.len())?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// One-to-many variant of `map`
    pub fn manymap(
        &self,
        table: &str,
        key_column: &str,
        value_column: &str,
    ) -> HerbariumResult<HashMap<Value, Vec<Value>>> {
        let sql = format!("SELECT {}, {} FROM {}", key_column, value_column, table);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut map: HashMap<Value, Vec<Value>> = HashMap::new();
        while let Some(row) = rows.next()? {
            let key: Value = row.get(0)?;
            let value: Value = row.get(1)?;
            map.entry(key).or_default().push(value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE shrub (
                id INTEGER PRIMARY KEY,
                slug TEXT NOT NULL DEFAULT '',
                region TEXT NOT NULL DEFAULT ''
            );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_map_is_read_fresh_per_call() {
        let conn = test_conn();
        let db = Database::new(&conn);

        let mut shrub = db.table("shrub", &["slug"]);
        shrub.get(&["ilex".into()]);
        shrub.save(false).unwrap();

        let before = db.map("shrub", &["slug"], "id").unwrap();
        assert_eq!(before.len(), 1);

        let mut shrub = db.table("shrub", &["slug"]);
        shrub.get(&["ilex".into()]);
        shrub.get(&["kalmia".into()]);
        shrub.save(false).unwrap();

        let after = db.map("shrub", &["slug"], "id").unwrap();
        assert_eq!(after.len(), 2);
        assert!(after.contains_key(&Value::from("kalmia")));
    }

    #[test]
    fn test_composite_map_keys() {
        let conn = test_conn();
        let db = Database::new(&conn);

        let mut shrub = db.table("shrub", &["slug", "region"]);
        shrub.get(&["ilex".into(), "ME".into()]);
        shrub.get(&["ilex".into(), "VT".into()]);
        shrub.save(false).unwrap();

        let map = db.map("shrub", &["slug", "region"], "id").unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&Value::composite(["ilex".into(), "VT".into()])));
    }

    #[test]
    fn test_manymap_groups_values() {
        let conn = test_conn();
        let db = Database::new(&conn);

        let mut shrub = db.table("shrub", &["slug", "region"]);
        shrub.get(&["ilex".into(), "ME".into()]);
        shrub.get(&["ilex".into(), "VT".into()]);
        shrub.get(&["kalmia".into(), "ME".into()]);
        shrub.save(false).unwrap();

        let map = db.manymap("shrub", "slug", "region").unwrap();
        assert_eq!(map[&Value::from("ilex")].len(), 2);
        assert_eq!(map[&Value::from("kalmia")].len(), 1);
    }
}
