use super::{PersistenceResult, SnapshotStore};
use crate::cost_item::CostItem;
use crate::snapshot::{EngineSettings, ProjectSnapshot};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use site_schedule::{Relation, ScheduleMetadata, Task, WorkCalendarConfig};
use std::path::Path;
use std::sync::Mutex;

/// Keeps one project in an SQLite file, one JSON document per record.
pub struct SqliteSnapshotStore {
    connection: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS project (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                metadata_json TEXT NOT NULL,
                calendar_json TEXT,
                settings_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                task_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS relations (
                predecessor_id INTEGER NOT NULL,
                successor_id INTEGER NOT NULL,
                relation_json TEXT NOT NULL,
                PRIMARY KEY (predecessor_id, successor_id)
            );
            CREATE TABLE IF NOT EXISTS cost_items (
                id INTEGER PRIMARY KEY,
                item_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // a panic mid-transaction rolls back, so the connection stays usable
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save_project(tx: &Transaction, snapshot: &ProjectSnapshot) -> PersistenceResult<()> {
        let metadata_json = serde_json::to_string(&snapshot.metadata)?;
        let calendar_json = snapshot
            .calendar
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let settings_json = serde_json::to_string(&snapshot.settings)?;
        tx.execute("DELETE FROM project", [])?;
        tx.execute(
            "INSERT INTO project (id, metadata_json, calendar_json, settings_json) VALUES (1, ?1, ?2, ?3)",
            params![metadata_json, calendar_json, settings_json],
        )?;
        Ok(())
    }

    fn save_records(tx: &Transaction, snapshot: &ProjectSnapshot) -> PersistenceResult<()> {
        tx.execute("DELETE FROM tasks", [])?;
        tx.execute("DELETE FROM relations", [])?;
        tx.execute("DELETE FROM cost_items", [])?;

        let mut stmt = tx.prepare("INSERT INTO tasks (id, task_json) VALUES (?1, ?2)")?;
        for task in &snapshot.tasks {
            stmt.execute(params![task.id, serde_json::to_string(task)?])?;
        }
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO relations (predecessor_id, successor_id, relation_json) VALUES (?1, ?2, ?3)",
        )?;
        for relation in &snapshot.relations {
            stmt.execute(params![
                relation.predecessor_id,
                relation.successor_id,
                serde_json::to_string(relation)?
            ])?;
        }
        let mut stmt = tx.prepare("INSERT INTO cost_items (id, item_json) VALUES (?1, ?2)")?;
        for item in &snapshot.cost_items {
            stmt.execute(params![item.id, serde_json::to_string(item)?])?;
        }
        Ok(())
    }

    fn load_json_rows<T>(connection: &Connection, sql: &str) -> PersistenceResult<Vec<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let mut stmt = connection.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut values = Vec::new();
        for json in rows {
            values.push(serde_json::from_str(&json?)?);
        }
        Ok(values)
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn save_snapshot(&self, snapshot: &ProjectSnapshot) -> PersistenceResult<()> {
        super::validate_snapshot(snapshot)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        Self::save_project(&tx, snapshot)?;
        Self::save_records(&tx, snapshot)?;
        tx.commit()?;
        Ok(())
    }

    fn load_snapshot(&self) -> PersistenceResult<Option<ProjectSnapshot>> {
        let conn = self.lock();

        let project: Option<(String, Option<String>, String)> = conn
            .query_row(
                "SELECT metadata_json, calendar_json, settings_json FROM project WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((metadata_json, calendar_json, settings_json)) = project else {
            return Ok(None);
        };

        let metadata: ScheduleMetadata = serde_json::from_str(&metadata_json)?;
        let calendar: Option<WorkCalendarConfig> = calendar_json
            .map(|json| serde_json::from_str(&json))
            .transpose()?;
        let settings: EngineSettings = serde_json::from_str(&settings_json)?;
        let tasks: Vec<Task> =
            Self::load_json_rows(&conn, "SELECT task_json FROM tasks ORDER BY id ASC")?;
        let relations: Vec<Relation> = Self::load_json_rows(
            &conn,
            "SELECT relation_json FROM relations ORDER BY predecessor_id, successor_id",
        )?;
        let cost_items: Vec<CostItem> =
            Self::load_json_rows(&conn, "SELECT item_json FROM cost_items ORDER BY id ASC")?;

        let snapshot = ProjectSnapshot {
            metadata,
            calendar,
            settings,
            tasks,
            relations,
            cost_items,
        };
        super::validate_snapshot(&snapshot)?;
        Ok(Some(snapshot))
    }
}
