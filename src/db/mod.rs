mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::import;
use crate::models::*;

const PROJECT_COLUMNS: &str = "id, name, description, document, created_at, updated_at";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::info!("Opened project store at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "featurecost")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Self::open(dirs.data_dir().join("featurecost.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Project operations
    // ============================================================

    pub fn get_all_projects(&self) -> Result<Vec<ProjectSummary>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM projects ORDER BY name",
        )?;

        let projects = stmt
            .query_map([], |row| {
                Ok(ProjectSummary {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: parse_datetime(row.get::<_, String>(3)?),
                    updated_at: parse_datetime(row.get::<_, String>(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"))?;

        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(project_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();
        let document = input.document.unwrap_or_default();
        let document_json = serde_json::to_string(&document).context("Failed to serialize document")?;

        conn.execute(
            "INSERT INTO projects (id, name, description, document, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.description,
                &document_json,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;
        tracing::info!(%id, name = %input.name, "created project");

        Ok(Project {
            id,
            name: input.name,
            description: input.description,
            document,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_project(&self, id: Uuid, input: UpdateProjectInput) -> Result<Option<Project>> {
        let Some(existing) = self.get_project(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);

        conn.execute(
            "UPDATE projects SET name = ?, description = ?, updated_at = ? WHERE id = ?",
            (&name, &description, now.to_rfc3339(), id.to_string()),
        )?;

        Ok(Some(Project {
            id,
            name,
            description,
            document: existing.document,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Replace the stored document. Returns false if the project doesn't exist.
    pub fn save_document(&self, id: Uuid, document: &EstimateProject) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let document_json = serde_json::to_string(document).context("Failed to serialize document")?;
        let rows = conn.execute(
            "UPDATE projects SET document = ?, updated_at = ? WHERE id = ?",
            (&document_json, Utc::now().to_rfc3339(), id.to_string()),
        )?;
        Ok(rows > 0)
    }

    pub fn delete_project(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM projects WHERE id = ?", [id.to_string()])?;
        if rows > 0 {
            tracing::info!(%id, "deleted project");
        }
        Ok(rows > 0)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let id = parse_uuid(row.get::<_, String>(0)?);
    Ok(Project {
        id,
        name: row.get(1)?,
        description: row.get(2)?,
        document: parse_document(id, &row.get::<_, String>(3)?),
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

/// Stored documents go through the partial importer so one bad entry
/// doesn't make the whole project unreadable.
fn parse_document(id: Uuid, json: &str) -> EstimateProject {
    match import::import_project(json) {
        Ok(imported) => imported.project,
        Err(e) => {
            tracing::warn!(%id, "Stored document is unreadable, using an empty one: {}", e);
            EstimateProject::default()
        }
    }
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
