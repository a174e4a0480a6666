use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::HarvestError;
use crate::record::{CanonicalRecord, Company, HarvestRun, RunId, RunStatus, RunUpdate};

/// Rows written by one upsert call plus per-row failures.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub count: usize,
    pub errors: Vec<String>,
}

/// Where harvested products, companies and run records go.
pub trait Storage {
    fn create_run(&self, label: &str) -> Result<RunId, HarvestError>;
    fn update_run(&self, id: RunId, update: &RunUpdate) -> Result<(), HarvestError>;
    /// Insert new products; rows already present by (name, plant part, industry)
    /// are left untouched and not counted.
    fn upsert_products(&self, records: &[CanonicalRecord]) -> Result<UpsertOutcome, HarvestError>;
    fn upsert_companies(&self, companies: &[Company]) -> Result<UpsertOutcome, HarvestError>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, HarvestError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| HarvestError::FatalConfig(format!("{}: {e}", dir.display())))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| HarvestError::FatalConfig(format!("{}: {e}", path.display())))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let store = SqliteStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), HarvestError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS harvest_runs (
                id               INTEGER PRIMARY KEY,
                agent            TEXT NOT NULL,
                started_at       TEXT NOT NULL,
                finished_at      TEXT,
                status           TEXT NOT NULL CHECK(status IN ('running','completed','failed')),
                products_found   INTEGER NOT NULL DEFAULT 0,
                products_saved   INTEGER NOT NULL DEFAULT 0,
                companies_saved  INTEGER NOT NULL DEFAULT 0,
                errors           TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS hemp_products (
                id                      INTEGER PRIMARY KEY,
                name                    TEXT NOT NULL,
                description             TEXT NOT NULL,
                plant_part              TEXT NOT NULL,
                industry                TEXT NOT NULL,
                source_url              TEXT NOT NULL,
                benefits                TEXT NOT NULL DEFAULT '[]',
                technical_specs         TEXT NOT NULL DEFAULT '{}',
                sustainability_aspects  TEXT NOT NULL DEFAULT '[]',
                keywords                TEXT NOT NULL DEFAULT '[]',
                content_hash            TEXT NOT NULL,
                created_at              TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(name, plant_part, industry)
            );
            CREATE INDEX IF NOT EXISTS idx_products_hash ON hemp_products(content_hash);
            CREATE INDEX IF NOT EXISTS idx_products_industry ON hemp_products(industry);

            CREATE TABLE IF NOT EXISTS hemp_companies (
                name           TEXT PRIMARY KEY,
                website        TEXT,
                description    TEXT,
                primary_focus  TEXT,
                created_at     TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    /// Most recent runs first.
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<HarvestRun>, HarvestError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, agent, started_at, status, products_found, products_saved,
                    companies_saved, errors
             FROM harvest_runs
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let started_at: String = row.get(2)?;
                let status: String = row.get(3)?;
                let errors: String = row.get(7)?;
                Ok(HarvestRun {
                    id: row.get(0)?,
                    agent: row.get(1)?,
                    started_at: DateTime::parse_from_rfc3339(&started_at)
                        .map(|t| t.with_timezone(&Utc))
                        .unwrap_or_default(),
                    status: RunStatus::parse(&status).unwrap_or(RunStatus::Failed),
                    products_found: row.get(4)?,
                    products_saved: row.get(5)?,
                    companies_saved: row.get(6)?,
                    errors: serde_json::from_str(&errors).unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn product_count(&self) -> Result<usize, HarvestError> {
        let n: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM hemp_products", [], |r| r.get(0))?;
        Ok(n)
    }

    pub fn company_count(&self) -> Result<usize, HarvestError> {
        let n: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM hemp_companies", [], |r| r.get(0))?;
        Ok(n)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

impl Storage for SqliteStore {
    fn create_run(&self, label: &str) -> Result<RunId, HarvestError> {
        self.conn.execute(
            "INSERT INTO harvest_runs (agent, started_at, status) VALUES (?1, ?2, ?3)",
            params![label, Utc::now().to_rfc3339(), RunStatus::Running.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_run(&self, id: RunId, update: &RunUpdate) -> Result<(), HarvestError> {
        let tx = self.conn.unchecked_transaction()?;
        let errors: String = tx.query_row(
            "SELECT errors FROM harvest_runs WHERE id = ?1",
            params![id],
            |r| r.get(0),
        )?;
        let mut errors: Vec<String> = serde_json::from_str(&errors).unwrap_or_default();
        // one entry per line of the message
        if let Some(msg) = &update.error_message {
            errors.extend(msg.lines().filter(|l| !l.is_empty()).map(str::to_string));
        }
        tx.execute(
            "UPDATE harvest_runs
             SET status = ?2, products_found = ?3, products_saved = ?4,
                 companies_saved = ?5, errors = ?6, finished_at = ?7
             WHERE id = ?1",
            params![
                id,
                update.status.as_str(),
                update.products_found as i64,
                update.products_saved as i64,
                update.companies_saved as i64,
                to_json(&errors),
                Utc::now().to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn upsert_products(&self, records: &[CanonicalRecord]) -> Result<UpsertOutcome, HarvestError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut outcome = UpsertOutcome::default();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO hemp_products
                 (name, description, plant_part, industry, source_url, benefits,
                  technical_specs, sustainability_aspects, keywords, content_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for r in records {
                let result = stmt.execute(params![
                    r.name,
                    r.description,
                    r.plant_part,
                    r.industry,
                    r.source_url,
                    to_json(&r.benefits),
                    to_json(&r.technical_specs),
                    to_json(&r.sustainability_aspects),
                    to_json(&r.keywords),
                    r.content_hash,
                ]);
                match result {
                    Ok(n) => outcome.count += n,
                    Err(e) => outcome.errors.push(format!("product '{}': {}", r.name, e)),
                }
            }
        }
        tx.commit()?;
        Ok(outcome)
    }

    fn upsert_companies(&self, companies: &[Company]) -> Result<UpsertOutcome, HarvestError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut outcome = UpsertOutcome::default();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO hemp_companies (name, website, description, primary_focus)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for c in companies {
                match stmt.execute(params![c.name, c.website, c.description, c.primary_focus]) {
                    Ok(n) => outcome.count += n,
                    Err(e) => outcome.errors.push(format!("company '{}': {}", c.name, e)),
                }
            }
        }
        tx.commit()?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::content_hash;
    use std::collections::BTreeMap;

    fn product(name: &str, part: &str, industry: &str) -> CanonicalRecord {
        CanonicalRecord {
            name: name.into(),
            description: "Hemp product".into(),
            plant_part: part.into(),
            industry: industry.into(),
            source_url: "https://hemp.org".into(),
            benefits: vec!["strong".into()],
            technical_specs: BTreeMap::from([("tensile".to_string(), "high".to_string())]),
            sustainability_aspects: Vec::new(),
            keywords: vec!["hemp".into()],
            content_hash: content_hash(name, part, industry),
        }
    }

    fn company(name: &str) -> Company {
        Company {
            name: name.into(),
            website: Some("https://hemp.org/".into()),
            description: None,
            primary_focus: Some("Textiles".into()),
        }
    }

    #[test]
    fn products_insert_or_ignore() {
        let store = SqliteStore::open_in_memory().unwrap();
        let batch = vec![
            product("Hemp Rope", "Fiber", "Textiles"),
            product("Hemp Rope", "Fiber", "Textiles"),
            product("Hemp Rope", "Stem", "Textiles"),
        ];
        let outcome = store.upsert_products(&batch).unwrap();
        assert_eq!(outcome.count, 2);
        assert!(outcome.errors.is_empty());

        // second run: nothing new
        let again = store.upsert_products(&batch[..1]).unwrap();
        assert_eq!(again.count, 0);
        assert_eq!(store.product_count().unwrap(), 2);
    }

    #[test]
    fn companies_keyed_by_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let outcome = store
            .upsert_companies(&[company("Rope Works"), company("Hempline"), company("Rope Works")])
            .unwrap();
        assert_eq!(outcome.count, 2);
        assert_eq!(store.company_count().unwrap(), 2);
    }

    #[test]
    fn run_lifecycle() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.create_run("harvester").unwrap();
        let second = store.create_run("harvester").unwrap();
        assert!(second > first);

        store
            .update_run(
                first,
                &RunUpdate {
                    status: RunStatus::Completed,
                    products_found: 12,
                    products_saved: 9,
                    companies_saved: 2,
                    error_message: Some(
                        "source unreachable: https://a.org: timeout\nproduct batch 2: disk full".into(),
                    ),
                },
            )
            .unwrap();

        let runs = store.recent_runs(10).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert_eq!(runs[0].status, RunStatus::Running);

        let done = &runs[1];
        assert_eq!(done.status, RunStatus::Completed);
        assert_eq!(done.products_found, 12);
        assert_eq!(done.products_saved, 9);
        assert_eq!(done.companies_saved, 2);
        assert_eq!(done.errors.len(), 2);
        assert_eq!(done.errors[1], "product batch 2: disk full");
        assert_eq!(done.agent, "harvester");

        assert_eq!(store.recent_runs(1).unwrap().len(), 1);
    }

    #[test]
    fn update_unknown_run_fails() {
        let store = SqliteStore::open_in_memory().unwrap();
        let update = RunUpdate {
            status: RunStatus::Failed,
            products_found: 0,
            products_saved: 0,
            companies_saved: 0,
            error_message: None,
        };
        assert!(matches!(store.update_run(99, &update), Err(HarvestError::Storage(_))));
    }

    #[test]
    fn open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hemp.sqlite");
        let store = SqliteStore::open(&path).unwrap();
        store.upsert_products(&[product("Hemp Board", "Stem", "Construction")]).unwrap();
        drop(store);

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.product_count().unwrap(), 1);
    }
}
