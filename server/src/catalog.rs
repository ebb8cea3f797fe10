//! Joke catalog and the persistent store it is loaded from
//!
//! The catalog is built once at startup and never mutated. Sessions refer to
//! jokes by their index, so the order fixed at load time stays stable for the
//! lifetime of the process. Cloning a [`JokeCatalog`] only bumps a reference
//! count; every session task shares the same records without locking.

use crate::error::CatalogError;
use log::info;
use rusqlite::{Connection, OpenFlags};
use std::ops::Index;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Jokes inserted by `--seed` into an empty database
pub const SAMPLE_JOKES: &[(&str, &str)] = &[
    ("Lettuce", "Lettuce in, it's cold out here!"),
    ("Boo", "Don't cry, it's only a joke."),
    ("Atch", "Bless you!"),
    ("Olive", "Olive you too!"),
    ("Cow says", "No, a cow says moooo!"),
    ("Interrupting cow", "Moo!"),
    ("Tank", "You're welcome!"),
    ("Harry", "Harry up, it's cold out here!"),
    ("Orange", "Orange you glad I didn't say banana?"),
    ("Nobel", "No bell, that's why I knocked!"),
];

/// One (setup, punchline) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JokeRecord {
    pub setup: String,
    pub punchline: String,
}

impl JokeRecord {
    pub fn new(setup: impl Into<String>, punchline: impl Into<String>) -> Self {
        Self {
            setup: setup.into(),
            punchline: punchline.into(),
        }
    }
}

/// Anything that can produce the full, ordered set of joke rows
pub trait JokeSource {
    fn load(&self) -> Result<Vec<JokeRecord>, CatalogError>;
}

/// Immutable, shared list of jokes
#[derive(Debug, Clone)]
pub struct JokeCatalog {
    jokes: Arc<[JokeRecord]>,
}

impl JokeCatalog {
    /// Builds a catalog, refusing an empty joke set
    pub fn from_records(records: Vec<JokeRecord>) -> Result<Self, CatalogError> {
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self {
            jokes: records.into(),
        })
    }

    pub fn load(source: &impl JokeSource) -> Result<Self, CatalogError> {
        Self::from_records(source.load()?)
    }

    pub fn len(&self) -> usize {
        self.jokes.len()
    }

    /// Always false for a constructed catalog
    pub fn is_empty(&self) -> bool {
        self.jokes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&JokeRecord> {
        self.jokes.get(index)
    }
}

impl Index<usize> for JokeCatalog {
    type Output = JokeRecord;

    fn index(&self, index: usize) -> &JokeRecord {
        &self.jokes[index]
    }
}

/// SQLite database with a `jokes(id, setup, punchline)` table
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates the table if needed and fills it when it holds no rows.
    ///
    /// Returns how many rows were inserted.
    pub fn seed(&self, records: &[JokeRecord]) -> Result<usize, CatalogError> {
        let mut conn = Connection::open(&self.path).map_err(|source| CatalogError::Unreachable {
            path: self.path.clone(),
            source,
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS jokes (
                id INTEGER PRIMARY KEY,
                setup TEXT,
                punchline TEXT
            )",
            [],
        )?;

        let existing: i64 = conn.query_row("SELECT COUNT(*) FROM jokes", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO jokes (setup, punchline) VALUES (?1, ?2)")?;
            for joke in records {
                stmt.execute((&joke.setup, &joke.punchline))?;
            }
        }
        tx.commit()?;

        info!("Seeded {} jokes into {:?}", records.len(), self.path);
        Ok(records.len())
    }
}

impl JokeSource for SqliteSource {
    fn load(&self) -> Result<Vec<JokeRecord>, CatalogError> {
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| CatalogError::Unreachable {
                path: self.path.clone(),
                source,
            })?;

        let mut stmt = conn.prepare("SELECT setup, punchline FROM jokes ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            let setup: Option<String> = row.get(0)?;
            let punchline: Option<String> = row.get(1)?;
            Ok(JokeRecord {
                setup: setup.unwrap_or_default(),
                punchline: punchline.unwrap_or_default(),
            })
        })?;

        let jokes = rows.collect::<Result<Vec<_>, _>>()?;
        info!("Loaded {} jokes from {:?}", jokes.len(), self.path);
        Ok(jokes)
    }
}

/// The built-in sample set as records
pub fn sample_jokes() -> Vec<JokeRecord> {
    SAMPLE_JOKES
        .iter()
        .map(|(setup, punchline)| JokeRecord::new(*setup, *punchline))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_catalog_rejects_empty() {
        let result = JokeCatalog::from_records(Vec::new());
        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[test]
    fn test_catalog_indices_are_stable() {
        let catalog = JokeCatalog::from_records(sample_jokes()).unwrap();
        assert_eq!(catalog.len(), SAMPLE_JOKES.len());
        assert!(!catalog.is_empty());

        for (i, (setup, punchline)) in SAMPLE_JOKES.iter().enumerate() {
            assert_eq!(catalog[i].setup, *setup);
            assert_eq!(catalog[i].punchline, *punchline);
        }
        assert!(catalog.get(SAMPLE_JOKES.len()).is_none());

        let shared = catalog.clone();
        assert_eq!(shared[3], catalog[3]);
    }

    #[test]
    fn test_sqlite_missing_file_is_unreachable() {
        let dir = tempdir().unwrap();
        let source = SqliteSource::new(dir.path().join("missing.db"));

        let result = JokeCatalog::load(&source);
        assert!(matches!(result, Err(CatalogError::Unreachable { .. })));
    }

    #[test]
    fn test_sqlite_without_table_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jokes.db");
        Connection::open(&path)
            .unwrap()
            .execute("CREATE TABLE other (x INTEGER)", [])
            .unwrap();

        let result = SqliteSource::new(&path).load();
        assert!(matches!(result, Err(CatalogError::Malformed(_))));
    }

    #[test]
    fn test_sqlite_empty_table_is_fatal() {
        let dir = tempdir().unwrap();
        let source = SqliteSource::new(dir.path().join("jokes.db"));
        assert_eq!(source.seed(&[]).unwrap(), 0);

        assert!(source.load().unwrap().is_empty());
        assert!(matches!(JokeCatalog::load(&source), Err(CatalogError::Empty)));
    }

    #[test]
    fn test_sqlite_seed_and_load() {
        let dir = tempdir().unwrap();
        let source = SqliteSource::new(dir.path().join("jokes.db"));

        assert_eq!(source.seed(&sample_jokes()).unwrap(), SAMPLE_JOKES.len());
        // Seeding a populated table is a no-op
        assert_eq!(source.seed(&sample_jokes()).unwrap(), 0);

        let catalog = JokeCatalog::load(&source).unwrap();
        assert_eq!(catalog.len(), SAMPLE_JOKES.len());
        assert_eq!(catalog[0].setup, "Lettuce");
    }

    #[test]
    fn test_sqlite_null_columns_load_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jokes.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "CREATE TABLE jokes (id INTEGER PRIMARY KEY, setup TEXT, punchline TEXT)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO jokes (setup, punchline) VALUES ('Boo', NULL)",
            [],
        )
        .unwrap();
        drop(conn);

        let jokes = SqliteSource::new(&path).load().unwrap();
        assert_eq!(jokes, vec![JokeRecord::new("Boo", "")]);
    }
}
