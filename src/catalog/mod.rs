//! Film catalog store
//!
//! Read-mostly SQLite store behind the search tools. Schema is applied
//! idempotently at open; genre and actor names are upserted case-insensitively
//! so re-inserting a shared name never creates a second row.

pub mod seed;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::Path;

use crate::error::Result;
use crate::types::Film;

const TITLE_RESULT_CAP: i64 = 10;
const RESULT_CAP: i64 = 20;

/// SQLite-backed film catalog
pub struct CatalogStore {
    conn: Mutex<Connection>,
}

impl CatalogStore {
    /// Open or create the catalog at the given path
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = create_connection(db_path.as_ref())?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory catalog for testing
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Search films by title substring, case-insensitive, best-rated first
    pub fn search_by_title(&self, title: &str) -> Result<Vec<Film>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT f.id, f.title, f.year, f.rating, f.description
             FROM films f
             WHERE LOWER(f.title) LIKE LOWER(?1)
             ORDER BY f.rating DESC
             LIMIT ?2",
        )?;
        let films = stmt
            .query_map(params![format!("%{title}%"), TITLE_RESULT_CAP], film_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        enrich(&conn, films)
    }

    /// Films carrying the given genre, exact case-insensitive match
    pub fn filter_by_genre(&self, genre: &str) -> Result<Vec<Film>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT f.id, f.title, f.year, f.rating, f.description
             FROM films f
             JOIN film_genres fg ON f.id = fg.film_id
             JOIN genres g ON fg.genre_id = g.id
             WHERE LOWER(g.name) = LOWER(?1)
             ORDER BY f.rating DESC
             LIMIT ?2",
        )?;
        let films = stmt
            .query_map(params![genre, RESULT_CAP], film_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        enrich(&conn, films)
    }

    /// Films with rating in the inclusive range
    pub fn search_by_rating(&self, min_rating: f64, max_rating: f64) -> Result<Vec<Film>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT f.id, f.title, f.year, f.rating, f.description
             FROM films f
             WHERE f.rating BETWEEN ?1 AND ?2
             ORDER BY f.rating DESC
             LIMIT ?3",
        )?;
        let films = stmt
            .query_map(params![min_rating, max_rating, RESULT_CAP], film_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        enrich(&conn, films)
    }

    /// Films featuring an actor whose name contains the given substring
    pub fn search_by_actor(&self, actor_name: &str) -> Result<Vec<Film>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT f.id, f.title, f.year, f.rating, f.description
             FROM films f
             JOIN film_actors fa ON f.id = fa.film_id
             JOIN actors a ON fa.actor_id = a.id
             WHERE LOWER(a.name) LIKE LOWER(?1)
             ORDER BY f.rating DESC
             LIMIT ?2",
        )?;
        let films = stmt
            .query_map(params![format!("%{actor_name}%"), RESULT_CAP], film_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        enrich(&conn, films)
    }

    /// Insert a film with its genre and actor links in one transaction.
    ///
    /// Genre and actor names are upserted; linking two films through the same
    /// name shares the row.
    pub fn add_film(
        &self,
        title: &str,
        year: i32,
        rating: f64,
        description: &str,
        genres: &[&str],
        actors: &[&str],
    ) -> Result<i64> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO films (title, year, rating, description) VALUES (?1, ?2, ?3, ?4)",
            params![title, year, rating, description],
        )?;
        let film_id = tx.last_insert_rowid();

        for genre in genres {
            tx.execute("INSERT OR IGNORE INTO genres (name) VALUES (?1)", params![genre])?;
            let genre_id: i64 =
                tx.query_row("SELECT id FROM genres WHERE name = ?1", params![genre], |row| {
                    row.get(0)
                })?;
            tx.execute(
                "INSERT INTO film_genres (film_id, genre_id) VALUES (?1, ?2)",
                params![film_id, genre_id],
            )?;
        }

        for actor in actors {
            tx.execute("INSERT OR IGNORE INTO actors (name) VALUES (?1)", params![actor])?;
            let actor_id: i64 =
                tx.query_row("SELECT id FROM actors WHERE name = ?1", params![actor], |row| {
                    row.get(0)
                })?;
            tx.execute(
                "INSERT INTO film_actors (film_id, actor_id) VALUES (?1, ?2)",
                params![film_id, actor_id],
            )?;
        }

        tx.commit()?;
        Ok(film_id)
    }

    /// All genre names, sorted. Feeds the genre tool's live description.
    pub fn all_genres(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name FROM genres ORDER BY name")?;
        let genres = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(genres)
    }

    /// Number of films in the catalog
    pub fn film_count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM films", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn create_connection(db_path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open_with_flags(db_path, flags)?;
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
        PRAGMA busy_timeout=30000;
        PRAGMA foreign_keys=ON;
        "#,
    )?;
    Ok(conn)
}

/// Apply the catalog schema if absent
fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS films (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            year INTEGER NOT NULL,
            rating REAL NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS genres (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE
        );

        CREATE TABLE IF NOT EXISTS film_genres (
            film_id INTEGER NOT NULL REFERENCES films(id),
            genre_id INTEGER NOT NULL REFERENCES genres(id),
            PRIMARY KEY (film_id, genre_id)
        );

        CREATE TABLE IF NOT EXISTS actors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE
        );

        CREATE TABLE IF NOT EXISTS film_actors (
            film_id INTEGER NOT NULL REFERENCES films(id),
            actor_id INTEGER NOT NULL REFERENCES actors(id),
            PRIMARY KEY (film_id, actor_id)
        );

        CREATE INDEX IF NOT EXISTS idx_films_rating ON films(rating DESC);
        CREATE INDEX IF NOT EXISTS idx_films_title ON films(title);
        "#,
    )?;
    Ok(())
}

fn film_from_row(row: &Row) -> rusqlite::Result<Film> {
    Ok(Film {
        id: row.get("id")?,
        title: row.get("title")?,
        year: row.get("year")?,
        rating: row.get("rating")?,
        description: row.get("description")?,
        genres: vec![],
        actors: vec![],
    })
}

/// Attach genre and actor lists to each film
fn enrich(conn: &Connection, mut films: Vec<Film>) -> Result<Vec<Film>> {
    let mut genre_stmt = conn.prepare(
        "SELECT g.name FROM genres g
         JOIN film_genres fg ON g.id = fg.genre_id
         WHERE fg.film_id = ?1",
    )?;
    let mut actor_stmt = conn.prepare(
        "SELECT a.name FROM actors a
         JOIN film_actors fa ON a.id = fa.actor_id
         WHERE fa.film_id = ?1
         ORDER BY a.name",
    )?;

    for film in &mut films {
        film.genres = genre_stmt
            .query_map(params![film.id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        film.actors = actor_stmt
            .query_map(params![film.id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
    }
    Ok(films)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> CatalogStore {
        let store = CatalogStore::open_in_memory().unwrap();
        store
            .add_film(
                "Inception",
                2010,
                8.8,
                "Dream heists.",
                &["Sci-Fi", "Thriller"],
                &["Leonardo DiCaprio", "Tom Hardy"],
            )
            .unwrap();
        store
            .add_film(
                "The Matrix",
                1999,
                8.7,
                "Simulated reality.",
                &["Sci-Fi", "Action"],
                &["Keanu Reeves", "Carrie-Anne Moss"],
            )
            .unwrap();
        store
    }

    #[test]
    fn title_search_is_case_insensitive() {
        let store = sample_store();
        let films = store.search_by_title("inception").unwrap();
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].title, "Inception");
        assert_eq!(films[0].genres.len(), 2);
    }

    #[test]
    fn shared_genre_is_one_row() {
        let store = sample_store();
        let conn = store.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM genres WHERE LOWER(name) = 'sci-fi'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
        drop(conn);

        let films = store.filter_by_genre("sci-fi").unwrap();
        assert_eq!(films.len(), 2);
        assert!(films.iter().all(|f| f.genres.iter().any(|g| g == "Sci-Fi")));
    }

    #[test]
    fn rating_range_is_inclusive_and_sorted() {
        let store = sample_store();
        let films = store.search_by_rating(8.7, 8.8).unwrap();
        assert_eq!(films.len(), 2);
        assert_eq!(films[0].title, "Inception");
        assert_eq!(films[1].title, "The Matrix");
    }

    #[test]
    fn actor_search_matches_substring() {
        let store = sample_store();
        let films = store.search_by_actor("reeves").unwrap();
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].title, "The Matrix");
        // Actors come back ordered by name
        assert_eq!(films[0].actors, vec!["Carrie-Anne Moss", "Keanu Reeves"]);
    }

    #[test]
    fn genres_listed_sorted() {
        let store = sample_store();
        let genres = store.all_genres().unwrap();
        assert_eq!(genres, vec!["Action", "Sci-Fi", "Thriller"]);
    }
}
