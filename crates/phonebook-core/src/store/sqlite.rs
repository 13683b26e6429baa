//! SQLite entity store
//!
//! Layout:
//! ```text
//! persons       (id, name UNIQUE, phone, street, city, birth_year)
//! users         (id, username UNIQUE)
//! user_friends  (user_id, person_id, position, UNIQUE(user_id, person_id))
//! ```
//! Insertion order is the table rowid; friend order is `position`.

use super::PhonebookStore;
use crate::error::{Error, Result};
use crate::models::{Friends, NewPerson, Person, PersonFilter, PersonId, User, UserId};
use crate::validation::{self, FieldViolation, ValidationError, PERSON, USER};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

const PERSON_COLUMNS: &str = "id, name, phone, street, city, birth_year";

#[derive(Debug, sqlx::FromRow)]
struct PersonRow {
    id: String,
    name: String,
    phone: Option<String>,
    street: String,
    city: String,
    birth_year: i64,
}

impl TryFrom<PersonRow> for Person {
    type Error = Error;

    fn try_from(row: PersonRow) -> Result<Self> {
        Ok(Person {
            id: parse_id(&row.id)?,
            birth_year: i32::try_from(row.birth_year)
                .map_err(|_| Error::Corrupt(format!("birth_year {} out of range", row.birth_year)))?,
            name: row.name,
            phone: row.phone,
            street: row.street,
            city: row.city,
        })
    }
}

fn parse_id<T: FromStr>(raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::Corrupt(format!("invalid id {raw:?}")))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Store backed by an sqlx SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Builds the pool without opening a connection. Only a malformed URL
    /// fails here; connectivity problems show up on first use.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_lazy_with(options);
        Ok(Self { pool })
    }

    /// Opens the pool and creates the tables.
    pub async fn connect(url: &str) -> Result<Self> {
        let store = Self::connect_lazy(url)?;
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS persons (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                phone TEXT,
                street TEXT NOT NULL,
                city TEXT NOT NULL,
                birth_year INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_friends (
                user_id TEXT NOT NULL,
                person_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (person_id) REFERENCES persons(id),
                UNIQUE(user_id, person_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("[Store] SQLite schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn friends_of(&self, user: UserId, resolve: bool) -> Result<Friends> {
        if resolve {
            let rows: Vec<PersonRow> = sqlx::query_as(
                r#"
                SELECT p.id, p.name, p.phone, p.street, p.city, p.birth_year
                FROM user_friends f
                JOIN persons p ON p.id = f.person_id
                WHERE f.user_id = ?
                ORDER BY f.position
                "#,
            )
            .bind(user.to_string())
            .fetch_all(&self.pool)
            .await?;
            let persons = rows
                .into_iter()
                .map(Person::try_from)
                .collect::<Result<Vec<_>>>()?;
            return Ok(Friends::Resolved(persons));
        }

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT person_id FROM user_friends WHERE user_id = ? ORDER BY position",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;
        let ids = rows
            .iter()
            .map(|(id,)| parse_id(id))
            .collect::<Result<Vec<_>>>()?;
        Ok(Friends::Unresolved(ids))
    }

    async fn load_user(&self, row: Option<(String, String)>, resolve: bool) -> Result<Option<User>> {
        let Some((id, username)) = row else {
            return Ok(None);
        };
        let id: UserId = parse_id(&id)?;
        let friends = self.friends_of(id, resolve).await?;
        Ok(Some(User {
            id,
            username,
            friends,
        }))
    }
}

#[async_trait]
impl PhonebookStore for SqliteStore {
    async fn count_persons(&self) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM persons")
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn find_persons(&self, filter: PersonFilter) -> Result<Vec<Person>> {
        let condition = match filter.has_phone {
            None => "",
            Some(true) => " WHERE phone IS NOT NULL",
            Some(false) => " WHERE phone IS NULL",
        };
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons{condition} ORDER BY rowid");

        let rows: Vec<PersonRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Person::try_from).collect()
    }

    async fn find_person_by_name(&self, name: &str) -> Result<Option<Person>> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE name = ?");
        let row: Option<PersonRow> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Person::try_from).transpose()
    }

    async fn create_person(&self, fields: NewPerson) -> Result<Person> {
        let mut checks = validation::new_person_checks(&fields);
        if self.find_person_by_name(&fields.name).await?.is_some() {
            checks.push(FieldViolation::unique("name", &fields.name));
        }
        checks.finish(PERSON, || validation::to_args(&fields))?;

        let person = fields.into_person(PersonId::new());
        let inserted = sqlx::query(
            "INSERT INTO persons (id, name, phone, street, city, birth_year) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(person.id.to_string())
        .bind(&person.name)
        .bind(&person.phone)
        .bind(&person.street)
        .bind(&person.city)
        .bind(person.birth_year)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                info!("[Store] Person created: {}", person.name);
                Ok(person)
            }
            Err(e) if is_unique_violation(&e) => Err(ValidationError::unique(
                PERSON,
                "name",
                &person.name,
                validation::to_args(&person),
            )
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_person_phone(&self, name: &str, phone: &str) -> Result<Option<Person>> {
        let Some(mut person) = self.find_person_by_name(name).await? else {
            return Ok(None);
        };

        person.phone = Some(phone.to_string());
        validation::validate_person(&person)?;

        sqlx::query("UPDATE persons SET phone = ? WHERE id = ?")
            .bind(&person.phone)
            .bind(person.id.to_string())
            .execute(&self.pool)
            .await?;

        info!("[Store] Phone updated for {}", name);
        Ok(Some(person))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT id, username FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        self.load_user(row, false).await
    }

    async fn find_user_by_id(&self, id: UserId, resolve_friends: bool) -> Result<Option<User>> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT id, username FROM users WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        self.load_user(row, resolve_friends).await
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        validation::username_checks(username)
            .finish(USER, || validation::username_args(username))?;

        let duplicate = || -> Error {
            ValidationError::unique(USER, "username", username, validation::username_args(username))
                .into()
        };
        if self.find_user_by_username(username).await?.is_some() {
            return Err(duplicate());
        }

        let id = UserId::new();
        let inserted = sqlx::query("INSERT INTO users (id, username) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(username)
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => {
                info!("[Store] User created: {}", username);
                Ok(User {
                    id,
                    username: username.to_string(),
                    friends: Friends::default(),
                })
            }
            Err(e) if is_unique_violation(&e) => Err(duplicate()),
            Err(e) => Err(e.into()),
        }
    }

    async fn add_friend(&self, user: UserId, person: PersonId) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let user_exists: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(user.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let person_exists: Option<(String,)> =
            sqlx::query_as("SELECT id FROM persons WHERE id = ?")
                .bind(person.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        if user_exists.is_none() || person_exists.is_none() {
            return Err(Error::not_found());
        }

        let already: Option<(i64,)> = sqlx::query_as(
            "SELECT position FROM user_friends WHERE user_id = ? AND person_id = ?",
        )
        .bind(user.to_string())
        .bind(person.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        if already.is_some() {
            debug!("[Store] User {} already has friend {}", user, person);
        } else {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO user_friends (user_id, person_id, position)
                VALUES (?, ?, (SELECT COALESCE(MAX(position), -1) + 1 FROM user_friends WHERE user_id = ?))
                "#,
            )
            .bind(user.to_string())
            .bind(person.to_string())
            .bind(user.to_string())
            .execute(&mut *tx)
            .await?;
            info!("[Store] Friend {} added for user {}", person, user);
        }

        tx.commit().await?;

        self.find_user_by_id(user, true)
            .await?
            .ok_or_else(Error::not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store(dir: &TempDir) -> SqliteStore {
        let url = format!("sqlite://{}", dir.path().join("phonebook.sqlite").display());
        SqliteStore::connect(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_schema_init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        store.init_schema().await.unwrap();
        assert_eq!(store.count_persons().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_records_survive_reconnect() {
        let dir = TempDir::new().unwrap();
        {
            let store = store(&dir).await;
            let user = store.create_user("alice").await.unwrap();
            let person = store
                .create_person(NewPerson {
                    name: "Arto Hellas".to_string(),
                    phone: None,
                    street: "Tapiolankatu 5 A".to_string(),
                    city: "Espoo".to_string(),
                    birth_year: 1987,
                })
                .await
                .unwrap();
            store.add_friend(user.id, person.id).await.unwrap();
            store.pool().close().await;
        }

        let store = store(&dir).await;
        let alice = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.friends.len(), 1);
        assert_eq!(store.count_persons().await.unwrap(), 1);
    }
}
