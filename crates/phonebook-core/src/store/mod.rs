//! Entity storage
//!
//! `PhonebookStore` is the only way resolvers reach person and user
//! records. Two backends implement it:
//!
//! - [`MemoryStore`]: process-local, used for tests and demo runs
//! - [`SqliteStore`]: durable, backed by an sqlx SQLite pool

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::models::{NewPerson, Person, PersonFilter, PersonId, User, UserId};
use async_trait::async_trait;

#[async_trait]
pub trait PhonebookStore: Send + Sync {
    async fn count_persons(&self) -> Result<usize>;

    /// Persons matching `filter`, in insertion order.
    async fn find_persons(&self, filter: PersonFilter) -> Result<Vec<Person>>;

    async fn find_person_by_name(&self, name: &str) -> Result<Option<Person>>;

    /// Fails with a validation error on a constraint or uniqueness violation.
    async fn create_person(&self, fields: NewPerson) -> Result<Person>;

    /// `Ok(None)` when no person has that name. The updated record is
    /// re-validated before it is saved.
    async fn update_person_phone(&self, name: &str, phone: &str) -> Result<Option<Person>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// With `resolve_friends` the user's friends come back as full records.
    async fn find_user_by_id(&self, id: UserId, resolve_friends: bool) -> Result<Option<User>>;

    async fn create_user(&self, username: &str) -> Result<User>;

    /// Appends `person` to the user's friends unless already present.
    /// Returns the user with friends resolved.
    async fn add_friend(&self, user: UserId, person: PersonId) -> Result<User>;
}

/// People seeded into demo runs
pub fn demo_persons() -> Vec<NewPerson> {
    vec![
        NewPerson {
            name: "Arto Hellas".to_string(),
            phone: Some("040-123543".to_string()),
            street: "Tapiolankatu 5 A".to_string(),
            city: "Espoo".to_string(),
            birth_year: 1987,
        },
        NewPerson {
            name: "Matti Luukkainen".to_string(),
            phone: Some("040-432342".to_string()),
            street: "Malminkaari 10 A".to_string(),
            city: "Helsinki".to_string(),
            birth_year: 1975,
        },
        NewPerson {
            name: "Venla Ruuskanen".to_string(),
            phone: None,
            street: "Nallemäentie 22 C".to_string(),
            city: "Helsinki".to_string(),
            birth_year: 1995,
        },
    ]
}
