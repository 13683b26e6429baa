//! In-memory entity store
//!
//! Records live in insertion-ordered vectors behind a single `RwLock`, so
//! uniqueness checks and writes happen under one guard.

use super::PhonebookStore;
use crate::error::{Error, Result};
use crate::models::{Friends, NewPerson, Person, PersonFilter, PersonId, User, UserId};
use crate::validation::{self, FieldViolation, ValidationError, PERSON, USER};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct UserRecord {
    id: UserId,
    username: String,
    friends: Vec<PersonId>,
}

#[derive(Debug, Default)]
struct MemoryState {
    persons: Vec<Person>,
    users: Vec<UserRecord>,
}

impl MemoryState {
    fn person_by_name(&self, name: &str) -> Option<&Person> {
        self.persons.iter().find(|p| p.name == name)
    }

    fn insert_person(&mut self, fields: NewPerson) -> Result<Person> {
        let mut checks = validation::new_person_checks(&fields);
        if self.person_by_name(&fields.name).is_some() {
            checks.push(FieldViolation::unique("name", &fields.name));
        }
        checks.finish(PERSON, || validation::to_args(&fields))?;

        let person = fields.into_person(PersonId::new());
        self.persons.push(person.clone());
        Ok(person)
    }

    fn to_user(&self, record: &UserRecord, resolve_friends: bool) -> User {
        let friends = if resolve_friends {
            Friends::Resolved(
                record
                    .friends
                    .iter()
                    .filter_map(|id| self.persons.iter().find(|p| p.id == *id).cloned())
                    .collect(),
            )
        } else {
            Friends::Unresolved(record.friends.clone())
        };
        User {
            id: record.id,
            username: record.username.clone(),
            friends,
        }
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `persons`, validated like any other insert.
    pub fn with_persons(persons: impl IntoIterator<Item = NewPerson>) -> Result<Self> {
        let mut state = MemoryState::default();
        for fields in persons {
            state.insert_person(fields)?;
        }
        info!("[Store] Memory store seeded with {} persons", state.persons.len());
        Ok(Self {
            state: RwLock::new(state),
        })
    }
}

#[async_trait]
impl PhonebookStore for MemoryStore {
    async fn count_persons(&self) -> Result<usize> {
        Ok(self.state.read().await.persons.len())
    }

    async fn find_persons(&self, filter: PersonFilter) -> Result<Vec<Person>> {
        let state = self.state.read().await;
        Ok(state
            .persons
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn find_person_by_name(&self, name: &str) -> Result<Option<Person>> {
        Ok(self.state.read().await.person_by_name(name).cloned())
    }

    async fn create_person(&self, fields: NewPerson) -> Result<Person> {
        let person = self.state.write().await.insert_person(fields)?;
        info!("[Store] Person created: {}", person.name);
        Ok(person)
    }

    async fn update_person_phone(&self, name: &str, phone: &str) -> Result<Option<Person>> {
        let mut state = self.state.write().await;
        let Some(stored) = state.persons.iter_mut().find(|p| p.name == name) else {
            return Ok(None);
        };

        let mut updated = stored.clone();
        updated.phone = Some(phone.to_string());
        validation::validate_person(&updated)?;

        *stored = updated.clone();
        info!("[Store] Phone updated for {}", name);
        Ok(Some(updated))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| state.to_user(u, false)))
    }

    async fn find_user_by_id(&self, id: UserId, resolve_friends: bool) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| state.to_user(u, resolve_friends)))
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        let mut state = self.state.write().await;

        validation::username_checks(username)
            .finish(USER, || validation::username_args(username))?;
        if state.users.iter().any(|u| u.username == username) {
            return Err(ValidationError::unique(
                USER,
                "username",
                username,
                validation::username_args(username),
            )
            .into());
        }

        let record = UserRecord {
            id: UserId::new(),
            username: username.to_string(),
            friends: Vec::new(),
        };
        state.users.push(record.clone());
        info!("[Store] User created: {}", username);
        Ok(state.to_user(&record, false))
    }

    async fn add_friend(&self, user: UserId, person: PersonId) -> Result<User> {
        let mut state = self.state.write().await;

        if !state.persons.iter().any(|p| p.id == person) {
            return Err(Error::not_found());
        }
        let record = state
            .users
            .iter_mut()
            .find(|u| u.id == user)
            .ok_or_else(Error::not_found)?;

        if record.friends.contains(&person) {
            debug!("[Store] {} already has friend {}", record.username, person);
        } else {
            record.friends.push(person);
            info!("[Store] Friend {} added for {}", person, record.username);
        }

        let record = record.clone();
        Ok(state.to_user(&record, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::demo_persons;

    #[tokio::test]
    async fn test_seeded_store_counts_and_filters() {
        let store = MemoryStore::with_persons(demo_persons()).unwrap();

        assert_eq!(store.count_persons().await.unwrap(), 3);
        assert_eq!(
            store
                .find_persons(PersonFilter::has_phone(true))
                .await
                .unwrap()
                .len(),
            2
        );
        let without = store
            .find_persons(PersonFilter::has_phone(false))
            .await
            .unwrap();
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].name, "Venla Ruuskanen");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let store = MemoryStore::with_persons(demo_persons()).unwrap();
        let mut fields = demo_persons().remove(0);
        fields.phone = None;

        let err = store.create_person(fields).await.unwrap_err();
        match err {
            Error::Validation(v) => assert_eq!(v.invalid_fields(), vec!["name"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.count_persons().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_invalid_phone_update_keeps_old_value() {
        let store = MemoryStore::with_persons(demo_persons()).unwrap();

        let err = store
            .update_person_phone("Arto Hellas", "123")
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let arto = store.find_person_by_name("Arto Hellas").await.unwrap().unwrap();
        assert_eq!(arto.phone.as_deref(), Some("040-123543"));
    }

    #[tokio::test]
    async fn test_friend_order_is_kept() {
        let store = MemoryStore::with_persons(demo_persons()).unwrap();
        let user = store.create_user("alice").await.unwrap();
        let venla = store.find_person_by_name("Venla Ruuskanen").await.unwrap().unwrap();
        let arto = store.find_person_by_name("Arto Hellas").await.unwrap().unwrap();

        store.add_friend(user.id, venla.id).await.unwrap();
        let user = store.add_friend(user.id, arto.id).await.unwrap();

        assert_eq!(user.friends.ids(), vec![venla.id, arto.id]);
    }
}
