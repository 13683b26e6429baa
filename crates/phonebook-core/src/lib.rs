//! Phonebook Core
//!
//! Domain model, validation rules, entity stores and token authentication
//! shared by the phonebook GraphQL server.
//!
//! ```text
//! request ──► AuthManager::resolve_current_user ──► PhonebookStore
//!                     │                                 ├── MemoryStore
//!                     └── CredentialPolicy (login)      └── SqliteStore
//! ```

pub mod auth;
pub mod clock;
pub mod error;
pub mod models;
pub mod store;
pub mod validation;

pub use auth::{AuthManager, CredentialPolicy, SharedSecretPolicy, Token, TokenClaims};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use models::{Address, Friends, NewPerson, Person, PersonFilter, PersonId, User, UserId};
pub use store::{MemoryStore, PhonebookStore, SqliteStore};
pub use validation::{FieldViolation, ValidationError, ViolationKind};
