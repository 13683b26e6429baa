use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

record_id!(
    /// Stable identifier of a person record
    PersonId
);
record_id!(
    /// Stable identifier of a user record
    UserId
);

/// A phonebook entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub phone: Option<String>,
    pub street: String,
    pub city: String,
    pub birth_year: i32,
}

impl Person {
    /// Age in the given calendar year. Never stored.
    pub fn age_in(&self, year: i32) -> i32 {
        year - self.birth_year
    }

    pub fn address(&self) -> Address {
        Address {
            street: self.street.clone(),
            city: self.city.clone(),
        }
    }

    pub fn has_phone(&self) -> bool {
        self.phone.is_some()
    }
}

/// View of a person's street and city
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub street: String,
    pub city: String,
}

/// Fields accepted when creating a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub name: String,
    pub phone: Option<String>,
    pub street: String,
    pub city: String,
    pub birth_year: i32,
}

impl NewPerson {
    pub fn into_person(self, id: PersonId) -> Person {
        Person {
            id,
            name: self.name,
            phone: self.phone,
            street: self.street,
            city: self.city,
            birth_year: self.birth_year,
        }
    }
}

/// Query-time predicate over persons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersonFilter {
    /// `None` matches everyone, otherwise phone presence must equal the flag
    pub has_phone: Option<bool>,
}

impl PersonFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn has_phone(has_phone: bool) -> Self {
        Self {
            has_phone: Some(has_phone),
        }
    }

    pub fn matches(&self, person: &Person) -> bool {
        self.has_phone
            .map_or(true, |wanted| person.has_phone() == wanted)
    }
}

/// Friend references of a user, either as ids or loaded records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Friends {
    Unresolved(Vec<PersonId>),
    Resolved(Vec<Person>),
}

impl Friends {
    pub fn ids(&self) -> Vec<PersonId> {
        match self {
            Friends::Unresolved(ids) => ids.clone(),
            Friends::Resolved(persons) => persons.iter().map(|p| p.id).collect(),
        }
    }

    pub fn contains(&self, id: PersonId) -> bool {
        match self {
            Friends::Unresolved(ids) => ids.contains(&id),
            Friends::Resolved(persons) => persons.iter().any(|p| p.id == id),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Friends::Unresolved(ids) => ids.len(),
            Friends::Resolved(persons) => persons.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Friends {
    fn default() -> Self {
        Friends::Unresolved(Vec::new())
    }
}

/// An account that can log in and keep a friends list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub friends: Friends,
}

impl User {
    pub fn has_friend(&self, id: PersonId) -> bool {
        self.friends.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(phone: Option<&str>) -> Person {
        NewPerson {
            name: "Arto Hellas".to_string(),
            phone: phone.map(str::to_string),
            street: "Tapiolankatu 5 A".to_string(),
            city: "Espoo".to_string(),
            birth_year: 1990,
        }
        .into_person(PersonId::new())
    }

    #[test]
    fn test_age_follows_year() {
        let p = person(None);
        assert_eq!(p.age_in(2020), 30);
        assert_eq!(p.age_in(2021), 31);
    }

    #[test]
    fn test_filter_partitions_on_phone() {
        let with = person(Some("040-123543"));
        let without = person(None);

        assert!(PersonFilter::all().matches(&with));
        assert!(PersonFilter::all().matches(&without));
        assert!(PersonFilter::has_phone(true).matches(&with));
        assert!(!PersonFilter::has_phone(true).matches(&without));
        assert!(PersonFilter::has_phone(false).matches(&without));
        assert!(!PersonFilter::has_phone(false).matches(&with));
    }

    #[test]
    fn test_id_round_trips_through_string() {
        let id = PersonId::new();
        let parsed: PersonId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }

    #[test]
    fn test_friends_membership() {
        let p = person(None);
        let resolved = Friends::Resolved(vec![p.clone()]);
        assert!(resolved.contains(p.id));
        assert_eq!(resolved.ids(), vec![p.id]);
        assert!(!Friends::default().contains(p.id));
        assert!(Friends::default().is_empty());
    }
}
