use super::{clock, store};
use crate::error::graphql_error;
use async_graphql::{Context, Enum, Object, Result, SimpleObject, ID};
use phonebook_core::{Address, Friends, Person, PersonFilter, Token, User};

/// Phone presence filter for `allPersons`
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum YesNo {
    Yes,
    No,
}

impl From<YesNo> for PersonFilter {
    fn from(value: YesNo) -> Self {
        match value {
            YesNo::Yes => PersonFilter::has_phone(true),
            YesNo::No => PersonFilter::has_phone(false),
        }
    }
}

pub struct PersonObject(pub Person);

#[Object(name = "Person")]
impl PersonObject {
    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn phone(&self) -> Option<&str> {
        self.0.phone.as_deref()
    }

    async fn address(&self) -> AddressObject {
        self.0.address().into()
    }

    async fn birth_year(&self) -> i32 {
        self.0.birth_year
    }

    /// Years since `birthYear` as of the current calendar year
    async fn age(&self, ctx: &Context<'_>) -> Result<Option<i32>> {
        let year = clock(ctx)?.current_year();
        Ok(Some(self.0.age_in(year)))
    }

    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }
}

#[derive(SimpleObject)]
#[graphql(name = "Address")]
pub struct AddressObject {
    pub street: String,
    pub city: String,
}

impl From<Address> for AddressObject {
    fn from(address: Address) -> Self {
        Self {
            street: address.street,
            city: address.city,
        }
    }
}

pub struct UserObject(pub User);

#[Object(name = "User")]
impl UserObject {
    async fn username(&self) -> &str {
        &self.0.username
    }

    async fn friends(&self, ctx: &Context<'_>) -> Result<Vec<PersonObject>> {
        let persons = match &self.0.friends {
            Friends::Resolved(persons) => persons.clone(),
            Friends::Unresolved(ids) if ids.is_empty() => Vec::new(),
            Friends::Unresolved(_) => {
                let loaded = store(ctx)?
                    .find_user_by_id(self.0.id, true)
                    .await
                    .map_err(graphql_error)?;
                match loaded.map(|user| user.friends) {
                    Some(Friends::Resolved(persons)) => persons,
                    _ => Vec::new(),
                }
            }
        };
        Ok(persons.into_iter().map(PersonObject).collect())
    }

    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }
}

#[derive(SimpleObject)]
#[graphql(name = "Token")]
pub struct TokenObject {
    pub value: String,
}

impl From<Token> for TokenObject {
    fn from(token: Token) -> Self {
        Self { value: token.value }
    }
}
