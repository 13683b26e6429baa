use super::types::{PersonObject, TokenObject, UserObject};
use super::{auth, current_user, store};
use crate::error::graphql_error;
use async_graphql::{Context, Object, Result};
use phonebook_core::{Error as CoreError, NewPerson};
use tracing::{debug, info};

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Creates a person and adds it to the caller's friends
    async fn add_person(
        &self,
        ctx: &Context<'_>,
        name: String,
        phone: Option<String>,
        street: String,
        city: String,
        birth_year: i32,
    ) -> Result<Option<PersonObject>> {
        let Some(user) = current_user(ctx) else {
            return Err(graphql_error(CoreError::not_authenticated()));
        };
        let store = store(ctx)?;

        // Two writes, as separate store calls: a failed friend append leaves
        // the created person in place and reports the error.
        let person = store
            .create_person(NewPerson {
                name,
                phone,
                street,
                city,
                birth_year,
            })
            .await
            .map_err(graphql_error)?;
        store
            .add_friend(user.id, person.id)
            .await
            .map_err(graphql_error)?;

        info!("[Gateway] {} added {}", user.username, person.name);
        Ok(Some(PersonObject(person)))
    }

    /// Returns null when nobody has that name
    async fn edit_number(
        &self,
        ctx: &Context<'_>,
        name: String,
        phone: String,
    ) -> Result<Option<PersonObject>> {
        let person = store(ctx)?
            .update_person_phone(&name, &phone)
            .await
            .map_err(graphql_error)?;
        Ok(person.map(PersonObject))
    }

    async fn create_user(&self, ctx: &Context<'_>, username: String) -> Result<Option<UserObject>> {
        let user = store(ctx)?
            .create_user(&username)
            .await
            .map_err(graphql_error)?;
        info!("[Gateway] Created user {}", user.username);
        Ok(Some(UserObject(user)))
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> Result<Option<TokenObject>> {
        let token = auth(ctx)?
            .login(&username, &password)
            .await
            .map_err(graphql_error)?;
        Ok(Some(token.into()))
    }

    async fn add_as_friend(&self, ctx: &Context<'_>, name: String) -> Result<Option<PersonObject>> {
        let Some(user) = current_user(ctx) else {
            return Err(graphql_error(CoreError::not_found()));
        };
        let store = store(ctx)?;

        let Some(person) = store
            .find_person_by_name(&name)
            .await
            .map_err(graphql_error)?
        else {
            return Err(graphql_error(CoreError::not_found()));
        };

        if user.has_friend(person.id) {
            debug!("[Gateway] {} already friends with {}", user.username, person.name);
        } else {
            store
                .add_friend(user.id, person.id)
                .await
                .map_err(graphql_error)?;
        }

        Ok(Some(PersonObject(person)))
    }
}
