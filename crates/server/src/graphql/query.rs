use super::types::{PersonObject, UserObject, YesNo};
use super::{current_user, store};
use crate::error::graphql_error;
use async_graphql::{Context, Object, Result};
use phonebook_core::PersonFilter;

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn person_count(&self, ctx: &Context<'_>) -> Result<usize> {
        store(ctx)?.count_persons().await.map_err(graphql_error)
    }

    /// All persons, or only those with (`YES`) or without (`NO`) a phone
    async fn all_persons(
        &self,
        ctx: &Context<'_>,
        phone: Option<YesNo>,
    ) -> Result<Vec<PersonObject>> {
        let filter = phone.map(PersonFilter::from).unwrap_or_default();
        let persons = store(ctx)?
            .find_persons(filter)
            .await
            .map_err(graphql_error)?;
        Ok(persons.into_iter().map(PersonObject).collect())
    }

    async fn find_person(&self, ctx: &Context<'_>, name: String) -> Result<Option<PersonObject>> {
        let person = store(ctx)?
            .find_person_by_name(&name)
            .await
            .map_err(graphql_error)?;
        Ok(person.map(PersonObject))
    }

    async fn me(&self, ctx: &Context<'_>) -> Option<UserObject> {
        current_user(ctx).cloned().map(UserObject)
    }
}
