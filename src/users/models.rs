use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::users;
use crate::profile::Profile;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    #[serde(skip_serializing)]
    pub id: i32,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub image: Option<String>,
}

impl User {
    pub fn find(user_id: i32, connection: &mut SqliteConnection) -> QueryResult<Option<User>> {
        users::table
            .find(user_id)
            .select(User::as_select())
            .first(connection)
            .optional()
    }

    pub fn find_by_name(name: &str, connection: &mut SqliteConnection) -> QueryResult<Option<User>> {
        users::table
            .filter(users::username.eq(name))
            .select(User::as_select())
            .first(connection)
            .optional()
    }

    /// Loads every user in `ids` with one query.
    pub fn load_many(ids: &[i32], connection: &mut SqliteConnection) -> QueryResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        users::table
            .filter(users::id.eq_any(ids))
            .select(User::as_select())
            .load(connection)
    }

    pub fn profile(&self, following: bool) -> Profile<'_> {
        Profile::of(self, following)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub bio: Option<&'a str>,
    pub image: Option<&'a str>,
}

impl<'a> NewUser<'a> {
    pub fn insert(&self, connection: &mut SqliteConnection) -> QueryResult<User> {
        diesel::insert_into(users::table)
            .values(self)
            .returning(User::as_returning())
            .get_result(connection)
    }
}
