//! A minimal registry of the users that tweets, likes and Retweets refer to.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as QueryError};
use diesel::SqliteConnection;

use crate::models::{NewUser, User};
use crate::query;
use crate::schema::*;
use crate::{Error, Result};

pub fn create_user(conn: &SqliteConnection, user: &NewUser<'_>) -> Result<User> {
    trace_fn!(create_user, "username={}", user.username);

    conn.immediate_transaction::<_, Error, _>(|| {
        diesel::insert_into(users::table)
            .values(user)
            .execute(conn)
            .map_err(|e| match e {
                QueryError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    Error::UsernameTaken
                }
                e => e.into(),
            })?;
        let id = query::inserted_id(conn)?;
        let user = users::table.find(id).first::<User>(conn)?;
        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    })
}

pub fn find_user(conn: &SqliteConnection, id: i64) -> Result<Option<User>> {
    users::table
        .find(id)
        .first::<User>(conn)
        .optional()
        .map_err(Into::into)
}

pub fn list_users(conn: &SqliteConnection) -> Result<Vec<User>> {
    users::table
        .order(users::id.asc())
        .load::<User>(conn)
        .map_err(Into::into)
}
