//! Fixtures shared by the unit tests.

use std::path::Path;

use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;

use crate::models::{Actor, NewUser};
use crate::query;
use crate::util::r2d2::{self, SqlitePool};

/// Opens a migrated in-memory database.
pub fn conn() -> SqliteConnection {
    let conn = SqliteConnection::establish(":memory:").unwrap();
    query::pragma_foreign_keys_on().execute(&conn).unwrap();
    crate::migrations::run(&conn).unwrap();
    conn
}

/// Creates a pool over a single migrated in-memory database.
pub fn pool() -> SqlitePool {
    let manager = ConnectionManager::new(":memory:");
    let pool = r2d2::pool_with_builder(diesel::r2d2::Pool::builder().max_size(1), manager).unwrap();
    crate::migrations::run(&*pool.get().unwrap()).unwrap();
    pool
}

/// Creates a pool of `size` connections over a migrated database file at `path`.
pub fn file_pool(path: &Path, size: u32) -> SqlitePool {
    let manager = ConnectionManager::new(path.to_str().unwrap());
    let pool =
        r2d2::pool_with_builder(diesel::r2d2::Pool::builder().max_size(size), manager).unwrap();
    crate::migrations::run(&*pool.get().unwrap()).unwrap();
    pool
}

/// Registers a user named `name` and returns it as an `Actor`.
pub fn user(conn: &SqliteConnection, name: &str) -> Actor {
    let email = format!("{}@example.com", name);
    let user = crate::users::create_user(
        conn,
        &NewUser {
            username: name,
            email: &email,
            picture: None,
        },
    )
    .unwrap();
    Actor::new(user.id, user.username)
}
