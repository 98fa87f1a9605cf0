use diesel::dsl::{Eq, Filter, Select};
use diesel::prelude::*;
use diesel::query_builder::SqlQuery;

use crate::schema::*;

no_arg_sql_function!(
    last_insert_rowid,
    diesel::sql_types::BigInt,
    "Represents the SQLite `last_insert_rowid()` function"
);

pub fn pragma_busy_timeout(ms: u32) -> SqlQuery {
    diesel::sql_query(format!("PRAGMA busy_timeout = {};", ms))
}

pub fn pragma_foreign_keys_on() -> SqlQuery {
    diesel::sql_query("PRAGMA foreign_keys = ON;")
}

/// Returns the id of the row most recently inserted through `conn`.
pub fn inserted_id(conn: &SqliteConnection) -> QueryResult<i64> {
    diesel::select(last_insert_rowid).get_result(conn)
}

pub fn tweet_hashtag_ids(
    tweet_id: i64,
) -> Select<Filter<tweet_hashtags::table, Eq<tweet_hashtags::tweet_id, i64>>, tweet_hashtags::hashtag_id>
{
    tweet_hashtags::table
        .filter(tweet_hashtags::tweet_id.eq(tweet_id))
        .select(tweet_hashtags::hashtag_id)
}
