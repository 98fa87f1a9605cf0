//! The tweet interaction workflow.
//!
//! Every writing operation runs in a single `BEGIN IMMEDIATE` transaction on the
//! given connection. A failure in any step leaves the database untouched, and
//! concurrent writers queue up on the connection's busy timeout.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::models::{
    ActionType, Actor, Liker, NewActivityLog, NewHashtag, NewLike, NewRetweet, NewTweet,
    NewTweetHashtag, NewUserTweet, Tweet,
};
use crate::query;
use crate::schema::*;
use crate::util::time::now_epoch;
use crate::{Error, Result};

/// Creates a tweet authored by `creator` and tags it with `hashtags`.
///
/// Hashtags are matched case-insensitively. Tags that differ only in case are
/// linked once.
pub fn create_tweet(
    conn: &SqliteConnection,
    creator: &Actor,
    content: &str,
    hashtags: &[String],
) -> Result<Tweet> {
    trace_fn!(create_tweet, "creator={}", creator.id);

    let tags = normalize_hashtags(hashtags);

    conn.immediate_transaction::<_, Error, _>(|| {
        diesel::insert_into(tweets::table)
            .values(&NewTweet::new(content, creator.id, now_epoch()))
            .execute(conn)?;
        let tweet_id = query::inserted_id(conn)?;

        for tag in &tags {
            let hashtag_id = tag_usage(conn, tag)?;
            diesel::insert_into(tweet_hashtags::table)
                .values(&NewTweetHashtag {
                    hashtag_id,
                    tweet_id,
                })
                .execute(conn)?;
        }

        diesel::insert_into(user_tweets::table)
            .values(&NewUserTweet {
                user_id: creator.id,
                tweet_id,
            })
            .execute(conn)?;

        let tweet = tweets::table.find(tweet_id).first::<Tweet>(conn)?;
        info!(
            "User {} created tweet {} with {} hashtag(s)",
            creator.id,
            tweet.id,
            tags.len()
        );
        Ok(tweet)
    })
}

pub fn find_tweet(conn: &SqliteConnection, tweet_id: i64) -> Result<Option<Tweet>> {
    tweets::table
        .find(tweet_id)
        .first::<Tweet>(conn)
        .optional()
        .map_err(Into::into)
}

/// Registers a like of the tweet by `actor`.
///
/// Fails with `Error::InvalidTweetId` if the tweet does not exist.
pub fn like_tweet(conn: &SqliteConnection, actor: &Actor, tweet_id: i64) -> Result<()> {
    trace_fn!(like_tweet, "actor={}, tweet_id={}", actor.id, tweet_id);

    conn.immediate_transaction::<_, Error, _>(|| {
        let creator_id = tweet_creator(conn, tweet_id)?;

        diesel::update(tweets::table.find(tweet_id))
            .set(tweets::like_count.eq(tweets::like_count + 1))
            .execute(conn)?;
        diesel::insert_into(likes::table)
            .values(&NewLike {
                tweet_id,
                user_id: actor.id,
            })
            .execute(conn)?;
        log_activity(conn, actor, ActionType::Like, tweet_id, creator_id)?;

        info!("User {} liked tweet {}", actor.id, tweet_id);
        Ok(())
    })
}

/// Returns the users who liked the tweet, in the order of their likes.
pub fn tweet_likers(conn: &SqliteConnection, tweet_id: i64) -> Result<Vec<Liker>> {
    trace_fn!(tweet_likers, "tweet_id={}", tweet_id);

    likes::table
        .inner_join(users::table)
        .filter(likes::tweet_id.eq(tweet_id))
        .order(likes::id.asc())
        .select((users::id, users::username, users::email, users::picture))
        .load::<Liker>(conn)
        .map_err(Into::into)
}

/// Registers a Retweet of the tweet by `actor`.
///
/// Fails with `Error::InvalidTweetId` if the tweet does not exist.
pub fn retweet(conn: &SqliteConnection, actor: &Actor, tweet_id: i64) -> Result<()> {
    trace_fn!(retweet, "actor={}, tweet_id={}", actor.id, tweet_id);

    conn.immediate_transaction::<_, Error, _>(|| {
        let creator_id = tweet_creator(conn, tweet_id)?;

        diesel::update(tweets::table.find(tweet_id))
            .set(tweets::retweet_count.eq(tweets::retweet_count + 1))
            .execute(conn)?;
        diesel::insert_into(user_tweets::table)
            .values(&NewUserTweet {
                user_id: actor.id,
                tweet_id,
            })
            .execute(conn)?;
        diesel::insert_into(retweets::table)
            .values(&NewRetweet {
                tweet_id,
                retweeter_id: actor.id,
            })
            .execute(conn)?;
        log_activity(conn, actor, ActionType::Retweet, tweet_id, creator_id)?;

        info!("User {} Retweeted tweet {}", actor.id, tweet_id);
        Ok(())
    })
}

/// Deletes the tweet together with every row that refers to it.
///
/// Activity log entries are kept. Deleting a nonexistent tweet is a no-op.
pub fn delete_tweet(conn: &SqliteConnection, tweet_id: i64) -> Result<()> {
    trace_fn!(delete_tweet, "tweet_id={}", tweet_id);

    conn.immediate_transaction::<_, Error, _>(|| {
        let hashtag_ids = query::tweet_hashtag_ids(tweet_id).load::<i64>(conn)?;
        if !hashtag_ids.is_empty() {
            diesel::update(hashtags::table.filter(hashtags::id.eq_any(&hashtag_ids)))
                .set(hashtags::usage_count.eq(hashtags::usage_count - 1))
                .execute(conn)?;
        }

        diesel::delete(tweet_hashtags::table.filter(tweet_hashtags::tweet_id.eq(tweet_id)))
            .execute(conn)?;
        let unliked = diesel::delete(likes::table.filter(likes::tweet_id.eq(tweet_id)))
            .execute(conn)?;
        diesel::delete(retweets::table.filter(retweets::tweet_id.eq(tweet_id)))
            .execute(conn)?;
        diesel::delete(user_tweets::table.filter(user_tweets::tweet_id.eq(tweet_id)))
            .execute(conn)?;

        let n = diesel::delete(tweets::table.find(tweet_id)).execute(conn)?;
        if n == 0 {
            debug!("Tweet {} does not exist; nothing to delete", tweet_id);
        } else {
            info!(
                "Deleted tweet {} ({} hashtag(s), {} like(s))",
                tweet_id,
                hashtag_ids.len(),
                unliked
            );
        }

        Ok(())
    })
}

/// Normalizes a hashtag for storage. Only the case is folded: `#rust` and `rust`
/// are distinct tags.
pub fn normalize_hashtag(tag: &str) -> String {
    tag.to_lowercase()
}

fn normalize_hashtags(hashtags: &[String]) -> Vec<String> {
    let mut ret: Vec<String> = Vec::with_capacity(hashtags.len());
    for tag in hashtags.iter().map(|t| normalize_hashtag(t)) {
        if !ret.contains(&tag) {
            ret.push(tag);
        }
    }
    ret
}

/// Records one more use of the hashtag, creating it if necessary, and returns its id.
fn tag_usage(conn: &SqliteConnection, content: &str) -> QueryResult<i64> {
    let existing = hashtags::table
        .filter(hashtags::content.eq(content))
        .select(hashtags::id)
        .first::<i64>(conn)
        .optional()?;

    if let Some(id) = existing {
        diesel::update(hashtags::table.find(id))
            .set(hashtags::usage_count.eq(hashtags::usage_count + 1))
            .execute(conn)?;
        Ok(id)
    } else {
        debug!("New hashtag: {}", content);
        diesel::insert_into(hashtags::table)
            .values(&NewHashtag {
                content,
                usage_count: 1,
            })
            .execute(conn)?;
        query::inserted_id(conn)
    }
}

fn tweet_creator(conn: &SqliteConnection, tweet_id: i64) -> Result<i64> {
    tweets::table
        .find(tweet_id)
        .select(tweets::creator_id)
        .first::<i64>(conn)
        .optional()?
        .ok_or(Error::InvalidTweetId)
}

fn log_activity(
    conn: &SqliteConnection,
    actor: &Actor,
    action: ActionType,
    target_tweet_id: i64,
    target_user_id: i64,
) -> QueryResult<()> {
    diesel::insert_into(activity_logs::table)
        .values(&NewActivityLog::new(
            actor,
            action,
            target_tweet_id,
            target_user_id,
            now_epoch(),
        ))
        .execute(conn)
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use std::thread;

    use diesel::dsl::count_star;

    use super::*;
    use crate::models::{ActivityLog, Hashtag};
    use crate::testing;

    fn tags(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|&t| t.to_owned()).collect()
    }

    macro_rules! count {
        ($conn:expr, $table:ident) => {
            $table::table
                .select(count_star())
                .get_result::<i64>($conn)
                .unwrap()
        };
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_hashtag("Test"), "test");
        assert_eq!(normalize_hashtag("#RustLang"), "#rustlang");
        assert_eq!(normalize_hashtag(" Spaced "), " spaced ");
        assert_eq!(
            normalize_hashtags(&tags(&["Test", "#test", "TEST", "other", "#Test"])),
            ["test", "#test", "other"],
        );
    }

    #[test]
    fn hashtags_only_fold_case() {
        let conn = testing::conn();
        let alice = testing::user(&conn, "alice");

        create_tweet(&conn, &alice, "#rust rust", &tags(&["#Rust", "rust", ""])).unwrap();

        let contents = hashtags::table
            .order(hashtags::content.asc())
            .select(hashtags::content)
            .load::<String>(&conn)
            .unwrap();
        assert_eq!(contents, ["", "#rust", "rust"]);
        assert_eq!(count!(&conn, tweet_hashtags), 3);
    }

    #[test]
    fn create() {
        let conn = testing::conn();
        let alice = testing::user(&conn, "alice");

        let tweet = create_tweet(&conn, &alice, "hello #Test", &tags(&["Test"])).unwrap();
        assert_eq!(tweet.content, "hello #Test");
        assert_eq!(tweet.creator_id, alice.id);
        assert_eq!(tweet.like_count, 0);
        assert_eq!(tweet.retweet_count, 0);
        assert!(!tweet.is_retweet);

        let hashtags = hashtags::table.load::<Hashtag>(&conn).unwrap();
        assert_eq!(hashtags.len(), 1);
        assert_eq!(hashtags[0].content, "test");
        assert_eq!(hashtags[0].usage_count, 1);

        let links = tweet_hashtags::table
            .select((tweet_hashtags::tweet_id, tweet_hashtags::hashtag_id))
            .load::<(i64, i64)>(&conn)
            .unwrap();
        assert_eq!(links, [(tweet.id, hashtags[0].id)]);

        let authors = user_tweets::table
            .select((user_tweets::user_id, user_tweets::tweet_id))
            .load::<(i64, i64)>(&conn)
            .unwrap();
        assert_eq!(authors, [(alice.id, tweet.id)]);
    }

    #[test]
    fn create_without_hashtags() {
        let conn = testing::conn();
        let alice = testing::user(&conn, "alice");

        create_tweet(&conn, &alice, "no tags", &[]).unwrap();
        assert_eq!(count!(&conn, tweets), 1);
        assert_eq!(count!(&conn, hashtags), 0);
        assert_eq!(count!(&conn, tweet_hashtags), 0);
        assert_eq!(count!(&conn, user_tweets), 1);
    }

    #[test]
    fn hashtag_reuse() {
        let conn = testing::conn();
        let alice = testing::user(&conn, "alice");

        create_tweet(&conn, &alice, "first #Test", &tags(&["Test"])).unwrap();
        create_tweet(&conn, &alice, "second #test", &tags(&["TEST", "test"])).unwrap();

        let hashtags = hashtags::table.load::<Hashtag>(&conn).unwrap();
        assert_eq!(hashtags.len(), 1);
        assert_eq!(hashtags[0].usage_count, 2);
        assert_eq!(count!(&conn, tweet_hashtags), 2);
    }

    #[test]
    fn like() {
        let conn = testing::conn();
        let alice = testing::user(&conn, "alice");
        let bob = testing::user(&conn, "bob");

        let tweet = create_tweet(&conn, &alice, "like me", &[]).unwrap();
        like_tweet(&conn, &bob, tweet.id).unwrap();

        let tweet = find_tweet(&conn, tweet.id).unwrap().unwrap();
        assert_eq!(tweet.like_count, 1);
        assert_eq!(count!(&conn, likes), 1);

        let logs = activity_logs::table.load::<ActivityLog>(&conn).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].actor_id, bob.id);
        assert_eq!(logs[0].actor_name, "bob");
        assert_eq!(logs[0].action_type_id, ActionType::Like.id());
        assert_eq!(logs[0].action_type_name, "Like");
        assert_eq!(logs[0].target_tweet_id, tweet.id);
        assert_eq!(logs[0].target_user_id, alice.id);
    }

    #[test]
    fn like_invalid_tweet() {
        let conn = testing::conn();
        let bob = testing::user(&conn, "bob");

        match like_tweet(&conn, &bob, 42) {
            Err(Error::InvalidTweetId) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(count!(&conn, likes), 0);
        assert_eq!(count!(&conn, activity_logs), 0);
    }

    #[test]
    fn like_rolls_back_on_failure() {
        let conn = testing::conn();
        let alice = testing::user(&conn, "alice");
        let tweet = create_tweet(&conn, &alice, "atomic", &[]).unwrap();

        // Not a registered user, so inserting the like violates a foreign key.
        let ghost = Actor::new(9999, "ghost");
        assert!(like_tweet(&conn, &ghost, tweet.id).is_err());

        let tweet = find_tweet(&conn, tweet.id).unwrap().unwrap();
        assert_eq!(tweet.like_count, 0);
        assert_eq!(count!(&conn, activity_logs), 0);
    }

    #[test]
    fn concurrent_likes() {
        const THREADS: usize = 8;
        const LIKES: usize = 25;

        let dir = tempfile::tempdir().unwrap();
        let pool = testing::file_pool(&dir.path().join("chirp.sqlite3"), THREADS as u32);
        let (alice, tweet_id) = {
            let conn = pool.get().unwrap();
            let alice = testing::user(&conn, "alice");
            let tweet = create_tweet(&conn, &alice, "rush hour", &[]).unwrap();
            (alice, tweet.id)
        };

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let pool = pool.clone();
                let alice = alice.clone();
                thread::spawn(move || {
                    let conn = pool.get().unwrap();
                    for _ in 0..LIKES {
                        like_tweet(&conn, &alice, tweet_id).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let conn = pool.get().unwrap();
        let total = (THREADS * LIKES) as i64;
        let tweet = find_tweet(&conn, tweet_id).unwrap().unwrap();
        assert_eq!(tweet.like_count, total);
        assert_eq!(count!(&*conn, likes), total);
        assert_eq!(count!(&*conn, activity_logs), total);
    }

    #[test]
    fn likers() {
        let conn = testing::conn();
        let alice = testing::user(&conn, "alice");
        let bob = testing::user(&conn, "bob");
        let carol = testing::user(&conn, "carol");

        let tweet = create_tweet(&conn, &alice, "popular", &[]).unwrap();
        like_tweet(&conn, &carol, tweet.id).unwrap();
        like_tweet(&conn, &bob, tweet.id).unwrap();

        let likers = tweet_likers(&conn, tweet.id).unwrap();
        let names: Vec<_> = likers.iter().map(|l| &*l.username).collect();
        assert_eq!(names, ["carol", "bob"]);
        assert_eq!(likers[0].id, carol.id);
        assert_eq!(likers[0].email, "carol@example.com");
        assert_eq!(likers[0].picture, None);

        assert!(tweet_likers(&conn, tweet.id + 1).unwrap().is_empty());
    }

    #[test]
    fn retweet_registers_relations() {
        let conn = testing::conn();
        let alice = testing::user(&conn, "alice");
        let bob = testing::user(&conn, "bob");

        let tweet = create_tweet(&conn, &alice, "share me", &[]).unwrap();
        retweet(&conn, &bob, tweet.id).unwrap();

        let tweet = find_tweet(&conn, tweet.id).unwrap().unwrap();
        assert_eq!(tweet.retweet_count, 1);
        assert_eq!(tweet.like_count, 0);

        let retweeters = retweets::table
            .select(retweets::retweeter_id)
            .load::<i64>(&conn)
            .unwrap();
        assert_eq!(retweeters, [bob.id]);

        let users = user_tweets::table
            .filter(user_tweets::tweet_id.eq(tweet.id))
            .order(user_tweets::id.asc())
            .select(user_tweets::user_id)
            .load::<i64>(&conn)
            .unwrap();
        assert_eq!(users, [alice.id, bob.id]);

        let logs = activity_logs::table.load::<ActivityLog>(&conn).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action_type_name, "Retweet");
        assert_eq!(logs[0].target_user_id, alice.id);
    }

    #[test]
    fn retweet_invalid_tweet() {
        let conn = testing::conn();
        let bob = testing::user(&conn, "bob");

        assert!(matches!(
            retweet(&conn, &bob, 7),
            Err(Error::InvalidTweetId)
        ));
        assert_eq!(count!(&conn, retweets), 0);
        assert_eq!(count!(&conn, user_tweets), 0);
    }

    #[test]
    fn delete_cascades() {
        let conn = testing::conn();
        let alice = testing::user(&conn, "alice");
        let bob = testing::user(&conn, "bob");

        let tweet = create_tweet(&conn, &alice, "short-lived", &tags(&["a", "b"])).unwrap();
        let other = create_tweet(&conn, &alice, "survivor", &tags(&["a"])).unwrap();
        like_tweet(&conn, &bob, tweet.id).unwrap();
        like_tweet(&conn, &bob, other.id).unwrap();
        retweet(&conn, &bob, tweet.id).unwrap();

        delete_tweet(&conn, tweet.id).unwrap();

        assert!(find_tweet(&conn, tweet.id).unwrap().is_none());
        assert!(tweet_likers(&conn, tweet.id).unwrap().is_empty());
        assert_eq!(count!(&conn, retweets), 0);
        assert_eq!(count!(&conn, likes), 1);
        assert_eq!(count!(&conn, tweet_hashtags), 1);
        assert_eq!(count!(&conn, user_tweets), 1);
        // The audit trail survives the tweet.
        assert_eq!(count!(&conn, activity_logs), 3);

        let usage = hashtags::table
            .order(hashtags::content.asc())
            .select((hashtags::content, hashtags::usage_count))
            .load::<(String, i64)>(&conn)
            .unwrap();
        assert_eq!(usage, [("a".to_owned(), 1), ("b".to_owned(), 0)]);

        assert!(find_tweet(&conn, other.id).unwrap().is_some());
    }

    #[test]
    fn delete_nonexistent_tweet() {
        let conn = testing::conn();
        delete_tweet(&conn, 1).unwrap();
    }
}
