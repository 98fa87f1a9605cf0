use serde::Serialize;

use crate::schema::*;

/// The authenticated caller of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionType {
    Like,
    Retweet,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
#[table_name = "activity_logs"]
pub struct ActivityLog {
    pub id: i64,
    pub actor_id: i64,
    pub actor_name: String,
    pub action_type_id: i64,
    pub action_type_name: String,
    pub target_tweet_id: i64,
    pub target_user_id: i64,
    pub date: i64,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "activity_logs"]
pub struct NewActivityLog<'a> {
    pub actor_id: i64,
    pub actor_name: &'a str,
    pub action_type_id: i64,
    pub action_type_name: &'a str,
    pub target_tweet_id: i64,
    pub target_user_id: i64,
    pub date: i64,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
pub struct Hashtag {
    pub id: i64,
    pub content: String,
    pub usage_count: i64,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "hashtags"]
pub struct NewHashtag<'a> {
    pub content: &'a str,
    pub usage_count: i64,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "likes"]
pub struct NewLike {
    pub tweet_id: i64,
    pub user_id: i64,
}

/// A user who liked a tweet, as returned by `tweets::tweet_likers`.
#[derive(Clone, Debug, PartialEq, Eq, Queryable, Serialize)]
pub struct Liker {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub picture: Option<String>,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "retweets"]
pub struct NewRetweet {
    pub tweet_id: i64,
    pub retweeter_id: i64,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "tweet_hashtags"]
pub struct NewTweetHashtag {
    pub hashtag_id: i64,
    pub tweet_id: i64,
}

#[derive(Clone, Debug, Identifiable, Queryable, Serialize)]
pub struct Tweet {
    pub id: i64,
    pub content: String,
    pub created_at: i64,
    pub creator_id: i64,
    pub like_count: i64,
    pub retweet_count: i64,
    pub is_retweet: bool,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "tweets"]
pub struct NewTweet<'a> {
    pub content: &'a str,
    pub created_at: i64,
    pub creator_id: i64,
    pub like_count: i64,
    pub retweet_count: i64,
    pub is_retweet: bool,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "user_tweets"]
pub struct NewUserTweet {
    pub user_id: i64,
    pub tweet_id: i64,
}

#[derive(Clone, Debug, Identifiable, Queryable, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub picture: Option<String>,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "users"]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub picture: Option<&'a str>,
}

impl Actor {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Actor {
            id,
            name: name.into(),
        }
    }
}

impl ActionType {
    pub fn id(self) -> i64 {
        match self {
            ActionType::Like => 1,
            ActionType::Retweet => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ActionType::Like => "Like",
            ActionType::Retweet => "Retweet",
        }
    }
}

impl<'a> NewTweet<'a> {
    pub fn new(content: &'a str, creator_id: i64, created_at: i64) -> Self {
        NewTweet {
            content,
            created_at,
            creator_id,
            like_count: 0,
            retweet_count: 0,
            is_retweet: false,
        }
    }
}

impl<'a> NewActivityLog<'a> {
    pub fn new(
        actor: &'a Actor,
        action: ActionType,
        target_tweet_id: i64,
        target_user_id: i64,
        date: i64,
    ) -> Self {
        NewActivityLog {
            actor_id: actor.id,
            actor_name: &actor.name,
            action_type_id: action.id(),
            action_type_name: action.name(),
            target_tweet_id,
            target_user_id,
            date,
        }
    }
}
