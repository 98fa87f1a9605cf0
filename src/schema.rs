table! {
    activity_logs (id) {
        id -> BigInt,
        actor_id -> BigInt,
        actor_name -> Text,
        action_type_id -> BigInt,
        action_type_name -> Text,
        target_tweet_id -> BigInt,
        target_user_id -> BigInt,
        date -> BigInt,
    }
}

table! {
    hashtags (id) {
        id -> BigInt,
        content -> Text,
        usage_count -> BigInt,
    }
}

table! {
    likes (id) {
        id -> BigInt,
        tweet_id -> BigInt,
        user_id -> BigInt,
    }
}

table! {
    retweets (id) {
        id -> BigInt,
        tweet_id -> BigInt,
        retweeter_id -> BigInt,
    }
}

table! {
    tweet_hashtags (id) {
        id -> BigInt,
        hashtag_id -> BigInt,
        tweet_id -> BigInt,
    }
}

table! {
    tweets (id) {
        id -> BigInt,
        content -> Text,
        created_at -> BigInt,
        creator_id -> BigInt,
        like_count -> BigInt,
        retweet_count -> BigInt,
        is_retweet -> Bool,
    }
}

table! {
    user_tweets (id) {
        id -> BigInt,
        user_id -> BigInt,
        tweet_id -> BigInt,
    }
}

table! {
    users (id) {
        id -> BigInt,
        username -> Text,
        email -> Text,
        picture -> Nullable<Text>,
    }
}

joinable!(likes -> tweets (tweet_id));
joinable!(likes -> users (user_id));
joinable!(retweets -> tweets (tweet_id));
joinable!(retweets -> users (retweeter_id));
joinable!(tweet_hashtags -> hashtags (hashtag_id));
joinable!(tweet_hashtags -> tweets (tweet_id));
joinable!(tweets -> users (creator_id));
joinable!(user_tweets -> tweets (tweet_id));
joinable!(user_tweets -> users (user_id));

allow_tables_to_appear_in_same_query!(
    activity_logs,
    hashtags,
    likes,
    retweets,
    tweet_hashtags,
    tweets,
    user_tweets,
    users,
);
