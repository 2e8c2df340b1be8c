diesel::table! {
    articles (id) {
        id -> Integer,
        author_id -> Integer,
        slug -> Text,
        title -> Text,
        description -> Text,
        body -> Text,
        tag_list -> Text,
        favorites_count -> Integer,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    favorites (user_id, article_id) {
        user_id -> Integer,
        article_id -> Integer,
    }
}

diesel::table! {
    followers (follower_id, following_id) {
        follower_id -> Integer,
        following_id -> Integer,
    }
}

diesel::table! {
    users (id) {
        id -> Integer,
        username -> Text,
        email -> Text,
        bio -> Nullable<Text>,
        image -> Nullable<Text>,
    }
}

diesel::joinable!(articles -> users (author_id));
diesel::joinable!(favorites -> articles (article_id));

diesel::allow_tables_to_appear_in_same_query!(articles, favorites, followers, users);
