//! Diesel mirror of `migrations/*/up.sql`.

table! {
    users (id) {
        id -> Uuid,
        created_at -> Timestamptz,
        username -> Text,
    }
}

table! {
    groups (id) {
        id -> Int4,
        title -> Varchar,
        slug -> Varchar,
        description -> Text,
    }
}

table! {
    posts (id) {
        id -> Int4,
        created_at -> Timestamptz,
        text -> Text,
        group_id -> Nullable<Int4>,
        author_id -> Nullable<Uuid>,
        image -> Nullable<Text>,
    }
}

table! {
    comments (id) {
        id -> Int4,
        created_at -> Timestamptz,
        post_id -> Int4,
        author_id -> Uuid,
        text -> Text,
    }
}

table! {
    follows (user_id, author_id) {
        user_id -> Uuid,
        author_id -> Uuid,
    }
}

joinable!(posts -> groups (group_id));
joinable!(posts -> users (author_id));
joinable!(comments -> posts (post_id));
joinable!(comments -> users (author_id));

allow_tables_to_appear_in_same_query!(comments, follows, groups, posts, users);
