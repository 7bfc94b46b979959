#[allow(unused_imports)]
use diesel::sql_types::*;

table! {
    users (id) {
        id -> Int4,
        created_at -> Timestamptz,
        username -> Text,
        email -> Text,
        password_hash -> Text,
    }
}

table! {
    groups (id) {
        id -> Int4,
        title -> Text,
        slug -> Text,
        description -> Text,
    }
}

table! {
    posts (id) {
        id -> Int4,
        created_at -> Timestamptz,
        text -> Text,
        author_id -> Int4,
        group_id -> Nullable<Int4>,
        image -> Nullable<Text>,
    }
}

table! {
    comments (id) {
        id -> Int4,
        created_at -> Timestamptz,
        text -> Text,
        author_id -> Int4,
        post_id -> Int4,
    }
}

table! {
    follows (user_id, author_id) {
        user_id -> Int4,
        author_id -> Int4,
    }
}

table! {
    sessions (token) {
        token -> Uuid,
        user_id -> Int4,
        expires_at -> Timestamptz,
    }
}

joinable!(posts -> users (author_id));
joinable!(posts -> groups (group_id));
joinable!(comments -> posts (post_id));
joinable!(comments -> users (author_id));
joinable!(sessions -> users (user_id));

allow_tables_to_appear_in_same_query!(posts, users, groups);
allow_tables_to_appear_in_same_query!(comments, users);
allow_tables_to_appear_in_same_query!(follows, posts);
allow_tables_to_appear_in_same_query!(follows, users);
allow_tables_to_appear_in_same_query!(sessions, users);
