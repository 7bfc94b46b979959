use crate::datastore::postfilters::PostFilters;
use crate::datastore::tables::{comments, follows, groups, posts, sessions, users};
use chrono::{offset::Utc, DateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered author on the site.
#[derive(Queryable, Identifiable, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string. Never serialized into templates or JSON.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Parameters for the database statement which inserts new users.
#[derive(Insertable)]
#[table_name = "users"]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// A topical community that posts may belong to.
#[derive(Queryable, Identifiable, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Parameters for the database statement which inserts new groups.
#[derive(Insertable, Deserialize)]
#[table_name = "groups"]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A text entry authored by a user, optionally grouped and optionally
/// carrying an uploaded image.
#[derive(Queryable, Identifiable, Serialize, Clone, Debug, PartialEq, Eq, Associations)]
#[belongs_to(User, foreign_key = "author_id")]
#[belongs_to(Group)]
pub struct Post {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub author_id: i32,
    pub group_id: Option<i32>,
    /// Media path relative to the media root, e.g. `posts/<uuid>_pic.gif`.
    pub image: Option<String>,
}

impl Post {
    /// Does this post match all specified filters?
    ///
    /// `followed_by` cannot be answered from the post alone and is resolved
    /// by the datastore before this check.
    pub fn matches(&self, filters: &PostFilters) -> bool {
        if let Some(author_id) = filters.author_id {
            if author_id != self.author_id {
                return false;
            }
        }
        if let Some(group_id) = filters.group_id {
            if Some(group_id) != self.group_id {
                return false;
            }
        }
        if let Some(substring) = &filters.text_contains {
            if !self.text.contains(substring) {
                return false;
            }
        }
        true
    }
}

/// Parameters for the database statement which inserts new posts.
#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub text: String,
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

/// An edit to an existing post. A `None` image keeps whatever image the post
/// already has; uploads always replace it.
#[derive(Debug, Clone)]
pub struct PostChange {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

/// A reply attached to a post.
#[derive(Queryable, Identifiable, Serialize, Clone, Debug, PartialEq, Eq, Associations)]
#[belongs_to(User, foreign_key = "author_id")]
#[belongs_to(Post)]
pub struct Comment {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub author_id: i32,
    pub post_id: i32,
}

/// Parameters for the database statement which inserts new comments.
#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub text: String,
    pub author_id: i32,
    pub post_id: i32,
}

/// A directed subscription: `user_id` reads everything `author_id` writes.
#[derive(Queryable, Insertable, Identifiable, Clone, Copy, Debug, PartialEq, Eq)]
#[table_name = "follows"]
#[primary_key(user_id, author_id)]
pub struct Follow {
    pub user_id: i32,
    pub author_id: i32,
}

/// A login session backing the session cookie.
#[derive(Queryable, Insertable, Identifiable, Clone, Debug, PartialEq, Eq)]
#[table_name = "sessions"]
#[primary_key(token)]
pub struct Session {
    pub token: Uuid,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// A post joined with the records templates need to render it.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct FeedEntry {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

/// A comment joined with its author.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author: User,
}

#[cfg(test)]
mod post_tests {
    use super::*;

    fn example_post() -> Post {
        Post {
            id: 1,
            created_at: Utc::now(),
            text: "example text".to_owned(),
            author_id: 7,
            group_id: Some(3),
            image: None,
        }
    }

    #[test]
    fn test_post_condition() {
        let post = example_post();

        assert!(post.matches(&PostFilters {
            author_id: Some(7),
            ..Default::default()
        }));

        assert!(post.matches(&PostFilters {
            group_id: Some(3),
            ..Default::default()
        }));

        assert!(post.matches(&PostFilters {
            text_contains: Some("ample".to_owned()),
            ..Default::default()
        }));

        assert!(!post.matches(&PostFilters {
            author_id: Some(8),
            ..Default::default()
        }));

        assert!(!post.matches(&PostFilters {
            group_id: Some(4),
            ..Default::default()
        }));

        let ungrouped = Post {
            group_id: None,
            ..example_post()
        };
        assert!(!ungrouped.matches(&PostFilters {
            group_id: Some(3),
            ..Default::default()
        }));
    }

    #[test]
    fn test_session_expiry() {
        let live = Session {
            token: Uuid::new_v4(),
            user_id: 1,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        };
        assert!(!live.is_expired());

        let stale = Session {
            expires_at: Utc::now() - chrono::Duration::seconds(1),
            ..live
        };
        assert!(stale.is_expired());
    }
}
