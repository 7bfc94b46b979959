#[cfg(test)]
pub mod mock;
pub mod postfilters;
pub mod postgres;
pub mod structs;
pub mod tables;

use crate::datastore::structs::{
    Comment, CommentEntry, FeedEntry, Group, NewComment, NewGroup, NewPost, NewUser, Post,
    PostChange, Session, User,
};
use crate::twoface::Fallible;
use async_trait::async_trait;
use postfilters::{PostFilters, Slice};
use uuid::Uuid;

/// The interface for storing user accounts.
#[async_trait]
pub trait UserStore {
    async fn new_user(&self, new_user: NewUser) -> Fallible<User>;
    async fn find_user(&self, username: &str) -> Fallible<Option<User>>;
}

/// The interface for storing groups (topical communities).
#[async_trait]
pub trait GroupStore {
    async fn new_group(&self, new_group: NewGroup) -> Fallible<Group>;
    async fn find_group(&self, slug: &str) -> Fallible<Option<Group>>;
    async fn list_groups(&self) -> Fallible<Vec<Group>>;
}

/// The interface for storing post data. Listings are always ordered
/// newest-first and come back joined with their author and group.
#[async_trait]
pub trait PostStore {
    async fn new_post(&self, new_post: NewPost) -> Fallible<Post>;
    async fn update_post(&self, id: i32, change: PostChange) -> Fallible<Option<Post>>;
    async fn find_post(&self, id: i32) -> Fallible<Option<FeedEntry>>;
    async fn list_posts(&self, filters: PostFilters, slice: Slice) -> Fallible<Vec<FeedEntry>>;
    async fn count_posts(&self, filters: PostFilters) -> Fallible<i64>;
}

/// The interface for storing comments on posts.
#[async_trait]
pub trait CommentStore {
    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment>;
    async fn list_comments(&self, post_id: i32) -> Fallible<Vec<CommentEntry>>;
}

/// The interface for the follower graph. `follow` is idempotent; callers
/// enforce the no-self-follow rule.
#[async_trait]
pub trait FollowStore {
    async fn follow(&self, user_id: i32, author_id: i32) -> Fallible<()>;
    async fn unfollow(&self, user_id: i32, author_id: i32) -> Fallible<()>;
    async fn is_following(&self, user_id: i32, author_id: i32) -> Fallible<bool>;
}

/// The interface for login sessions backing the session cookie.
#[async_trait]
pub trait SessionStore {
    async fn open_session(&self, session: Session) -> Fallible<Session>;
    /// Resolve a session token to its user. Expired sessions resolve to `None`.
    async fn session_user(&self, token: Uuid) -> Fallible<Option<User>>;
    async fn close_session(&self, token: Uuid) -> Fallible<()>;
}

/// Everything the page handlers need from a datastore.
pub trait Client:
    UserStore
    + GroupStore
    + PostStore
    + CommentStore
    + FollowStore
    + SessionStore
    + Clone
    + Send
    + Sync
{
}
