use crate::datastore::{
    postfilters::{PostFilters, Slice},
    structs::{
        Comment, CommentEntry, FeedEntry, Follow, Group, NewComment, NewGroup, NewPost, NewUser,
        Post, PostChange, Session, User,
    },
    CommentStore, FollowStore, GroupStore, PostStore, SessionStore, UserStore,
};
use crate::twoface::Fallible;
use async_trait::async_trait;
use chrono::offset::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Store<T> = Arc<Mutex<Vec<T>>>;

/// A mock implementation of datastore::Client
#[derive(Clone, Default, Debug)]
pub struct Client {
    users: Store<User>,
    groups: Store<Group>,
    posts: Store<Post>,
    comments: Store<Comment>,
    follows: Store<Follow>,
    sessions: Store<Session>,
}

fn next_id<T>(rows: &[T], id_of: impl Fn(&T) -> i32) -> i32 {
    rows.iter().map(id_of).max().unwrap_or(0) + 1
}

impl Client {
    fn feed_entry(&self, post: Post) -> Option<FeedEntry> {
        let author = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == post.author_id)?
            .clone();
        let group = post.group_id.and_then(|id| {
            self.groups
                .lock()
                .unwrap()
                .iter()
                .find(|group| group.id == id)
                .cloned()
        });
        Some(FeedEntry {
            post,
            author,
            group,
        })
    }

    fn followed_authors(&self, user_id: i32) -> Vec<i32> {
        self.follows
            .lock()
            .unwrap()
            .iter()
            .filter(|follow| follow.user_id == user_id)
            .map(|follow| follow.author_id)
            .collect()
    }

    /// Posts passing the filters, newest first, like the SQL listing.
    fn filtered_posts(&self, filters: &PostFilters) -> Vec<Post> {
        let authors = filters
            .followed_by
            .map(|user_id| self.followed_authors(user_id));
        let mut page: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|post| post.matches(filters))
            .filter(|post| match &authors {
                Some(authors) => authors.contains(&post.author_id),
                None => true,
            })
            .cloned()
            .collect();
        page.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        page
    }
}

#[async_trait]
impl UserStore for Client {
    async fn new_user(&self, new_user: NewUser) -> Fallible<User> {
        let mut users = self.users.lock().unwrap();
        let user = User {
            id: next_id(&users, |user| user.id),
            created_at: Utc::now(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, username: &str) -> Fallible<Option<User>> {
        let user = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.username == username)
            .cloned();
        Ok(user)
    }
}

#[async_trait]
impl GroupStore for Client {
    async fn new_group(&self, new_group: NewGroup) -> Fallible<Group> {
        let mut groups = self.groups.lock().unwrap();
        let group = Group {
            id: next_id(&groups, |group| group.id),
            title: new_group.title,
            slug: new_group.slug,
            description: new_group.description,
        };
        groups.push(group.clone());
        Ok(group)
    }

    async fn find_group(&self, slug: &str) -> Fallible<Option<Group>> {
        let group = self
            .groups
            .lock()
            .unwrap()
            .iter()
            .find(|group| group.slug == slug)
            .cloned();
        Ok(group)
    }

    async fn list_groups(&self) -> Fallible<Vec<Group>> {
        let mut groups = self.groups.lock().unwrap().clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

#[async_trait]
impl PostStore for Client {
    async fn new_post(&self, new_post: NewPost) -> Fallible<Post> {
        let mut posts = self.posts.lock().unwrap();
        let post = Post {
            id: next_id(&posts, |post| post.id),
            created_at: Utc::now(),
            text: new_post.text,
            author_id: new_post.author_id,
            group_id: new_post.group_id,
            image: new_post.image,
        };
        posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i32, change: PostChange) -> Fallible<Option<Post>> {
        let updated = self
            .posts
            .lock()
            .unwrap()
            .iter_mut()
            .find(|post| post.id == id)
            .map(|post| {
                post.text = change.text;
                post.group_id = change.group_id;
                if let Some(image) = change.image {
                    post.image = Some(image);
                }
                post.clone()
            });
        Ok(updated)
    }

    async fn find_post(&self, id: i32) -> Fallible<Option<FeedEntry>> {
        let post = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|post| post.id == id)
            .cloned();

        guard!(let Some(post) = post else {
            return Ok(None)
        });

        Ok(self.feed_entry(post))
    }

    async fn list_posts(&self, filters: PostFilters, slice: Slice) -> Fallible<Vec<FeedEntry>> {
        let entries = self
            .filtered_posts(&filters)
            .into_iter()
            .skip(slice.offset as usize)
            .take(slice.limit as usize)
            .filter_map(|post| self.feed_entry(post))
            .collect();
        Ok(entries)
    }

    async fn count_posts(&self, filters: PostFilters) -> Fallible<i64> {
        Ok(self.filtered_posts(&filters).len() as i64)
    }
}

#[async_trait]
impl CommentStore for Client {
    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let mut comments = self.comments.lock().unwrap();
        let comment = Comment {
            id: next_id(&comments, |comment| comment.id),
            created_at: Utc::now(),
            text: new_comment.text,
            author_id: new_comment.author_id,
            post_id: new_comment.post_id,
        };
        comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i32) -> Fallible<Vec<CommentEntry>> {
        let mut replies: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        replies.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        let users = self.users.lock().unwrap();
        let entries = replies
            .into_iter()
            .filter_map(|comment| {
                let author = users.iter().find(|user| user.id == comment.author_id)?;
                Some(CommentEntry {
                    comment,
                    author: author.clone(),
                })
            })
            .collect();
        Ok(entries)
    }
}

#[async_trait]
impl FollowStore for Client {
    async fn follow(&self, user_id: i32, author_id: i32) -> Fallible<()> {
        let mut follows = self.follows.lock().unwrap();
        let already = follows
            .iter()
            .any(|follow| follow.user_id == user_id && follow.author_id == author_id);
        if !already {
            follows.push(Follow { user_id, author_id });
        }
        Ok(())
    }

    async fn unfollow(&self, user_id: i32, author_id: i32) -> Fallible<()> {
        self.follows
            .lock()
            .unwrap()
            .retain(|follow| !(follow.user_id == user_id && follow.author_id == author_id));
        Ok(())
    }

    async fn is_following(&self, user_id: i32, author_id: i32) -> Fallible<bool> {
        let following = self
            .follows
            .lock()
            .unwrap()
            .iter()
            .any(|follow| follow.user_id == user_id && follow.author_id == author_id);
        Ok(following)
    }
}

#[async_trait]
impl SessionStore for Client {
    async fn open_session(&self, session: Session) -> Fallible<Session> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn session_user(&self, token: Uuid) -> Fallible<Option<User>> {
        let session = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|session| session.token == token && !session.is_expired())
            .cloned();

        guard!(let Some(session) = session else {
            return Ok(None)
        });

        let user = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == session.user_id)
            .cloned();
        Ok(user)
    }

    async fn close_session(&self, token: Uuid) -> Fallible<()> {
        self.sessions
            .lock()
            .unwrap()
            .retain(|session| session.token != token);
        Ok(())
    }
}

impl super::Client for Client {}
