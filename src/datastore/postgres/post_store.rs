use crate::datastore::{
    postfilters::{PostFilters, Slice},
    postgres::{
        errors::{BlockingResp, DbPoolResult},
        PostgresStore,
    },
    structs::{FeedEntry, Group, NewPost, Post, PostChange, User},
    tables::{follows, groups, posts, users},
    PostStore,
};
use crate::twoface::{Fallible, TfError};
use actix_web::web::block;
use async_trait::async_trait;
use diesel::{
    expression::BoxableExpression,
    pg::{Pg, PgConnection},
    query_dsl::{QueryDsl, RunQueryDsl},
    result::Error as DieselError,
    sql_types::Bool,
    Connection, ExpressionMethods, OptionalExtension, TextExpressionMethods,
};
use std::collections::HashMap;

#[async_trait]
impl PostStore for PostgresStore {
    async fn new_post(&self, new_post: NewPost) -> Fallible<Post> {
        let conn = self.pool.get()?;
        let post = block(move || {
            conn.transaction::<_, TfError, _>(|| {
                // Insert the new post
                let post: Post = diesel::insert_into(posts::table)
                    .values(&new_post)
                    .get_result(&conn)?;

                Ok(post)
            })
        })
        .await
        .to_resp()?;
        Ok(post)
    }

    async fn update_post(&self, id: i32, change: PostChange) -> Fallible<Option<Post>> {
        let conn = self.pool.get()?;
        let post = block(move || {
            conn.transaction::<_, anyhow::Error, _>(|| {
                let target = posts::table.find(id);
                let updated: Option<Post> = match change.image {
                    Some(image) => diesel::update(target)
                        .set((
                            posts::text.eq(change.text),
                            posts::group_id.eq(change.group_id),
                            posts::image.eq(image),
                        ))
                        .get_result(&conn)
                        .optional()?,
                    // No new upload: the stored image stays untouched.
                    None => diesel::update(target)
                        .set((
                            posts::text.eq(change.text),
                            posts::group_id.eq(change.group_id),
                        ))
                        .get_result(&conn)
                        .optional()?,
                };

                Ok(updated)
            })
        })
        .await
        .to_resp()?;
        Ok(post)
    }

    async fn find_post(&self, id: i32) -> Fallible<Option<FeedEntry>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let target_post: Option<Post> = posts::table.find(id).first(&conn).optional()?;

            guard!(let Some(target_post) = target_post else {
                return Ok(None);
            });

            let mut entries = hydrate(&conn, vec![target_post])?;
            Ok(entries.pop())
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn list_posts(&self, filters: PostFilters, slice: Slice) -> Fallible<Vec<FeedEntry>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let mut query = posts::table.into_boxed();
            for filter in filters.as_sql_where() {
                query = query.filter(filter);
            }
            if let Some(user_id) = filters.followed_by {
                let authors = followed_authors(&conn, user_id)?;
                query = query.filter(posts::author_id.eq_any(authors));
            }
            let page: Vec<Post> = query
                .order_by(posts::created_at.desc())
                .then_order_by(posts::id.desc())
                .offset(slice.offset)
                .limit(slice.limit)
                .get_results(&conn)?;

            hydrate(&conn, page)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn count_posts(&self, filters: PostFilters) -> Fallible<i64> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let mut query = posts::table
                .select(diesel::dsl::count_star())
                .into_boxed();
            for filter in filters.as_sql_where() {
                query = query.filter(filter);
            }
            if let Some(user_id) = filters.followed_by {
                let authors = followed_authors(&conn, user_id)?;
                query = query.filter(posts::author_id.eq_any(authors));
            }
            let total = query.first(&conn)?;

            Ok(total)
        })
        .await;
        Ok(query_result.to_resp()?)
    }
}

/// Authors the given user follows.
fn followed_authors(conn: &PgConnection, user_id: i32) -> Result<Vec<i32>, DieselError> {
    follows::table
        .filter(follows::user_id.eq(user_id))
        .select(follows::author_id)
        .get_results(conn)
}

/// Attach each post's author and group, preserving the post order.
fn hydrate(conn: &PgConnection, page: Vec<Post>) -> Result<Vec<FeedEntry>, DieselError> {
    let author_ids: Vec<i32> = page.iter().map(|post| post.author_id).collect();
    let authors: HashMap<i32, User> = users::table
        .filter(users::id.eq_any(author_ids))
        .get_results::<User>(conn)?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let group_ids: Vec<i32> = page.iter().filter_map(|post| post.group_id).collect();
    let post_groups: HashMap<i32, Group> = groups::table
        .filter(groups::id.eq_any(group_ids))
        .get_results::<Group>(conn)?
        .into_iter()
        .map(|group| (group.id, group))
        .collect();

    let entries = page
        .into_iter()
        .filter_map(|post| {
            let author = authors.get(&post.author_id)?.clone();
            let group = post.group_id.and_then(|id| post_groups.get(&id).cloned());
            Some(FeedEntry {
                post,
                author,
                group,
            })
        })
        .collect();
    Ok(entries)
}

impl PostFilters {
    pub fn as_sql_where(
        &self,
    ) -> Vec<Box<dyn BoxableExpression<posts::table, Pg, SqlType = Bool>>> {
        let mut wheres: Vec<Box<dyn BoxableExpression<posts::table, Pg, SqlType = Bool>>> =
            Vec::new();
        if let Some(author_id) = self.author_id {
            wheres.push(Box::new(posts::author_id.eq(author_id)))
        }
        if let Some(group_id) = self.group_id {
            wheres.push(Box::new(posts::group_id.eq(group_id)))
        }
        if let Some(substring) = &self.text_contains {
            wheres.push(Box::new(posts::text.like(format!("%{}%", substring))))
        }
        wheres
    }
}
