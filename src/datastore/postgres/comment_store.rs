use crate::datastore::{
    postgres::{
        errors::{BlockingResp, DbPoolResult},
        PostgresStore,
    },
    structs::{Comment, CommentEntry, NewComment, User},
    tables::{comments, users},
    CommentStore,
};
use crate::twoface::{Fallible, TfError};
use actix_web::web::block;
use async_trait::async_trait;
use diesel::{
    query_dsl::{QueryDsl, RunQueryDsl},
    Connection, ExpressionMethods,
};
use std::collections::HashMap;

#[async_trait]
impl CommentStore for PostgresStore {
    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let conn = self.pool.get()?;
        let comment = block(move || {
            conn.transaction::<_, TfError, _>(|| {
                let comment: Comment = diesel::insert_into(comments::table)
                    .values(&new_comment)
                    .get_result(&conn)?;

                Ok(comment)
            })
        })
        .await
        .to_resp()?;
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i32) -> Fallible<Vec<CommentEntry>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let replies: Vec<Comment> = comments::table
                .filter(comments::post_id.eq(post_id))
                .order_by(comments::created_at.desc())
                .then_order_by(comments::id.desc())
                .get_results(&conn)?;

            let author_ids: Vec<i32> = replies.iter().map(|comment| comment.author_id).collect();
            let authors: HashMap<i32, User> = users::table
                .filter(users::id.eq_any(author_ids))
                .get_results::<User>(&conn)?
                .into_iter()
                .map(|user| (user.id, user))
                .collect();

            let entries = replies
                .into_iter()
                .filter_map(|comment| {
                    let author = authors.get(&comment.author_id)?.clone();
                    Some(CommentEntry { comment, author })
                })
                .collect();
            Ok(entries)
        })
        .await;
        Ok(query_result.to_resp()?)
    }
}
