use crate::datastore::{
    postgres::{
        errors::{BlockingResp, DbPoolResult},
        PostgresStore,
    },
    structs::Follow,
    tables::follows,
    FollowStore,
};
use crate::twoface::{Fallible, TfError};
use actix_web::web::block;
use async_trait::async_trait;
use diesel::{
    dsl::exists,
    query_dsl::{QueryDsl, RunQueryDsl},
    Connection, ExpressionMethods,
};

#[async_trait]
impl FollowStore for PostgresStore {
    async fn follow(&self, user_id: i32, author_id: i32) -> Fallible<()> {
        let conn = self.pool.get()?;
        block(move || {
            conn.transaction::<_, TfError, _>(|| {
                // The composite primary key makes repeat follows a no-op.
                diesel::insert_into(follows::table)
                    .values(&Follow { user_id, author_id })
                    .on_conflict_do_nothing()
                    .execute(&conn)?;

                Ok(())
            })
        })
        .await
        .to_resp()?;
        Ok(())
    }

    async fn unfollow(&self, user_id: i32, author_id: i32) -> Fallible<()> {
        let conn = self.pool.get()?;
        block(move || {
            conn.transaction::<_, TfError, _>(|| {
                diesel::delete(
                    follows::table
                        .filter(follows::user_id.eq(user_id))
                        .filter(follows::author_id.eq(author_id)),
                )
                .execute(&conn)?;

                Ok(())
            })
        })
        .await
        .to_resp()?;
        Ok(())
    }

    async fn is_following(&self, user_id: i32, author_id: i32) -> Fallible<bool> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            diesel::select(exists(
                follows::table
                    .filter(follows::user_id.eq(user_id))
                    .filter(follows::author_id.eq(author_id)),
            ))
            .get_result(&conn)
        })
        .await;
        Ok(query_result.to_resp()?)
    }
}
