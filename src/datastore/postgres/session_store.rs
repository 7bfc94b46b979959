use crate::datastore::{
    postgres::{
        errors::{BlockingResp, DbPoolResult},
        PostgresStore,
    },
    structs::{Session, User},
    tables::{sessions, users},
    SessionStore,
};
use crate::twoface::{Fallible, TfError};
use actix_web::web::block;
use async_trait::async_trait;
use diesel::{
    dsl::now,
    query_dsl::{QueryDsl, RunQueryDsl},
    Connection, ExpressionMethods, OptionalExtension,
};
use uuid::Uuid;

#[async_trait]
impl SessionStore for PostgresStore {
    async fn open_session(&self, session: Session) -> Fallible<Session> {
        let conn = self.pool.get()?;
        let session = block(move || {
            conn.transaction::<_, TfError, _>(|| {
                let session: Session = diesel::insert_into(sessions::table)
                    .values(&session)
                    .get_result(&conn)?;

                Ok(session)
            })
        })
        .await
        .to_resp()?;
        Ok(session)
    }

    async fn session_user(&self, token: Uuid) -> Fallible<Option<User>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            // Expired rows stay in the table but never resolve to a user.
            sessions::table
                .inner_join(users::table)
                .filter(sessions::token.eq(token))
                .filter(sessions::expires_at.gt(now))
                .select(users::all_columns)
                .first(&conn)
                .optional()
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn close_session(&self, token: Uuid) -> Fallible<()> {
        let conn = self.pool.get()?;
        block(move || {
            diesel::delete(sessions::table.filter(sessions::token.eq(token))).execute(&conn)
        })
        .await
        .to_resp()?;
        Ok(())
    }
}
