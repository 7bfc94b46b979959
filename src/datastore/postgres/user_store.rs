use crate::datastore::{
    postgres::{
        errors::{BlockingResp, DbPoolResult},
        PostgresStore,
    },
    structs::{NewUser, User},
    tables::users,
    UserStore,
};
use crate::twoface::{Fallible, TfError};
use actix_web::web::block;
use async_trait::async_trait;
use diesel::{
    query_dsl::{QueryDsl, RunQueryDsl},
    Connection, ExpressionMethods, OptionalExtension,
};

#[async_trait]
impl UserStore for PostgresStore {
    async fn new_user(&self, new_user: NewUser) -> Fallible<User> {
        let conn = self.pool.get()?;
        let user = block(move || {
            conn.transaction::<_, TfError, _>(|| {
                let user: User = diesel::insert_into(users::table)
                    .values(&new_user)
                    .get_result(&conn)?;

                Ok(user)
            })
        })
        .await
        .to_resp()?;
        Ok(user)
    }

    async fn find_user(&self, username: &str) -> Fallible<Option<User>> {
        let conn = self.pool.get()?;
        let username = username.to_owned();
        let query_result: DbPoolResult<_> = block(move || {
            users::table
                .filter(users::username.eq(username))
                .first(&conn)
                .optional()
        })
        .await;
        Ok(query_result.to_resp()?)
    }
}
