use crate::datastore::{
    postgres::{
        errors::{BlockingResp, DbPoolResult},
        PostgresStore,
    },
    structs::{Group, NewGroup},
    tables::groups,
    GroupStore,
};
use crate::twoface::{Fallible, TfError};
use actix_web::web::block;
use async_trait::async_trait;
use diesel::{
    query_dsl::{QueryDsl, RunQueryDsl},
    Connection, ExpressionMethods, OptionalExtension,
};

#[async_trait]
impl GroupStore for PostgresStore {
    async fn new_group(&self, new_group: NewGroup) -> Fallible<Group> {
        let conn = self.pool.get()?;
        let group = block(move || {
            conn.transaction::<_, TfError, _>(|| {
                let group: Group = diesel::insert_into(groups::table)
                    .values(&new_group)
                    .get_result(&conn)?;

                Ok(group)
            })
        })
        .await
        .to_resp()?;
        Ok(group)
    }

    async fn find_group(&self, slug: &str) -> Fallible<Option<Group>> {
        let conn = self.pool.get()?;
        let slug = slug.to_owned();
        let query_result: DbPoolResult<_> = block(move || {
            groups::table
                .filter(groups::slug.eq(slug))
                .first(&conn)
                .optional()
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn list_groups(&self) -> Fallible<Vec<Group>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> =
            block(move || groups::table.order_by(groups::title).get_results(&conn)).await;
        Ok(query_result.to_resp()?)
    }
}
