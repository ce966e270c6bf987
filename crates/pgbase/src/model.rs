//! Table-level CRUD helpers driven by where-maps.
//!
//! [`BaseModel`] wraps one table described by a [`ModelConfig`]. Each helper
//! checks its input, issues exactly one statement on the caller's client and
//! reports the outcome through the model's [`Notifier`].
//!
//! ```ignore
//! use pgbase::{BaseModel, ModelConfig, Record, WhereMap};
//!
//! let posts = BaseModel::new(ModelConfig::new("posts"));
//! let id = posts.store(&client, &Record::new().with("title", "hello")).await?;
//! posts.update(&client, &WhereMap::new().eq("id", id), &Record::new().with("title", "hi")).await?;
//! posts.destroy(&client, &WhereMap::new().eq("id", id)).await?;
//! posts.restore(&client, &WhereMap::new().eq("id", id)).await?;
//! ```

use crate::batch::BatchUpdate;
use crate::client::GenericClient;
use crate::compile::WhereTarget;
use crate::condition::WhereMap;
use crate::error::{OrmError, OrmResult};
use crate::notify::{Messages, NoopNotifier, Notifier, TracingNotifier};
use crate::qb::{self, MutationQb, SelectQb, SoftDeleteScope, SqlQb, UpdateQb};
use crate::record::Record;
use std::sync::Arc;
use tokio_postgres::Row;
use tracing::debug;

/// Creation/update timestamp columns, both written with `now()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamps {
    pub created_at: String,
    pub updated_at: String,
}

impl Default for Timestamps {
    fn default() -> Self {
        Self {
            created_at: "created_at".to_string(),
            updated_at: "updated_at".to_string(),
        }
    }
}

/// Table description for a [`BaseModel`].
#[derive(Debug, Clone)]
pub struct ModelConfig {
    table: String,
    prefix: String,
    primary_key: String,
    soft_delete: Option<String>,
    timestamps: Option<Timestamps>,
    messages: Messages,
}

impl ModelConfig {
    /// Defaults: primary key `id`, soft delete on `deleted_at`, timestamps on,
    /// English messages.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            prefix: String::new(),
            primary_key: "id".to_string(),
            soft_delete: Some("deleted_at".to_string()),
            timestamps: Some(Timestamps::default()),
            messages: Messages::default(),
        }
    }

    /// Table name prefix (e.g. `blog_`).
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn soft_delete(mut self, column: impl Into<String>) -> Self {
        self.soft_delete = Some(column.into());
        self
    }

    pub fn without_soft_delete(mut self) -> Self {
        self.soft_delete = None;
        self
    }

    pub fn timestamps(mut self, created_at: impl Into<String>, updated_at: impl Into<String>) -> Self {
        self.timestamps = Some(Timestamps {
            created_at: created_at.into(),
            updated_at: updated_at.into(),
        });
        self
    }

    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = None;
        self
    }

    pub fn messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Prefixed table name used in SQL.
    pub fn table_name(&self) -> String {
        format!("{}{}", self.prefix, self.table)
    }

    pub fn primary_key_column(&self) -> &str {
        &self.primary_key
    }

    pub fn soft_delete_column(&self) -> Option<&str> {
        self.soft_delete.as_deref()
    }

    pub fn timestamp_columns(&self) -> Option<&Timestamps> {
        self.timestamps.as_ref()
    }

    pub fn message_texts(&self) -> &Messages {
        &self.messages
    }
}

/// CRUD helpers for one table.
#[derive(Clone)]
pub struct BaseModel {
    config: ModelConfig,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for BaseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseModel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BaseModel {
    /// A model flashing through [`TracingNotifier`].
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Suppress all flashes.
    pub fn quiet(self) -> Self {
        self.with_notifier(Arc::new(NoopNotifier))
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    // ==================== Reads ====================

    /// SELECT builder over live rows matching `map`. An empty map filters nothing.
    pub fn query(&self, map: &WhereMap) -> SelectQb {
        let mut select = qb::select(&self.config.table_name());
        if let Some(column) = self.config.soft_delete_column() {
            select = select.soft_delete(column);
        }
        select.where_map(map)
    }

    /// All live rows matching `map`.
    pub async fn find_where(&self, conn: &impl GenericClient, map: &WhereMap) -> OrmResult<Vec<Row>> {
        let select = self.query(map);
        let (sql, params) = select.build();
        debug!(target: "pgbase.sql", sql = %sql, params = params.len(), "find_where");
        conn.query(&sql, &params.as_refs()).await
    }

    /// Number of live rows matching `map`.
    pub async fn count_where(&self, conn: &impl GenericClient, map: &WhereMap) -> OrmResult<i64> {
        let select = self.query(map);
        debug!(target: "pgbase.sql", sql = %select.to_count_sql(), "count_where");
        select.count(conn).await
    }

    // ==================== Writes ====================

    /// Insert `record` and return the new primary key.
    ///
    /// Timestamp columns not present in the record are set to `now()`.
    pub async fn store(&self, conn: &impl GenericClient, record: &Record) -> OrmResult<i64> {
        let messages = &self.config.messages;
        if record.is_empty() {
            self.notifier.error(messages.nothing_to_store);
            return Err(OrmError::EmptyData("store"));
        }

        let mut insert = qb::insert(&self.config.table_name()).set_record(record);
        if let Some(ts) = self.config.timestamp_columns() {
            for column in [&ts.created_at, &ts.updated_at] {
                if !record.contains(column) {
                    insert = insert.set_raw(column, "now()");
                }
            }
        }
        let insert = insert.returning(&self.config.primary_key);

        let (sql, params) = insert.build();
        debug!(target: "pgbase.sql", sql = %sql, params = params.len(), "store");

        let result = match conn.query_one(&sql, &params.as_refs()).await {
            Ok(row) => self.primary_key_of(&row),
            Err(err) => Err(err),
        };
        match result {
            Ok(id) => {
                self.notifier.success(messages.stored);
                Ok(id)
            }
            Err(err) => {
                self.notifier.error(messages.store_failed);
                Err(err)
            }
        }
    }

    /// Update rows matching `map` (trashed rows included) with `record`.
    ///
    /// The update timestamp is set to `now()` unless the record sets it.
    pub async fn update(
        &self,
        conn: &impl GenericClient,
        map: &WhereMap,
        record: &Record,
    ) -> OrmResult<u64> {
        let messages = &self.config.messages;
        self.require_condition(map, "update")?;
        if record.is_empty() {
            self.notifier.error(messages.empty_update);
            return Err(OrmError::EmptyData("update"));
        }

        let update = qb::update(&self.config.table_name()).set_record(record);
        let update = self.touch(update, record).where_map(map);

        let result = self.execute(conn, &update, "update").await;
        self.finish(
            result,
            "update",
            messages.updated,
            messages.no_matching_rows,
            messages.update_failed,
        )
    }

    /// Delete rows matching `map`.
    ///
    /// With a soft-delete column this marks live rows deleted (and sets the
    /// update timestamp); otherwise the rows are removed.
    pub async fn destroy(&self, conn: &impl GenericClient, map: &WhereMap) -> OrmResult<u64> {
        let messages = &self.config.messages;
        self.require_condition(map, "destroy")?;

        let table = self.config.table_name();
        let result = match self.config.soft_delete_column() {
            Some(column) => {
                let update = qb::update(&table).set_raw(column, "now()");
                let update = self
                    .touch(update, &Record::new())
                    .soft_delete(column, SoftDeleteScope::Exclude)
                    .where_map(map);
                self.execute(conn, &update, "destroy").await
            }
            None => {
                let delete = qb::delete(&table).where_map(map);
                self.execute(conn, &delete, "destroy").await
            }
        };
        self.finish(
            result,
            "destroy",
            messages.destroyed,
            messages.destroy_failed,
            messages.destroy_failed,
        )
    }

    /// Clear the soft-delete column on rows matching `map` and set the update timestamp.
    pub async fn restore(&self, conn: &impl GenericClient, map: &WhereMap) -> OrmResult<u64> {
        let messages = &self.config.messages;
        self.require_condition(map, "restore")?;
        let Some(column) = self.config.soft_delete_column() else {
            self.notifier.error(messages.restore_failed);
            return Err(OrmError::validation(format!(
                "restore requires a soft-delete column on {}",
                self.config.table_name()
            )));
        };

        let update = qb::update(&self.config.table_name()).set_raw(column, "NULL");
        let update = self.touch(update, &Record::new()).where_map(map);
        let result = self.execute(conn, &update, "restore").await;
        self.finish(
            result,
            "restore",
            messages.restored,
            messages.restore_failed,
            messages.restore_failed,
        )
    }

    /// Remove rows matching `map`, trashed or not.
    pub async fn force_delete(&self, conn: &impl GenericClient, map: &WhereMap) -> OrmResult<u64> {
        let messages = &self.config.messages;
        self.require_condition(map, "force_delete")?;

        let delete = qb::delete(&self.config.table_name()).where_map(map);
        let result = self.execute(conn, &delete, "force_delete").await;
        self.finish(
            result,
            "force_delete",
            messages.force_deleted,
            messages.force_delete_failed,
            messages.force_delete_failed,
        )
    }

    /// Update many rows in one statement (see [`BatchUpdate`]).
    ///
    /// Empty input returns [`OrmError::EmptyData`] without a flash. Zero affected
    /// rows is not an error, but flashes the failure message.
    pub async fn update_batch(&self, conn: &impl GenericClient, rows: Vec<Record>) -> OrmResult<u64> {
        let messages = &self.config.messages;
        let batch = BatchUpdate::new(&self.config.table_name(), rows);

        match batch.validate() {
            Ok(()) => {}
            Err(err @ OrmError::EmptyData(_)) => return Err(err),
            Err(err) => {
                self.notifier.error(messages.batch_failed);
                return Err(err);
            }
        }

        match self.execute(conn, &batch, "update_batch").await {
            Ok(0) => {
                self.notifier.error(messages.batch_failed);
                Ok(0)
            }
            Ok(n) => {
                self.notifier.success(messages.batch_done);
                Ok(n)
            }
            Err(err) => {
                self.notifier.error(messages.batch_failed);
                Err(err)
            }
        }
    }

    // ==================== Internals ====================

    /// Set the update timestamp to `now()` unless `record` already sets it.
    fn touch(&self, update: UpdateQb, record: &Record) -> UpdateQb {
        match self.config.timestamp_columns() {
            Some(ts) if !record.contains(&ts.updated_at) => update.set_raw(&ts.updated_at, "now()"),
            _ => update,
        }
    }

    fn require_condition(&self, map: &WhereMap, operation: &'static str) -> OrmResult<()> {
        map.require_non_empty(operation).inspect_err(|_| {
            self.notifier.error(self.config.messages.empty_condition);
        })
    }

    async fn execute(
        &self,
        conn: &impl GenericClient,
        statement: &impl MutationQb,
        operation: &'static str,
    ) -> OrmResult<u64> {
        statement.validate()?;
        let (sql, params) = statement.build();
        debug!(target: "pgbase.sql", sql = %sql, params = params.len(), "{operation}");
        conn.execute(&sql, &params.as_refs()).await
    }

    /// Map zero affected rows to `NotFound` and flash the outcome.
    fn finish(
        &self,
        result: OrmResult<u64>,
        operation: &'static str,
        ok: &str,
        none: &str,
        failed: &str,
    ) -> OrmResult<u64> {
        match result {
            Ok(0) => {
                self.notifier.error(none);
                Err(OrmError::not_found(format!(
                    "{operation} matched no rows in {}",
                    self.config.table_name()
                )))
            }
            Ok(n) => {
                self.notifier.success(ok);
                Ok(n)
            }
            Err(err) => {
                self.notifier.error(failed);
                Err(err)
            }
        }
    }

    fn primary_key_of(&self, row: &Row) -> OrmResult<i64> {
        row.try_get::<_, i64>(0)
            .or_else(|_| row.try_get::<_, i32>(0).map(i64::from))
            .map_err(|e| OrmError::decode(&self.config.primary_key, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{CollectingNotifier, Flash};
    use std::sync::Mutex;
    use tokio_postgres::types::ToSql;

    /// Records statements; `execute` reports a fixed row count, `query` fails.
    struct FakeClient {
        affected: u64,
        log: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl FakeClient {
        fn new(affected: u64) -> Self {
            Self {
                affected,
                log: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) {
            let params = params.iter().map(|p| format!("{p:?}")).collect();
            self.log.lock().unwrap().push((sql.to_string(), params));
        }

        fn statements(&self) -> Vec<(String, Vec<String>)> {
            self.log.lock().unwrap().clone()
        }
    }

    impl GenericClient for FakeClient {
        async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
            self.record(sql, params);
            Err(OrmError::Other("fake client returns no rows".to_string()))
        }

        async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
            self.record(sql, params);
            Ok(self.affected)
        }
    }

    fn posts(notifier: Arc<CollectingNotifier>) -> BaseModel {
        BaseModel::new(ModelConfig::new("posts")).with_notifier(notifier)
    }

    fn by_id(id: i64) -> WhereMap {
        WhereMap::new().eq("id", id)
    }

    #[test]
    fn table_name_uses_prefix() {
        let config = ModelConfig::new("posts").prefix("blog_");
        assert_eq!(config.table_name(), "blog_posts");
    }

    #[test]
    fn query_excludes_trashed_rows() {
        let model = BaseModel::new(ModelConfig::new("posts"));
        let map = WhereMap::or().eq("a", 1).eq("b", 2);
        assert_eq!(
            model.query(&map).to_sql(),
            "SELECT * FROM posts WHERE (a = $1 OR b = $2) AND deleted_at IS NULL"
        );
        let plain = BaseModel::new(ModelConfig::new("tags").without_soft_delete());
        assert_eq!(plain.query(&WhereMap::new()).to_sql(), "SELECT * FROM tags");
    }

    #[tokio::test]
    async fn mutations_reject_empty_map_before_sql() {
        let flashes = Arc::new(CollectingNotifier::new());
        let model = posts(flashes.clone());
        let client = FakeClient::new(1);
        let empty = WhereMap::new();
        let record = Record::new().with("title", "x");

        let errs = [
            model.update(&client, &empty, &record).await.unwrap_err(),
            model.destroy(&client, &empty).await.unwrap_err(),
            model.restore(&client, &empty).await.unwrap_err(),
            model.force_delete(&client, &empty).await.unwrap_err(),
        ];
        assert!(matches!(errs[0], OrmError::EmptyCondition("update")));
        assert!(matches!(errs[1], OrmError::EmptyCondition("destroy")));
        assert!(matches!(errs[2], OrmError::EmptyCondition("restore")));
        assert!(matches!(errs[3], OrmError::EmptyCondition("force_delete")));
        assert!(client.statements().is_empty());

        let expected = (Flash::Error, Messages::en().empty_condition.to_string());
        assert_eq!(flashes.take(), vec![expected; 4]);
    }

    #[tokio::test]
    async fn update_sets_timestamp_and_includes_trashed() {
        let flashes = Arc::new(CollectingNotifier::new());
        let client = FakeClient::new(2);
        let n = posts(flashes.clone())
            .update(&client, &by_id(5), &Record::new().with("title", "new"))
            .await
            .unwrap();
        assert_eq!(n, 2);

        let statements = client.statements();
        assert_eq!(
            statements[0].0,
            "UPDATE posts SET title = $1, updated_at = now() WHERE id = $2"
        );
        assert_eq!(flashes.take(), vec![(Flash::Success, Messages::en().updated.to_string())]);
    }

    #[tokio::test]
    async fn update_with_empty_record_is_empty_data() {
        let flashes = Arc::new(CollectingNotifier::new());
        let client = FakeClient::new(1);
        let err = posts(flashes.clone())
            .update(&client, &by_id(1), &Record::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::EmptyData("update")));
        assert!(client.statements().is_empty());
        assert_eq!(flashes.take()[0].1, Messages::en().empty_update);
    }

    #[tokio::test]
    async fn zero_rows_is_not_found() {
        let flashes = Arc::new(CollectingNotifier::new());
        let client = FakeClient::new(0);
        let err = posts(flashes.clone())
            .update(&client, &by_id(1), &Record::new().with("title", "x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            flashes.take(),
            vec![(Flash::Error, Messages::en().no_matching_rows.to_string())]
        );
    }

    #[tokio::test]
    async fn destroy_soft_deletes_live_rows() {
        let flashes = Arc::new(CollectingNotifier::new());
        let client = FakeClient::new(1);
        let map = WhereMap::or().eq("id", 1).eq("id", 2);
        posts(flashes.clone()).destroy(&client, &map).await.unwrap();
        assert_eq!(
            client.statements()[0].0,
            "UPDATE posts SET deleted_at = now(), updated_at = now() \
             WHERE (id = $1 OR id = $2) AND deleted_at IS NULL"
        );
        assert_eq!(flashes.take()[0].0, Flash::Success);
    }

    #[tokio::test]
    async fn destroy_without_timestamps_only_marks_deleted() {
        let client = FakeClient::new(1);
        let model = BaseModel::new(ModelConfig::new("posts").without_timestamps()).quiet();
        model.destroy(&client, &by_id(1)).await.unwrap();
        model.restore(&client, &by_id(1)).await.unwrap();
        let statements = client.statements();
        assert_eq!(
            statements[0].0,
            "UPDATE posts SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL"
        );
        assert_eq!(statements[1].0, "UPDATE posts SET deleted_at = NULL WHERE id = $1");
    }

    #[tokio::test]
    async fn destroy_without_soft_delete_removes_rows() {
        let client = FakeClient::new(1);
        let model = BaseModel::new(ModelConfig::new("tags").without_soft_delete()).quiet();
        model.destroy(&client, &by_id(3)).await.unwrap();
        assert_eq!(client.statements()[0].0, "DELETE FROM tags WHERE id = $1");
    }

    #[tokio::test]
    async fn restore_clears_column_including_trashed() {
        let client = FakeClient::new(1);
        let model = BaseModel::new(ModelConfig::new("posts")).quiet();
        model.restore(&client, &by_id(3)).await.unwrap();
        assert_eq!(
            client.statements()[0].0,
            "UPDATE posts SET deleted_at = NULL, updated_at = now() WHERE id = $1"
        );
    }

    #[tokio::test]
    async fn restore_requires_soft_delete_column() {
        let flashes = Arc::new(CollectingNotifier::new());
        let client = FakeClient::new(1);
        let model = BaseModel::new(ModelConfig::new("tags").without_soft_delete())
            .with_notifier(flashes.clone());
        let err = model.restore(&client, &by_id(1)).await.unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
        assert!(client.statements().is_empty());
        assert_eq!(flashes.take()[0].1, Messages::en().restore_failed);
    }

    #[tokio::test]
    async fn force_delete_ignores_soft_delete() {
        let client = FakeClient::new(4);
        let model = BaseModel::new(ModelConfig::new("posts").prefix("blog_")).quiet();
        let n = model
            .force_delete(&client, &WhereMap::new().in_list("id", [1, 2]))
            .await
            .unwrap();
        assert_eq!(n, 4);
        assert_eq!(
            client.statements()[0].0,
            "DELETE FROM blog_posts WHERE id IN ($1, $2)"
        );
    }

    #[tokio::test]
    async fn store_rejects_empty_record() {
        let flashes = Arc::new(CollectingNotifier::new());
        let client = FakeClient::new(1);
        let err = posts(flashes.clone())
            .store(&client, &Record::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::EmptyData("store")));
        assert!(client.statements().is_empty());
        assert_eq!(flashes.take()[0].1, Messages::en().nothing_to_store);
    }

    #[tokio::test]
    async fn store_renders_timestamps_and_flashes_failure() {
        let flashes = Arc::new(CollectingNotifier::new());
        let client = FakeClient::new(1);
        let err = posts(flashes.clone())
            .store(&client, &Record::new().with("title", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Other(_)));
        assert_eq!(
            client.statements()[0].0,
            "INSERT INTO posts (title, created_at, updated_at) VALUES ($1, now(), now()) RETURNING id"
        );
        assert_eq!(
            flashes.take(),
            vec![(Flash::Error, Messages::en().store_failed.to_string())]
        );
    }

    #[tokio::test]
    async fn update_batch_runs_one_statement() {
        let flashes = Arc::new(CollectingNotifier::new());
        let client = FakeClient::new(2);
        let rows = vec![
            Record::new().with("id", 1).with("title", "a"),
            Record::new().with("id", 2).with("title", "b"),
        ];
        let n = posts(flashes.clone()).update_batch(&client, rows).await.unwrap();
        assert_eq!(n, 2);

        let statements = client.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].0,
            "UPDATE posts SET title = CASE WHEN id = $1 THEN $3 WHEN id = $2 THEN $4 ELSE title END \
             WHERE id IN ($1, $2)"
        );
        assert_eq!(flashes.take()[0].1, Messages::en().batch_done);
    }

    #[tokio::test]
    async fn update_batch_empty_input_is_silent() {
        let flashes = Arc::new(CollectingNotifier::new());
        let client = FakeClient::new(1);
        let err = posts(flashes.clone())
            .update_batch(&client, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::EmptyData("update_batch")));
        assert!(flashes.take().is_empty());
        assert!(client.statements().is_empty());
    }

    #[tokio::test]
    async fn localized_messages_flow_through() {
        let flashes = Arc::new(CollectingNotifier::new());
        let model = BaseModel::new(ModelConfig::new("posts").messages(Messages::zh_cn()))
            .with_notifier(flashes.clone());
        let client = FakeClient::new(1);
        model.force_delete(&client, &by_id(1)).await.unwrap();
        assert_eq!(flashes.take(), vec![(Flash::Success, "彻底删除成功".to_string())]);
    }
}
