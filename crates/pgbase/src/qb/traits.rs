//! Trait definitions for query builders.

use crate::client::GenericClient;
use crate::error::OrmResult;
use crate::qb::param::ParamList;
use tokio_postgres::Row;

/// Base trait for all query builders.
///
/// A builder renders to SQL plus its parameters in one pass, so placeholder
/// numbers and parameter order can never drift apart.
pub trait SqlQb: Sync {
    /// Render the statement and its parameters.
    fn build(&self) -> (String, ParamList);

    /// The SQL string only.
    fn build_sql(&self) -> String {
        self.build().0
    }

    /// The parameters only, in placeholder order.
    fn params(&self) -> ParamList {
        self.build().1
    }

    /// Debug helper to get the SQL string.
    fn to_sql(&self) -> String {
        self.build_sql()
    }

    /// Validate builder state before execution.
    fn validate(&self) -> OrmResult<()> {
        Ok(())
    }

    /// Execute query and return all rows.
    fn query(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        async move {
            self.validate()?;
            let (sql, params) = self.build();
            conn.query(&sql, &params.as_refs()).await
        }
    }

    /// Execute query and return at most one row.
    fn query_opt(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = OrmResult<Option<Row>>> + Send {
        async move {
            self.validate()?;
            let (sql, params) = self.build();
            conn.query_opt(&sql, &params.as_refs()).await
        }
    }

    /// Execute query and return exactly one row.
    fn query_one(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = OrmResult<Row>> + Send {
        async move {
            self.validate()?;
            let (sql, params) = self.build();
            conn.query_one(&sql, &params.as_refs()).await
        }
    }
}

/// Trait for mutation builders (INSERT/UPDATE/DELETE).
pub trait MutationQb: SqlQb {
    /// Execute and return affected row count.
    fn execute(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        async move {
            self.validate()?;
            let (sql, params) = self.build();
            conn.execute(&sql, &params.as_refs()).await
        }
    }
}
