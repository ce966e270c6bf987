//! # pgbase
//!
//! Base-model CRUD helpers for PostgreSQL, driven by declarative where-maps.
//!
//! ## Features
//!
//! - **Where-maps**: `{"id": ["in", [1, 2]], "_logic": "or"}` style condition
//!   maps, parsed from JSON or built in code, compiled onto any builder
//! - **Query builders**: SELECT/INSERT/UPDATE/DELETE with numbered placeholders
//!   and soft-delete scoping
//! - **BaseModel**: store / update / destroy / restore / force_delete /
//!   update_batch with flash notifications
//! - **Safe defaults**: mutating helpers refuse empty conditions, DELETE and
//!   UPDATE without WHERE are no-ops
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is expected
//!
//! ## Where-maps
//!
//! ```ignore
//! use pgbase::{qb, SqlQb, WhereMap, WhereTarget};
//! use serde_json::json;
//!
//! let map = WhereMap::from_json(&json!({
//!     "id": ["in", [1, 2, 3]],
//!     "category_id": ["<>", 9],
//! }))?;
//! let sql = qb::select("posts").where_map(&map).to_sql();
//! // SELECT * FROM posts WHERE id IN ($1, $2, $3) AND category_id <> $4
//! ```
//!
//! ## CRUD
//!
//! ```ignore
//! use pgbase::{BaseModel, ModelConfig, Record, WhereMap};
//!
//! let posts = BaseModel::new(ModelConfig::new("posts"));
//! let id = posts.store(&client, &Record::new().with("title", "hello")).await?;
//! posts.destroy(&client, &WhereMap::new().eq("id", id)).await?;
//! ```

pub mod batch;
pub mod client;
pub mod compile;
pub mod condition;
pub mod error;
pub mod model;
pub mod notify;
pub mod prelude;
pub mod qb;
pub mod record;
pub mod value;

pub use batch::BatchUpdate;
pub use client::GenericClient;
pub use compile::{WhereTarget, compile};
pub use condition::{LOGIC_KEY, Logic, Op, OpKind, WhereMap};
pub use error::{OrmError, OrmResult};
pub use model::{BaseModel, ModelConfig, Timestamps};
pub use notify::{CollectingNotifier, Flash, Messages, NoopNotifier, Notifier, TracingNotifier};
pub use record::Record;
pub use value::Value;

// Re-export qb module for easy access
pub use qb::{
    CmpOp, DeleteQb, Expr, InsertQb, MutationQb, SelectQb, SoftDeleteScope, SqlQb, UpdateQb,
    WhereClause, delete, insert, select, update,
};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{PoolConfig, create_pool, create_pool_with_config, create_pool_with_tls};
