//! Convenient imports for typical `pgbase` usage.
//!
//! ```ignore
//! use pgbase::prelude::*;
//! ```

pub use crate::{
    BaseModel, CmpOp, GenericClient, Messages, ModelConfig, MutationQb, OrmError, OrmResult,
    Record, SqlQb, Value, WhereMap, WhereTarget, qb,
};

#[cfg(feature = "pool")]
pub use crate::{PoolConfig, create_pool, create_pool_with_config};
