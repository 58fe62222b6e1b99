//! Repository Module
//!
//! Provides read/write operations for the SurrealDB tables.

pub mod order;
pub mod product;

// Re-exports
pub use order::{OrderFilter, OrderRepository};
pub use product::ProductRepository;

use shared::error::{AppError, ErrorCode};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// 唯一索引冲突 (或并发写同一索引键的事务冲突) 转为 `Duplicate`
pub(crate) fn unique_violation(err: surrealdb::Error, what: impl FnOnce() -> String) -> RepoError {
    let msg = err.to_string();
    if msg.contains("already contains") || msg.contains("read or write conflict") {
        RepoError::Duplicate(what())
    } else {
        RepoError::Database(msg)
    }
}

// =============================================================================
// ID Convention
// =============================================================================
//
// 记录 ID 使用业务主键：type::thing('order', $order_id) / type::thing('product', $product_id)
// 读取时 `SELECT * OMIT id`，models 中不出现 RecordId。

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
