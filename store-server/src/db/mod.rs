//! Database Module
//!
//! Embedded SurrealDB (RocksDB engine) connection and schema

pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

const NAMESPACE: &str = "store";
const DATABASE: &str = "store";

/// 表结构与索引定义
///
/// 文档是 SCHEMALESS 的，字段由 `shared::models` 决定；
/// 只定义查询需要的索引。`created_at` 不建索引，见 repository::order。
const SCHEMA: &str = r#"
    DEFINE TABLE IF NOT EXISTS order SCHEMALESS;
    DEFINE INDEX IF NOT EXISTS order_number_idx ON TABLE order FIELDS order_number UNIQUE;
    DEFINE INDEX IF NOT EXISTS order_user_idx ON TABLE order FIELDS user_id;
    DEFINE INDEX IF NOT EXISTS order_payment_ref_idx ON TABLE order FIELDS payment_ref;

    DEFINE TABLE IF NOT EXISTS product SCHEMALESS;
"#;

/// Database service, owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the RocksDB store at `db_path` and apply the schema
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        tracing::info!(path = %db_path, "Database connection established (SurrealDB RocksDB)");

        Self::from_connection(db).await
    }

    /// Use an already opened connection (tests open their own in a tempdir)
    pub async fn from_connection(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        db.query(SCHEMA)
            .await
            .and_then(|response| response.check())
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;
        tracing::info!("Database schema applied");

        Ok(Self { db })
    }

    /// 健康检查：执行一次最小查询
    pub async fn ping(db: &Surreal<Db>) -> Result<(), AppError> {
        db.query("RETURN 1")
            .await
            .and_then(|response| response.check())
            .map(|_| ())
            .map_err(|e| AppError::database(e.to_string()))
    }
}
