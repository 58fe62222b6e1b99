//! Product Repository

use super::{BaseRepository, RepoError, RepoResult};
use shared::models::{Product, ProductCreate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active products ordered by name
    pub async fn find_all_active(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * OMIT id FROM product WHERE is_active = true ORDER BY name")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find all products (including inactive)
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * OMIT id FROM product")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * OMIT id FROM type::thing('product', $id)")
            .bind(("id", id.to_string()))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }

    /// Find products by a list of ids; missing ids are simply absent
    pub async fn find_by_ids(&self, ids: Vec<String>) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * OMIT id FROM product WHERE product_id IN $ids")
            .bind(("ids", ids))
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate, now: i64) -> RepoResult<Product> {
        let product = Product {
            product_id: uuid::Uuid::new_v4().to_string(),
            name: data.name.trim().to_string(),
            price: data.price,
            is_active: data.is_active.unwrap_or(true),
            rating_total: 0,
            rating_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.base
            .db()
            .query("CREATE type::thing('product', $id) CONTENT $data RETURN NONE")
            .bind(("id", product.product_id.clone()))
            .bind(("data", product.clone()))
            .await?
            .check()?;
        Ok(product)
    }

    /// Add one rating to the product aggregate
    pub async fn add_rating(&self, id: &str, rating: i64, now: i64) -> RepoResult<Product> {
        if self.find_by_id(id).await?.is_none() {
            return Err(RepoError::NotFound(format!("Product {} not found", id)));
        }

        self.base
            .db()
            .query(
                "UPDATE type::thing('product', $id) \
                 SET rating_total += $rating, rating_count += 1, updated_at = $now \
                 RETURN NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("rating", rating))
            .bind(("now", now))
            .await?
            .check()?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }
}
