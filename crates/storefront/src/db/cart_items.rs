//! Cart item repository.
//!
//! Each row is owned by exactly one of `user_id` / `session_key` (enforced by
//! a CHECK constraint) and two partial unique indexes keep a single row per
//! (owner, product). Every query picks its owner column by matching on
//! [`OwnerKey`] instead of composing WHERE clauses at call sites.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use toko_core::{
    CartItem, CartItemId, CartLine, OwnerKey, Product, ProductId, SessionKey, UserId,
};

use super::{RepositoryError, quantity_from_db, quantity_to_db};

const ITEM_COLUMNS: &str = "ci.id, ci.user_id, ci.session_key, ci.product_id, ci.quantity, \
     ci.created_at, ci.updated_at";

/// Column holding the owner for a given key kind.
const fn owner_column(owner: &OwnerKey) -> &'static str {
    match owner {
        OwnerKey::User(_) => "user_id",
        OwnerKey::Session(_) => "session_key",
    }
}

/// SQLSTATE for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Map a summed quantity that no longer fits the column to `Conflict`.
fn quantity_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE)
    {
        return RepositoryError::Conflict("quantity overflow".to_owned());
    }
    RepositoryError::Database(e)
}

/// Raw `cart_item` row.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    user_id: Option<UserId>,
    session_key: Option<String>,
    product_id: ProductId,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let owner = match (row.user_id, row.session_key) {
            (Some(user), None) => OwnerKey::User(user),
            (None, Some(key)) => OwnerKey::Session(SessionKey::parse(&key).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid session key: {e}"))
            })?),
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "cart item {} must have exactly one owner",
                    row.id
                )));
            }
        };

        Ok(Self {
            id: row.id,
            owner,
            product_id: row.product_id,
            quantity: quantity_from_db(row.quantity)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Cart item joined with its product.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    product_name: String,
    product_slug: String,
    product_description: Option<String>,
    product_price: Decimal,
    product_discount_price: Option<Decimal>,
    product_stock: Option<i32>,
    product_image: Option<String>,
    product_created_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let product = Product {
            id: row.item.product_id,
            name: row.product_name,
            slug: row.product_slug,
            description: row.product_description,
            price: row.product_price,
            discount_price: row.product_discount_price,
            stock: row.product_stock,
            image: row.product_image,
            created_at: row.product_created_at,
        };

        Ok(Self {
            item: CartItem::try_from(row.item)?,
            product,
        })
    }
}

/// Repository for cart item database operations.
pub struct CartItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartItemRepository<'a> {
    /// Create a new cart item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get all lines for an owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row violates the owner invariant.
    pub async fn lines(&self, owner: &OwnerKey) -> Result<Vec<CartLine>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ITEM_COLUMNS},
                   p.name AS product_name, p.slug AS product_slug,
                   p.description AS product_description, p.price AS product_price,
                   p.discount_price AS product_discount_price, p.stock AS product_stock,
                   p.image AS product_image, p.created_at AS product_created_at
            FROM storefront.cart_item ci
            JOIN storefront.product p ON p.id = ci.product_id
            WHERE ci.{column} = $1
            ORDER BY ci.created_at DESC, ci.id DESC
            ",
            column = owner_column(owner)
        );

        let query = sqlx::query_as::<_, CartLineRow>(&sql);
        let rows = match owner {
            OwnerKey::User(user) => query.bind(*user),
            OwnerKey::Session(key) => query.bind(key.as_str()),
        }
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    /// Get a row by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM storefront.cart_item ci WHERE ci.id = $1");
        let row = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(CartItem::try_from).transpose()
    }

    /// Insert a row or increment the existing one in a single statement.
    ///
    /// Concurrent adds for the same (owner, product) both apply.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the summed quantity does not fit the column.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert_increment(
        &self,
        owner: &OwnerKey,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, RepositoryError> {
        let column = owner_column(owner);
        let sql = format!(
            r"
            INSERT INTO storefront.cart_item AS ci ({column}, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT ({column}, product_id) WHERE {column} IS NOT NULL
            DO UPDATE SET quantity = ci.quantity + EXCLUDED.quantity,
                          updated_at = now()
            RETURNING {ITEM_COLUMNS}
            "
        );

        let query = sqlx::query_as::<_, CartItemRow>(&sql);
        let row = match owner {
            OwnerKey::User(user) => query.bind(*user),
            OwnerKey::Session(key) => query.bind(key.as_str()),
        }
        .bind(product_id)
        .bind(quantity_to_db(quantity)?)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            quantity_error(e)
        })?;

        CartItem::try_from(row)
    }

    /// Overwrite the quantity of a row belonging to `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        &self,
        owner: &OwnerKey,
        id: CartItemId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let sql = format!(
            r"
            UPDATE storefront.cart_item
            SET quantity = $1, updated_at = now()
            WHERE id = $2 AND {column} = $3
            ",
            column = owner_column(owner)
        );

        let query = sqlx::query(&sql).bind(quantity_to_db(quantity)?).bind(id);
        let result = match owner {
            OwnerKey::User(user) => query.bind(*user),
            OwnerKey::Session(key) => query.bind(key.as_str()),
        }
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a row belonging to `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, owner: &OwnerKey, id: CartItemId) -> Result<bool, RepositoryError> {
        let sql = format!(
            "DELETE FROM storefront.cart_item WHERE id = $1 AND {column} = $2",
            column = owner_column(owner)
        );

        let query = sqlx::query(&sql).bind(id);
        let result = match owner {
            OwnerKey::User(user) => query.bind(*user),
            OwnerKey::Session(key) => query.bind(key.as_str()),
        }
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete all rows belonging to `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_all(&self, owner: &OwnerKey) -> Result<u64, RepositoryError> {
        let sql = format!(
            "DELETE FROM storefront.cart_item WHERE {column} = $1",
            column = owner_column(owner)
        );

        let query = sqlx::query(&sql);
        let result = match owner {
            OwnerKey::User(user) => query.bind(*user),
            OwnerKey::Session(key) => query.bind(key.as_str()),
        }
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Move a session's rows into a user's cart.
    ///
    /// The delete and the insert run as one statement, so a row is either
    /// moved or left untouched. Quantities are summed on conflict.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a summed quantity does not fit the column.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn merge_session_into_user(
        &self,
        session: &SessionKey,
        user: UserId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            WITH moved AS (
                DELETE FROM storefront.cart_item
                WHERE session_key = $2
                RETURNING product_id, quantity, created_at
            )
            INSERT INTO storefront.cart_item AS ci (user_id, product_id, quantity, created_at)
            SELECT $1, product_id, quantity, created_at FROM moved
            ON CONFLICT (user_id, product_id) WHERE user_id IS NOT NULL
            DO UPDATE SET quantity = ci.quantity + EXCLUDED.quantity,
                          updated_at = now()
            ",
        )
        .bind(user)
        .bind(session.as_str())
        .execute(self.pool)
        .await
        .map_err(quantity_error)?;

        Ok(result.rows_affected())
    }

    /// Delete anonymous rows idle since before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn prune_sessions(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.cart_item
            WHERE session_key IS NOT NULL AND updated_at < $1
            ",
        )
        .bind(cutoff)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
