use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Equipment {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32, // units currently on the shelf
    pub created_at: DateTime<Utc>,
    /// Set when the equipment is retired; its issues are kept
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEquipment {
    pub name: String,
    pub quantity: i32,
}

impl Equipment {
    /// Creates a new equipment record
    pub async fn create(pool: &PgPool, data: &NewEquipment) -> Result<Self, sqlx::Error> {
        let equipment = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO equipments (name, quantity)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(data.quantity)
        .fetch_one(pool)
        .await?;

        Ok(equipment)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let equipment = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM equipments WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(equipment)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let equipments = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM equipments
            WHERE deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(equipments)
    }

    /// Takes one unit off the shelf.
    ///
    /// Returns the remaining quantity, or `None` when the equipment does not
    /// exist or has no units left.
    pub async fn take_one(conn: &mut PgConnection, id: Uuid) -> Result<Option<i32>, sqlx::Error> {
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE equipments
            SET quantity = quantity - 1
            WHERE id = $1 AND quantity > 0 AND deleted_at IS NULL
            RETURNING quantity
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(remaining)
    }

    /// Puts one unit back on the shelf
    pub async fn restore_one(conn: &mut PgConnection, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE equipments
            SET quantity = quantity + 1
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Counts loans of this equipment that are still out
    pub async fn count_open_issues(conn: &mut PgConnection, id: Uuid) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM issues
            WHERE equipment_id = $1 AND status = 'issued'
            "#,
        )
        .bind(id)
        .fetch_one(conn)
        .await?;

        Ok(count)
    }

    /// Locks an active equipment row until the transaction ends.
    ///
    /// A concurrent `take_one` waits on the lock and then sees the row as it
    /// was left, so a retirement cannot race with a new loan.
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        let locked: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM equipments
            WHERE id = $1 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(locked)
    }

    /// Retires the equipment. Its issues stay in place for the history.
    pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE equipments
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }
}
