//! PostgreSQL sequence and step repositories

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::sequence::{Sequence, SequenceRepository, Step, StepRepository};
use crate::domain::DomainError;

/// Steps travel embedded in the sequence row as a JSON array so that one
/// round trip loads the whole aggregate.
const SELECT_AGGREGATE: &str = r#"
    SELECT s.id, s.external_id, s.sequence_name, s.open_tracking_enabled,
           s.click_tracking_enabled, s.created, s.updated,
           COALESCE(
               json_agg(
                   json_build_object(
                       'id', st.id,
                       'external_id', st.external_id,
                       'sequence_id', st.sequence_id,
                       'mail_subject', st.mail_subject,
                       'mail_content', st.mail_content,
                       'order', st.step_order
                   )
                   ORDER BY st.step_order, st.id
               ) FILTER (WHERE st.id IS NOT NULL),
               '[]'::json
           ) AS steps
    FROM sequences s
    LEFT JOIN steps st ON st.sequence_id = s.id
"#;

/// PostgreSQL implementation of SequenceRepository
#[derive(Debug, Clone)]
pub struct PostgresSequenceRepository {
    pool: PgPool,
}

impl PostgresSequenceRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceRepository for PostgresSequenceRepository {
    async fn create(&self, mut sequence: Sequence) -> Result<Sequence, DomainError> {
        // Dropping the transaction without commit rolls it back, so every early
        // return below leaves no rows behind.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let row = sqlx::query(
            r#"
            INSERT INTO sequences (external_id, sequence_name, open_tracking_enabled,
                                   click_tracking_enabled)
            VALUES ($1, $2, $3, $4)
            RETURNING id, external_id, created, updated
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&sequence.name)
        .bind(sequence.open_tracking_enabled)
        .bind(sequence.click_tracking_enabled)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create sequence: {}", e)))?;

        sequence.id = row.get("id");
        sequence.external_id = row.get("external_id");
        sequence.created_at = row.get("created");
        sequence.updated_at = row.get("updated");

        for step in &mut sequence.steps {
            let external_id = Uuid::new_v4();

            let row = sqlx::query(
                r#"
                INSERT INTO steps (external_id, sequence_id, mail_subject, mail_content, step_order)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(external_id)
            .bind(sequence.id)
            .bind(&step.mail_subject)
            .bind(&step.mail_content)
            .bind(step.order)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create step: {}", e)))?;

            step.id = row.get("id");
            step.external_id = external_id;
            step.sequence_id = sequence.id;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit transaction: {}", e)))?;

        sequence.sort_steps();
        Ok(sequence)
    }

    async fn find_by_external_id(&self, id: &Uuid) -> Result<Sequence, DomainError> {
        let query = format!("{} WHERE s.external_id = $1 GROUP BY s.id", SELECT_AGGREGATE);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get sequence: {}", e)))?;

        match row {
            Some(row) => row_to_sequence(&row),
            None => Err(DomainError::not_found(format!("Sequence '{}' not found", id))),
        }
    }

    async fn find_all(&self, limit: u32, offset: u64) -> Result<Vec<Sequence>, DomainError> {
        let query = format!(
            "{} GROUP BY s.id ORDER BY s.created, s.id LIMIT $1 OFFSET $2",
            SELECT_AGGREGATE
        );

        let rows = sqlx::query(&query)
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list sequences: {}", e)))?;

        let mut sequences = Vec::with_capacity(rows.len());

        for row in rows {
            sequences.push(row_to_sequence(&row)?);
        }

        Ok(sequences)
    }

    async fn update(&self, mut sequence: Sequence) -> Result<Sequence, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE sequences
            SET open_tracking_enabled = $2, click_tracking_enabled = $3, updated = NOW()
            WHERE id = $1
            RETURNING updated
            "#,
        )
        .bind(sequence.id)
        .bind(sequence.open_tracking_enabled)
        .bind(sequence.click_tracking_enabled)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update sequence: {}", e)))?;

        match row {
            Some(row) => {
                sequence.updated_at = row.get("updated");
                Ok(sequence)
            }
            None => Err(DomainError::not_found(format!(
                "Sequence '{}' not found",
                sequence.external_id
            ))),
        }
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM sequences WHERE external_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete sequence: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to ping database: {}", e)))?;

        Ok(())
    }
}

/// PostgreSQL implementation of StepRepository
#[derive(Debug, Clone)]
pub struct PostgresStepRepository {
    pool: PgPool,
}

impl PostgresStepRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StepRepository for PostgresStepRepository {
    async fn find_one(&self, sequence_id: &Uuid, step_id: &Uuid) -> Result<Step, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT st.id, st.external_id, st.sequence_id, st.mail_subject,
                   st.mail_content, st.step_order
            FROM steps st
            JOIN sequences s ON s.id = st.sequence_id
            WHERE st.external_id = $1 AND s.external_id = $2
            "#,
        )
        .bind(step_id)
        .bind(sequence_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get step: {}", e)))?;

        match row {
            Some(row) => Ok(row_to_step(&row)),
            None => Err(DomainError::not_found(format!(
                "Step '{}' not found in sequence '{}'",
                step_id, sequence_id
            ))),
        }
    }

    async fn create(&self, mut step: Step) -> Result<Step, DomainError> {
        let external_id = Uuid::new_v4();

        let row = sqlx::query(
            r#"
            INSERT INTO steps (external_id, sequence_id, mail_subject, mail_content, step_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(external_id)
        .bind(step.sequence_id)
        .bind(&step.mail_subject)
        .bind(&step.mail_content)
        .bind(step.order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create step: {}", e)))?;

        step.id = row.get("id");
        step.external_id = external_id;
        Ok(step)
    }

    async fn update(&self, step: Step) -> Result<Step, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE steps
            SET mail_subject = $2, mail_content = $3, step_order = $4
            WHERE external_id = $1
            "#,
        )
        .bind(step.external_id)
        .bind(&step.mail_subject)
        .bind(&step.mail_content)
        .bind(step.order)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update step: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Step '{}' not found",
                step.external_id
            )));
        }

        Ok(step)
    }

    async fn delete(&self, step_id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM steps WHERE external_id = $1")
            .bind(step_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete step: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_sequence(row: &PgRow) -> Result<Sequence, DomainError> {
    let steps: serde_json::Value = row.get("steps");
    let steps: Vec<Step> = serde_json::from_value(steps)
        .map_err(|e| DomainError::storage(format!("Invalid steps in database: {}", e)))?;

    let created_at: DateTime<Utc> = row.get("created");
    let updated_at: Option<DateTime<Utc>> = row.get("updated");

    Ok(Sequence {
        id: row.get("id"),
        external_id: row.get("external_id"),
        name: row.get("sequence_name"),
        open_tracking_enabled: row.get("open_tracking_enabled"),
        click_tracking_enabled: row.get("click_tracking_enabled"),
        created_at,
        updated_at,
        steps,
    })
}

fn row_to_step(row: &PgRow) -> Step {
    Step {
        id: row.get("id"),
        external_id: row.get("external_id"),
        sequence_id: row.get("sequence_id"),
        mail_subject: row.get("mail_subject"),
        mail_content: row.get("mail_content"),
        order: row.get("step_order"),
    }
}
