//! Card repository: Postgres implementation of the card store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::error::StoreError;
use domain::models::{Card, CardWithSender, Sender, SentMark, ViewRecord};
use domain::services::lifecycle;
use domain::store::CardStore;

use crate::entities::{CardEntity, CardWithSenderEntity, SenderEntity, ViewRecordEntity};
use crate::metrics::QueryTimer;

const CARD_WITH_SENDER_SELECT: &str = r#"
    SELECT c.*, s.name AS sender_name, s.email AS sender_email,
           s.created_date AS sender_created_date
    FROM cards c
    JOIN senders s ON s.id = c.sender_id
"#;

/// Repository for cards, senders and view records.
#[derive(Clone)]
pub struct CardRepository {
    pool: PgPool,
}

impl CardRepository {
    /// Creates a new CardRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardStore for CardRepository {
    async fn ping(&self) -> Result<(), StoreError> {
        let timer = QueryTimer::new("ping");
        let result = sqlx::query("SELECT 1").execute(&self.pool).await;
        timer.record();
        result?;
        Ok(())
    }

    async fn find_card(&self, id: Uuid) -> Result<Option<Card>, StoreError> {
        let timer = QueryTimer::new("find_card_by_id");
        let result = sqlx::query_as::<_, CardEntity>("SELECT * FROM cards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn find_card_with_sender(&self, id: Uuid) -> Result<Option<CardWithSender>, StoreError> {
        let timer = QueryTimer::new("find_card_with_sender");
        let result = sqlx::query_as::<_, CardWithSenderEntity>(&format!(
            "{} WHERE c.id = $1",
            CARD_WITH_SENDER_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn find_sender_by_email(&self, email: &str) -> Result<Option<Sender>, StoreError> {
        let timer = QueryTimer::new("find_sender_by_email");
        let result = sqlx::query_as::<_, SenderEntity>(
            "SELECT * FROM senders WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn insert_card(&self, sender: Sender, card: Card) -> Result<(Card, Sender), StoreError> {
        let timer = QueryTimer::new("insert_card");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO senders (id, name, email, created_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ((LOWER(email))) DO NOTHING
            "#,
        )
        .bind(sender.id)
        .bind(&sender.name)
        .bind(&sender.email)
        .bind(sender.created_date)
        .execute(&mut *tx)
        .await?;

        let sender: Sender = sqlx::query_as::<_, SenderEntity>(
            "SELECT * FROM senders WHERE LOWER(email) = LOWER($1)",
        )
        .bind(&sender.email)
        .fetch_one(&mut *tx)
        .await?
        .into();

        let card: Card = sqlx::query_as::<_, CardEntity>(
            r#"
            INSERT INTO cards (
                id, sender_id, recipient_name, recipient_email, message,
                custom_art_path, premade_art_id, scheduled_send_date, is_sent, sent_date,
                created_date, first_viewed_date, view_count, expiry_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(card.id)
        .bind(sender.id)
        .bind(&card.recipient_name)
        .bind(&card.recipient_email)
        .bind(&card.message)
        .bind(&card.custom_art_path)
        .bind(&card.premade_art_id)
        .bind(card.scheduled_send_date)
        .bind(card.is_sent)
        .bind(card.sent_date)
        .bind(card.created_date)
        .bind(card.first_viewed_date)
        .bind(card.view_count)
        .bind(card.expiry_date)
        .fetch_one(&mut *tx)
        .await?
        .into();

        tx.commit().await?;
        timer.record();
        Ok((card, sender))
    }

    async fn list_cards_for_sender(&self, sender_id: Uuid) -> Result<Vec<Card>, StoreError> {
        let timer = QueryTimer::new("list_cards_for_sender");
        let result = sqlx::query_as::<_, CardEntity>(
            r#"
            SELECT * FROM cards
            WHERE sender_id = $1
            ORDER BY created_date DESC
            "#,
        )
        .bind(sender_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn list_recent_cards(&self, limit: i64) -> Result<Vec<CardWithSender>, StoreError> {
        let timer = QueryTimer::new("list_recent_cards");
        let result = sqlx::query_as::<_, CardWithSenderEntity>(&format!(
            "{} ORDER BY c.created_date DESC LIMIT $1",
            CARD_WITH_SENDER_SELECT
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn list_recent_views(&self, limit: i64) -> Result<Vec<ViewRecord>, StoreError> {
        let timer = QueryTimer::new("list_recent_views");
        let result = sqlx::query_as::<_, ViewRecordEntity>(
            r#"
            SELECT * FROM view_records
            ORDER BY viewed_date DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Card>, StoreError> {
        let timer = QueryTimer::new("find_expired_cards");
        let result = sqlx::query_as::<_, CardEntity>("SELECT * FROM cards WHERE expiry_date <= $1")
            .bind(now)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn find_due_for_delivery(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Card, Sender)>, StoreError> {
        let timer = QueryTimer::new("find_cards_due_for_delivery");
        let result = sqlx::query_as::<_, CardWithSenderEntity>(&format!(
            r#"{}
            WHERE c.is_sent = FALSE
              AND c.scheduled_send_date IS NOT NULL
              AND c.scheduled_send_date <= $1
            ORDER BY c.scheduled_send_date"#,
            CARD_WITH_SENDER_SELECT
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn record_view(&self, record: ViewRecord) -> Result<Option<Card>, StoreError> {
        let timer = QueryTimer::new("record_card_view");
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, CardEntity>("SELECT * FROM cards WHERE id = $1 FOR UPDATE")
            .bind(record.card_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(locked) = locked else {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        };

        let mut card: Card = locked.into();
        lifecycle::apply_view(&mut card, record.viewed_date);

        sqlx::query(
            r#"
            INSERT INTO view_records (id, card_id, viewed_date, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(record.card_id)
        .bind(record.viewed_date)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE cards
            SET view_count = $2, first_viewed_date = $3, expiry_date = $4
            WHERE id = $1
            "#,
        )
        .bind(card.id)
        .bind(card.view_count)
        .bind(card.first_viewed_date)
        .bind(card.expiry_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(card))
    }

    async fn mark_sent(&self, marks: &[SentMark]) -> Result<u64, StoreError> {
        if marks.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = marks.iter().map(|m| m.card_id).collect();
        let sent_at: Vec<DateTime<Utc>> = marks.iter().map(|m| m.sent_at).collect();

        let timer = QueryTimer::new("mark_cards_sent");
        let result = sqlx::query(
            r#"
            UPDATE cards SET is_sent = TRUE, sent_date = m.sent_at
            FROM UNNEST($1::uuid[], $2::timestamptz[]) AS m(id, sent_at)
            WHERE cards.id = m.id AND cards.is_sent = FALSE
            "#,
        )
        .bind(&ids)
        .bind(&sent_at)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    async fn set_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("set_card_sent");
        let result = sqlx::query("UPDATE cards SET is_sent = TRUE, sent_date = $2 WHERE id = $1")
            .bind(id)
            .bind(sent_at)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    async fn delete_cards(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let timer = QueryTimer::new("delete_cards");
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM view_records WHERE card_id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM cards WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        timer.record();
        Ok(deleted)
    }
}
