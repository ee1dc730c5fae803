use sqlx::{query_as, query_scalar, FromRow, Pool, Sqlite};

use crate::models::{
    types::UtcDateTime, GiftConfirmation, GiftConfirmationId, NewGiftConfirmation, PairId,
};

use super::conversion::{DBConvertible, DBFromConversionError, DBToConversionError};

pub struct GiftRepository {
    pool: Pool<Sqlite>,
}

impl GiftRepository {
    pub fn new(pool: Pool<Sqlite>) -> GiftRepository {
        GiftRepository { pool }
    }

    pub async fn add_confirmation(
        &self,
        confirmation: &NewGiftConfirmation,
    ) -> Result<GiftConfirmation, anyhow::Error> {
        let confirmation = query_as::<_, SqlGiftConfirmation>(
            r#"
            INSERT INTO gift_confirmations (pair_id, tracking_number, message, sent_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, pair_id, tracking_number, message, sent_at
            "#,
        )
        .bind(confirmation.pair_id.to_db()?)
        .bind(&confirmation.tracking_number)
        .bind(&confirmation.message)
        .bind(UtcDateTime::now().to_db()?)
        .fetch_one(&self.pool)
        .await?;

        Ok(GiftConfirmation::from_db(&confirmation)?)
    }

    pub async fn get_confirmations(
        &self,
        pair_id: PairId,
    ) -> Result<Vec<GiftConfirmation>, anyhow::Error> {
        let confirmations = query_as::<_, SqlGiftConfirmation>(
            r#"
            SELECT id, pair_id, tracking_number, message, sent_at
            FROM gift_confirmations
            WHERE pair_id = ?
            ORDER BY sent_at, id
            "#,
        )
        .bind(pair_id.to_db()?)
        .fetch_all(&self.pool)
        .await?;

        confirmations
            .iter()
            .map(|c| GiftConfirmation::from_db(c).map_err(anyhow::Error::from))
            .collect()
    }

    pub async fn has_confirmation(&self, pair_id: PairId) -> Result<bool, anyhow::Error> {
        let exists = query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM gift_confirmations WHERE pair_id = ?)",
        )
        .bind(pair_id.to_db()?)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[derive(Debug, FromRow)]
pub struct SqlGiftConfirmation {
    id: i64,
    pair_id: i64,
    tracking_number: Option<String>,
    message: Option<String>,
    sent_at: String,
}

impl DBConvertible for GiftConfirmation {
    type DBType = SqlGiftConfirmation;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlGiftConfirmation {
            id: self.id.to_db()?,
            pair_id: self.pair_id.to_db()?,
            tracking_number: self.tracking_number.clone(),
            message: self.message.clone(),
            sent_at: self.sent_at.to_db()?,
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(GiftConfirmation {
            id: GiftConfirmationId::from_db(&value.id)?,
            pair_id: PairId::from_db(&value.pair_id)?,
            tracking_number: value.tracking_number.clone(),
            message: value.message.clone(),
            sent_at: UtcDateTime::from_db(&value.sent_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        models::NewGiftConfirmation,
        repository::test_util::{memory_pool, paired_event},
    };

    use super::GiftRepository;

    #[test_log::test(tokio::test)]
    async fn confirmations_are_kept_per_pair() {
        let pool = memory_pool().await;
        let (_event, pairs) = paired_event(&pool, 3).await;
        let gifts = GiftRepository::new(pool);

        assert!(!gifts.has_confirmation(pairs[0].id).await.unwrap());

        gifts
            .add_confirmation(&NewGiftConfirmation {
                pair_id: pairs[0].id,
                tracking_number: Some("RR123456789".to_string()),
                message: None,
            })
            .await
            .unwrap();

        assert!(gifts.has_confirmation(pairs[0].id).await.unwrap());
        assert!(!gifts.has_confirmation(pairs[1].id).await.unwrap());

        let stored = gifts.get_confirmations(pairs[0].id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].tracking_number.as_deref(), Some("RR123456789"));
    }
}
