use poise::serenity_prelude::UserId;
use sqlx::{query_as, query_scalar, FromRow, Pool, Sqlite};

use crate::models::{types::UtcDateTime, Feedback, FeedbackId, PairId, Rating};

use super::conversion::{DBConvertible, DBFromConversionError, DBToConversionError};

pub struct FeedbackRepository {
    pool: Pool<Sqlite>,
}

impl FeedbackRepository {
    pub fn new(pool: Pool<Sqlite>) -> FeedbackRepository {
        FeedbackRepository { pool }
    }

    /// Stores the receiver's feedback about their santa. Returns `None` if the
    /// pair already has feedback.
    pub async fn add_feedback(
        &self,
        pair_id: PairId,
        message: &str,
        rating: Option<Rating>,
    ) -> Result<Option<Feedback>, anyhow::Error> {
        let feedback = query_as::<_, SqlFeedback>(
            r#"
            INSERT INTO feedback (pair_id, message, rating, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (pair_id) DO NOTHING
            RETURNING id, pair_id, message, rating, created_at
            "#,
        )
        .bind(pair_id.to_db()?)
        .bind(message)
        .bind(rating.map(|r| r.to_db()).transpose()?)
        .bind(UtcDateTime::now().to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match feedback {
            Some(feedback) => Ok(Some(Feedback::from_db(&feedback)?)),
            None => Ok(None),
        }
    }

    pub async fn get_feedback(&self, pair_id: PairId) -> Result<Option<Feedback>, anyhow::Error> {
        let feedback = query_as::<_, SqlFeedback>(
            "SELECT id, pair_id, message, rating, created_at FROM feedback WHERE pair_id = ?",
        )
        .bind(pair_id.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match feedback {
            Some(feedback) => Ok(Some(Feedback::from_db(&feedback)?)),
            None => Ok(None),
        }
    }

    /// Average rating a member received as a santa, across all events.
    pub async fn average_rating(&self, santa: UserId) -> Result<Option<f64>, anyhow::Error> {
        let average = query_scalar::<_, Option<f64>>(
            r#"
            SELECT AVG(feedback.rating)
            FROM feedback
            JOIN pairs ON pairs.id = feedback.pair_id
            JOIN participants ON participants.id = pairs.giver_id
            WHERE participants.discord_user = ? AND feedback.rating IS NOT NULL
            "#,
        )
        .bind(santa.to_db()?)
        .fetch_one(&self.pool)
        .await?;

        Ok(average)
    }
}

#[derive(Debug, FromRow)]
pub struct SqlFeedback {
    id: i64,
    pair_id: i64,
    message: String,
    rating: Option<i64>,
    created_at: String,
}

impl DBConvertible for Feedback {
    type DBType = SqlFeedback;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlFeedback {
            id: self.id.to_db()?,
            pair_id: self.pair_id.to_db()?,
            message: self.message.clone(),
            rating: self.rating.map(|r| r.to_db()).transpose()?,
            created_at: self.created_at.to_db()?,
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(Feedback {
            id: FeedbackId::from_db(&value.id)?,
            pair_id: PairId::from_db(&value.pair_id)?,
            message: value.message.clone(),
            rating: value.rating.as_ref().map(Rating::from_db).transpose()?,
            created_at: UtcDateTime::from_db(&value.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        models::Rating,
        repository::{
            test_util::{memory_pool, paired_event},
            ParticipantRepository,
        },
    };

    use super::FeedbackRepository;

    #[test_log::test(tokio::test)]
    async fn one_feedback_per_pair() {
        let pool = memory_pool().await;
        let (_event, pairs) = paired_event(&pool, 3).await;
        let feedback = FeedbackRepository::new(pool);

        let first = feedback
            .add_feedback(pairs[0].id, "Lovely socks", Some(Rating::new(5).unwrap()))
            .await
            .unwrap();
        let second = feedback
            .add_feedback(pairs[0].id, "Changed my mind", Some(Rating::new(1).unwrap()))
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(
            feedback.get_feedback(pairs[0].id).await.unwrap().unwrap().message,
            "Lovely socks"
        );
    }

    #[test_log::test(tokio::test)]
    async fn average_rating_of_a_santa() {
        let pool = memory_pool().await;
        let (event, pairs) = paired_event(&pool, 3).await;
        let participants = ParticipantRepository::new(pool.clone());
        let feedback = FeedbackRepository::new(pool);

        let santa = participants
            .get_participant(pairs[0].giver_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(santa.event_id, event.id);

        assert_eq!(feedback.average_rating(santa.discord_user).await.unwrap(), None);

        feedback
            .add_feedback(pairs[0].id, "Thanks!", Some(Rating::new(4).unwrap()))
            .await
            .unwrap();

        assert_eq!(
            feedback.average_rating(santa.discord_user).await.unwrap(),
            Some(4.0)
        );
    }
}
