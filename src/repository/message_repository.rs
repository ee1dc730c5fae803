use sqlx::{query_as, FromRow, Pool, Sqlite};

use crate::models::{types::UtcDateTime, AnonymousMessage, MessageId, PairId};

use super::conversion::{DBConvertible, DBFromConversionError, DBToConversionError};

pub struct MessageRepository {
    pool: Pool<Sqlite>,
}

impl MessageRepository {
    pub fn new(pool: Pool<Sqlite>) -> MessageRepository {
        MessageRepository { pool }
    }

    pub async fn add_message(
        &self,
        pair_id: PairId,
        from_santa: bool,
        text: &str,
    ) -> Result<AnonymousMessage, anyhow::Error> {
        let message = query_as::<_, SqlAnonymousMessage>(
            r#"
            INSERT INTO anonymous_messages (pair_id, from_santa, text, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, pair_id, from_santa, text, created_at
            "#,
        )
        .bind(pair_id.to_db()?)
        .bind(from_santa)
        .bind(text)
        .bind(UtcDateTime::now().to_db()?)
        .fetch_one(&self.pool)
        .await?;

        Ok(AnonymousMessage::from_db(&message)?)
    }

    /// The latest `limit` messages of a pair, oldest first.
    pub async fn get_messages_for_pair(
        &self,
        pair_id: PairId,
        limit: u32,
    ) -> Result<Vec<AnonymousMessage>, anyhow::Error> {
        let mut messages = query_as::<_, SqlAnonymousMessage>(
            r#"
            SELECT id, pair_id, from_santa, text, created_at
            FROM anonymous_messages
            WHERE pair_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(pair_id.to_db()?)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        messages.reverse();

        messages
            .iter()
            .map(|message| AnonymousMessage::from_db(message).map_err(anyhow::Error::from))
            .collect()
    }
}

#[derive(Debug, FromRow)]
pub struct SqlAnonymousMessage {
    id: i64,
    pair_id: i64,
    from_santa: bool,
    text: String,
    created_at: String,
}

impl DBConvertible for AnonymousMessage {
    type DBType = SqlAnonymousMessage;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlAnonymousMessage {
            id: self.id.to_db()?,
            pair_id: self.pair_id.to_db()?,
            from_santa: self.from_santa,
            text: self.text.clone(),
            created_at: self.created_at.to_db()?,
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(AnonymousMessage {
            id: MessageId::from_db(&value.id)?,
            pair_id: PairId::from_db(&value.pair_id)?,
            from_santa: value.from_santa,
            text: value.text.clone(),
            created_at: UtcDateTime::from_db(&value.created_at)?,
        })
    }
}
