use chrono::{DateTime, Utc};

use super::domain::{Message, MessageId, NewMessage};
use crate::accounts::AccountId;
use crate::store::RepositoryError;

/// Storage abstraction for private messages.
pub trait MessageRepository: Send + Sync {
    fn insert_message(&self, draft: NewMessage) -> Result<Message, RepositoryError>;
    fn fetch_message(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;
    /// Messages addressed to `recipient`, newest first.
    fn received_messages(&self, recipient: AccountId) -> Result<Vec<Message>, RepositoryError>;
    /// Messages written by `sender`, newest first.
    fn sent_messages(&self, sender: AccountId) -> Result<Vec<Message>, RepositoryError>;
    fn unread_count(&self, recipient: AccountId) -> Result<usize, RepositoryError>;
    /// Mark one message read and return the stored row.
    fn mark_message_read(
        &self,
        id: MessageId,
        at: DateTime<Utc>,
    ) -> Result<Message, RepositoryError>;
    /// Mark every unread message addressed to `recipient`; returns how many changed.
    fn mark_all_read(
        &self,
        recipient: AccountId,
        at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError>;
    fn delete_message(&self, id: MessageId) -> Result<Message, RepositoryError>;
}
