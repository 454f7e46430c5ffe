use chrono::{DateTime, Utc};

use super::{InMemoryStore, RepositoryError};
use crate::accounts::AccountId;
use crate::workflows::messaging::{Message, MessageId, MessageRepository, NewMessage};

fn newest_first(messages: &mut [Message]) {
    messages.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then(right.id.cmp(&left.id))
    });
}

impl MessageRepository for InMemoryStore {
    fn insert_message(&self, draft: NewMessage) -> Result<Message, RepositoryError> {
        let mut tables = self.tables()?;
        let id = MessageId(tables.message_ids.next());
        let message = draft.into_message(id);
        tables.messages.insert(id, message.clone());
        Ok(message)
    }

    fn fetch_message(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.messages.get(&id).cloned())
    }

    fn received_messages(&self, recipient: AccountId) -> Result<Vec<Message>, RepositoryError> {
        let tables = self.tables()?;
        let mut messages: Vec<Message> = tables
            .messages
            .values()
            .filter(|message| message.recipient == recipient)
            .cloned()
            .collect();
        newest_first(&mut messages);
        Ok(messages)
    }

    fn sent_messages(&self, sender: AccountId) -> Result<Vec<Message>, RepositoryError> {
        let tables = self.tables()?;
        let mut messages: Vec<Message> = tables
            .messages
            .values()
            .filter(|message| message.sender == sender)
            .cloned()
            .collect();
        newest_first(&mut messages);
        Ok(messages)
    }

    fn unread_count(&self, recipient: AccountId) -> Result<usize, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .messages
            .values()
            .filter(|message| message.recipient == recipient && !message.is_read)
            .count())
    }

    fn mark_message_read(
        &self,
        id: MessageId,
        at: DateTime<Utc>,
    ) -> Result<Message, RepositoryError> {
        let mut tables = self.tables()?;
        let message = tables
            .messages
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        message.mark_read(at);
        Ok(message.clone())
    }

    fn mark_all_read(
        &self,
        recipient: AccountId,
        at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut tables = self.tables()?;
        Ok(tables
            .messages
            .values_mut()
            .filter(|message| message.recipient == recipient)
            .filter_map(|message| message.mark_read(at).then_some(()))
            .count())
    }

    fn delete_message(&self, id: MessageId) -> Result<Message, RepositoryError> {
        let mut tables = self.tables()?;
        tables.messages.remove(&id).ok_or(RepositoryError::NotFound)
    }
}
