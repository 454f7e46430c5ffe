use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{Message, MessageId, NewMessage};
use super::repository::MessageRepository;
use crate::accounts::access::load_actor;
use crate::accounts::{AccessError, Account, AccountId, AccountRepository};
use crate::clock::Clock;
use crate::store::RepositoryError;
use crate::validation::FieldErrors;

const MAX_SUBJECT_CHARS: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Compose {
    #[serde(default)]
    pub recipient_id: Option<u64>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
}

/// A message with both participants' display names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageEntry {
    #[serde(flatten)]
    pub message: Message,
    pub sender_name: String,
    pub recipient_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inbox {
    pub messages: Vec<MessageEntry>,
    pub unread_count: usize,
}

pub struct MessageService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> MessageService<S>
where
    S: AccountRepository + MessageRepository + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Send a message to another active citizen.
    pub fn compose(&self, sender: AccountId, form: Compose) -> Result<MessageEntry, MessagingError> {
        let sender = self.actor(sender)?;

        let mut errors = FieldErrors::new();
        if form.recipient_id.is_none() {
            errors.push("recipient_id", "All fields are required.");
        }
        if errors.require("subject", &form.subject, "All fields are required.") {
            errors.check_length(
                "subject",
                form.subject.trim(),
                1,
                Some(MAX_SUBJECT_CHARS),
                "Subject must be less than 200 characters",
            );
        }
        errors.require("content", &form.content, "All fields are required.");
        errors.into_result()?;

        let recipient_id = AccountId(form.recipient_id.unwrap_or_default());
        let recipient = self
            .store
            .fetch_account(recipient_id)?
            .filter(|account| account.is_active)
            .ok_or(MessagingError::RecipientNotFound(recipient_id))?;
        if recipient.id == sender.id {
            return Err(FieldErrors::single(
                "recipient_id",
                "You cannot send a message to yourself.",
            )
            .into());
        }

        let message = self.store.insert_message(NewMessage {
            sender: sender.id,
            recipient: recipient.id,
            subject: form.subject.trim().to_string(),
            content: form.content.trim().to_string(),
            created_at: self.clock.now(),
        })?;
        info!(message = %message.id, sender = %sender.id, recipient = %recipient.id, "message sent");

        Ok(MessageEntry {
            message,
            sender_name: sender.display_name().to_string(),
            recipient_name: recipient.display_name().to_string(),
        })
    }

    pub fn inbox(&self, account: AccountId) -> Result<Inbox, MessagingError> {
        let account = self.actor(account)?;
        let names = self.display_names()?;
        let messages = self
            .store
            .received_messages(account.id)?
            .into_iter()
            .map(|message| entry(message, &names))
            .collect();
        let unread_count = self.store.unread_count(account.id)?;
        Ok(Inbox {
            messages,
            unread_count,
        })
    }

    pub fn sent(&self, account: AccountId) -> Result<Vec<MessageEntry>, MessagingError> {
        let account = self.actor(account)?;
        let names = self.display_names()?;
        Ok(self
            .store
            .sent_messages(account.id)?
            .into_iter()
            .map(|message| entry(message, &names))
            .collect())
    }

    /// Open a message. The recipient opening an unread message marks it read.
    pub fn view(&self, account: AccountId, id: MessageId) -> Result<MessageEntry, MessagingError> {
        let account = self.actor(account)?;
        let mut message = self.participant_message(&account, id)?;
        if message.recipient == account.id && !message.is_read {
            message = self.store.mark_message_read(id, self.clock.now())?;
        }
        let names = self.display_names()?;
        Ok(entry(message, &names))
    }

    pub fn delete(&self, account: AccountId, id: MessageId) -> Result<Message, MessagingError> {
        let account = self.actor(account)?;
        self.participant_message(&account, id)?;
        let message = self.store.delete_message(id)?;
        info!(message = %id, account = %account.id, "message deleted");
        Ok(message)
    }

    pub fn mark_all_read(&self, account: AccountId) -> Result<usize, MessagingError> {
        let account = self.actor(account)?;
        Ok(self.store.mark_all_read(account.id, self.clock.now())?)
    }

    fn actor(&self, id: AccountId) -> Result<Account, MessagingError> {
        load_actor::<_, MessagingError>(self.store.as_ref(), id)
    }

    fn participant_message(
        &self,
        account: &Account,
        id: MessageId,
    ) -> Result<Message, MessagingError> {
        let message = self
            .store
            .fetch_message(id)?
            .ok_or(MessagingError::NotFound(id))?;
        if !message.involves(account.id) {
            return Err(MessagingError::NotParticipant(id));
        }
        Ok(message)
    }

    fn display_names(&self) -> Result<HashMap<AccountId, String>, MessagingError> {
        Ok(self
            .store
            .list_accounts()?
            .into_iter()
            .map(|account| (account.id, account.display_name().to_string()))
            .collect())
    }
}

fn entry(message: Message, names: &HashMap<AccountId, String>) -> MessageEntry {
    let name = |id: AccountId| {
        names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("citizen #{id}"))
    };
    MessageEntry {
        sender_name: name(message.sender),
        recipient_name: name(message.recipient),
        message,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error(transparent)]
    Validation(#[from] FieldErrors),
    #[error("message {0} not found")]
    NotFound(MessageId),
    #[error("recipient not found")]
    RecipientNotFound(AccountId),
    #[error("you do not have permission to access message {0}")]
    NotParticipant(MessageId),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
