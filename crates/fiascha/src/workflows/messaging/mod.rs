//! Private messages between citizens.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Message, MessageId, NewMessage};
pub use repository::MessageRepository;
pub use router::message_router;
pub use service::{Compose, Inbox, MessageEntry, MessageService, MessagingError};
