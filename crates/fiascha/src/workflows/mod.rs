pub mod jobs;
pub mod messaging;
pub mod news;
pub mod todo;
