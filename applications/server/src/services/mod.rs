/// Server services
pub mod accounts;
pub mod file_storage;
pub mod mailer;
pub mod sessions;

pub use accounts::{AccountService, UserView};
pub use file_storage::FileStorage;
pub use mailer::{LogMailer, Mailer, MemoryMailer};
pub use sessions::{PlayerAction, PlayerResponse, SessionHost};
