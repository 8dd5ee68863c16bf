pub mod token;
pub mod user;

pub use token::{
    CommitReport, InMemoryTokenStore, RecordPredicate, RefreshTokenStore, StoreOperation,
};
pub use user::{InMemoryUserDirectory, UserDirectory};
