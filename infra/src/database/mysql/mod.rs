//! MySQL implementations of the credential stores

mod refresh_token_store;
mod user_directory;

pub use refresh_token_store::MySqlRefreshTokenStore;
pub use user_directory::MySqlUserDirectory;
