pub mod config;
pub mod error;
pub mod paths;
pub mod platform_client;
pub mod types;

pub use error::{CoreError, Result};
pub use paths::DataRoot;
pub use platform_client::{ActiveBroadcast, ChatMessage, FetchedMessages, PlatformClient, PlatformClientError};
pub use types::{now_rfc3339, round_half_even, Platform, UserId};
