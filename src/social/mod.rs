//! Friend request relay between players on the server

pub mod relay;

pub use relay::{PlayerDirectory, SocialError, SocialRelay};
