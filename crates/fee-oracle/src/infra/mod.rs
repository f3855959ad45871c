pub mod api;
pub mod blockchain;
pub mod cli;
pub mod observe;

pub use self::api::Api;
