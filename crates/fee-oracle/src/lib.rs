//! Gas fee oracle: follows the chain head of an Ethereum node, estimates the
//! base fee and the average priority fee of every new block and serves the
//! most recent estimate over HTTP.

pub mod domain;
pub mod infra;
mod run;

pub use self::run::{run, start};
