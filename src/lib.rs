//! Normalizes governance, staking and token events from Substrate and EVM chains into one
//! canonical event stream.

pub mod chains;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod listener;
pub mod pipeline;
pub mod state;
