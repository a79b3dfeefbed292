pub mod dto;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

#[cfg(test)]
mod tests;

pub use server::{router, serve, start_server};
