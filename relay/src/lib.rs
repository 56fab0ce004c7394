// Neelakshi chat relay:
// - message: request/reply types and text normalization
// - strategy: the ordered keyword table
// - resolver: turns one message into one reply
// - http_server: the /chat, /status and widget routes

pub mod http_server;
pub mod message;
pub mod resolver;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use message::{IncomingMessage, Reply, ReplySource};
pub use resolver::{Collaborators, ResolveError, Resolver};
pub use strategy::StrategyTable;
