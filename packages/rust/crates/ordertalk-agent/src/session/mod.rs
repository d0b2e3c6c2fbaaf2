//! Session namespace: message log, store backends, per-session gate, request-scoped memory.

mod gate;
mod memory;
mod message;
mod redis_backend;
mod store;

pub use gate::{SessionGate, SessionGuard};
pub use memory::SessionMemory;
pub use message::{Message, MessageContent, MessageRole, SessionKey};
pub use store::SessionStore;
