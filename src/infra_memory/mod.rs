//! Storage adapter keeping users in process memory.

mod memory_db;
mod repo_tx_memory;
mod user_repo_memory;

pub use memory_db::{MemoryDb, constraint_name};
pub use repo_tx_memory::*;
pub use user_repo_memory::*;

mod util;
