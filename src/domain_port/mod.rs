// repo

mod user_repo;

mod repo_tx;

pub use user_repo::*;

pub use repo_tx::*;
