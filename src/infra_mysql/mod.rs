mod user_repo_mysql;

pub use user_repo_mysql::*;

mod repo_tx_mysql;

pub use repo_tx_mysql::*;

mod util;

pub use util::{dup_key_name, is_dup_key};
