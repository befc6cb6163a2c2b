pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod fxql;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{Currency, Decimal, ParsedRate, StoredRate};
pub use error::AppError;
pub use fxql::{parse, ErrorKind, FxqlError, Position};
