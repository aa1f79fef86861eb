pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod observability;
pub mod server;
pub mod storage;

pub use app::{ItemUseCase, ItemUseCasePort};
pub use domain::{Item, ItemMap};
pub use error::{ErrorKind, InventoryError, Result};
