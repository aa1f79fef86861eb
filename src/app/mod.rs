pub mod item_use_case;
pub mod ports;

pub use item_use_case::ItemUseCase;
pub use ports::ItemUseCasePort;
