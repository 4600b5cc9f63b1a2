pub mod console_service;
pub mod scheduler;

pub use console_service::ConsoleService;
pub use scheduler::CacheSweeper;
