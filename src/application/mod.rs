pub mod builder;
pub mod client;
pub mod dto;
pub mod errors;
pub mod events;
pub mod ports;
pub mod session;
pub mod use_cases;
pub mod validation;
