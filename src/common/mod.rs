pub mod field;
pub mod http;
pub mod message;
