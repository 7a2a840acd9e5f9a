pub mod http;
pub mod spotify;
pub mod token;
