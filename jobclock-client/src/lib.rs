pub mod api_client;
pub mod engine;
pub mod location;
pub mod settings;
pub mod utils;
