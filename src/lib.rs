pub mod companion;
pub mod config;
pub mod error;
pub mod events;
pub mod item;
pub mod manifest;
pub mod ports;
pub mod slideshow;
pub mod status;
pub mod store;
pub mod engine {
    pub mod advance;
    pub mod cache;
    pub mod library;
    pub mod prefetch;
}
pub mod tasks {
    pub mod poller;
    pub mod refresh;
    pub mod session;
}
