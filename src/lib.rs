pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod processing {
    pub mod layout;
    pub mod rect;
}
pub mod render {
    pub mod gpu;
    pub mod input;
    pub mod loader;
    pub mod viewer;
}
pub mod platform {
    pub mod file_picker;
}

pub use engine::Engine;
pub use error::Error;
