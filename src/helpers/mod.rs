pub mod events;
pub mod settings;
