pub mod settings;
pub mod spans;
