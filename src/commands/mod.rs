// Re-export commands from individual modules
pub mod config_commands;
pub mod model_commands;
pub mod voice_commands;

pub use config_commands::*;
pub use model_commands::*;
pub use voice_commands::*;
