// Domain models module
// Contains core data structures used throughout the application

pub mod model;
pub mod storage;
pub mod voice;

pub use model::{Model, ModelRow, NewModel, Page, PageQuery};
pub use storage::{ServiceType, UploadResult};
pub use voice::{NewVoiceProfile, VoiceProfile};
