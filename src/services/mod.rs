// Services module
// Onboarding pipeline, voice training and the collaborators they drive

pub mod audio; // Audio extraction from model videos
pub mod mirror; // Uploads to the remote file gateway
pub mod model; // Model onboarding pipeline
pub mod tts; // Speech backend client
pub mod voice; // Voice training and synthesis

#[cfg(test)]
pub(crate) mod test_support;

pub use mirror::{MirrorPolicy, RemoteMirror};
pub use model::ModelService;
pub use voice::{MakeAudioRequest, VoiceService};
