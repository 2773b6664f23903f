pub mod backend;
pub mod capture;
pub mod clip;

pub use backend::{AudioBackend, AudioFrame, CaptureConfig, ScriptedBackend};
pub use capture::{CaptureController, CaptureState};
pub use clip::AudioClip;
