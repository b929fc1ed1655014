mod backend;
mod backends;
mod labels;
mod loader;
mod result;
mod worker;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::{TractBackend, YoloParams};
pub use labels::LabelTable;
pub use loader::{load_model, LoadedModel};
pub use result::RawDetection;
pub use worker::InferenceWorker;
