// Transient, single-request values passed between pipeline stages.
// Nothing here outlives the submission that created it.

pub mod document;
pub mod letter;

pub use document::{JobDescription, JobDescriptionSource, ResumeDocument};
pub use letter::{Creativity, RenderedPdf, SignatureAsset};
