// Output rendering: the cover letter PDF and the optional generated signature.
// Everything here is CPU-bound; async callers run it inside tokio::task::spawn_blocking.

pub mod bitmap_font;
pub mod font_metrics;
pub mod pdf;
pub mod signature;

pub use pdf::compose_cover_letter;
pub use signature::{render_signature, SignatureFont};
