use bytes::Bytes;

use crate::errors::AppError;

/// Sampling temperature chosen on the creativity slider, always within `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Creativity(f32);

impl Creativity {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 1.0;
    pub const STEP: f32 = 0.1;

    pub fn value(self) -> f32 {
        self.0
    }
}

impl TryFrom<f32> for Creativity {
    type Error = AppError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if value.is_finite() && (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::Validation(format!(
                "creativity must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }
}

/// Signature placed under the letter: an uploaded image or one rendered from a name.
#[derive(Debug, Clone)]
pub enum SignatureAsset {
    Uploaded(Bytes),
    Rendered { name: String, png: Vec<u8> },
}

impl SignatureAsset {
    pub fn bytes(&self) -> &[u8] {
        match self {
            SignatureAsset::Uploaded(bytes) => bytes,
            SignatureAsset::Rendered { png, .. } => png,
        }
    }
}

/// A composed cover letter PDF ready for download.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
}

impl RenderedPdf {
    pub const FILE_NAME: &'static str = "cover_letter_Cover_Letter.pdf";
}
