//! Request checking and PDF generation seams used by the HTTP layer.

use super::{CompositionError, RenderedDocument};

/// A request that can reject itself before any drawing happens.
///
/// The error is the user-facing message listing every invalid field.
pub trait Validator {
    fn validate(&self) -> Result<(), String>;
}

/// Draws the document for one request type.
pub trait Generator<Req> {
    fn generate(&self, request: &Req) -> Result<RenderedDocument, CompositionError>;
}
