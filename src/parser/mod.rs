mod document;
mod extractor;

pub use document::{Document, Element};
pub use extractor::{normalize, rewrite_selector, ExtractFn, Extractor, ExtractorSpec};
