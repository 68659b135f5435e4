use async_trait::async_trait;

use crate::parser::Document;

/// Something that gathers URLs page by page and acts on them once per batch.
///
/// The pending buffer is empty after construction and again after every
/// `consume`, whatever happened to the individual items.
#[async_trait]
pub trait Actor: Send + Sync {
    fn name(&self) -> &str;

    /// Runs the actor's extractor on `document` and queues the URL it yields, if any.
    /// Returns the actor again so feeds can be chained.
    fn feed(&mut self, document: &Document) -> &mut dyn Actor;

    fn pending(&self) -> &[String];

    async fn consume(&mut self);
}
