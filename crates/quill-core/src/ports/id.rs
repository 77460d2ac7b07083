/// Produces identifiers for new posts.
pub trait IdGenerator: Send + Sync {
    /// A fresh identifier, never returned before by this generator.
    fn next_id(&self) -> String;
}
