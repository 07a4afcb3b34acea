//! Query rewrite pass trait.

use crate::query::QueryDefinition;

/// A pass that derives a new query definition from an existing one.
///
/// Passes never mutate their input.
pub trait QueryPass {
    /// Rewrites the given query.
    fn rewrite(&self, query: &QueryDefinition) -> QueryDefinition;

    /// Returns the name of this pass.
    fn name(&self) -> &'static str {
        "unnamed"
    }
}
