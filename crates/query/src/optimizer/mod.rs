//! Query rewrites.

mod count;
mod pass;

pub use count::{count_query, CountQueryPass};
pub use pass::QueryPass;
