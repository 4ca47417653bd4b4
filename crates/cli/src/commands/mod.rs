//! Command implementations.

mod publish;
mod unpublish;
mod validate;

pub use publish::run_publish;
pub use unpublish::run_unpublish;
pub use validate::run_validate;
