mod link;
mod linked;
mod project;
mod sync;
mod unlink;

pub use link::link;
pub use linked::linked;
pub use sync::sync;
pub use unlink::{unlink, unlink_all};
