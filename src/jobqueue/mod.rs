pub mod mock;
pub mod redis;
pub mod traits;

pub use traits::{Delivery, JobQueue};
