pub mod identity;
pub mod review_queue;
pub mod vault;
pub mod workflow;
