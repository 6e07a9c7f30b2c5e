mod publisher;

pub use publisher::{PoolTotals, PublishPool, PublishTicket, publish_messages};
