pub mod feed;
pub mod push;

pub use feed::parse_feed_event;
pub use push::parse_push_event;
