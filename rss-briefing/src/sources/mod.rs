pub mod default_feeds;
pub mod rss_feed;

pub use rss_feed::RssFeedSource;
