use crate::types::{SourceCategory, SourceDescriptor};

const MIRROR: &str = "https://rsshub.rssforever.com";
const PRIMARY: &str = "https://rsshub.app";

/// Market wires and hot lists.
pub fn signal_feeds() -> Vec<SourceDescriptor> {
    [
        "/wallstreetcn/live/global/2",
        "/wallstreetcn/hot/day",
        "/cls/telegraph/red",
        "/yicai/headline",
    ]
    .iter()
    .map(|path| SourceDescriptor::new(format!("{MIRROR}{path}"), SourceCategory::Signal))
    .collect()
}

/// Official news agencies and current-affairs channels.
pub fn official_feeds() -> Vec<SourceDescriptor> {
    ["/news/xhsxw", "/thepaper/channel/25951", "/thepaper/channel/25950"]
        .iter()
        .map(|path| SourceDescriptor::new(format!("{PRIMARY}{path}"), SourceCategory::Official))
        .collect()
}

/// Technology, product and startup coverage.
pub fn tooling_feeds() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new(format!("{MIRROR}/36kr/newsflashes"), SourceCategory::Tooling),
        SourceDescriptor::new(format!("{MIRROR}/sspai/index"), SourceCategory::Tooling),
        SourceDescriptor::new(
            format!("{MIRROR}/woshipm/popular/daily"),
            SourceCategory::Tooling,
        ),
        SourceDescriptor::new(format!("{PRIMARY}/huxiu/channel/103"), SourceCategory::Tooling),
    ]
}

/// Broker strategy research.
pub fn macro_feeds() -> Vec<SourceDescriptor> {
    vec![SourceDescriptor::new(
        format!("{MIRROR}/eastmoney/report/strategyreport"),
        SourceCategory::Macro,
    )]
}

/// The built-in source list, grouped by category in priority order.
pub fn catalog() -> Vec<SourceDescriptor> {
    let mut feeds = signal_feeds();
    feeds.extend(official_feeds());
    feeds.extend(tooling_feeds());
    feeds.extend(macro_feeds());
    feeds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_grouped_by_category() {
        let feeds = catalog();
        assert_eq!(feeds.len(), 12);
        assert_eq!(feeds.first().map(|f| f.category), Some(SourceCategory::Signal));
        assert_eq!(feeds.last().map(|f| f.category), Some(SourceCategory::Macro));
        assert!(feeds.iter().all(|f| f.url.starts_with("https://")));
    }
}
