use crate::defs::CandidatePool;
use crate::defs::Topic;

// Model-free topic choice: candidate titles in pool order.
// Pads short model answers up to the requested topic count.

fn already_chosen(chosen: &[Topic], candidate: &Topic) -> bool {
    chosen.iter().any(|topic| topic.matches(candidate.as_str()))
}

/// Appends top-ranked pool titles to `chosen` until it holds `k` topics or the pool runs out.
pub fn pad_with_titles(chosen: &mut Vec<Topic>, pool: &CandidatePool, k: usize) {
    for title in pool.titles() {
        if chosen.len() >= k {
            break;
        }
        // Compare clipped labels: a long title and its repeat clip to the same topic.
        let Some(topic) = Topic::new(title) else {
            continue;
        };
        if !already_chosen(chosen, &topic) {
            chosen.push(topic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::Article;

    fn pool(titles: &[&str]) -> CandidatePool {
        let articles = titles
            .iter()
            .map(|title| Article::new(*title, "", "src", None))
            .collect();
        CandidatePool::new(articles, 60)
    }

    #[test]
    fn takes_titles_in_pool_order() {
        let mut topics = Vec::new();
        pad_with_titles(&mut topics, &pool(&["a", "b", "c", "d"]), 2);
        let labels: Vec<_> = topics.iter().map(Topic::as_str).collect();
        assert_eq!(labels, vec!["a", "b"]);
    }

    #[test]
    fn skips_duplicates_when_padding() {
        let mut chosen = vec![Topic::new("B").unwrap()];
        pad_with_titles(&mut chosen, &pool(&["a", "b", "a", "c"]), 3);
        let labels: Vec<_> = chosen.iter().map(Topic::as_str).collect();
        assert_eq!(labels, vec!["B", "a", "c"]);
    }

    #[test]
    fn small_pool_yields_what_it_has() {
        let mut topics = Vec::new();
        pad_with_titles(&mut topics, &pool(&["only"]), 5);
        assert_eq!(topics.len(), 1);
    }

    #[test]
    fn repeated_long_title_is_chosen_once() {
        let long = "L".repeat(Topic::MAX_CHARS + 10);
        let mut topics = Vec::new();
        pad_with_titles(&mut topics, &pool(&[long.as_str(), long.as_str(), "short"]), 2);
        let labels: Vec<_> = topics.iter().map(Topic::as_str).collect();
        assert_eq!(labels, vec!["L".repeat(Topic::MAX_CHARS).as_str(), "short"]);
    }
}
