use std::collections::HashSet;

use crate::api::{Page, Post, UserPreview};
use crate::feed::InfiniteDataset;

/// Avatar-stack affordance shows at most this many distinct authors.
pub const INDICATOR_AUTHOR_LIMIT: usize = 3;

/// Posts in a poll result that are not yet visible. The seen set is built
/// from the first page only, which bounds the check to the first page's
/// size no matter how deep the user has scrolled; a post that reappears
/// while sitting on page 3 is still counted as new.
pub fn new_post_count(seen: &Page, polled: &[Post]) -> usize {
    if polled.is_empty() {
        return 0;
    }
    let seen_ids: HashSet<&str> = seen.results.iter().map(|p| p.id.as_str()).collect();
    polled
        .iter()
        .filter(|post| !seen_ids.contains(post.id.as_str()))
        .count()
}

/// Summary handed to the renderer: how many posts are waiting and up to
/// three of their authors, deduplicated by id in first-appearance order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewPostIndicator {
    pub count: usize,
    pub authors: Vec<UserPreview>,
}

impl NewPostIndicator {
    pub fn has_new(&self) -> bool {
        self.count > 0
    }
}

pub fn new_post_indicator(seen: &Page, polled: &[Post]) -> NewPostIndicator {
    let seen_ids: HashSet<&str> = seen.results.iter().map(|p| p.id.as_str()).collect();
    let mut count = 0;
    let mut authors: Vec<UserPreview> = Vec::new();
    let mut author_ids: HashSet<&str> = HashSet::new();

    for post in polled {
        if seen_ids.contains(post.id.as_str()) {
            continue;
        }
        count += 1;
        if authors.len() < INDICATOR_AUTHOR_LIMIT && author_ids.insert(post.author.id.as_str()) {
            authors.push(post.author.clone());
        }
    }

    NewPostIndicator { count, authors }
}

/// What to do about polled posts that already exist somewhere in the
/// dataset. The feed currently trusts the poll endpoint to return only
/// genuinely new top-of-feed posts and keeps duplicates; a deduplicating
/// variant would slot in here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    #[default]
    KeepDuplicates,
}

/// Folds a poll result onto the head of the dataset: the entire polled
/// list is prepended to the first page's results and every other page is
/// carried over untouched. The input dataset is not modified; the caller
/// re-runs the grouper over the returned dataset's flattened view.
pub fn merge_new_posts(dataset: &InfiniteDataset, polled: &[Post]) -> InfiniteDataset {
    merge_new_posts_with(dataset, polled, MergePolicy::default())
}

pub fn merge_new_posts_with(
    dataset: &InfiniteDataset,
    polled: &[Post],
    policy: MergePolicy,
) -> InfiniteDataset {
    let MergePolicy::KeepDuplicates = policy;

    if polled.is_empty() {
        return dataset.clone();
    }

    let mut pages: Vec<Page> = dataset.pages().to_vec();
    match pages.first_mut() {
        Some(first) => {
            let mut results = polled.to_vec();
            results.extend(first.results.drain(..));
            first.results = results;
        }
        None => pages.push(Page {
            results: polled.to_vec(),
            next: None,
        }),
    }

    InfiniteDataset::from_pages(pages)
}

/// Live-update lifecycle around one displayed feed. Polling cadence is
/// owned by the caller; this only reacts to each poll result and to the
/// user pressing the "show N posts" affordance.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LiveState {
    /// Nothing new since the last baseline.
    #[default]
    Idle,
    /// The indicator is showing.
    Polled(NewPostIndicator),
    /// The user folded the new posts in; clears on the next poll.
    Merged,
}

#[derive(Debug, Clone, Default)]
pub struct LiveFeed {
    state: LiveState,
    latest: Vec<Post>,
}

impl LiveFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LiveState {
        &self.state
    }

    pub fn indicator(&self) -> Option<&NewPostIndicator> {
        match &self.state {
            LiveState::Polled(indicator) => Some(indicator),
            _ => None,
        }
    }

    /// Records the newest poll result and recomputes the indicator
    /// against the dataset's first page.
    pub fn observe_poll(&mut self, dataset: &InfiniteDataset, polled: &[Post]) -> &LiveState {
        self.latest = polled.to_vec();
        let empty = Page {
            results: Vec::new(),
            next: None,
        };
        let seen = dataset.first_page().unwrap_or(&empty);
        let indicator = new_post_indicator(seen, &self.latest);
        self.state = if indicator.has_new() {
            LiveState::Polled(indicator)
        } else {
            LiveState::Idle
        };
        &self.state
    }

    /// User action: fold the held poll result into the dataset. The
    /// returned dataset becomes the new baseline, so the next poll with
    /// the same posts counts zero new.
    pub fn acknowledge(&mut self, dataset: &InfiniteDataset) -> InfiniteDataset {
        let merged = merge_new_posts(dataset, &self.latest);
        self.latest.clear();
        self.state = LiveState::Merged;
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PageCursor;
    use chrono::{TimeZone, Utc};

    fn post_by(id: &str, author_id: &str) -> Post {
        Post {
            id: id.to_string(),
            author: UserPreview {
                id: author_id.to_string(),
                username: format!("user_{author_id}"),
                display_name: String::new(),
                avatar_url: String::new(),
            },
            content: String::new(),
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            images: Vec::new(),
            reply_parent: None,
            repost_parent: None,
            like_count: 0,
            repost_count: 0,
            comment_count: 0,
            view_count: 0,
            bookmark_count: 0,
            liked: false,
            bookmarked: false,
            reposted: false,
        }
    }

    fn post(id: &str) -> Post {
        post_by(id, &format!("u-{id}"))
    }

    fn page(ids: &[&str], next: Option<PageCursor>) -> Page {
        Page {
            results: ids.iter().map(|id| post(id)).collect(),
            next,
        }
    }

    #[test]
    fn counts_only_unseen_ids() {
        let seen = page(&["1", "2", "3"], None);
        let polled = vec![post("4"), post("2"), post("5")];
        assert_eq!(new_post_count(&seen, &polled), 2);
    }

    #[test]
    fn empty_poll_counts_zero() {
        let seen = page(&["1"], None);
        assert_eq!(new_post_count(&seen, &[]), 0);
    }

    #[test]
    fn indicator_caps_at_three_distinct_authors() {
        let seen = page(&[], None);
        let polled = vec![
            post_by("a", "alice"),
            post_by("b", "alice"),
            post_by("c", "bob"),
            post_by("d", "carol"),
            post_by("e", "dave"),
        ];
        let indicator = new_post_indicator(&seen, &polled);
        assert_eq!(indicator.count, 5);
        let ids: Vec<_> = indicator.authors.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn indicator_skips_seen_posts_authors() {
        let seen = page(&["a"], None);
        let polled = vec![post_by("a", "alice"), post_by("b", "bob")];
        let indicator = new_post_indicator(&seen, &polled);
        assert_eq!(indicator.count, 1);
        let ids: Vec<_> = indicator.authors.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["bob"]);
    }

    #[test]
    fn merge_prepends_whole_poll_onto_first_page() {
        let dataset = InfiniteDataset::from_pages(vec![
            page(&["1", "2", "3"], Some(PageCursor::Token("t".into()))),
            page(&["6", "7"], None),
        ]);
        let polled = vec![post("4"), post("5")];

        let merged = merge_new_posts(&dataset, &polled);

        let first: Vec<_> = merged.first_page().unwrap().results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(first, vec!["4", "5", "1", "2", "3"]);
        assert_eq!(merged.pages()[1], dataset.pages()[1]);
        // Copy-on-write: the input is untouched.
        assert_eq!(dataset.first_page().unwrap().results.len(), 3);
    }

    #[test]
    fn merging_empty_poll_is_a_no_op() {
        let dataset = InfiniteDataset::from_pages(vec![page(&["1", "2"], None)]);
        let merged = merge_new_posts(&dataset, &[]);
        assert_eq!(merged, dataset);
    }

    #[test]
    fn merging_into_empty_dataset_creates_first_page() {
        let dataset = InfiniteDataset::new();
        let merged = merge_new_posts(&dataset, &[post("1")]);
        assert_eq!(merged.post_count(), 1);
        assert!(merged.is_exhausted());
    }

    #[test]
    fn live_feed_walks_idle_polled_merged() {
        let dataset = InfiniteDataset::from_pages(vec![page(&["1", "2"], None)]);
        let mut live = LiveFeed::new();
        assert_eq!(live.state(), &LiveState::Idle);

        // Poll returns nothing new.
        live.observe_poll(&dataset, &[post("1")]);
        assert_eq!(live.state(), &LiveState::Idle);
        assert!(live.indicator().is_none());

        // Two new posts arrive.
        live.observe_poll(&dataset, &[post("3"), post("4"), post("1")]);
        let indicator = live.indicator().expect("indicator visible");
        assert_eq!(indicator.count, 2);

        // User folds them in; count re-baselines to zero.
        let merged = live.acknowledge(&dataset);
        assert_eq!(live.state(), &LiveState::Merged);
        let first: Vec<_> = merged.first_page().unwrap().results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(first, vec!["3", "4", "1", "1", "2"]);

        live.observe_poll(&merged, &[post("3"), post("4"), post("1")]);
        assert_eq!(live.state(), &LiveState::Idle);
    }
}
