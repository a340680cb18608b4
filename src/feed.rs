use crate::api::{Page, PageCursor, Post};

/// Accumulated state of infinite-scroll fetching: the ordered pages seen
/// so far. Pages are appended as the user scrolls and the first page grows
/// at its head when polled posts are merged in; pages are never removed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InfiniteDataset {
    pages: Vec<Page>,
}

impl InfiniteDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pages(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn push_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn first_page(&self) -> Option<&Page> {
        self.pages.first()
    }

    /// Cursor to request the next page with, if the stream has more.
    pub fn next_cursor(&self) -> Option<&PageCursor> {
        self.pages.last().and_then(|page| page.next.as_ref())
    }

    /// True once the last fetched page reported no continuation.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.pages.last(), Some(page) if page.next.is_none())
    }

    pub fn post_count(&self) -> usize {
        self.pages.iter().map(|page| page.results.len()).sum()
    }

    /// All posts in page order, the flat view the thread grouper consumes.
    pub fn flattened(&self) -> Vec<Post> {
        self.pages
            .iter()
            .flat_map(|page| page.results.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserPreview;
    use chrono::{TimeZone, Utc};

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            author: UserPreview {
                id: format!("u-{id}"),
                username: format!("user_{id}"),
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

    #[test]
    fn flattens_in_page_order() {
        let mut dataset = InfiniteDataset::new();
        dataset.push_page(Page {
            results: vec![post("a"), post("b")],
            next: Some(PageCursor::Token("t1".into())),
        });
        dataset.push_page(Page {
            results: vec![post("c")],
            next: None,
        });

        let ids: Vec<_> = dataset.flattened().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(dataset.post_count(), 3);
    }

    #[test]
    fn exhaustion_follows_last_page_cursor() {
        let mut dataset = InfiniteDataset::new();
        assert!(!dataset.is_exhausted());

        dataset.push_page(Page {
            results: vec![post("a")],
            next: Some(PageCursor::Offset(20)),
        });
        assert!(!dataset.is_exhausted());
        assert_eq!(dataset.next_cursor(), Some(&PageCursor::Offset(20)));

        dataset.push_page(Page {
            results: vec![post("b")],
            next: None,
        });
        assert!(dataset.is_exhausted());
        assert_eq!(dataset.next_cursor(), None);
    }
}
