use std::collections::{HashMap, HashSet};

use crate::api::Post;

/// Where a post sits inside its thread group, for connector styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionRole {
    /// First of a multi-post group.
    Top,
    /// Interior of a multi-post group.
    Middle,
    /// Last of a multi-post group.
    Bottom,
    /// The group's only member.
    Normal,
}

/// One post placed inside a thread group. `suppress_parent_context` marks
/// the root of a multi-post group: the reply it answers is rendered right
/// above it, so the inlined `reply_parent` snapshot must not be drawn
/// again. The post itself is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadEntry {
    pub post: Post,
    pub role: PositionRole,
    pub suppress_parent_context: bool,
}

/// A visually contiguous reply chain: a root post followed by the direct
/// descendants present in (or synthesized from) the source page.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadGroup {
    pub entries: Vec<ThreadEntry>,
}

impl ThreadGroup {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How groups are ordered relative to each other.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderPolicy {
    /// Most-recently-active group first, by the last member's timestamp.
    Recency,
    /// Externally supplied rank per post id, lower = more prominent.
    /// Groups sort ascending by the rank of their last member.
    Ranked(HashMap<String, usize>),
}

impl OrderPolicy {
    /// Rank map taken from the input's own order, for recommendation
    /// feeds where the server already sorted by relevance.
    pub fn ranked_from_input(posts: &[Post]) -> Self {
        let ranks = posts
            .iter()
            .enumerate()
            .map(|(rank, post)| (post.id.clone(), rank))
            .collect();
        OrderPolicy::Ranked(ranks)
    }
}

// Chain node. Nodes live in a plain Vec and link forward by index, so a
// malformed parent reference can at worst produce a revisited index, never
// an ownership cycle.
struct Node {
    post: Post,
    next: Option<usize>,
}

/// Reconstructs thread groups from one flat fetched page.
///
/// The input arrives in source order (newest-first for chronological
/// feeds, highest-rank-first for recommended feeds) and is processed in
/// reverse, so that by the time a post is visited, every post that replied
/// to it has already been placed. Reply trees are linearized: when two
/// replies to the same parent appear in one page, the older one keeps the
/// chain and the newer one is split off as its own group head.
///
/// Pure and deterministic: identical input yields identical groups, order
/// and role annotations included.
pub fn group_posts(posts: &[Post], policy: &OrderPolicy) -> Vec<ThreadGroup> {
    let mut nodes: Vec<Node> = Vec::with_capacity(posts.len());
    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut heads: Vec<usize> = Vec::new();

    for post in posts.iter().rev() {
        let idx = nodes.len();
        nodes.push(Node {
            post: post.clone(),
            next: None,
        });

        match post.reply_parent.as_deref() {
            None => heads.push(idx),
            Some(parent) => {
                if let Some(&parent_idx) = by_id.get(&parent.id) {
                    // The previously attached reply, if any, is bumped out
                    // to start its own group.
                    if let Some(bumped) = nodes[parent_idx].next.replace(idx) {
                        heads.push(bumped);
                    }
                } else {
                    // Parent never fetched directly; reconstruct it from
                    // the embedded snapshot and let it root the chain.
                    let parent_idx = nodes.len();
                    nodes.push(Node {
                        post: parent.clone(),
                        next: Some(idx),
                    });
                    by_id.insert(parent.id.clone(), parent_idx);
                    heads.push(parent_idx);
                }
            }
        }

        // Registered after the parent hookup so a later (older) reply to
        // this post finds this node, not a stale duplicate.
        by_id.insert(post.id.clone(), idx);
    }

    let mut groups: Vec<Vec<usize>> = Vec::with_capacity(heads.len());
    for head in heads {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut cursor = Some(head);
        while let Some(idx) = cursor {
            // A revisited id means a self-reply or duplicate-id loop in
            // the source data; stop the walk instead of spinning.
            if !seen.insert(nodes[idx].post.id.as_str()) {
                break;
            }
            chain.push(idx);
            cursor = nodes[idx].next;
        }
        groups.push(chain);
    }

    match policy {
        OrderPolicy::Recency => {
            groups.sort_by(|a, b| {
                let a_last = &nodes[*a.last().expect("non-empty chain")].post;
                let b_last = &nodes[*b.last().expect("non-empty chain")].post;
                b_last.created_at.cmp(&a_last.created_at)
            });
        }
        OrderPolicy::Ranked(ranks) => {
            groups.sort_by_key(|chain| {
                let last = &nodes[*chain.last().expect("non-empty chain")].post;
                ranks.get(&last.id).copied().unwrap_or(usize::MAX)
            });
        }
    }

    groups
        .into_iter()
        .map(|chain| {
            let len = chain.len();
            let entries = chain
                .into_iter()
                .enumerate()
                .map(|(i, idx)| {
                    let role = if len == 1 {
                        PositionRole::Normal
                    } else if i == 0 {
                        PositionRole::Top
                    } else if i == len - 1 {
                        PositionRole::Bottom
                    } else {
                        PositionRole::Middle
                    };
                    ThreadEntry {
                        post: nodes[idx].post.clone(),
                        role,
                        suppress_parent_context: len > 1 && i == 0,
                    }
                })
                .collect();
            ThreadGroup { entries }
        })
        .collect()
}
