use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api;
use crate::config;
use crate::data::{self, FeedService, InteractionService};
use crate::feed::InfiniteDataset;
use crate::live::LiveFeed;
use crate::thread::{group_posts, OrderPolicy, PositionRole, ThreadGroup};

#[derive(Debug, Clone)]
pub enum Command {
    /// Render the home feed once, then run one poll cycle.
    Feed,
    Search { query: String },
    Like { post_id: String, on: bool },
    Bookmark { post_id: String, on: bool },
    Repost { post_id: String, on: bool },
    Follow { user_id: String, on: bool },
}

pub fn run(command: Command) -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;

    if cfg.api.token.trim().is_empty() {
        let path = config::default_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "the finch config file".to_string());
        println!(
            "No API token configured.\nSet api.token in {path} or export FINCH_API__TOKEN."
        );
        return Ok(());
    }

    let provider = Arc::new(api::StaticToken(cfg.api.token.clone()));
    let client = Arc::new(
        api::Client::new(
            provider,
            api::ClientConfig {
                user_agent: cfg.api.user_agent.clone(),
                base_url: Some(cfg.api.base_url.clone()),
                http_client: None,
            },
        )
        .context("build api client")?,
    );

    let feed: Arc<dyn FeedService> = Arc::new(data::ApiFeedService::new(client.clone()));
    let interactions: Arc<dyn InteractionService> =
        Arc::new(data::ApiInteractionService::new(client));

    match command {
        Command::Feed => show_feed(feed.as_ref(), &cfg),
        Command::Search { query } => show_search(feed.as_ref(), &cfg, &query),
        Command::Like { post_id, on } => {
            interactions.like(&post_id, on)?;
            println!("{} {post_id}", if on { "liked" } else { "unliked" });
            Ok(())
        }
        Command::Bookmark { post_id, on } => {
            interactions.bookmark(&post_id, on)?;
            println!("{} {post_id}", if on { "bookmarked" } else { "unbookmarked" });
            Ok(())
        }
        Command::Repost { post_id, on } => {
            interactions.repost(&post_id, on)?;
            println!("{} {post_id}", if on { "reposted" } else { "unreposted" });
            Ok(())
        }
        Command::Follow { user_id, on } => {
            interactions.follow(&user_id, on)?;
            println!("{} {user_id}", if on { "followed" } else { "unfollowed" });
            Ok(())
        }
    }
}

fn show_feed(feed: &dyn FeedService, cfg: &config::Config) -> Result<()> {
    let opts = api::PageOptions {
        cursor: None,
        limit: Some(cfg.feed.page_size),
    };
    let page = if cfg.feed.ranked {
        feed.load_recommended(opts)?
    } else {
        feed.load_timeline(opts)?
    };

    let mut dataset = InfiniteDataset::new();
    dataset.push_page(page);

    let flat = dataset.flattened();
    let policy = if cfg.feed.ranked {
        OrderPolicy::ranked_from_input(&flat)
    } else {
        OrderPolicy::Recency
    };
    let groups = group_posts(&flat, &policy);
    print!("{}", render_groups(&groups));

    let polled = feed.poll_latest(Some(cfg.feed.page_size))?;
    let mut live = LiveFeed::new();
    live.observe_poll(&dataset, &polled);
    if let Some(indicator) = live.indicator() {
        let authors: Vec<String> = indicator
            .authors
            .iter()
            .map(|a| format!("@{}", a.username))
            .collect();
        println!(
            "\n{} new post{} from {}",
            indicator.count,
            if indicator.count == 1 { "" } else { "s" },
            authors.join(", ")
        );
    }

    Ok(())
}

fn show_search(feed: &dyn FeedService, cfg: &config::Config, query: &str) -> Result<()> {
    let page = feed.search(
        query,
        api::PageOptions {
            cursor: None,
            limit: Some(cfg.feed.page_size),
        },
    )?;
    let groups = group_posts(&page.results, &OrderPolicy::Recency);
    print!("{}", render_groups(&groups));
    Ok(())
}

/// Plain-text rendering of grouped threads with connector glyphs.
pub fn render_groups(groups: &[ThreadGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        for entry in &group.entries {
            let glyph = match entry.role {
                PositionRole::Normal => " ",
                PositionRole::Top => "┌",
                PositionRole::Middle => "├",
                PositionRole::Bottom => "└",
            };
            let post = &entry.post;
            let mut line = format!("{glyph} @{}: {}", post.author.username, first_line(&post.content));
            // Interior and bottom entries sit right under their parent;
            // only detached entries need the inline context, and group
            // roots carry the suppress flag.
            let show_context = matches!(entry.role, PositionRole::Normal | PositionRole::Top)
                && !entry.suppress_parent_context;
            if show_context {
                if let Some(parent) = &post.reply_parent {
                    line.push_str(&format!("  (replying to @{})", parent.author.username));
                }
            }
            if let Some(reposted) = &post.repost_parent {
                line.push_str(&format!("  (reposting @{})", reposted.author.username));
            }
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

fn first_line(content: &str) -> &str {
    content.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Post, UserPreview};
    use chrono::{TimeZone, Utc};

    fn post(id: &str, user: &str, content: &str, minute: u32) -> Post {
        Post {
            id: id.to_string(),
            author: UserPreview {
                id: format!("u-{user}"),
                username: user.to_string(),
                display_name: String::new(),
                avatar_url: String::new(),
            },
            content: content.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, minute, 0).unwrap(),
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
    fn renders_thread_connectors() {
        let a = post("a", "ana", "root post", 1);
        let mut b = post("b", "bo", "first reply", 2);
        b.reply_parent = Some(Box::new(a.clone()));
        let mut c = post("c", "cy", "second reply", 3);
        c.reply_parent = Some(Box::new(b.clone()));

        let groups = group_posts(&[c, b, a], &OrderPolicy::Recency);
        let text = render_groups(&groups);

        assert!(text.contains("┌ @ana: root post"));
        assert!(text.contains("├ @bo: first reply"));
        assert!(text.contains("└ @cy: second reply"));
        // The interior replies sit under their parent; no inline context.
        assert!(!text.contains("replying to"));
    }

    #[test]
    fn renders_parent_context_for_lone_replies() {
        let ghost = post("g", "ghost", "unseen root", 1);
        let mut reply = post("r", "rhea", "late reply", 2);
        reply.reply_parent = Some(Box::new(ghost));
        // A bumped reply keeps its snapshot context.
        let groups = vec![ThreadGroup {
            entries: vec![crate::thread::ThreadEntry {
                post: reply,
                role: PositionRole::Normal,
                suppress_parent_context: false,
            }],
        }];
        let text = render_groups(&groups);
        assert!(text.contains("(replying to @ghost)"));
    }
}
