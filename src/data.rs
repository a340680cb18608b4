use anyhow::{Context, Result};
use std::sync::Arc;

use crate::api::{self, Page, PageOptions, Post};

pub trait FeedService: Send + Sync {
    fn load_timeline(&self, opts: PageOptions) -> Result<Page>;
    fn load_recommended(&self, opts: PageOptions) -> Result<Page>;
    fn poll_latest(&self, limit: Option<u32>) -> Result<Vec<Post>>;
    fn search(&self, query: &str, opts: PageOptions) -> Result<Page>;
}

pub trait InteractionService: Send + Sync {
    fn like(&self, post_id: &str, on: bool) -> Result<()>;
    fn bookmark(&self, post_id: &str, on: bool) -> Result<()>;
    fn repost(&self, post_id: &str, on: bool) -> Result<()>;
    fn follow(&self, user_id: &str, on: bool) -> Result<()>;
}

pub struct ApiFeedService {
    client: Arc<api::Client>,
}

impl ApiFeedService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl FeedService for ApiFeedService {
    fn load_timeline(&self, opts: PageOptions) -> Result<Page> {
        self.client.timeline(opts).context("fetch timeline page")
    }

    fn load_recommended(&self, opts: PageOptions) -> Result<Page> {
        self.client
            .recommended(opts)
            .context("fetch recommended page")
    }

    fn poll_latest(&self, limit: Option<u32>) -> Result<Vec<Post>> {
        self.client.latest(limit).context("poll latest posts")
    }

    fn search(&self, query: &str, opts: PageOptions) -> Result<Page> {
        self.client.search(query, opts).context("search posts")
    }
}

pub struct ApiInteractionService {
    client: Arc<api::Client>,
}

impl ApiInteractionService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl InteractionService for ApiInteractionService {
    fn like(&self, post_id: &str, on: bool) -> Result<()> {
        if on {
            self.client.like(post_id).context("like post")
        } else {
            self.client.unlike(post_id).context("unlike post")
        }
    }

    fn bookmark(&self, post_id: &str, on: bool) -> Result<()> {
        if on {
            self.client.bookmark(post_id).context("bookmark post")
        } else {
            self.client.unbookmark(post_id).context("remove bookmark")
        }
    }

    fn repost(&self, post_id: &str, on: bool) -> Result<()> {
        if on {
            self.client.repost(post_id).context("repost")
        } else {
            self.client.unrepost(post_id).context("undo repost")
        }
    }

    fn follow(&self, user_id: &str, on: bool) -> Result<()> {
        if on {
            self.client.follow(user_id).context("follow user")
        } else {
            self.client.unfollow(user_id).context("unfollow user")
        }
    }
}
