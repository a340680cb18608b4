use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.finch.example/";

pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Result<String>;
}

/// Static bearer token, e.g. one read from the config file.
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> Result<String> {
        if self.0.trim().is_empty() {
            bail!("api: no access token configured");
        }
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: Option<String>,
    pub http_client: Option<HttpClient>,
}

/// Cursor into a paginated feed. The backend hands out either an opaque
/// token or a numeric offset depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageCursor {
    Token(String),
    Offset(u64),
}

impl PageCursor {
    fn as_param(&self) -> String {
        match self {
            PageCursor::Token(token) => token.clone(),
            PageCursor::Offset(offset) => offset.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub cursor: Option<PageCursor>,
    pub limit: Option<u32>,
}

impl PageOptions {
    fn into_params(self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(cursor) = self.cursor {
            params.push(("cursor".into(), cursor.as_param()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".into(), limit.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreview {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// A single post as delivered by the feed endpoints. `reply_parent` and
/// `repost_parent` are denormalized snapshots inlined by the backend for
/// rendering context; they are shallow (one level, no grandparents) and
/// may describe posts that never appear elsewhere in the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: UserPreview,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub reply_parent: Option<Box<Post>>,
    #[serde(default)]
    pub repost_parent: Option<Box<Post>>,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub repost_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub bookmark_count: i64,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub bookmarked: bool,
    #[serde(default)]
    pub reposted: bool,
}

/// One unit of pagination. `next: None` signals end of stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub results: Vec<Post>,
    #[serde(default)]
    pub next: Option<PageCursor>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("api: unauthorized")]
    Unauthorized,
    #[error("api: forbidden")]
    Forbidden,
    #[error("api: rate limited: {0}")]
    RateLimited(String),
    #[error("api: error {status}: {body}")]
    Status { status: u16, body: String },
}

pub struct Client {
    token_provider: Arc<dyn TokenProvider>,
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Client {
    pub fn new(token_provider: Arc<dyn TokenProvider>, config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("api: client user agent required");
        }
        let base = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base)?;
        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(Duration::from_secs(20))
                .build()?,
        };

        Ok(Client {
            token_provider,
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    /// Home timeline, reverse-chronological.
    pub fn timeline(&self, opts: PageOptions) -> Result<Page> {
        self.fetch_page("/api/posts", opts)
    }

    /// Recommended timeline; result order is the server's rank order.
    pub fn recommended(&self, opts: PageOptions) -> Result<Page> {
        self.fetch_page("/api/posts/recommended", opts)
    }

    /// Most recent posts, flat and unpaginated, for new-post polling.
    pub fn latest(&self, limit: Option<u32>) -> Result<Vec<Post>> {
        let mut params = Vec::new();
        if let Some(limit) = limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        let resp = self.request(Method::GET, "/api/posts/latest", &params)?;
        let posts: Vec<Post> = resp.json().context("api: decode latest posts")?;
        Ok(posts)
    }

    pub fn search(&self, query: &str, opts: PageOptions) -> Result<Page> {
        if query.trim().is_empty() {
            bail!("api: search query is required");
        }
        let mut params = opts.into_params();
        params.push(("q".to_string(), query.to_string()));
        let resp = self.request(Method::GET, "/api/search", &params)?;
        let page: Page = resp.json().context("api: decode search page")?;
        Ok(page)
    }

    pub fn like(&self, post_id: &str) -> Result<()> {
        self.toggle(Method::POST, &format!("/api/posts/{}/like", post_id))
    }

    pub fn unlike(&self, post_id: &str) -> Result<()> {
        self.toggle(Method::DELETE, &format!("/api/posts/{}/like", post_id))
    }

    pub fn bookmark(&self, post_id: &str) -> Result<()> {
        self.toggle(Method::POST, &format!("/api/posts/{}/bookmark", post_id))
    }

    pub fn unbookmark(&self, post_id: &str) -> Result<()> {
        self.toggle(Method::DELETE, &format!("/api/posts/{}/bookmark", post_id))
    }

    pub fn repost(&self, post_id: &str) -> Result<()> {
        self.toggle(Method::POST, &format!("/api/posts/{}/repost", post_id))
    }

    pub fn unrepost(&self, post_id: &str) -> Result<()> {
        self.toggle(Method::DELETE, &format!("/api/posts/{}/repost", post_id))
    }

    pub fn follow(&self, user_id: &str) -> Result<()> {
        self.toggle(Method::POST, &format!("/api/users/{}/follow", user_id))
    }

    pub fn unfollow(&self, user_id: &str) -> Result<()> {
        self.toggle(Method::DELETE, &format!("/api/users/{}/follow", user_id))
    }

    fn toggle(&self, method: Method, path: &str) -> Result<()> {
        self.request(method, path, &[])?;
        Ok(())
    }

    fn fetch_page(&self, path: &str, opts: PageOptions) -> Result<Page> {
        let params = opts.into_params();
        let resp = self.request(Method::GET, path, &params)?;
        let page: Page = resp.json().with_context(|| format!("api: decode {path}"))?;
        Ok(page)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Response> {
        let token = self.token_provider.token()?;
        let mut url = self.base_url.join(path)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }

        let resp = self
            .http
            .request(method, url)
            .header(USER_AGENT, self.user_agent.clone())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()?;

        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            let err = match status.as_u16() {
                401 => ApiError::Unauthorized,
                403 => ApiError::Forbidden,
                429 => ApiError::RateLimited(body),
                code => ApiError::Status { status: code, body },
            };
            Err(err.into())
        }
    }
}
