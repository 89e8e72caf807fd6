//! Random post retrieval from the imageboard JSON API.

use crate::error::Result;
use crate::text::post_to_text;

use anyhow::Context as _;
use rand::Rng;
use rand::seq::IndexedRandom as _;
use serde::Deserialize;

/// One page of `threads.json`.
#[derive(Debug, Deserialize)]
pub struct ThreadPage {
    #[serde(default)]
    pub threads: Vec<ThreadStub>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadStub {
    pub no: u64,
}

/// Body of `thread/{no}.json`.
#[derive(Debug, Deserialize)]
pub struct Thread {
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub struct Post {
    pub no: u64,
    /// Comment HTML. Image-only posts omit it.
    #[serde(default)]
    pub com: Option<String>,
}

/// Client for the read-only imageboard API.
#[derive(Debug, Clone)]
pub struct Imageboard {
    http: reqwest::Client,
    api_base: String,
    boards: Vec<String>,
}

impl Imageboard {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, boards: Vec<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            boards,
        }
    }

    /// Fetch a random post from a random board and format it for chat.
    pub async fn random_post<R: Rng + Send>(&self, rng: &mut R) -> Result<String> {
        let board = self
            .boards
            .choose(rng)
            .context("no boards configured")?
            .clone();

        let pages: Vec<ThreadPage> = self
            .http
            .get(format!("{}/{board}/threads.json", self.api_base))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let thread_no = pages
            .first()
            .and_then(|page| page.threads.choose(rng))
            .map(|thread| thread.no)
            .with_context(|| format!("/{board}/ has no threads"))?;

        let thread: Thread = self
            .http
            .get(format!("{}/{board}/thread/{thread_no}.json", self.api_base))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = pick_post(&board, thread_no, &thread, rng)
            .with_context(|| format!("thread {thread_no} on /{board}/ has no text posts"))?;
        Ok(text)
    }
}

/// Pick a random post with a body and format it with its permalink.
pub fn pick_post<R: Rng + ?Sized>(
    board: &str,
    thread_no: u64,
    thread: &Thread,
    rng: &mut R,
) -> Option<String> {
    let candidates: Vec<&Post> = thread
        .posts
        .iter()
        .filter(|post| post.com.as_deref().is_some_and(|com| !com.trim().is_empty()))
        .collect();
    let post = candidates.choose(rng)?;

    Some(format_post(board, thread_no, post))
}

pub fn format_post(board: &str, thread_no: u64, post: &Post) -> String {
    let text = post_to_text(post.com.as_deref().unwrap_or_default());
    let permalink = format!(">boards.4chan.org/{board}/thread/{thread_no}#p{}", post.no);

    if text.is_empty() {
        permalink
    } else {
        format!("{text}\n{permalink}")
    }
}
