//! Blog handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::content::Post;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Blog listing entry (no body).
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: NaiveDate,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub reading_time_minutes: u32,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.meta.title.clone(),
            description: post.meta.description.clone(),
            author: post.meta.author.clone(),
            published_at: post.meta.published_at,
            featured_image: post.meta.featured_image.clone(),
            tags: post.meta.tags.clone(),
            reading_time_minutes: post.reading_time_minutes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BlogQuery {
    pub tag: Option<String>,
}

/// Published posts, newest first, optionally filtered by tag.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BlogQuery>,
) -> Json<Vec<PostSummary>> {
    let content = state.content();
    let posts = match query.tag.as_deref().filter(|t| !t.is_empty()) {
        Some(tag) => content.get_posts_by_tag(tag).map(PostSummary::from).collect(),
        None => content.get_published_posts().map(PostSummary::from).collect(),
    };
    Json(posts)
}

/// All tags used by published posts.
#[instrument(skip(state))]
pub async fn tags(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.content().get_all_tags())
}

/// A single published post.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Post>> {
    state
        .content()
        .get_post(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("post {slug}")))
}
