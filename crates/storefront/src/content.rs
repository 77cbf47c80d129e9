//! Markdown-based static pages and blog posts.
//!
//! Content is loaded from `<content_dir>/pages` and `<content_dir>/blog` at
//! startup. Each file carries YAML front matter followed by a markdown body,
//! which is rendered to HTML once and kept in memory.

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Average reading speed used for the reading time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// Metadata for static pages (shipping, returns, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// Metadata for blog posts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub published_at: NaiveDate,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub draft: bool,
}

/// A rendered page with metadata and HTML content
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub slug: String,
    #[serde(flatten)]
    pub meta: PageMeta,
    pub content_html: String,
}

/// A rendered blog post with metadata and HTML content
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub slug: String,
    #[serde(flatten)]
    pub meta: PostMeta,
    pub content_html: String,
    pub reading_time_minutes: u32,
}

/// A file that could not be loaded.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Content store that holds all loaded content in memory
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
    /// Newest first.
    posts: Arc<Vec<Post>>,
    skipped: Arc<Vec<SkippedFile>>,
}

impl ContentStore {
    /// Load all content from the filesystem.
    ///
    /// Files that fail to parse are logged and skipped; see [`Self::skipped`].
    ///
    /// # Errors
    ///
    /// Returns an error if a content directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let mut skipped = Vec::new();
        let pages = load_dir(&content_dir.join("pages"), &mut skipped, parse_page)?
            .into_iter()
            .map(|page| (page.slug.clone(), page))
            .collect();
        let posts = load_dir(&content_dir.join("blog"), &mut skipped, parse_post)?;

        Ok(Self::from_parts(pages, posts, skipped))
    }

    /// Build a store from already parsed content.
    #[must_use]
    pub fn from_parts(
        pages: HashMap<String, Page>,
        mut posts: Vec<Post>,
        skipped: Vec<SkippedFile>,
    ) -> Self {
        // Newest first; slug breaks ties so the order is stable across loads
        posts.sort_by(|a, b| {
            b.meta
                .published_at
                .cmp(&a.meta.published_at)
                .then_with(|| a.slug.cmp(&b.slug))
        });

        Self {
            pages: Arc::new(pages),
            posts: Arc::new(posts),
            skipped: Arc::new(skipped),
        }
    }

    /// Get a page by slug
    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// Number of loaded pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a published blog post by slug. Drafts are never returned.
    #[must_use]
    pub fn get_post(&self, slug: &str) -> Option<&Post> {
        self.get_published_posts().find(|p| p.slug == slug)
    }

    /// Get all published blog posts (excludes drafts), newest first
    pub fn get_published_posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter().filter(|p| !p.meta.draft)
    }

    /// Number of posts including drafts.
    #[must_use]
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    /// Get posts by tag (case-insensitive)
    pub fn get_posts_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Post> {
        let tag_lower = tag.to_lowercase();
        self.get_published_posts()
            .filter(move |p| p.meta.tags.iter().any(|t| t.to_lowercase() == tag_lower))
    }

    /// Get all unique tags from published posts
    #[must_use]
    pub fn get_all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .get_published_posts()
            .flat_map(|p| p.meta.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Files that were skipped during [`Self::load`].
    #[must_use]
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }
}

/// Parse every `.md` file in `dir`, recording the ones that fail.
fn load_dir<T>(
    dir: &Path,
    skipped: &mut Vec<SkippedFile>,
    parse: fn(&str, &str) -> Result<T, ContentError>,
) -> Result<Vec<T>, ContentError> {
    let mut loaded = Vec::new();

    if !dir.exists() {
        tracing::warn!("Content directory does not exist: {:?}", dir);
        return Ok(loaded);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ContentError::Io(e.to_string()))?;
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    for path in paths {
        let result = std::fs::read_to_string(&path)
            .map_err(|e| ContentError::Io(e.to_string()))
            .and_then(|raw| {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?;
                parse(stem, &raw)
            });

        match result {
            Ok(item) => {
                tracing::info!("Loaded content: {:?}", path);
                loaded.push(item);
            }
            Err(e) => {
                tracing::error!("Failed to load content {:?}: {}", path, e);
                skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(loaded)
}

fn parse_front_matter<T>(raw: &str) -> Result<(T, String), ContentError>
where
    T: serde::de::DeserializeOwned,
{
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<T> = matter
        .parse(raw)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;
    Ok((meta, parsed.content))
}

/// Parse a static page. The slug is the file stem.
///
/// # Errors
///
/// Returns an error if the front matter is missing or malformed.
pub fn parse_page(stem: &str, raw: &str) -> Result<Page, ContentError> {
    let (meta, body) = parse_front_matter::<PageMeta>(raw)?;

    Ok(Page {
        slug: stem.to_string(),
        meta,
        content_html: render_markdown(&body),
    })
}

/// Parse a blog post. A `YYYY-MM-DD-` prefix on the file stem is dropped
/// from the slug.
///
/// # Errors
///
/// Returns an error if the front matter is missing or malformed.
pub fn parse_post(stem: &str, raw: &str) -> Result<Post, ContentError> {
    let (meta, body) = parse_front_matter::<PostMeta>(raw)?;

    Ok(Post {
        slug: post_slug(stem).to_string(),
        meta,
        content_html: render_markdown(&body),
        reading_time_minutes: reading_time_minutes(&body),
    })
}

/// "2025-01-15-my-post" -> "my-post"
fn post_slug(stem: &str) -> &str {
    let dated = stem
        .get(..10)
        .is_some_and(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").is_ok());

    match stem.get(11..) {
        Some(rest) if dated && stem.get(10..11) == Some("-") && !rest.is_empty() => rest,
        _ => stem,
    }
}

/// Whole minutes at [`WORDS_PER_MINUTE`], never less than one.
fn reading_time_minutes(body: &str) -> u32 {
    let words = body.split_whitespace().count();
    u32::try_from(words.div_ceil(WORDS_PER_MINUTE))
        .unwrap_or(u32::MAX)
        .max(1)
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    markdown_to_html(content, &options)
}

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
