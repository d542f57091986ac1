//! Front matter for generated posts
//!
//! Posts are Markdown files opened by a YAML block between `---` delimiters.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::posts::constants::{DATE_FORMAT, POST_LAYOUT};

/// Metadata header written at the top of every post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostFrontmatter {
    pub layout: String,
    pub title: String,
    pub date: String,
    pub categories: Vec<String>,
    pub author: String,
    pub excerpt: String,
}

impl PostFrontmatter {
    pub fn new<Tz>(title: &str, date: &DateTime<Tz>, category: &str, author: &str, excerpt: String) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            layout: POST_LAYOUT.to_string(),
            title: title.to_string(),
            date: date.format(DATE_FORMAT).to_string(),
            categories: vec![category.to_string()],
            author: author.to_string(),
            excerpt,
        }
    }
}

/// Render front matter followed by the post body.
pub fn render_post(frontmatter: &PostFrontmatter, content: &str) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    // older serde_yaml releases emit a leading document marker
    let yaml = yaml.strip_prefix("---\n").unwrap_or(&yaml);
    Ok(format!("---\n{yaml}---\n\n{content}\n"))
}

/// First `limit` characters of the content, with an ellipsis when truncated.
pub fn excerpt(content: &str, limit: usize) -> String {
    if content.chars().count() > limit {
        let head: String = content.chars().take(limit).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}
