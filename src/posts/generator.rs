use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use log::info;

use crate::config::PostPreferences;
use crate::posts::constants::FILE_DATE_FORMAT;
use crate::posts::frontmatter::{excerpt, render_post, PostFrontmatter};

pub struct PostWriter<'a> {
    preferences: &'a PostPreferences,
}

impl<'a> PostWriter<'a> {
    pub fn new(preferences: &'a PostPreferences) -> Self {
        Self { preferences }
    }

    /// Write `<dir>/<date>-<slug>.md`, replacing any existing file of that name.
    pub fn generate<Tz>(
        &self,
        title: &str,
        content: &str,
        category: Option<&str>,
        now: &DateTime<Tz>,
    ) -> Result<PathBuf>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let category = category.unwrap_or(self.preferences.default_category.as_str());
        let frontmatter = PostFrontmatter::new(
            title,
            now,
            category,
            &self.preferences.author,
            excerpt(content, self.preferences.excerpt_length),
        );

        let dir = &self.preferences.dir;
        fs::create_dir_all(dir).with_context(|| format!("Unable to create {dir:?}"))?;

        let path = dir.join(post_file_name(title, now));
        let rendered = render_post(&frontmatter, content).context("Failed to render front matter")?;
        fs::write(&path, rendered).with_context(|| format!("Unable to write {path:?}"))?;

        info!("Created post {}", path.display());
        Ok(path)
    }
}

pub fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "-").replace('/', "-")
}

fn post_file_name<Tz>(title: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}-{}.md", now.format(FILE_DATE_FORMAT), slugify(title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use std::path::Path;
    use tempfile::TempDir;

    fn preferences(temp: &TempDir) -> PostPreferences {
        PostPreferences {
            dir: temp.path().join("_posts"),
            ..Default::default()
        }
    }

    fn fixed_now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 11, 2, 18, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Weekly Build/Deploy Notes"), "weekly-build-deploy-notes");
    }

    fn read_frontmatter(path: &Path) -> (PostFrontmatter, String) {
        let written = fs::read_to_string(path).unwrap();
        let rest = written.strip_prefix("---\n").unwrap();
        let (yaml, body) = rest.split_once("\n---\n\n").unwrap();
        (serde_yaml::from_str(yaml).unwrap(), body.to_string())
    }

    #[test]
    fn test_generate_post_file() {
        let temp = TempDir::new().unwrap();
        let prefs = preferences(&temp);
        let writer = PostWriter::new(&prefs);

        let path = writer
            .generate("Release Notes", "Shipped the thing.", None, &fixed_now())
            .unwrap();

        assert_eq!(path, prefs.dir.join("2024-11-02-release-notes.md"));
        let (fm, body) = read_frontmatter(&path);
        assert_eq!(fm.layout, "post");
        assert_eq!(fm.title, "Release Notes");
        assert_eq!(fm.date, "2024-11-02 18:05:00 +0200");
        assert_eq!(fm.categories, vec!["daily-update"]);
        assert_eq!(fm.author, "Automated Bot");
        assert_eq!(fm.excerpt, "Shipped the thing.");
        assert_eq!(body, "Shipped the thing.\n");
    }

    #[test]
    fn test_generate_post_custom_category_and_long_excerpt() {
        let temp = TempDir::new().unwrap();
        let prefs = preferences(&temp);
        let writer = PostWriter::new(&prefs);
        let content = "x".repeat(250);

        let path = writer
            .generate("Long", &content, Some("research"), &fixed_now())
            .unwrap();

        let (fm, _) = read_frontmatter(&path);
        assert_eq!(fm.categories, vec!["research"]);
        assert_eq!(fm.excerpt, format!("{}...", "x".repeat(200)));
    }
}
