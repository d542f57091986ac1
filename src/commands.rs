//! CLI command handlers.
//!
//! Each handler performs one store operation and prints a short confirmation.
//! Errors are returned to the caller, which decides whether to exit (one-shot
//! CLI) or keep going (interactive menu).

use std::path::Path;

use chrono::Local;
use log::debug;

use crate::config::PostPreferences;
use crate::posts::PostWriter;
use crate::subjects::{StoreResult, Subject, SubjectPatch, SubjectStore};

pub fn list_subjects(store: &SubjectStore) -> StoreResult<()> {
    print!("{}", format_subjects(&store.read_all()?));
    Ok(())
}

pub fn add_subject(store: &SubjectStore, name: &str, description: &str, keywords: &str) -> StoreResult<()> {
    let subject = store.add(name, description, keywords)?;
    println!("✓ Added subject: {}", subject.name);
    Ok(())
}

pub fn edit_subject(store: &SubjectStore, index: usize, patch: SubjectPatch) -> StoreResult<()> {
    if patch.is_empty() {
        debug!("No fields given for index {index}; rewriting record unchanged");
    }
    store.update(index, patch)?;
    println!("✓ Updated subject at index {index}");
    Ok(())
}

pub fn delete_subject(store: &SubjectStore, index: usize) -> StoreResult<()> {
    let removed = store.delete(index)?;
    println!("✓ Deleted subject: {}", removed.name);
    Ok(())
}

pub fn export_subjects(store: &SubjectStore, target: &Path) -> StoreResult<()> {
    let count = store.export_to_file(target)?;
    println!("✓ Exported {count} subject(s) to {}", target.display());
    Ok(())
}

pub fn import_subjects(store: &SubjectStore, source: &Path) -> StoreResult<()> {
    let count = store.import_from_file(source)?;
    println!("✓ Imported {count} subject(s) into {}", store.display_path());
    Ok(())
}

pub fn generate_post(
    preferences: &PostPreferences,
    title: &str,
    content: &str,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let path = PostWriter::new(preferences).generate(title, content, category, &Local::now())?;
    println!("✓ Created post: {}", path.display());
    Ok(())
}

/// Numbered listing; numbers are 1-based for display.
pub fn format_subjects(subjects: &[Subject]) -> String {
    if subjects.is_empty() {
        return "No post subjects configured.\n".to_string();
    }

    let mut out = String::from("\nConfigured Post Subjects:\n\n");
    for (position, subject) in subjects.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", position + 1, subject.name));
        out.push_str(&format!("   Description: {}\n", subject.description));
        out.push_str(&format!("   Keywords: {}\n\n", subject.keywords.join(", ")));
    }
    out
}
