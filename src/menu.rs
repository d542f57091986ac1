use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use crate::commands;
use crate::subjects::{StoreError, SubjectPatch, SubjectStore};

const MENU_ITEMS: [&str; 7] = [
    "List all subjects",
    "Add new subject",
    "Edit subject",
    "Delete subject",
    "Export configuration",
    "Import configuration",
    "Exit",
];

/// Interactive loop. Store errors are reported and the loop continues;
/// terminal errors (closed stdin, interrupted prompt) end it.
pub fn run(store: &SubjectStore) -> Result<()> {
    let theme = ColorfulTheme::default();

    loop {
        println!();
        let choice = Select::with_theme(&theme)
            .with_prompt("Post Subjects Admin")
            .items(&MENU_ITEMS)
            .default(0)
            .interact()?;

        let outcome = match choice {
            0 => commands::list_subjects(store).map_err(anyhow::Error::from),
            1 => add(&theme, store),
            2 => edit(&theme, store),
            3 => delete(&theme, store),
            4 => commands::export_subjects(store, &PathBuf::from(backup_file_name(&Local::now())))
                .map_err(anyhow::Error::from),
            5 => import(&theme, store),
            _ => {
                println!("Goodbye!");
                return Ok(());
            }
        };

        if let Err(error) = outcome {
            match error.downcast_ref::<StoreError>() {
                Some(store_error) => println!("Error: {store_error}"),
                None => return Err(error),
            }
        }
    }
}

fn add(theme: &ColorfulTheme, store: &SubjectStore) -> Result<()> {
    let name: String = Input::with_theme(theme).with_prompt("Subject name").interact_text()?;
    let description: String = Input::with_theme(theme).with_prompt("Description").interact_text()?;
    let keywords: String = Input::with_theme(theme)
        .with_prompt("Keywords (comma-separated)")
        .interact_text()?;

    commands::add_subject(store, name.trim(), description.trim(), keywords.trim())?;
    Ok(())
}

fn edit(theme: &ColorfulTheme, store: &SubjectStore) -> Result<()> {
    commands::list_subjects(store)?;
    let index = prompt_index(theme, "Subject number to edit")?;

    let patch = SubjectPatch {
        name: optional(prompt_optional(theme, "New name (leave blank to skip)")?),
        description: optional(prompt_optional(theme, "New description (leave blank to skip)")?),
        keywords: optional(prompt_optional(
            theme,
            "New keywords (comma-separated, leave blank to skip)",
        )?),
    };

    commands::edit_subject(store, index, patch)?;
    Ok(())
}

fn delete(theme: &ColorfulTheme, store: &SubjectStore) -> Result<()> {
    commands::list_subjects(store)?;
    let index = prompt_index(theme, "Subject number to delete")?;

    let confirmed = Confirm::with_theme(theme)
        .with_prompt("Are you sure?")
        .default(false)
        .interact()?;
    if confirmed {
        commands::delete_subject(store, index)?;
    }
    Ok(())
}

fn import(theme: &ColorfulTheme, store: &SubjectStore) -> Result<()> {
    let raw: String = Input::with_theme(theme).with_prompt("Import file path").interact_text()?;
    let path = PathBuf::from(raw.trim());
    if !path.exists() {
        println!("File not found");
        return Ok(());
    }

    commands::import_subjects(store, &path)?;
    Ok(())
}

/// Ask for a 1-based subject number and return the 0-based index.
fn prompt_index(theme: &ColorfulTheme, prompt: &str) -> Result<usize> {
    let number: usize = Input::with_theme(theme)
        .with_prompt(prompt)
        .validate_with(|value: &usize| if *value >= 1 { Ok(()) } else { Err("Numbers start at 1") })
        .interact_text()?;
    Ok(number - 1)
}

fn prompt_optional(theme: &ColorfulTheme, prompt: &str) -> Result<String> {
    let value: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(value)
}

fn optional(answer: String) -> Option<String> {
    let trimmed = answer.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn backup_file_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("subjects_backup_{}.json", now.format("%Y%m%d_%H%M%S"))
}
