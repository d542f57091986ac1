use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::subjects::error::StoreError;
use crate::subjects::model::{parse_keywords, NewSubject, Subject, SubjectPatch};

pub type StoreResult<T> = Result<T, StoreError>;

/// File-backed list of subjects.
///
/// Nothing is cached between calls: every operation reads the whole file and
/// every mutation rewrites it. Two writers racing on the same file lose
/// updates (last writer wins).
#[derive(Debug, Clone)]
pub struct SubjectStore {
    path: PathBuf,
    strict: bool,
}

impl SubjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            strict: false,
        }
    }

    /// Mutations refuse to run over a file that fails to parse instead of
    /// treating it as empty and overwriting it.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path for user-facing messages, canonicalized when the file exists.
    pub fn display_path(&self) -> String {
        dunce::canonicalize(self.path())
            .unwrap_or_else(|_| self.path.clone())
            .display()
            .to_string()
    }

    /// Read every subject. A missing or unreadable file yields an empty list.
    /// Use [`SubjectStore::read_all`] where an I/O failure must not look like
    /// an empty store.
    pub fn load(&self) -> Vec<Subject> {
        match self.load_strict() {
            Ok(subjects) => subjects,
            Err(error) => {
                warn!("Treating subject store as empty: {error}");
                Vec::new()
            }
        }
    }

    /// Like [`SubjectStore::load`], but reports a file that fails to parse.
    pub fn load_strict(&self) -> StoreResult<Vec<Subject>> {
        if !self.path.exists() {
            ensure_parent(&self.path)?;
            return Ok(Vec::new());
        }

        let raw = fs::read(&self.path).map_err(|error| StoreError::io(&self.path, error))?;
        serde_json::from_slice(&raw).map_err(|source| StoreError::CorruptConfig {
            path: self.path.clone(),
            source,
        })
    }

    /// Read every subject, reporting I/O failures. A file that fails to parse
    /// reads as empty unless the store is strict.
    pub fn read_all(&self) -> StoreResult<Vec<Subject>> {
        match self.load_strict() {
            Err(error @ StoreError::CorruptConfig { .. }) if !self.strict => {
                warn!("Treating subject store as empty: {error}");
                Ok(Vec::new())
            }
            result => result,
        }
    }

    pub fn save(&self, subjects: &[Subject]) -> StoreResult<()> {
        write_subjects(&self.path, subjects)?;
        info!("Saved {} subject(s) to {}", subjects.len(), self.path.display());
        Ok(())
    }

    pub fn add(&self, name: &str, description: &str, keywords_raw: &str) -> StoreResult<Subject> {
        let mut subjects = self.read_all()?;

        if subjects.iter().any(|subject| subject.matches_name(name)) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }

        let subject = Subject {
            id: Some(Uuid::new_v4().to_string()),
            name: name.to_string(),
            description: description.to_string(),
            keywords: parse_keywords(keywords_raw),
        };

        subjects.push(subject.clone());
        self.save(&subjects)?;
        Ok(subject)
    }

    /// Creation entry point for front ends that receive loosely shaped input.
    pub fn add_new(&self, input: NewSubject) -> StoreResult<Subject> {
        let missing: Vec<&str> = [
            ("name", input.name.is_none()),
            ("description", input.description.is_none()),
            ("keywords", input.keywords.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();

        match (input.name, input.description, input.keywords) {
            (Some(name), Some(description), Some(keywords)) => self.add(&name, &description, &keywords),
            _ => Err(StoreError::MalformedInput(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }

    /// Apply a partial update. Name uniqueness is not re-checked here, so an
    /// update can introduce a duplicate name.
    pub fn update(&self, index: usize, patch: SubjectPatch) -> StoreResult<Subject> {
        let mut subjects = self.read_all()?;
        let updated = patch_at(&mut subjects, index, patch)?;
        self.save(&subjects)?;
        Ok(updated)
    }

    /// Remove the record at `index`; later records shift down by one.
    pub fn delete(&self, index: usize) -> StoreResult<Subject> {
        let mut subjects = self.read_all()?;
        let removed = remove_at(&mut subjects, index)?;
        self.save(&subjects)?;
        Ok(removed)
    }

    pub fn position_of(&self, id: &str) -> StoreResult<usize> {
        index_of(&self.read_all()?, id)
    }

    pub fn update_by_id(&self, id: &str, patch: SubjectPatch) -> StoreResult<Subject> {
        let mut subjects = self.read_all()?;
        let index = index_of(&subjects, id)?;
        let updated = patch_at(&mut subjects, index, patch)?;
        self.save(&subjects)?;
        Ok(updated)
    }

    pub fn delete_by_id(&self, id: &str) -> StoreResult<Subject> {
        let mut subjects = self.read_all()?;
        let index = index_of(&subjects, id)?;
        let removed = remove_at(&mut subjects, index)?;
        self.save(&subjects)?;
        Ok(removed)
    }

    pub fn export_all(&self) -> Vec<Subject> {
        self.load()
    }

    /// Replace the whole store with `payload`, which must be a JSON array of
    /// subject records. Nothing is merged; ids are kept as given.
    pub fn import_all(&self, payload: Value) -> StoreResult<usize> {
        let Value::Array(items) = payload else {
            return Err(StoreError::InvalidFormat("Expected JSON array".into()));
        };

        let subjects = items
            .into_iter()
            .enumerate()
            .map(|(position, item)| {
                serde_json::from_value::<Subject>(item)
                    .map_err(|error| StoreError::InvalidFormat(format!("entry {position}: {error}")))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        self.save(&subjects)?;
        info!("Imported {} subject(s)", subjects.len());
        Ok(subjects.len())
    }

    pub fn export_to_file(&self, target: &Path) -> StoreResult<usize> {
        let subjects = self.read_all()?;
        write_subjects(target, &subjects)?;
        info!("Exported {} subject(s) to {}", subjects.len(), target.display());
        Ok(subjects.len())
    }

    pub fn import_from_file(&self, source: &Path) -> StoreResult<usize> {
        let raw = fs::read_to_string(source).map_err(|error| StoreError::io(source, error))?;
        let payload: Value = serde_json::from_str(&raw)
            .map_err(|error| StoreError::InvalidFormat(format!("{source:?} is not valid JSON: {error}")))?;
        self.import_all(payload)
    }
}

fn index_of(subjects: &[Subject], id: &str) -> StoreResult<usize> {
    subjects
        .iter()
        .position(|subject| subject.id.as_deref() == Some(id))
        .ok_or_else(|| StoreError::UnknownId(id.to_string()))
}

fn patch_at(subjects: &mut [Subject], index: usize, patch: SubjectPatch) -> StoreResult<Subject> {
    let len = subjects.len();
    let subject = subjects
        .get_mut(index)
        .ok_or(StoreError::InvalidIndex { index, len })?;
    patch.apply(subject);
    Ok(subject.clone())
}

fn remove_at(subjects: &mut Vec<Subject>, index: usize) -> StoreResult<Subject> {
    if index >= subjects.len() {
        return Err(StoreError::InvalidIndex {
            index,
            len: subjects.len(),
        });
    }
    Ok(subjects.remove(index))
}

fn ensure_parent(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|error| StoreError::io(dir, error))
        }
        _ => Ok(()),
    }
}

fn write_subjects(path: &Path, subjects: &[Subject]) -> StoreResult<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(subjects)?;
    fs::write(path, json).map_err(|error| StoreError::io(path, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> SubjectStore {
        SubjectStore::new(temp.path().join("_config").join("post_subjects.json"))
    }

    fn seeded(temp: &TempDir, names: &[&str]) -> SubjectStore {
        let store = store_in(temp);
        for name in names {
            store
                .add(name, &format!("{name} posts"), "one, two")
                .unwrap();
        }
        store
    }

    fn names(subjects: &[Subject]) -> Vec<String> {
        subjects.iter().map(|subject| subject.name.clone()).collect()
    }

    #[test]
    fn test_load_missing_file_creates_directory() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        assert!(store.load().is_empty());
        assert!(temp.path().join("_config").is_dir());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_load_invalid_json_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "\"not json\"").unwrap();

        assert!(store.load().is_empty());
        assert!(matches!(store.load_strict(), Err(StoreError::CorruptConfig { .. })));
    }

    #[test]
    fn test_non_utf8_file_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), [0xff, 0xfe, b'[', b']']).unwrap();

        assert!(matches!(store.load_strict(), Err(StoreError::CorruptConfig { .. })));
        assert!(store.read_all().unwrap().is_empty());
        assert!(matches!(
            store.clone().with_strict(true).read_all(),
            Err(StoreError::CorruptConfig { .. })
        ));
    }

    #[test]
    fn test_unreadable_store_is_not_overwritten() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        // A directory at the store path exists but cannot be read as a file.
        fs::create_dir_all(store.path()).unwrap();

        assert!(matches!(store.read_all(), Err(StoreError::Io { .. })));
        assert!(matches!(store.add("Tech", "Technology posts", "ai"), Err(StoreError::Io { .. })));
        assert!(matches!(store.delete(0), Err(StoreError::Io { .. })));
        assert!(matches!(store.import_all(json!([])), Err(StoreError::Io { .. })));
        assert!(store.path().is_dir());
    }

    #[test]
    fn test_add_to_empty_store() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let created = store.add("Tech", "Technology posts", "AI, Space, Gadgets").unwrap();
        assert_eq!(created.name, "Tech");
        assert_eq!(created.description, "Technology posts");
        assert_eq!(created.keywords, vec!["ai", "space", "gadgets"]);
        assert!(created.id.is_some());

        let stored = store.load();
        assert_eq!(stored, vec![created]);
    }

    #[test]
    fn test_save_writes_two_space_indentation() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store
            .save(&[Subject {
                id: None,
                name: "Tech".into(),
                description: "Technology posts".into(),
                keywords: vec!["ai".into()],
            }])
            .unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"name\": \"Tech\""));
    }

    #[test]
    fn test_add_duplicate_name_ignores_case() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech"]);
        let before = fs::read_to_string(store.path()).unwrap();

        let result = store.add("tech", "Other", "x");
        assert!(matches!(result, Err(StoreError::DuplicateName(name)) if name == "tech"));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_add_new_reports_missing_fields() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let result = store.add_new(NewSubject {
            name: Some("Tech".into()),
            ..Default::default()
        });
        match result {
            Err(StoreError::MalformedInput(message)) => {
                assert!(message.contains("description"));
                assert!(message.contains("keywords"));
                assert!(!message.contains("name"));
            }
            other => panic!("expected malformed input, got {other:?}"),
        }
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_add_new_with_all_fields() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let created = store
            .add_new(NewSubject {
                name: Some("Science".into()),
                description: Some("Science posts".into()),
                keywords: Some("Physics,Biology".into()),
            })
            .unwrap();
        assert_eq!(created.keywords, vec!["physics", "biology"]);
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_update_empty_patch_rewrites_file() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"[{"name":"Tech","description":"Technology posts","keywords":["ai"]}]"#,
        )
        .unwrap();
        let before = store.load();

        let updated = store.update(0, SubjectPatch::default()).unwrap();
        assert_eq!(updated, before[0]);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"name\": \"Tech\""));
        assert_eq!(store.load(), before);
    }

    #[test]
    fn test_update_partial_fields() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech"]);

        let updated = store
            .update(
                0,
                SubjectPatch {
                    keywords: Some("Rust, WASM".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Tech");
        assert_eq!(updated.description, "Tech posts");
        assert_eq!(updated.keywords, vec!["rust", "wasm"]);
        assert_eq!(store.load()[0], updated);
    }

    #[test]
    fn test_update_allows_duplicate_name() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech", "Science"]);

        let updated = store
            .update(
                1,
                SubjectPatch {
                    name: Some("TECH".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "TECH");
        assert_eq!(names(&store.load()), vec!["Tech", "TECH"]);
    }

    #[test]
    fn test_update_invalid_index() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech"]);

        let result = store.update(1, SubjectPatch::default());
        assert!(matches!(result, Err(StoreError::InvalidIndex { index: 1, len: 1 })));
    }

    #[test]
    fn test_delete_same_index_twice_removes_shifted_record() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech", "Science", "Travel"]);

        let first = store.delete(0).unwrap();
        let second = store.delete(0).unwrap();
        assert_eq!(first.name, "Tech");
        assert_eq!(second.name, "Science");
        assert_eq!(names(&store.load()), vec!["Travel"]);
    }

    #[test]
    fn test_delete_out_of_range_leaves_store() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech", "Science", "Travel"]);
        let before = store.load();

        let result = store.delete(5);
        assert!(matches!(result, Err(StoreError::InvalidIndex { index: 5, len: 3 })));
        assert_eq!(store.load(), before);
    }

    #[test]
    fn test_id_lookups_follow_record_after_shift() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech", "Science", "Travel"]);
        let travel_id = store.load()[2].id.clone().unwrap();

        store.delete(0).unwrap();
        assert_eq!(store.position_of(&travel_id).unwrap(), 1);

        let updated = store
            .update_by_id(
                &travel_id,
                SubjectPatch {
                    description: Some("Trips".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Travel");
        assert_eq!(updated.description, "Trips");

        let removed = store.delete_by_id(&travel_id).unwrap();
        assert_eq!(removed.name, "Travel");
        assert!(matches!(store.delete_by_id(&travel_id), Err(StoreError::UnknownId(_))));

        let before = fs::read_to_string(store.path()).unwrap();
        let result = store.update_by_id(&travel_id, SubjectPatch::default());
        assert!(matches!(result, Err(StoreError::UnknownId(_))));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_import_export_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech", "Science"]);
        let before = store.export_all();

        let payload = serde_json::to_value(store.export_all()).unwrap();
        assert_eq!(store.import_all(payload).unwrap(), 2);
        assert_eq!(store.export_all(), before);
    }

    #[test]
    fn test_import_replaces_store() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech", "Science"]);

        let count = store
            .import_all(json!([{"name": "Food", "description": "Recipes", "keywords": ["cooking"]}]))
            .unwrap();
        assert_eq!(count, 1);

        let stored = store.load();
        assert_eq!(names(&stored), vec!["Food"]);
        assert!(stored[0].id.is_none());
    }

    #[test]
    fn test_import_rejects_non_array() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech"]);
        let before = store.load();

        let result = store.import_all(json!({"name": "Food"}));
        assert!(matches!(result, Err(StoreError::InvalidFormat(_))));
        let result = store.import_all(json!(["Food", 3]));
        assert!(matches!(result, Err(StoreError::InvalidFormat(_))));
        assert_eq!(store.load(), before);
    }

    #[test]
    fn test_strict_store_refuses_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp).with_strict(true);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();

        let result = store.add("Tech", "Technology posts", "ai");
        assert!(matches!(result, Err(StoreError::CorruptConfig { .. })));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "not json");
    }

    #[test]
    fn test_lossy_store_overwrites_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();

        store.add("Tech", "Technology posts", "ai").unwrap();
        assert_eq!(names(&store.load()), vec!["Tech"]);
    }

    #[test]
    fn test_export_and_import_files() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp, &["Tech", "Science"]);
        let backup = temp.path().join("backup.json");

        assert_eq!(store.export_to_file(&backup).unwrap(), 2);

        let other = SubjectStore::new(temp.path().join("other.json"));
        assert_eq!(other.import_from_file(&backup).unwrap(), 2);
        assert_eq!(other.load(), store.load());
    }

    #[test]
    fn test_import_from_file_rejects_invalid_json() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let source = temp.path().join("broken.json");
        fs::write(&source, "{ nope").unwrap();

        assert!(matches!(store.import_from_file(&source), Err(StoreError::InvalidFormat(_))));
        assert!(matches!(
            store.import_from_file(&temp.path().join("missing.json")),
            Err(StoreError::Io { .. })
        ));
    }
}
