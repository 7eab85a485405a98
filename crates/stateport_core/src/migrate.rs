use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use similar::TextDiff;
use tracing::{debug, info, warn};

use crate::config::MigrationSettings;
use crate::grammar::Patterns;
use crate::rewrite::migrate_source;
use crate::store::{SourceStore, normalize_separators};

#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    pub dry_run: bool,
    pub recursive: bool,
    /// Attach a unified diff to every touched file.
    pub include_diff: bool,
}

/// Report returned after a batch run. Files appear in enumeration order.
#[derive(Debug, Clone, Serialize)]
pub struct MigrateReport {
    pub directory: String,
    pub dry_run: bool,
    pub scanned_files: usize,
    pub touched: Vec<TouchedFile>,
}

impl MigrateReport {
    pub fn touched_file_names(&self) -> Vec<&str> {
        self.touched.iter().map(|file| file.name.as_str()).collect()
    }

    pub fn touched_count(&self) -> usize {
        self.touched.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TouchedFile {
    pub name: String,
    pub keys: Vec<String>,
    pub inserted_import: bool,
    pub pruned_import: bool,
    pub origin_still_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// Migrate every component file in `directory`.
///
/// Files are handled one at a time and independently. A read or write
/// failure aborts the run; files already written stay written.
pub fn migrate_directory(
    store: &dyn SourceStore,
    directory: &Path,
    settings: &MigrationSettings,
    options: &MigrateOptions,
) -> Result<MigrateReport> {
    let patterns = Patterns::new(settings.clone())?;
    let entries = store.list(directory, options.recursive)?;

    let mut scanned_files = 0usize;
    let mut touched = Vec::new();

    for entry in entries {
        if !entry.is_file || !settings.matches_extension(&entry.name) {
            continue;
        }
        scanned_files += 1;

        let original = store.read(&entry.path)?;
        if !patterns.origin_call().is_match(&original) {
            debug!(file = %entry.name, "no {} call, skipping", settings.origin_hook);
            continue;
        }

        let migration = migrate_source(&original, &patterns);
        if migration.text == original {
            debug!(file = %entry.name, "no migratable declarations");
            continue;
        }

        if !options.dry_run {
            store.write(&entry.path, &migration.text)?;
        }
        info!(
            file = %entry.name,
            declarations = migration.keys.len(),
            dry_run = options.dry_run,
            "migrated"
        );
        if migration.origin_still_used {
            warn!(
                file = %entry.name,
                "{} calls remain with non-literal defaults",
                settings.origin_hook
            );
        }

        let diff = options
            .include_diff
            .then(|| render_diff(&entry.name, &original, &migration.text));
        touched.push(TouchedFile {
            name: entry.name,
            keys: migration.keys,
            inserted_import: migration.inserted_import,
            pruned_import: migration.pruned_import,
            origin_still_used: migration.origin_still_used,
            diff,
        });
    }

    Ok(MigrateReport {
        directory: normalize_separators(&directory.to_string_lossy()),
        dry_run: options.dry_run,
        scanned_files,
        touched,
    })
}

pub fn render_diff(name: &str, before: &str, after: &str) -> String {
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;

    use anyhow::{Context, bail};
    use tempfile::tempdir;

    use super::*;
    use crate::store::{FsStore, SourceEntry};

    /// In-memory store; `order` controls enumeration order.
    #[derive(Default)]
    struct MemoryStore {
        files: RefCell<BTreeMap<PathBuf, String>>,
        order: Vec<PathBuf>,
        unreadable: BTreeSet<PathBuf>,
        unwritable: BTreeSet<PathBuf>,
        writes: RefCell<Vec<PathBuf>>,
    }

    impl MemoryStore {
        fn with_files(files: &[(&str, &str)]) -> Self {
            let mut store = MemoryStore::default();
            for (name, text) in files {
                let path = PathBuf::from("/src").join(name);
                store.order.push(path.clone());
                store.files.borrow_mut().insert(path, text.to_string());
            }
            store
        }

        fn text(&self, name: &str) -> String {
            self.files.borrow()[&PathBuf::from("/src").join(name)].clone()
        }
    }

    impl SourceStore for MemoryStore {
        fn list(&self, directory: &Path, _recursive: bool) -> Result<Vec<SourceEntry>> {
            Ok(self
                .order
                .iter()
                .map(|path| SourceEntry {
                    path: path.clone(),
                    name: path
                        .strip_prefix(directory)
                        .unwrap_or(path)
                        .to_string_lossy()
                        .to_string(),
                    is_file: true,
                })
                .collect())
        }

        fn read(&self, path: &Path) -> Result<String> {
            if self.unreadable.contains(path) {
                bail!("failed to read {}", path.display());
            }
            self.files
                .borrow()
                .get(path)
                .cloned()
                .with_context(|| format!("failed to read {}", path.display()))
        }

        fn write(&self, path: &Path, text: &str) -> Result<()> {
            if self.unwritable.contains(path) {
                bail!("failed to write {}", path.display());
            }
            self.writes.borrow_mut().push(path.to_path_buf());
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), text.to_string());
            Ok(())
        }
    }

    const COUNTER: &str = "import React, { useState, useEffect } from \"react\";\n\nexport function Counter() {\n  const [count, setCount] = useState(5);\n  useEffect(() => {}, []);\n  return <button onClick={() => setCount(count + 1)}>{count}</button>;\n}\n";
    const PLAIN: &str = "export const Label = () => <span>label</span>;\n";
    const COMPUTED: &str = "import { useState } from \"react\";\nexport function A() {\n  const [v, setV] = useState(someFunction());\n  return v;\n}\n";

    fn run(store: &MemoryStore, options: &MigrateOptions) -> MigrateReport {
        migrate_directory(
            store,
            Path::new("/src"),
            &MigrationSettings::default(),
            options,
        )
        .expect("migrate")
    }

    #[test]
    fn migrates_matching_files_and_reports_them() {
        let store = MemoryStore::with_files(&[
            ("Counter.tsx", COUNTER),
            ("Label.tsx", PLAIN),
            ("notes.md", "const [a, setA] = useState(1);"),
        ]);
        let report = run(&store, &MigrateOptions::default());

        assert_eq!(report.touched_file_names(), vec!["Counter.tsx"]);
        assert_eq!(report.scanned_files, 2);
        assert_eq!(report.touched[0].keys, vec!["count"]);
        assert!(report.touched[0].inserted_import);
        assert!(report.touched[0].pruned_import);
        assert_eq!(
            store.text("Counter.tsx"),
            "import React, { useEffect } from \"react\";\nimport { useUrlState } from \"@/hooks/use-url-state\";\n\nexport function Counter() {\n  const [count, setCount] = useUrlState(\"count\", 5);\n  useEffect(() => {}, []);\n  return <button onClick={() => setCount(count + 1)}>{count}</button>;\n}\n"
        );
        assert_eq!(store.text("Label.tsx"), PLAIN);
        assert_eq!(store.text("notes.md"), "const [a, setA] = useState(1);");
        assert_eq!(store.writes.borrow().len(), 1);
    }

    #[test]
    fn second_run_touches_nothing() {
        let store = MemoryStore::with_files(&[("Counter.tsx", COUNTER), ("A.tsx", COMPUTED)]);
        let first = run(&store, &MigrateOptions::default());
        assert_eq!(first.touched_count(), 1);
        let after_first = store.text("Counter.tsx");

        let second = run(&store, &MigrateOptions::default());
        assert_eq!(second.touched_count(), 0);
        assert_eq!(store.text("Counter.tsx"), after_first);
        assert_eq!(store.writes.borrow().len(), 1);
    }

    #[test]
    fn unsupported_defaults_are_never_written() {
        let store = MemoryStore::with_files(&[("A.tsx", COMPUTED)]);
        let report = run(&store, &MigrateOptions::default());
        assert_eq!(report.touched_count(), 0);
        assert_eq!(store.text("A.tsx"), COMPUTED);
        assert!(store.writes.borrow().is_empty());
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let store = MemoryStore::with_files(&[("Counter.tsx", COUNTER)]);
        let report = run(
            &store,
            &MigrateOptions {
                dry_run: true,
                include_diff: true,
                ..MigrateOptions::default()
            },
        );
        assert!(report.dry_run);
        assert_eq!(report.touched_file_names(), vec!["Counter.tsx"]);
        assert_eq!(store.text("Counter.tsx"), COUNTER);
        assert!(store.writes.borrow().is_empty());

        let diff = report.touched[0].diff.as_deref().expect("diff");
        assert!(diff.contains("--- a/Counter.tsx"));
        assert!(diff.contains("+++ b/Counter.tsx"));
        assert!(diff.contains("-  const [count, setCount] = useState(5);"));
        assert!(diff.contains("+  const [count, setCount] = useUrlState(\"count\", 5);"));
    }

    #[test]
    fn enumeration_order_only_changes_report_order() {
        let second_counter = COUNTER.replace("count", "total").replace("Count", "Total");
        let forward = MemoryStore::with_files(&[
            ("A.tsx", COUNTER),
            ("B.tsx", second_counter.as_str()),
        ]);
        let backward = MemoryStore::with_files(&[
            ("B.tsx", second_counter.as_str()),
            ("A.tsx", COUNTER),
        ]);

        let forward_report = run(&forward, &MigrateOptions::default());
        let backward_report = run(&backward, &MigrateOptions::default());

        assert_eq!(forward_report.touched_file_names(), vec!["A.tsx", "B.tsx"]);
        assert_eq!(backward_report.touched_file_names(), vec!["B.tsx", "A.tsx"]);
        assert_eq!(forward.text("A.tsx"), backward.text("A.tsx"));
        assert_eq!(forward.text("B.tsx"), backward.text("B.tsx"));
    }

    #[test]
    fn read_failure_aborts_run() {
        let mut store = MemoryStore::with_files(&[("A.tsx", COUNTER), ("B.tsx", COUNTER)]);
        store.unreadable.insert(PathBuf::from("/src/B.tsx"));
        let error = migrate_directory(
            &store,
            Path::new("/src"),
            &MigrationSettings::default(),
            &MigrateOptions::default(),
        )
        .expect_err("must fail");
        assert!(error.to_string().contains("failed to read"));
        assert!(error.to_string().contains("B.tsx"));
        // earlier writes are not rolled back
        assert_ne!(store.text("A.tsx"), COUNTER);
    }

    #[test]
    fn write_failure_aborts_run() {
        let mut store = MemoryStore::with_files(&[("A.tsx", COUNTER), ("B.tsx", COUNTER)]);
        store.unwritable.insert(PathBuf::from("/src/A.tsx"));
        let error = migrate_directory(
            &store,
            Path::new("/src"),
            &MigrationSettings::default(),
            &MigrateOptions::default(),
        )
        .expect_err("must fail");
        assert!(error.to_string().contains("failed to write"));
        assert!(error.to_string().contains("A.tsx"));
        assert_eq!(store.text("B.tsx"), COUNTER);
    }

    #[test]
    fn migrates_real_directory_tree() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        std::fs::create_dir_all(root.join("widgets")).expect("create widgets");
        std::fs::write(root.join("Counter.tsx"), COUNTER).expect("write counter");
        std::fs::write(root.join("widgets/Zoom.tsx"), "const [zoom, setZoom] = useState(.75);\n")
            .expect("write zoom");

        let flat = migrate_directory(
            &FsStore,
            root,
            &MigrationSettings::default(),
            &MigrateOptions::default(),
        )
        .expect("flat run");
        assert_eq!(flat.touched_file_names(), vec!["Counter.tsx"]);

        let recursive = migrate_directory(
            &FsStore,
            root,
            &MigrationSettings::default(),
            &MigrateOptions {
                recursive: true,
                ..MigrateOptions::default()
            },
        )
        .expect("recursive run");
        assert_eq!(recursive.touched_file_names(), vec!["widgets/Zoom.tsx"]);
        assert_eq!(
            std::fs::read_to_string(root.join("widgets/Zoom.tsx")).expect("read zoom"),
            "import { useUrlState } from \"@/hooks/use-url-state\";\nconst [zoom, setZoom] = useUrlState(\"zoom\", .75);\n"
        );
    }
}
