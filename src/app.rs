use crate::config::{AppConfig, Command, CounterAction};
use crate::demo::{demo_document_store, demo_filesystem, demo_preferences};
use crate::display::{Terminal, format_check, format_document, format_query, format_snapshot};
use crate::docstore::{
    DocResult, DocStoreError, DocumentPath, DocumentStore, InMemoryDocumentStore, document_data,
};
use crate::matchers::contains;
use crate::services::{Announcer, COUNTER_KEY, CounterService, DocumentService, FileService, GroupedWrite};
use crate::system::{
    FilePreferenceStore, FileSystem, FsError, InMemoryPreferenceStore, MemoryFileSystem,
    PreferenceError, PreferenceStore, RealFileSystem, RecordingCallback,
};
use serde_json::json;
use thiserror::Error;
use tracing::info;

/// Errors surfaced to the command line
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Preference store error: {0}")]
    Preferences(#[from] PreferenceError),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FsError),

    #[error("Document store error: {0}")]
    Documents(#[from] DocStoreError),

    #[error("{failed} of {total} walkthrough checks failed")]
    WalkthroughFailed { failed: usize, total: usize },
}

/// Outcome of one walkthrough check
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub label: String,
    pub passed: bool,
    pub detail: Option<String>,
}

impl Check {
    fn new(label: &str, passed: bool) -> Self {
        Self {
            label: label.to_string(),
            passed,
            detail: None,
        }
    }

    fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Build collaborators for the configured mode and execute the command
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let terminal = Terminal::new();
    info!(demo_mode = config.demo_mode, command = ?config.command, "starting");

    match config.command {
        Command::Counter { action } => {
            if config.demo_mode {
                run_counter(CounterService::new(demo_preferences()), action)
            } else {
                let store = FilePreferenceStore::new(&config.prefs_path);
                info!(path = %store.path().display(), "using preference file");
                run_counter(CounterService::new(store), action)
            }
        }
        Command::Touch { path, recursive } => {
            if config.demo_mode {
                touch(&demo_filesystem(), &path, recursive)
            } else {
                touch(&RealFileSystem, &path, recursive)
            }
        }
        Command::Exists { path } => {
            let exists = if config.demo_mode {
                FileService::new(demo_filesystem()).file_exists(&path)
            } else {
                FileService::new(RealFileSystem).file_exists(&path)
            };
            println!("{}: {}", path, if exists { "exists" } else { "missing" });
            Ok(())
        }
        Command::Walkthrough => {
            let checks = run_walkthrough().await?;
            display_walkthrough(&terminal, &checks);
            let failed = checks.iter().filter(|check| !check.passed).count();
            if failed > 0 {
                return Err(AppError::WalkthroughFailed {
                    failed,
                    total: checks.len(),
                });
            }
            Ok(())
        }
    }
}

fn run_counter<P: PreferenceStore>(
    service: CounterService<P>,
    action: CounterAction,
) -> Result<(), AppError> {
    let value = match action {
        CounterAction::Show => service.read_counter()?,
        CounterAction::Increment => service.increment()?,
        CounterAction::Set { value } => {
            if !service.write_counter(value)? {
                return Err(PreferenceError::write_rejected(COUNTER_KEY).into());
            }
            value
        }
    };
    println!("counter = {}", value);
    Ok(())
}

fn touch<F: FileSystem>(filesystem: &F, path: &str, recursive: bool) -> Result<(), AppError> {
    filesystem.create_file(path, recursive)?;
    println!("{}: created", path);
    Ok(())
}

/// The grouped-write scenario applied to the demo documents
pub fn demo_grouped_write() -> DocResult<GroupedWrite> {
    Ok(GroupedWrite {
        merge_target: DocumentPath::new("collection", "doc1")?,
        partial: document_data(json!({"updated_data": "43"}))?,
        set_target: DocumentPath::new("collection", "doc2")?,
        set_data: document_data(json!({"data": "44"}))?,
        delete_target: DocumentPath::new("collection", "doc3")?,
    })
}

/// Run every service against fresh in-memory collaborators
pub async fn run_walkthrough() -> Result<Vec<Check>, AppError> {
    let mut checks = Vec::new();
    checks.extend(counter_checks()?);
    checks.extend(document_checks().await?);
    checks.extend(callback_checks());
    checks.extend(filesystem_checks()?);
    Ok(checks)
}

fn counter_checks() -> Result<Vec<Check>, AppError> {
    let fresh = CounterService::new(InMemoryPreferenceStore::new());
    let unwritten = fresh.read_counter()? == 0;
    fresh.write_counter(42)?;
    let round_trip = fresh.read_counter()? == 42;

    let seeded = CounterService::new(demo_preferences());
    let incremented = seeded.increment()? == 42;

    Ok(vec![
        Check::new("unwritten counter reads 0", unwritten),
        Check::new("counter round-trips 42", round_trip),
        Check::new("seeded counter increments to 42", incremented),
    ])
}

fn grouped_write_checks(
    store: &InMemoryDocumentStore,
    plan: &GroupedWrite,
    kind: &str,
) -> Vec<Check> {
    let expected_merge = document_data(json!({"data": "42", "updated_data": "43"})).ok();
    let merged = store.document(&plan.merge_target);
    let mut merge_check = Check::new(
        &format!("{}: merge target holds merged data", kind),
        merged == expected_merge,
    );
    if let Some(data) = &merged {
        merge_check =
            merge_check.with_detail(format!("{} => {}", plan.merge_target, format_document(data)));
    }
    vec![
        merge_check,
        Check::new(
            &format!("{}: set target holds payload", kind),
            store.document(&plan.set_target).as_ref() == Some(&plan.set_data),
        ),
        Check::new(
            &format!("{}: delete target is absent", kind),
            store.document(&plan.delete_target).is_none(),
        ),
    ]
}

async fn document_checks() -> Result<Vec<Check>, AppError> {
    let plan = demo_grouped_write()?;
    let mut checks = Vec::new();

    let transactional = DocumentService::new(demo_document_store());
    transactional.merge_in_transaction(&plan).await?;
    checks.extend(grouped_write_checks(transactional.store(), &plan, "transaction"));

    let batched = DocumentService::new(demo_document_store());
    batched.merge_in_batch(&plan).await?;
    checks.extend(grouped_write_checks(batched.store(), &plan, "batch"));

    let snapshot = batched.first_snapshot("messages").await?;
    let expected = document_data(json!({"read": false, "text": "hello"}))?;
    let seen = snapshot
        .as_ref()
        .is_some_and(|snapshot| contains(expected.clone()).matches(snapshot.data()));
    let mut snapshot_check = Check::new("first snapshot contains welcome message", seen);
    if let Some(snapshot) = &snapshot {
        snapshot_check = snapshot_check.with_detail(format_query(snapshot));
    }
    checks.push(snapshot_check);

    let set_snapshot = transactional.store().get(&plan.set_target).await?;
    checks.push(
        Check::new("transaction snapshot sees set payload", set_snapshot.exists())
            .with_detail(format_snapshot(&set_snapshot)),
    );

    Ok(checks)
}

fn callback_checks() -> Vec<Check> {
    let announcer = Announcer::with_prefix("walkthrough");
    let invoked = RecordingCallback::new();
    let untouched = RecordingCallback::new();

    announcer.announce("callback scenario", &invoked);

    vec![
        Check::new("callback invoked exactly once", invoked.was_called_times(1)),
        Check::new("unused callback never invoked", untouched.was_called_times(0)),
    ]
}

fn filesystem_checks() -> Result<Vec<Check>, AppError> {
    let service = FileService::new(MemoryFileSystem::new());
    let target = "/tmp/dep-doubles/check.txt";

    let rejected = matches!(
        service.filesystem().create_file(target, false),
        Err(FsError::ParentMissing { .. })
    );
    service.ensure_file(target)?;

    Ok(vec![
        Check::new("non-recursive create needs a parent", rejected),
        Check::new("recursive create makes the file exist", service.file_exists(target)),
    ])
}

fn display_walkthrough(terminal: &Terminal, checks: &[Check]) {
    println!(
        "{}",
        terminal.heading(&format!("{:=^60}", " dep-doubles walkthrough "))
    );
    println!("Time: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"));
    println!();
    for check in checks {
        println!(
            "    {}",
            terminal.outcome(check.passed, &format_check(check.passed, &check.label))
        );
        if let Some(detail) = &check.detail {
            for line in detail.lines() {
                println!("           {}", line);
            }
        }
    }
    println!("{:=^60}", "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::preferences::MockPreferenceStore;

    #[tokio::test]
    async fn test_walkthrough_passes() {
        let checks = run_walkthrough().await.unwrap();

        assert_eq!(checks.len(), 15);
        let failed: Vec<&Check> = checks.iter().filter(|check| !check.passed).collect();
        assert!(failed.is_empty(), "failed checks: {:?}", failed);
    }

    #[tokio::test]
    async fn test_counter_command_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefs_path = dir.path().join("prefs.json");
        let config = |action| AppConfig {
            demo_mode: false,
            prefs_path: prefs_path.clone(),
            command: Command::Counter { action },
        };

        run(config(CounterAction::Set { value: 9 })).await.unwrap();
        run(config(CounterAction::Increment)).await.unwrap();

        let store = FilePreferenceStore::new(&prefs_path);
        assert_eq!(store.get_int("counter").unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_touch_without_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("file.txt");
        let config = AppConfig {
            demo_mode: false,
            prefs_path: dir.path().join("prefs.json"),
            command: Command::Touch {
                path: target.to_string_lossy().into_owned(),
                recursive: false,
            },
        };

        assert!(matches!(
            run(config).await,
            Err(AppError::Filesystem(FsError::ParentMissing { .. }))
        ));
        assert!(!target.exists());
    }

    #[test]
    fn test_counter_set_reports_rejected_write() {
        let mut preferences = MockPreferenceStore::new();
        preferences.expect_set_int().times(1).returning(|_, _| Ok(false));

        let result = run_counter(
            CounterService::new(preferences),
            CounterAction::Set { value: 3 },
        );

        assert!(matches!(
            result,
            Err(AppError::Preferences(PreferenceError::WriteRejected { .. }))
        ));
    }

    #[test]
    fn test_demo_grouped_write_targets() {
        let plan = demo_grouped_write().unwrap();
        assert_eq!(plan.merge_target.to_string(), "collection/doc1");
        assert_eq!(plan.delete_target.to_string(), "collection/doc3");
    }
}
