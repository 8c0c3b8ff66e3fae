//! Two-pass renaming through collision-free staging names.
//!
//! Before the first rename, a [`Journal`] recording every note's original,
//! staging and final filename is written to the store. Pass one moves every
//! note to a short `~<operation>-<index>.md` name. No staging name parses as
//! a zettel identifier, so it can never collide with a real note or with
//! another note's final name. Pass two moves each note to its final name,
//! then `up:` links are refreshed and the journal is removed. A run
//! interrupted at any point leaves the journal behind, and [`recover`]
//! finishes the operation from it.

use super::journal::{Journal, JournalEntry, JournalError, Phase};
use super::{LinkTarget, Rename, RenameSet};
use crate::domain::Note;
use crate::infra::frontmatter;
use crate::store::{JournalStore, NoteStore, StoreError};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Shared flag checked between the staging and commit passes.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Temporary filename used between the two passes.
///
/// Its length does not depend on the note's filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedName {
    pub operation: String,
    pub index: usize,
}

impl StagedName {
    pub fn new(operation: impl Into<String>, index: usize) -> Self {
        Self {
            operation: operation.into(),
            index,
        }
    }

    /// Parses `~<operation>-<index>.md`.
    pub fn parse(filename: &str) -> Option<Self> {
        let head = filename.strip_prefix('~')?.strip_suffix(".md")?;
        let (operation, index) = head.rsplit_once('-')?;
        if operation.is_empty() {
            return None;
        }
        Some(Self::new(operation, index.parse().ok()?))
    }
}

impl fmt::Display for StagedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}-{:04}.md", self.operation, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedNote {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a completed [`apply`] or [`recover`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub operation: String,
    pub renamed: Vec<RenamedNote>,
    /// Notes whose `up:` link was rewritten.
    pub links_updated: Vec<PathBuf>,
    /// Link rewrites that failed; the renames themselves stand.
    pub link_failures: Vec<LinkFailure>,
    /// Staged notes left alone: their final name is taken, or no journal
    /// says where they belong.
    pub conflicts: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(
        "operation {operation} cancelled after staging {} note(s); run `recover` to finish",
        .staged.len()
    )]
    Cancelled {
        operation: String,
        staged: Vec<RenamedNote>,
    },

    #[error(
        "operation {operation} stopped during {phase} at {}: {} finalized, {} staged, {} untouched",
        .failed.display(), .finalized.len(), .staged.len(), .pending.len()
    )]
    Partial {
        operation: String,
        phase: Phase,
        failed: PathBuf,
        finalized: Vec<RenamedNote>,
        /// Notes still under a staging name; `to` is the staging path.
        staged: Vec<RenamedNote>,
        /// Notes never renamed.
        pending: Vec<PathBuf>,
        #[source]
        source: StoreError,
    },

    #[error("unfinished rename operation(s) {}; run `recover` first", .operations.join(", "))]
    Unfinished { operations: Vec<String> },

    #[error("recovery of operation {operation} stopped at {}", .path.display())]
    Stalled {
        operation: String,
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("rename journal unavailable")]
    Journal(#[from] JournalError),

    #[error("failed to list notes")]
    List(#[source] StoreError),
}

/// Applies `set` to the store.
///
/// Refuses to start while another operation's journal is unfinished.
/// Cancellation is honored only between the passes. Once pass two starts it
/// runs to completion or to the first failure.
pub fn apply<S: NoteStore + JournalStore + ?Sized>(
    store: &mut S,
    set: &RenameSet,
    cancel: &Cancellation,
) -> Result<RenameReport, ApplyError> {
    let operation = Ulid::new().to_string();
    let mut report = RenameReport {
        operation: operation.clone(),
        ..RenameReport::default()
    };
    if set.is_empty() {
        debug!("nothing to rename");
        return Ok(report);
    }

    let unfinished: Vec<String> = Journal::load_all(&*store)?
        .into_iter()
        .map(|journal| journal.operation)
        .collect();
    if !unfinished.is_empty() {
        return Err(ApplyError::Unfinished {
            operations: unfinished,
        });
    }

    let renames: Vec<&Rename> = set.iter().collect();
    let entries = renames
        .iter()
        .enumerate()
        .map(|(index, rename)| {
            JournalEntry::new(rename, StagedName::new(&operation, index).to_string())
        })
        .collect();
    let mut journal = Journal::new(&operation, entries);
    journal.save(store)?;
    info!(%operation, count = set.len(), "staging renames");

    let mut staged: Vec<Note> = Vec::with_capacity(renames.len());
    for (index, rename) in renames.iter().enumerate() {
        match store.rename(&rename.note, &journal.entries[index].staged) {
            Ok(note) => staged.push(note),
            Err(source) => {
                return Err(ApplyError::Partial {
                    operation,
                    phase: Phase::Staging,
                    failed: rename.note.path().into(),
                    finalized: Vec::new(),
                    staged: staged
                        .iter()
                        .zip(&renames)
                        .map(|(note, r)| renamed(&r.note, note))
                        .collect(),
                    pending: renames[index..]
                        .iter()
                        .map(|r| r.note.path().into())
                        .collect(),
                    source,
                });
            }
        }
    }

    journal.phase = Phase::Commit;
    journal.save(store)?;

    if cancel.is_cancelled() {
        warn!(%operation, "cancelled between passes");
        return Err(ApplyError::Cancelled {
            staged: staged
                .iter()
                .zip(&renames)
                .map(|(note, r)| renamed(&r.note, note))
                .collect(),
            operation,
        });
    }

    let mut finalized: Vec<Note> = Vec::with_capacity(staged.len());
    for (index, staged_note) in staged.iter().enumerate() {
        match store.rename(staged_note, &renames[index].filename) {
            Ok(note) => finalized.push(note),
            Err(source) => {
                return Err(ApplyError::Partial {
                    operation,
                    phase: Phase::Commit,
                    failed: staged_note.path().into(),
                    finalized: finalized
                        .iter()
                        .zip(&renames)
                        .map(|(note, r)| renamed(&r.note, note))
                        .collect(),
                    staged: staged[index..]
                        .iter()
                        .zip(&renames[index..])
                        .map(|(note, r)| renamed(&r.note, note))
                        .collect(),
                    pending: Vec::new(),
                    source,
                });
            }
        }
    }

    for (note, rename) in finalized.iter().zip(&renames) {
        debug!(from = %rename.from, to = %rename.to, "renamed");
        report.renamed.push(renamed(&rename.note, note));
        refresh_link(store, note, &rename.link, &mut report);
    }
    if let Err(error) = journal.remove(store) {
        warn!(%operation, %error, "renames committed but the journal was not removed");
    }
    info!(%operation, renamed = report.renamed.len(), "renames committed");
    Ok(report)
}

/// Finishes every operation left unfinished by an interrupted [`apply`].
///
/// Operations still in the staging pass are staged to the end and then
/// committed. Every journaled note gets its `up:` link refreshed, including
/// notes committed before the interruption. Staged notes whose final name is
/// taken, and staged notes no journal knows about, are reported as conflicts
/// and left where they are; the journal of such an operation is kept.
pub fn recover<S: NoteStore + JournalStore + ?Sized>(
    store: &mut S,
) -> Result<RenameReport, ApplyError> {
    let journals = Journal::load_all(&*store)?;
    let mut report = RenameReport {
        operation: "recover".into(),
        ..RenameReport::default()
    };

    let mut journaled: HashSet<PathBuf> = HashSet::new();
    for journal in journals {
        journaled.extend(journal.entries.iter().map(JournalEntry::staged_path));
        finish(store, journal, &mut report)?;
    }

    for note in store.list().map_err(ApplyError::List)? {
        if StagedName::parse(&note.filename()).is_some() && !journaled.contains(note.path()) {
            warn!(path = %note.path().display(), "staged note without a journal");
            report.conflicts.push(note.path().into());
        }
    }

    info!(renamed = report.renamed.len(), conflicts = report.conflicts.len(), "recovery finished");
    Ok(report)
}

fn finish<S: NoteStore + JournalStore + ?Sized>(
    store: &mut S,
    mut journal: Journal,
    report: &mut RenameReport,
) -> Result<(), ApplyError> {
    let operation = journal.operation.clone();
    debug!(%operation, phase = %journal.phase, "finishing operation");
    let mut notes: HashMap<PathBuf, Note> = store
        .list()
        .map_err(ApplyError::List)?
        .into_iter()
        .map(|note| (note.path().to_path_buf(), note))
        .collect();

    if journal.phase == Phase::Staging {
        for entry in &journal.entries {
            if notes.contains_key(&entry.staged_path()) {
                continue;
            }
            let Some(note) = notes.remove(&entry.original_path()) else {
                warn!(%operation, path = %entry.original_path().display(), "journaled note is missing");
                continue;
            };
            let staged = store
                .rename(&note, &entry.staged)
                .map_err(|source| stalled(&operation, note.path(), source))?;
            notes.insert(staged.path().to_path_buf(), staged);
        }
        journal.phase = Phase::Commit;
        journal.save(store)?;
    }

    let mut blocked = false;
    let mut finalized: Vec<(Note, &LinkTarget)> = Vec::new();
    for entry in &journal.entries {
        let staged_path = entry.staged_path();
        let target_path = entry.target_path();
        let Some(note) = notes.remove(&staged_path) else {
            if let Some(note) = notes.get(&target_path) {
                finalized.push((note.clone(), &entry.link));
            }
            continue;
        };
        if notes.contains_key(&target_path) {
            warn!(%operation, path = %staged_path.display(), target = %target_path.display(), "final name taken");
            report.conflicts.push(staged_path);
            notes.insert(note.path().to_path_buf(), note);
            blocked = true;
            continue;
        }
        let done = store
            .rename(&note, &entry.target)
            .map_err(|source| stalled(&operation, note.path(), source))?;
        report.renamed.push(RenamedNote {
            from: entry.original_path(),
            to: done.path().into(),
        });
        notes.insert(done.path().to_path_buf(), done.clone());
        finalized.push((done, &entry.link));
    }

    for (note, link) in &finalized {
        refresh_link(store, note, link, report);
    }
    if blocked {
        warn!(%operation, "journal kept until conflicts are resolved");
    } else {
        journal.remove(store)?;
    }
    Ok(())
}

fn stalled(operation: &str, path: &Path, source: StoreError) -> ApplyError {
    ApplyError::Stalled {
        operation: operation.to_string(),
        path: path.into(),
        source,
    }
}

fn renamed(before: &Note, after: &Note) -> RenamedNote {
    RenamedNote {
        from: before.path().into(),
        to: after.path().into(),
    }
}

/// Rewrites the `up:` link of an already renamed note. Failures are recorded,
/// never raised.
fn refresh_link<S: NoteStore + ?Sized>(
    store: &mut S,
    note: &Note,
    link: &LinkTarget,
    report: &mut RenameReport,
) {
    let parent = match link {
        LinkTarget::Parent(stem) => Some(stem.as_str()),
        LinkTarget::Remove => None,
        LinkTarget::Keep => return,
    };

    let result = store.read(note).map_err(|e| e.to_string()).and_then(|content| {
        frontmatter::set_up_link(&content, parent).map_err(|e| e.to_string())
    });
    let outcome = match result {
        Ok(Some(updated)) => store.write(note, &updated).map(|()| true).map_err(|e| e.to_string()),
        Ok(None) => Ok(false),
        Err(error) => Err(error),
    };

    match outcome {
        Ok(true) => report.links_updated.push(note.path().into()),
        Ok(false) => {}
        Err(error) => {
            warn!(path = %note.path().display(), %error, "failed to update up link");
            report.link_failures.push(LinkFailure {
                path: note.path().into(),
                error,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ZettelId;
    use crate::reorder::{PlanEntry, ReorderOptions, ReorderPlan};
    use crate::store::MemoryStore;
    use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const ROOT: &str = "20240101000000000";

    fn clock() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn store(tails: &[(&str, &str)]) -> MemoryStore {
        let mut store = MemoryStore::new(clock());
        for (tail, content) in tails {
            store.insert(format!("{ROOT}{tail}.md"), *content);
        }
        store
    }

    fn find(notes: &[Note], tail: &str) -> Note {
        let filename = format!("{ROOT}{tail}.md");
        notes
            .iter()
            .find(|n| n.filename() == filename)
            .cloned()
            .unwrap()
    }

    fn swap_plan(store: &MemoryStore) -> RenameSet {
        let notes = store.list().unwrap();
        let plan = ReorderPlan::new(
            find(&notes, ""),
            vec![PlanEntry::new(find(&notes, "b"), 0), PlanEntry::new(find(&notes, "a"), 0)],
        );
        plan.compute(&notes, &ReorderOptions::default()).unwrap()
    }

    fn up(stem: &str) -> String {
        format!("---\nup: \"[[{ROOT}{stem}]]\"\n---\nbody\n")
    }

    fn content(store: &MemoryStore, tail: &str) -> String {
        store
            .content(Path::new(&format!("{ROOT}{tail}.md")))
            .unwrap()
            .to_string()
    }

    fn staged_files(store: &MemoryStore) -> Vec<String> {
        store
            .filenames()
            .into_iter()
            .filter(|f| f.starts_with('~'))
            .collect()
    }

    #[test]
    fn staged_name_round_trip() {
        let name = StagedName::new("01HX", 7);
        assert_eq!(name.to_string(), "~01HX-0007.md");
        assert_eq!(StagedName::parse(&name.to_string()), Some(name));
        assert_eq!(StagedName::parse("20240101000000000a.md"), None);
        assert_eq!(StagedName::parse("~nodash.md"), None);
        assert_eq!(StagedName::parse("~-0001.md"), None);
    }

    #[test]
    fn staged_name_length_ignores_the_note_name() {
        let name = StagedName::new(Ulid::new().to_string(), 12).to_string();
        assert_eq!(name.len(), "~".len() + 26 + "-0012.md".len());
    }

    #[test]
    fn swap_with_children_never_collides() {
        let mut store = store(&[
            ("", ""),
            ("a", "---\ntitle: A\n---\n"),
            ("b", "---\ntitle: B\n---\n"),
            ("a1", up("a").as_str()),
            ("b1", up("b").as_str()),
        ]);
        store.insert(format!("{ROOT}a1.md"), "---\ntitle: A1\nup: \"[[old]]\"\n---\n");

        let set = swap_plan(&store);
        let report = apply(&mut store, &set, &Cancellation::new()).unwrap();
        assert_eq!(report.renamed.len(), 4);
        assert_eq!(report.links_updated.len(), 4);
        assert!(report.link_failures.is_empty());
        assert!(store.journals().unwrap().is_empty());

        // Every rename goes either into or out of a staging name.
        for (from, to) in store.renames() {
            let staged = |p: &Path| p.to_string_lossy().starts_with('~');
            assert!(staged(from) != staged(to));
        }

        assert!(content(&store, "a").contains("title: B"));
        assert!(content(&store, "a").contains(&format!("up: \"[[{ROOT}]]\"")));
        assert!(content(&store, "b").contains("title: A"));
        assert!(content(&store, "b1").contains("title: A1"));
        assert!(content(&store, "b1").contains(&format!("[[{ROOT}b]]")));

        let notes = store.list().unwrap();
        let again = ReorderPlan::new(
            find(&notes, ""),
            vec![PlanEntry::new(find(&notes, "a"), 0), PlanEntry::new(find(&notes, "b"), 0)],
        )
        .compute(&notes, &ReorderOptions::default())
        .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn failure_in_staging_is_finished_by_recover() {
        let mut store = store(&[("", ""), ("a", "A"), ("b", "B")]);
        let set = swap_plan(&store);
        store.fail_rename_at(1);

        let err = apply(&mut store, &set, &Cancellation::new()).unwrap_err();
        let ApplyError::Partial {
            phase,
            finalized,
            staged,
            pending,
            ..
        } = err
        else {
            panic!("expected partial failure");
        };
        assert_eq!(phase, Phase::Staging);
        assert!(finalized.is_empty());
        assert_eq!(staged.len(), 1);
        assert_eq!(pending.len(), 1);
        assert_eq!(staged_files(&store).len(), 1);

        store.clear_failures();
        let report = recover(&mut store).unwrap();
        assert_eq!(report.renamed.len(), 2);
        assert!(report.conflicts.is_empty());
        assert!(staged_files(&store).is_empty());
        assert!(store.journals().unwrap().is_empty());
        assert_eq!(content(&store, "a"), "B");
        assert_eq!(content(&store, "b"), "A");
    }

    #[test]
    fn failure_in_commit_then_recover() {
        let mut store = store(&[("", ""), ("a", "A"), ("b", "B")]);
        let set = swap_plan(&store);
        store.fail_rename_at(3);

        let err = apply(&mut store, &set, &Cancellation::new()).unwrap_err();
        assert!(matches!(
            err,
            ApplyError::Partial {
                phase: Phase::Commit,
                ..
            }
        ));
        assert_eq!(staged_files(&store).len(), 1);

        store.clear_failures();
        let report = recover(&mut store).unwrap();
        assert_eq!(report.renamed.len(), 1);
        assert_eq!(
            store.filenames(),
            vec![
                format!("{ROOT}.md"),
                format!("{ROOT}a.md"),
                format!("{ROOT}b.md")
            ]
        );
        assert_eq!(content(&store, "a"), "B");
    }

    #[test]
    fn recover_refreshes_links_of_notes_committed_before_the_failure() {
        let mut store = store(&[
            ("", ""),
            ("a", up("").as_str()),
            ("b", up("").as_str()),
            ("a1", up("a").as_str()),
            ("b1", up("b").as_str()),
        ]);
        let set = swap_plan(&store);
        assert_eq!(set.len(), 4);
        // Four staging renames, then the third commit fails.
        store.fail_rename_at(6);

        let err = apply(&mut store, &set, &Cancellation::new()).unwrap_err();
        let ApplyError::Partial { finalized, .. } = &err else {
            panic!("expected partial failure, got {err:?}");
        };
        assert_eq!(finalized.len(), 2);

        store.clear_failures();
        let report = recover(&mut store).unwrap();
        assert_eq!(report.renamed.len(), 2);
        assert!(report.link_failures.is_empty());
        assert!(staged_files(&store).is_empty());
        assert!(content(&store, "a1").contains(&format!("[[{ROOT}a]]")));
        assert!(content(&store, "b1").contains(&format!("[[{ROOT}b]]")));
    }

    #[test]
    fn cancel_between_passes_leaves_staged_notes() {
        let mut store = store(&[("", ""), ("a", ""), ("b", "")]);
        let set = swap_plan(&store);
        let cancel = Cancellation::new();
        cancel.cancel();

        let err = apply(&mut store, &set, &cancel).unwrap_err();
        assert!(matches!(err, ApplyError::Cancelled { ref staged, .. } if staged.len() == 2));
        assert_eq!(store.journals().unwrap().len(), 1);

        let report = recover(&mut store).unwrap();
        assert_eq!(report.renamed.len(), 2);
        assert!(staged_files(&store).is_empty());
    }

    #[test]
    fn unfinished_operation_blocks_apply() {
        let mut store = store(&[("", ""), ("a", ""), ("b", "")]);
        let set = swap_plan(&store);
        Journal::new("01OLD", Vec::new()).save(&mut store).unwrap();

        let err = apply(&mut store, &set, &Cancellation::new()).unwrap_err();
        assert!(matches!(err, ApplyError::Unfinished { ref operations } if operations == &["01OLD"]));
        assert!(store.renames().is_empty());
    }

    #[test]
    fn recover_keeps_journal_while_final_name_is_taken() {
        let mut store = store(&[("", ""), ("b", "squatter")]);
        store.insert("~01OP-0000.md", "staged");
        let mut journal = Journal::new(
            "01OP",
            vec![JournalEntry {
                folder: PathBuf::new(),
                original: format!("{ROOT}a.md"),
                staged: "~01OP-0000.md".into(),
                target: format!("{ROOT}b.md"),
                link: LinkTarget::Keep,
            }],
        );
        journal.phase = Phase::Commit;
        journal.save(&mut store).unwrap();

        let report = recover(&mut store).unwrap();
        assert!(report.renamed.is_empty());
        assert_eq!(report.conflicts, vec![PathBuf::from("~01OP-0000.md")]);
        assert_eq!(Journal::load_all(&store).unwrap(), vec![journal]);
    }

    #[test]
    fn recover_reports_staged_notes_without_a_journal() {
        let mut store = store(&[("", ""), ("a", "")]);
        store.insert("~01OP-0000.md", "stale");
        let report = recover(&mut store).unwrap();
        assert!(report.renamed.is_empty());
        assert_eq!(report.conflicts, vec![PathBuf::from("~01OP-0000.md")]);
    }

    #[test]
    fn promoted_note_loses_up_link() {
        let mut store = store(&[("", ""), ("a", up("").as_str()), ("b", up("").as_str())]);
        let notes = store.list().unwrap();
        let plan = ReorderPlan::new(
            find(&notes, ""),
            vec![PlanEntry::new(find(&notes, "b"), 0), PlanEntry::promoted(find(&notes, "a"))],
        );
        let set = plan.compute(&notes, &ReorderOptions::default()).unwrap();
        let report = apply(&mut store, &set, &Cancellation::new()).unwrap();

        assert_eq!(report.links_updated.len(), 1);
        let promoted = report
            .renamed
            .iter()
            .find(|r| r.from == Path::new(&format!("{ROOT}a.md")))
            .unwrap();
        assert!(!store.content(&promoted.to).unwrap().contains("up:"));
    }

    #[test]
    fn promoted_note_falls_back_to_creation_time() {
        let mut store = store(&[("", ""), ("a", ""), ("b", "")]);
        let created = Utc.with_ymd_and_hms(2023, 5, 6, 7, 8, 9).unwrap();
        store.set_created(Path::new(&format!("{ROOT}a.md")), created);
        // `now` is the root's own timestamp, so it is taken.
        let options = ReorderOptions::at(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_milli_opt(0, 0, 0, 0)
                .unwrap(),
        );

        let notes = store.list().unwrap();
        let set = ReorderPlan::new(
            find(&notes, ""),
            vec![PlanEntry::new(find(&notes, "b"), 0), PlanEntry::promoted(find(&notes, "a"))],
        )
        .compute(&notes, &options)
        .unwrap();
        let expected = ZettelId::from_datetime(created.with_timezone(&Local).naive_local());
        let promoted = set.iter().find(|r| r.from.tail() == "a").unwrap();
        assert_eq!(promoted.to.to_string(), expected.to_string());

        apply(&mut store, &set, &Cancellation::new()).unwrap();
        assert!(store.content(Path::new(&format!("{expected}.md"))).is_some());
    }

    #[test]
    fn empty_set_touches_nothing() {
        let mut store = store(&[("", "")]);
        let report = apply(&mut store, &RenameSet::default(), &Cancellation::new()).unwrap();
        assert!(report.renamed.is_empty());
        assert!(store.renames().is_empty());
    }
}
