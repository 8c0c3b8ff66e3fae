//! Reorder scenarios run against a real notes directory.

mod common;

use chrono::NaiveDate;
use common::harness::{ROOT, TestEnv, TestNote};
use pretty_assertions::assert_eq;
use zettel::domain::Note;
use zettel::reorder::{
    ApplyError, Cancellation, PlanEntry, RenameSet, ReorderOptions, ReorderPlan, apply, recover,
};
use zettel::store::{JournalStore, NoteStore, VaultStore};

fn id(tail: &str) -> String {
    format!("{ROOT}{tail}")
}

fn options() -> ReorderOptions {
    ReorderOptions::at(
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 0)
            .unwrap(),
    )
}

fn note<'a>(notes: &'a [Note], wanted: &str) -> &'a Note {
    notes
        .iter()
        .find(|n| n.id().is_some_and(|id| id.to_string() == wanted))
        .unwrap_or_else(|| panic!("no note {wanted}"))
}

/// Plans `order` (identifiers at indent 0) below the root.
fn plan_children(notes: &[Note], order: &[String]) -> RenameSet {
    let entries = order
        .iter()
        .map(|id| PlanEntry::new(note(notes, id).clone(), 0))
        .collect();
    ReorderPlan::new(note(notes, ROOT).clone(), entries)
        .compute(notes, &options())
        .unwrap()
}

fn vault() -> (TestEnv, VaultStore) {
    let env = TestEnv::new();
    let root = TestNote::new(ROOT).title("Root");
    let alpha = TestNote::new(id("a")).title("Alpha").up(root.stem());
    let beta = TestNote::new(id("b")).prefix("zk").title("Beta").up(root.stem());
    env.add_note(&root);
    env.add_note(&alpha);
    env.add_note(&beta);
    env.write_file(
        &format!("cards/{} Deep.md", id("a1")),
        &TestNote::new(id("a1")).up(alpha.stem()).content(),
    );
    env.write_file(&format!("cards/{}.md", id("b1")), "no frontmatter here\n");
    let store = VaultStore::open(env.notes_dir()).unwrap();
    (env, store)
}

#[test]
fn swap_keeps_folders_and_prefixes() {
    let (env, mut store) = vault();
    let notes = store.list().unwrap();

    let set = plan_children(&notes, &[id("b"), id("a")]);
    let report = apply(&mut store, &set, &Cancellation::new()).unwrap();

    assert_eq!(report.renamed.len(), 4);
    assert_eq!(
        env.filenames(),
        vec![
            format!("{ROOT} Root.md"),
            format!("{} Alpha.md", id("b")),
            format!("zk{} Beta.md", id("a")),
        ]
    );
    assert!(env.exists(&format!("cards/{} Deep.md", id("b1"))));
    assert!(env.exists(&format!("cards/{}.md", id("a1"))));
}

#[test]
fn swap_rewrites_up_links_only_where_frontmatter_exists() {
    let (env, mut store) = vault();
    let notes = store.list().unwrap();

    let set = plan_children(&notes, &[id("b"), id("a")]);
    apply(&mut store, &set, &Cancellation::new()).unwrap();

    let deep = env.read(&format!("cards/{} Deep.md", id("b1")));
    assert!(deep.contains(&format!("up: \"[[{} Alpha]]\"", id("b"))));
    assert_eq!(
        env.read(&format!("cards/{}.md", id("a1"))),
        "no frontmatter here\n"
    );
}

#[test]
fn reapplying_current_order_is_empty() {
    let (_env, mut store) = vault();
    let notes = store.list().unwrap();
    let set = plan_children(&notes, &[id("b"), id("a")]);
    apply(&mut store, &set, &Cancellation::new()).unwrap();

    let notes = store.list().unwrap();
    let again = plan_children(&notes, &[id("a"), id("b")]);
    assert!(again.is_empty());
}

#[test]
fn cancelled_apply_is_finished_by_recover() {
    let (env, mut store) = vault();
    let notes = store.list().unwrap();
    let set = plan_children(&notes, &[id("b"), id("a")]);

    let cancel = Cancellation::new();
    cancel.cancel();
    let err = apply(&mut store, &set, &cancel).unwrap_err();
    let ApplyError::Cancelled { staged, .. } = &err else {
        panic!("expected cancellation, got {err:?}");
    };
    assert_eq!(staged.len(), 4);
    assert!(env.filenames().iter().any(|name| name.starts_with('~')));

    let report = recover(&mut store).unwrap();
    assert_eq!(report.renamed.len(), 4);
    assert!(report.conflicts.is_empty());
    assert!(env.exists(&format!("zk{} Beta.md", id("a"))));
    assert!(env.exists(&format!("cards/{} Deep.md", id("b1"))));
    assert!(env.filenames().iter().all(|name| !name.starts_with('~')));
}

#[test]
fn swap_handles_titles_near_the_filename_limit() {
    let env = TestEnv::new();
    let title = "x".repeat(225);
    let root = TestNote::new(ROOT).title("Root");
    env.add_note(&root);
    env.add_note(&TestNote::new(id("a")).title(&title).up(root.stem()));
    env.add_note(&TestNote::new(id("b")).title("Short").up(root.stem()));
    let mut store = VaultStore::open(env.notes_dir()).unwrap();
    let notes = store.list().unwrap();

    let set = plan_children(&notes, &[id("b"), id("a")]);
    let report = apply(&mut store, &set, &Cancellation::new()).unwrap();

    assert_eq!(report.renamed.len(), 2);
    assert!(env.exists(&format!("{} {title}.md", id("b"))));
    assert!(env.exists(&format!("{} Short.md", id("a"))));
    assert!(env.filenames().iter().all(|name| !name.starts_with('~')));
}

#[test]
fn finished_apply_leaves_no_journal() {
    let (env, mut store) = vault();
    let notes = store.list().unwrap();
    let set = plan_children(&notes, &[id("b"), id("a")]);

    let cancel = Cancellation::new();
    cancel.cancel();
    apply(&mut store, &set, &cancel).unwrap_err();
    assert_eq!(store.journals().unwrap().len(), 1);

    recover(&mut store).unwrap();
    assert!(store.journals().unwrap().is_empty());
    assert!(env.filenames().iter().all(|name| !name.starts_with('~')));
}
