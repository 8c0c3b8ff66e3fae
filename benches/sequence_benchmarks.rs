//! Benchmarks for sequence derivation and reorder planning.
//!
//! Run with: cargo bench --bench sequence_benchmarks

use chrono::{NaiveDate, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::fs;
use tempfile::TempDir;
use zettel::domain::{Note, NoteMetadata, ZettelId};
use zettel::reorder::{PlanEntry, ReorderOptions, ReorderPlan};
use zettel::sequence::{BuildOptions, build_sequence, find_next_available_child_slot};
use zettel::store::{NoteStore, VaultStore};

const ROOT: &str = "20240101000000000";

// =============================================================================
// Test Data Generation
// =============================================================================

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Filenames for one root with `width` letter children, each holding
/// `width` numbered children with a single letter grandchild.
fn sequence_filenames(width: usize) -> Vec<String> {
    let mut names = vec![format!("{ROOT} Root.md")];
    for &letter in LETTERS.iter().take(width) {
        let letter = letter as char;
        names.push(format!("{ROOT}{letter} Topic {letter}.md"));
        for number in 1..=width {
            names.push(format!("{ROOT}{letter}{number} Detail {number}.md"));
            names.push(format!("{ROOT}{letter}{number}a.md"));
        }
    }
    names
}

fn create_notes(width: usize) -> Vec<Note> {
    let modified = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
    sequence_filenames(width)
        .into_iter()
        .map(|name| Note::new(name, NoteMetadata::new(modified)))
        .collect()
}

/// Create a temporary directory holding the same sequence as note files
fn create_vault(width: usize) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for name in sequence_filenames(width) {
        fs::write(dir.path().join(&name), "---\ntitle: Bench\n---\nbody\n")
            .expect("Failed to write note");
    }
    dir
}

fn options() -> ReorderOptions {
    ReorderOptions::at(
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 0)
            .unwrap(),
    )
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_build_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_sequence");

    for width in [5, 15, 26] {
        let notes = create_notes(width);
        let root = notes[0].clone();

        group.throughput(Throughput::Elements(notes.len() as u64));
        group.bench_with_input(BenchmarkId::new("notes", notes.len()), &width, |b, _| {
            b.iter(|| build_sequence(&root, &notes, &BuildOptions::default()).unwrap());
        });
    }

    group.finish();
}

fn bench_next_child_slot(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_child_slot");

    for width in [5, 15, 26] {
        let notes = create_notes(width);
        let ids: Vec<ZettelId> = notes.iter().filter_map(|n| n.id().cloned()).collect();
        let parent: ZettelId = format!("{ROOT}a").parse().unwrap();

        group.bench_with_input(BenchmarkId::new("notes", notes.len()), &width, |b, _| {
            b.iter(|| find_next_available_child_slot(&parent, &ids).unwrap());
        });
    }

    group.finish();
}

fn bench_reverse_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("reverse_plan");

    for width in [5, 15, 26] {
        let notes = create_notes(width);
        let root = notes[0].clone();
        let root_id = root.id().cloned().unwrap();
        let mut children: Vec<Note> = notes
            .iter()
            .filter(|n| n.id().is_some_and(|id| root_id.is_parent_of(id)))
            .cloned()
            .collect();
        children.reverse();
        let plan = ReorderPlan::new(
            root,
            children.into_iter().map(|n| PlanEntry::new(n, 0)).collect(),
        );

        group.throughput(Throughput::Elements(notes.len() as u64));
        group.bench_with_input(BenchmarkId::new("notes", notes.len()), &width, |b, _| {
            b.iter(|| plan.compute(&notes, &options()).unwrap());
        });
    }

    group.finish();
}

fn bench_vault_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault_listing");

    for width in [5, 15] {
        let dir = create_vault(width);
        let store = VaultStore::open(dir.path()).unwrap();

        group.bench_with_input(BenchmarkId::new("width", width), &width, |b, _| {
            b.iter(|| store.list().unwrap());
        });
    }

    group.finish();
}

criterion_group!(sequence_benches, bench_build_sequence, bench_next_child_slot);
criterion_group!(reorder_benches, bench_reverse_plan, bench_vault_listing);
criterion_main!(sequence_benches, reorder_benches);
