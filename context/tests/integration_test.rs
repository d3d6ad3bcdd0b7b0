use lexmap_context::{ContextConfig, ContextEngine, ContextError, QueryOverrides};
use lexmap_indexer::{IndexConfig, include_all};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create the rarity test corpus in a `corpus/` subdirectory: `a.py` shares
/// `frobnicate_widget` with `b.py` only, and `cfg` with eight other files.
/// Snapshot files live next to (not inside) the corpus.
fn create_test_corpus(dir: &TempDir) -> PathBuf {
    let root = dir.path().join("corpus");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("a.py"),
        "cfg = load_settings()\n\ndef run():\n    frobnicate_widget(cfg)\n",
    )
    .unwrap();
    fs::write(
        root.join("b.py"),
        "def frobnicate_widget(widget):\n    return widget\n",
    )
    .unwrap();
    for i in 0..8 {
        fs::write(
            root.join(format!("common_{i}.py")),
            format!("cfg = {i}\nvalue_{i} = cfg\n"),
        )
        .unwrap();
    }
    root
}

fn engine_for(root: &Path, cache: &Path, threshold: u32, max_workers: usize) -> ContextEngine {
    let index_config = IndexConfig {
        root_dir: root.to_path_buf(),
        cache_path: cache.to_path_buf(),
        rare_threshold: threshold,
        max_workers,
        ..Default::default()
    };
    ContextEngine::new(index_config, ContextConfig::default()).expect("valid configs")
}

#[tokio::test]
async fn shared_rare_token_outranks_common_one() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let engine = engine_for(&root, &temp_dir.path().join("index.bin"), 10, 4);
    let stats = engine.build_index(&include_all()).await.unwrap();
    assert_eq!(stats.files_indexed, 10);

    let context = engine.get_context("a.py").await.unwrap();
    assert!(!context.is_empty(), "a.py shares rare tokens with the corpus");

    // frobnicate_widget (df=2) carries more weight than cfg (df=9), so b.py
    // must come first even though every common file also shares cfg.
    assert_eq!(context.snippets[0].source_file, "b.py");
    assert_eq!(context.target_file, "a.py");
}

#[tokio::test]
async fn target_never_appears_in_its_own_context() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let engine = engine_for(&root, &temp_dir.path().join("index.bin"), 10, 2);
    engine.build_index(&include_all()).await.unwrap();

    let context = engine.get_context("a.py").await.unwrap();
    assert!(!context.is_empty());
    assert!(context.snippets.iter().all(|s| s.source_file != "a.py"));
}

#[tokio::test]
async fn context_is_deterministic_across_runs_and_worker_counts() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let mut renders = Vec::new();
    for (run, workers) in [(0, 1), (1, 1), (2, 4), (3, 8)] {
        let cache = temp_dir.path().join(format!("index_{run}.bin"));
        let engine = engine_for(&root, &cache, 10, workers);
        engine.build_index(&include_all()).await.unwrap();
        renders.push(engine.get_context("a.py").await.unwrap().render());
    }

    assert!(!renders[0].is_empty());
    for render in &renders[1..] {
        assert_eq!(render, &renders[0], "context must not depend on scheduling");
    }
}

#[tokio::test]
async fn incremental_rebuild_equals_full_rebuild() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let engine = engine_for(&root, &temp_dir.path().join("index.bin"), 10, 2);
    engine.build_index(&include_all()).await.unwrap();

    // Touch a subset: change one file, add one, delete one.
    fs::write(
        root.join("b.py"),
        "def frobnicate_widget(widget, extra):\n    return extra\n",
    )
    .unwrap();
    fs::write(root.join("c.py"), "frobnicate_widget(None)\n").unwrap();
    fs::remove_file(root.join("common_7.py")).unwrap();

    let stats = engine.build_index(&include_all()).await.unwrap();
    assert_eq!(stats.files_indexed, 2, "only b.py and c.py were retokenized");
    assert_eq!(stats.files_removed, 1, "common_7.py was dropped");
    let incremental = engine.get_context("a.py").await.unwrap();

    // A from-scratch engine over the same tree must agree byte for byte.
    let fresh = engine_for(&root, &temp_dir.path().join("fresh.bin"), 10, 2);
    fresh.build_index(&include_all()).await.unwrap();
    let full = fresh.get_context("a.py").await.unwrap();

    assert_eq!(incremental.render(), full.render());
}

#[tokio::test]
async fn unchanged_tree_is_fully_reused() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let engine = engine_for(&root, &temp_dir.path().join("index.bin"), 10, 2);
    let first = engine.build_index(&include_all()).await.unwrap();
    assert_eq!(first.files_indexed, 10);

    let second = engine.build_index(&include_all()).await.unwrap();
    assert_eq!(second.files_indexed, 0, "nothing changed");
    assert_eq!(second.files_reused, 10);
}

#[tokio::test]
async fn threshold_change_forces_full_rebuild() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let cache = temp_dir.path().join("index.bin");
    let engine = engine_for(&root, &cache, 10, 2);
    engine.build_index(&include_all()).await.unwrap();

    // Same cache path, stricter threshold: the stored snapshot is stale and
    // must not be partially reused.
    let stricter = engine_for(&root, &cache, 5, 2);
    let stats = stricter.build_index(&include_all()).await.unwrap();
    assert_eq!(stats.files_reused, 0);
    assert_eq!(stats.files_indexed, 10);
}

#[tokio::test]
async fn rarity_threshold_is_strict() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    // cfg now occurs in exactly 10 files; with threshold 10 it stops being
    // rare, leaving frobnicate_widget (df=2) as the only link from a.py.
    fs::write(root.join("common_8.py"), "cfg = 8\n").unwrap();

    let engine = engine_for(&root, &temp_dir.path().join("index.bin"), 10, 2);
    engine.build_index(&include_all()).await.unwrap();

    let context = engine.get_context("a.py").await.unwrap();
    assert!(!context.is_empty());
    assert!(
        context.snippets.iter().all(|s| s.source_file == "b.py"),
        "cfg-only files must not contribute once cfg stops being rare"
    );
}

#[tokio::test]
async fn missing_target_is_a_query_level_failure() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let engine = engine_for(&root, &temp_dir.path().join("index.bin"), 10, 2);
    engine.build_index(&include_all()).await.unwrap();

    let err = engine.get_context("not_in_corpus.py").await;
    assert!(matches!(err, Err(ContextError::TargetNotIndexed(_))));
}

#[tokio::test]
async fn query_before_build_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let engine = engine_for(&root, &temp_dir.path().join("index.bin"), 10, 2);
    let err = engine.get_context("a.py").await;
    assert!(matches!(err, Err(ContextError::IndexNotBuilt)));
}

#[tokio::test]
async fn overrides_bound_related_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let engine = engine_for(&root, &temp_dir.path().join("index.bin"), 10, 2);
    engine.build_index(&include_all()).await.unwrap();

    let context = engine
        .get_context_with(
            "a.py",
            QueryOverrides {
                max_related_files: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mut sources: Vec<&str> = context
        .snippets
        .iter()
        .map(|s| s.source_file.as_str())
        .collect();
    sources.dedup();
    assert_eq!(sources, vec!["b.py"], "only the top related file remains");
}

#[tokio::test]
async fn per_query_threshold_override_narrows_the_rare_set() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let engine = engine_for(&root, &temp_dir.path().join("index.bin"), 10, 2);
    engine.build_index(&include_all()).await.unwrap();

    // At threshold 3, cfg (df=9) is no longer rare, so only b.py remains.
    let context = engine
        .get_context_with(
            "a.py",
            QueryOverrides {
                rare_threshold: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!context.is_empty());
    assert!(context.snippets.iter().all(|s| s.source_file == "b.py"));

    // A zero threshold is a configuration error, not a silent no-op.
    let err = engine
        .get_context_with(
            "a.py",
            QueryOverrides {
                rare_threshold: Some(0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(err, Err(ContextError::InvalidConfig(_))));
}

#[tokio::test]
async fn corrupt_snapshot_falls_back_to_full_build() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_corpus(&temp_dir);

    let cache = temp_dir.path().join("index.bin");
    fs::write(&cache, b"garbage, not a snapshot").unwrap();

    let engine = engine_for(&root, &cache, 10, 2);
    let stats = engine.build_index(&include_all()).await.unwrap();
    assert_eq!(stats.files_indexed, 10);

    let context = engine.get_context("a.py").await.unwrap();
    assert_eq!(context.snippets[0].source_file, "b.py");
}
