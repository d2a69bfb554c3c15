mod common;

use std::{sync::Arc, time::Duration};

use common::{
    create_test_session, session_in, session_with_stores, stores_in, CountingDocumentStore,
    CountingKeyValueStore, SlowKeyValueStore, TEST_DEBOUNCE,
};
use kokugo_core::{
    models::{Category, CompositionMode, Draft, DraftField, Viewpoint},
    GenerateOutcome, PlannerError, RestoreOutcome,
};
use tempfile::TempDir;

fn draft(unit: &str, timestamp: &str) -> Draft {
    let mut draft = Draft::default();
    draft.form.unit = unit.to_string();
    draft.timestamp = Some(timestamp.to_string());
    draft
}

#[tokio::test]
async fn test_restore_selects_newer_remote_draft() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let stores = stores_in(temp_dir.path(), "teacher-1").await;
    stores
        .write_local(&draft("A", "2024-01-01T00:00:00Z"))
        .await
        .unwrap();
    stores
        .write_remote(&draft("B", "2024-01-02T00:00:00Z"))
        .await
        .unwrap();

    let mut session = session_in(temp_dir.path(), "teacher-1").await;
    assert_eq!(session.restore().await, RestoreOutcome::Remote);
    assert_eq!(session.draft().form.unit, "B");

    // The winner is written back to the local store too.
    let local = Draft::from_json(&stores.read_local().await.unwrap().unwrap()).unwrap();
    assert_eq!(local.form.unit, "B");
}

#[tokio::test]
async fn test_restore_selects_local_when_remote_absent() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let stores = stores_in(temp_dir.path(), "teacher-1").await;
    stores
        .write_local(&draft("A", "2024-01-01T00:00:00Z"))
        .await
        .unwrap();

    let mut session = session_in(temp_dir.path(), "teacher-1").await;
    assert_eq!(session.restore().await, RestoreOutcome::Local);
    assert_eq!(session.draft().form.unit, "A");
}

#[tokio::test]
async fn test_remote_drafts_are_per_user() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let other = stores_in(temp_dir.path(), "teacher-2").await;
    other
        .write_remote(&draft("someone else", "2024-01-01T00:00:00Z"))
        .await
        .unwrap();

    let mut session = session_in(temp_dir.path(), "teacher-1").await;
    assert_eq!(session.restore().await, RestoreOutcome::Empty);
}

#[tokio::test]
async fn test_edit_burst_mirrors_last_state_to_both_stores() {
    let (temp_dir, mut session) = create_test_session().await;
    session.restore().await;

    for i in 1..=5 {
        session.set_field(DraftField::Unit, format!("edit {i}"));
    }
    session.settle().await;

    let stores = stores_in(temp_dir.path(), "teacher-1").await;
    let local = Draft::from_json(&stores.read_local().await.unwrap().unwrap()).unwrap();
    let remote = stores.read_remote().await.unwrap().unwrap();
    assert_eq!(local.form.unit, "edit 5");
    assert_eq!(remote.form.unit, "edit 5");
    assert!(remote.parsed_timestamp().is_some());
}

#[tokio::test]
async fn test_edit_burst_writes_each_store_once() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let local = Arc::new(CountingKeyValueStore::default());
    let remote = Arc::new(CountingDocumentStore::default());
    let mut session =
        session_with_stores(temp_dir.path(), local.clone(), remote.clone(), TEST_DEBOUNCE).await;
    session.restore().await;

    for i in 1..=5 {
        session.set_field(DraftField::Unit, format!("edit {i}"));
    }
    session.settle().await;

    assert_eq!(local.sets(), 1);
    assert_eq!(remote.merges(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_clear_waits_for_write_in_flight() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let local = Arc::new(SlowKeyValueStore::new(Duration::from_millis(300)));
    let mut session = session_with_stores(
        temp_dir.path(),
        local.clone(),
        Arc::new(kokugo_core::store::MemoryDocumentStore::new()),
        Duration::from_millis(10),
    )
    .await;
    session.restore().await;

    session.set_field(DraftField::Unit, "ごんぎつね");
    // The mirror write has started and is still blocked in the store.
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.clear().await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    let stores = session.stores().clone();
    assert_eq!(stores.read_local().await.unwrap(), None);
    assert_eq!(stores.read_remote().await.unwrap(), None);

    let mut reopened = session_with_stores(
        temp_dir.path(),
        local,
        session.stores().remote(),
        Duration::from_millis(10),
    )
    .await;
    assert_eq!(reopened.restore().await, RestoreOutcome::Empty);
}

#[tokio::test]
async fn test_clear_skips_next_change_then_mirrors_again() {
    let (temp_dir, mut session) = create_test_session().await;
    session.restore().await;
    session.set_field(DraftField::Unit, "before");
    session.settle().await;

    session.clear().await.unwrap();
    session.settle().await;
    tokio::time::sleep(TEST_DEBOUNCE * 3).await;

    let stores = stores_in(temp_dir.path(), "teacher-1").await;
    assert_eq!(stores.read_local().await.unwrap(), None);
    assert_eq!(stores.read_remote().await.unwrap(), None);
    assert_eq!(session.draft().form.unit, "");

    session.set_field(DraftField::Unit, "after");
    session.settle().await;
    let remote = stores.read_remote().await.unwrap().unwrap();
    assert_eq!(remote.form.unit, "after");
}

#[tokio::test]
async fn test_lesson_count_resizes_lesson_list() {
    let (_temp_dir, mut session) = create_test_session().await;

    session.set_hours("3");
    for (i, text) in ["a", "b", "c"].iter().enumerate() {
        session.set_lesson(i, *text).unwrap();
    }
    session.set_hours("1");
    assert_eq!(session.draft().form.lesson_plan_list, vec!["a"]);

    session.set_hours("3");
    assert_eq!(session.draft().form.lesson_plan_list, vec!["a", "", ""]);
    assert!(session.set_lesson(3, "d").is_err());
}

#[tokio::test]
async fn test_evaluation_point_editing() {
    let (_temp_dir, mut session) = create_test_session().await;

    session
        .set_evaluation_point(Viewpoint::Thinking, 0, "比べて読む")
        .unwrap();
    session.add_evaluation_point(Viewpoint::Thinking);
    session
        .set_evaluation_point(Viewpoint::Thinking, 1, "理由を書く")
        .unwrap();
    let removed = session
        .remove_evaluation_point(Viewpoint::Thinking, 0)
        .unwrap();

    assert_eq!(removed, "比べて読む");
    assert_eq!(
        session.draft().form.evaluation_points.thinking,
        vec!["理由を書く"]
    );
    assert!(matches!(
        session.remove_evaluation_point(Viewpoint::Knowledge, 5),
        Err(PlannerError::InvalidInput { .. })
    ));
}

#[tokio::test]
async fn test_ai_generation_failure_leaves_draft_untouched() {
    let (_temp_dir, mut session) = create_test_session().await;
    session.set_mode(CompositionMode::Ai);
    session.set_category(Some(Category::Reading));
    session.set_hours("2");

    let err = session.generate().await.unwrap_err();
    assert!(matches!(err, PlannerError::Generation { .. }));
    assert_eq!(session.draft().result, None);
    assert_eq!(session.draft().form.lesson_plan_list.len(), 2);
}

#[tokio::test]
async fn test_manual_plan_save_list_open_export() {
    let (_temp_dir, mut session) = create_test_session().await;
    session.restore().await;
    session.set_field(DraftField::Unit, "ごんぎつね");
    session.set_hours("2");
    session.set_lesson(0, "音読して場面を分ける").unwrap();
    session.set_category(Some(Category::Reading));

    let outcome = session.generate().await.unwrap();
    assert!(matches!(outcome, GenerateOutcome::Applied(_)));
    let plan = session.save(None).await.unwrap();
    assert_eq!(plan.category, Category::Reading);
    assert!(plan.assistant_plan_markdown.contains("音読して場面を分ける"));

    let summaries = session.list_plans(None).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert!(session
        .list_plans(Some(Category::Writing))
        .await
        .unwrap()
        .is_empty());

    session.clear().await.unwrap();
    let opened = session.load_plan(&plan.id).await.unwrap();
    assert_eq!(opened.id, plan.id);
    assert_eq!(session.draft().id.as_deref(), Some(plan.id.as_str()));
    assert_eq!(session.draft().form.unit, "ごんぎつね");

    let export = session.export_plan(&plan.id).await.unwrap();
    assert!(export.url.starts_with("file://"));
    let path = export.url.trim_start_matches("file://");
    let markdown = std::fs::read_to_string(path).expect("Exported file should exist");
    assert!(markdown.contains("## 授業の流れ"));
    assert!(markdown.contains("1時間目"));
}

#[tokio::test]
async fn test_saved_plans_survive_new_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let plan_id = {
        let mut session = session_in(temp_dir.path(), "teacher-1").await;
        session.set_hours("1");
        session.set_category(Some(Category::Writing));
        session.generate().await.unwrap();
        session.save(None).await.unwrap().id
    };

    let session = session_in(temp_dir.path(), "teacher-1").await;
    let plan = session.get_plan(&plan_id).await.unwrap();
    assert_eq!(plan.category, Category::Writing);
    assert_eq!(plan.owner_uid, "teacher-1");
}
