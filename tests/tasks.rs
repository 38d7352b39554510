mod support;

use pretty_assertions::assert_eq;
use serde_json::json;
use taskdeck::{SyncError, TaskDraft, TaskFilter, TaskPriority, TaskSync};
use taskdeck_api::headers::HEADER_IF_MATCH;
use taskdeck_api::Method;
use taskdeck_api_mock::{json_body, task_json};
use time::macros::date;

use support::{Harness, BASE_URL};

const OWNER: i64 = 1;

async fn loaded(harness: &Harness, tasks: serde_json::Value) -> TaskSync {
    harness.transport.push_json(200, tasks);
    let mut sync = TaskSync::new(harness.gateway.clone());
    sync.load(OWNER, TaskFilter::All).await.expect("initial load");
    sync
}

fn ids(tasks: &[&taskdeck::Task]) -> Vec<i64> {
    tasks.iter().map(|task| task.id).collect()
}

#[tokio::test]
async fn load_replaces_collection_and_passes_filter() {
    let harness = Harness::new(Some("tok"));
    let mut sync = loaded(
        &harness,
        json!([task_json(1, OWNER, "a", false), task_json(2, OWNER, "b", true)]),
    )
    .await;
    harness
        .transport
        .push_json(200, json!([task_json(2, OWNER, "b", true)]));

    let tasks = sync.load(OWNER, TaskFilter::Completed).await.expect("load");

    assert_eq!(tasks.len(), 1);
    assert_eq!(sync.active_filter(), TaskFilter::Completed);
    assert_eq!(
        harness.transport.last_request().expect("request").url,
        format!("{BASE_URL}/1/tasks?completed=true")
    );
}

#[tokio::test]
async fn load_all_sends_no_completed_parameter() {
    let harness = Harness::new(Some("tok"));
    loaded(&harness, json!([])).await;

    assert_eq!(
        harness.transport.last_request().expect("request").url,
        format!("{BASE_URL}/1/tasks")
    );
}

#[tokio::test]
async fn failed_load_leaves_collection_and_filter_unchanged() {
    let harness = Harness::new(Some("tok"));
    let mut sync = loaded(&harness, json!([task_json(1, OWNER, "a", false)])).await;
    harness.transport.push_detail(500, "database unavailable");

    let error = sync
        .load(OWNER, TaskFilter::Pending)
        .await
        .expect_err("load fails");

    assert_eq!(error.message(), "database unavailable");
    assert_eq!(ids(&sync.derive_view(TaskFilter::All)), vec![1]);
    assert_eq!(sync.active_filter(), TaskFilter::All);
}

#[tokio::test]
async fn load_matching_sends_search_term() {
    let harness = Harness::new(Some("tok"));
    let mut sync = TaskSync::new(harness.gateway.clone());
    harness
        .transport
        .push_json(200, json!([task_json(4, OWNER, "Buy milk", false)]));

    sync.load_matching(OWNER, TaskFilter::Pending, Some("milk"))
        .await
        .expect("search");

    assert_eq!(
        harness.transport.last_request().expect("request").url,
        format!("{BASE_URL}/1/tasks?search=milk&completed=false")
    );
}

#[tokio::test]
async fn foreign_task_in_load_is_an_owner_mismatch() {
    let harness = Harness::new(Some("tok"));
    let mut sync = loaded(&harness, json!([task_json(1, OWNER, "mine", false)])).await;
    harness.transport.push_json(
        200,
        json!([task_json(1, OWNER, "mine", false), task_json(9, 2, "theirs", false)]),
    );

    let error = sync.load(OWNER, TaskFilter::All).await.expect_err("mismatch");

    assert!(matches!(
        error,
        SyncError::OwnerMismatch {
            task_id: 9,
            expected: 1,
            found: 2
        }
    ));
    assert_eq!(sync.tasks().len(), 1);
}

#[tokio::test]
async fn create_prepends_server_task() {
    let harness = Harness::new(Some("tok"));
    let mut sync = loaded(&harness, json!([task_json(3, OWNER, "older", false)])).await;
    harness
        .transport
        .push_json(201, task_json(42, OWNER, "Buy milk", false));

    let created = sync.create(OWNER, "Buy milk", "").await.expect("create");

    assert_eq!(created.id, 42);
    assert_eq!(ids(&sync.derive_view(TaskFilter::All)), vec![42, 3]);
    let request = harness.transport.last_request().expect("request");
    assert_eq!(request.method, Method::POST);
    assert_eq!(
        json_body(&request),
        Some(&json!({"title": "Buy milk", "description": ""}))
    );
}

#[tokio::test]
async fn blank_title_is_rejected_without_network() {
    let harness = Harness::new(Some("tok"));
    let mut sync = TaskSync::new(harness.gateway.clone());

    for title in ["", "   "] {
        let error = sync.create(OWNER, title, "x").await.expect_err("blank title");
        assert!(matches!(error, SyncError::Validation(_)));
    }

    assert_eq!(harness.transport.request_count(), 0);
    assert!(sync.tasks().is_empty());
}

#[tokio::test]
async fn create_draft_carries_priority_due_date_and_category() {
    let harness = Harness::new(Some("tok"));
    let mut sync = TaskSync::new(harness.gateway.clone());
    harness
        .transport
        .push_json(201, task_json(5, OWNER, "Ship", false));

    sync.create_draft(
        OWNER,
        TaskDraft::new("Ship", "v1")
            .with_priority(TaskPriority::High)
            .with_due_date(date!(2026 - 11 - 01))
            .with_category(2),
    )
    .await
    .expect("create");

    let request = harness.transport.last_request().expect("request");
    assert_eq!(
        json_body(&request),
        Some(&json!({
            "title": "Ship",
            "description": "v1",
            "priority": "high",
            "due_date": "2026-11-01",
            "category_id": 2
        }))
    );
}

#[tokio::test]
async fn failed_create_leaves_collection_unchanged() {
    let harness = Harness::new(Some("tok"));
    let mut sync = loaded(&harness, json!([task_json(3, OWNER, "older", false)])).await;
    harness.transport.push_transport_failure("connection reset");

    let error = sync.create(OWNER, "new", "").await.expect_err("create fails");

    assert!(matches!(error, SyncError::Api(_)));
    assert_eq!(ids(&sync.derive_view(TaskFilter::All)), vec![3]);
}

#[tokio::test]
async fn update_of_unknown_task_fails_before_network() {
    let harness = Harness::new(Some("tok"));
    let mut sync = loaded(&harness, json!([task_json(1, OWNER, "a", false)])).await;
    let before = harness.transport.request_count();

    let error = sync
        .update(OWNER, 99, Some("renamed"), None)
        .await
        .expect_err("unknown task");

    assert!(matches!(error, SyncError::NotFound { task_id: 99 }));
    assert_eq!(harness.transport.request_count(), before);
}

#[tokio::test]
async fn update_resolves_missing_fields_from_local_copy() {
    let harness = Harness::new(Some("tok"));
    let mut existing = task_json(1, OWNER, "Buy milk", false);
    existing["description"] = json!("two litres");
    let mut sync = loaded(&harness, json!([existing])).await;
    let mut updated = task_json(1, OWNER, "Buy oat milk", false);
    updated["description"] = json!("two litres");
    updated["updated_at"] = json!("2026-10-02T09:00:00");
    harness.transport.push_json(200, updated);

    let task = sync
        .update(OWNER, 1, Some("Buy oat milk"), None)
        .await
        .expect("update");

    let request = harness.transport.last_request().expect("request");
    assert_eq!(request.method, Method::PUT);
    assert_eq!(request.url, format!("{BASE_URL}/1/tasks/1"));
    assert_eq!(
        json_body(&request),
        Some(&json!({"title": "Buy oat milk", "description": "two litres"}))
    );
    assert_eq!(task.updated_at.as_deref(), Some("2026-10-02T09:00:00"));
    assert_eq!(sync.get(1), Some(&task));
}

#[tokio::test]
async fn update_sends_empty_description_when_none_is_known() {
    let harness = Harness::new(Some("tok"));
    let mut bare = task_json(1, OWNER, "a", false);
    bare["description"] = json!(null);
    let mut sync = loaded(&harness, json!([bare])).await;
    harness
        .transport
        .push_json(200, task_json(1, OWNER, "b", false));

    sync.update(OWNER, 1, Some("b"), None).await.expect("update");

    assert_eq!(
        json_body(&harness.transport.last_request().expect("request")),
        Some(&json!({"title": "b", "description": ""}))
    );
}

#[tokio::test]
async fn stale_revision_surfaces_as_conflict() {
    let harness = Harness::new(Some("tok"));
    let mut versioned = task_json(1, OWNER, "a", false);
    versioned["revision"] = json!(3);
    let mut sync = loaded(&harness, json!([versioned])).await;
    harness
        .transport
        .push_detail(409, "Task was modified by another client");

    let error = sync
        .update(OWNER, 1, Some("b"), None)
        .await
        .expect_err("conflict");

    assert!(matches!(
        error,
        SyncError::Conflict { task_id: 1, ref message } if message == "Task was modified by another client"
    ));
    let request = harness.transport.last_request().expect("request");
    assert_eq!(
        request.headers.get(HEADER_IF_MATCH).map(String::as_str),
        Some("\"3\"")
    );
    assert_eq!(sync.get(1).map(|task| task.title.as_str()), Some("a"));
}

#[tokio::test]
async fn toggle_twice_restores_completion() {
    let harness = Harness::new(Some("tok"));
    let mut sync = loaded(&harness, json!([task_json(7, OWNER, "a", false)])).await;
    harness
        .transport
        .push_json(200, task_json(7, OWNER, "a", true));
    harness
        .transport
        .push_json(200, task_json(7, OWNER, "a", false));

    let first = sync.toggle_complete(OWNER, 7).await.expect("first toggle");
    assert!(first.completed);
    assert_eq!(ids(&sync.derive_view(TaskFilter::Completed)), vec![7]);

    let second = sync.toggle_complete(OWNER, 7).await.expect("second toggle");
    assert!(!second.completed);
    assert_eq!(ids(&sync.derive_view(TaskFilter::Pending)), vec![7]);

    let request = harness.transport.last_request().expect("request");
    assert_eq!(request.method, Method::PATCH);
    assert_eq!(request.url, format!("{BASE_URL}/1/tasks/7/complete"));
}

#[tokio::test]
async fn delete_removes_on_success_only() {
    let harness = Harness::new(Some("tok"));
    let mut sync = loaded(
        &harness,
        json!([task_json(1, OWNER, "a", false), task_json(2, OWNER, "b", false)]),
    )
    .await;
    harness.transport.push_detail(404, "Task not found");
    harness.transport.push_no_content();

    sync.delete(OWNER, 1).await.expect_err("first delete fails");
    assert_eq!(ids(&sync.derive_view(TaskFilter::All)), vec![1, 2]);

    sync.delete(OWNER, 1).await.expect("second delete");
    assert_eq!(ids(&sync.derive_view(TaskFilter::All)), vec![2]);
    assert_eq!(
        harness.transport.last_request().expect("request").method,
        Method::DELETE
    );
}

#[tokio::test]
async fn refresh_replaces_or_appends() {
    let harness = Harness::new(Some("tok"));
    let mut sync = loaded(&harness, json!([task_json(1, OWNER, "a", false)])).await;
    harness
        .transport
        .push_json(200, task_json(1, OWNER, "a (edited elsewhere)", false));
    harness
        .transport
        .push_json(200, task_json(2, OWNER, "b", false));

    sync.refresh(OWNER, 1).await.expect("refresh known");
    sync.refresh(OWNER, 2).await.expect("refresh unknown");

    assert_eq!(
        sync.get(1).map(|task| task.title.as_str()),
        Some("a (edited elsewhere)")
    );
    assert_eq!(ids(&sync.derive_view(TaskFilter::All)), vec![1, 2]);
}

#[tokio::test]
async fn derive_view_is_pure_and_offline() {
    let harness = Harness::new(Some("tok"));
    let sync = loaded(
        &harness,
        json!([
            task_json(1, OWNER, "a", false),
            task_json(2, OWNER, "b", true),
            task_json(3, OWNER, "c", false)
        ]),
    )
    .await;
    let before = harness.transport.request_count();

    for filter in TaskFilter::ALL {
        assert_eq!(sync.derive_view(filter), sync.derive_view(filter));
    }
    assert_eq!(ids(&sync.derive_view(TaskFilter::All)), vec![1, 2, 3]);
    assert_eq!(ids(&sync.derive_view(TaskFilter::Pending)), vec![1, 3]);
    assert_eq!(ids(&sync.derive_view(TaskFilter::Completed)), vec![2]);
    assert_eq!(sync.tasks().len(), 3);
    assert_eq!(harness.transport.request_count(), before);
}

#[tokio::test]
async fn load_tolerates_free_text_priorities() {
    let harness = Harness::new(Some("tok"));
    let mut blank = task_json(2, OWNER, "b", false);
    blank["priority"] = json!("");
    let mut unknown = task_json(3, OWNER, "c", false);
    unknown["priority"] = json!("urgent");
    let sync = loaded(
        &harness,
        json!([task_json(1, OWNER, "a", false), blank, unknown]),
    )
    .await;

    let priorities: Vec<_> = sync.tasks().iter().map(|task| task.priority).collect();
    assert_eq!(priorities, vec![Some(TaskPriority::Medium), None, None]);
}

#[tokio::test]
async fn update_to_blank_title_is_rejected_without_network() {
    let harness = Harness::new(Some("tok"));
    let mut sync = loaded(&harness, json!([task_json(1, OWNER, "a", false)])).await;
    let before = harness.transport.request_count();

    let error = sync
        .update(OWNER, 1, Some("   "), Some("notes"))
        .await
        .expect_err("blank title");

    assert!(matches!(error, SyncError::Validation(_)));
    assert_eq!(harness.transport.request_count(), before);
    assert_eq!(sync.get(1).map(|task| task.title.as_str()), Some("a"));
}
