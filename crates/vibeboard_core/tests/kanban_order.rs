use serde_json::json;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use vibeboard_core::{
    ColumnId, ManualClock, Priority, Session, SortBy, SyncIntent, SyncOp, SyncOutbox, Task,
    TaskPatch, TaskStore, User,
};

fn new_store() -> (TaskStore, Receiver<SyncIntent>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let (outbox, receiver) = SyncOutbox::channel();
    let user = User {
        id: "owner-1".to_string(),
        email: "owner@example.com".to_string(),
    };
    let store = TaskStore::new(Session::new(user, outbox, clock.clone()));
    (store, receiver, clock)
}

fn add(store: &mut TaskStore, title: &str, column_id: ColumnId) -> Task {
    store
        .add(title, column_id, None, Priority::Medium, None)
        .unwrap()
}

fn titles_with_order(store: &TaskStore, column_id: ColumnId) -> Vec<(String, i64)> {
    store
        .column(column_id, SortBy::Manual, None)
        .into_iter()
        .map(|task| (task.title, task.order))
        .collect()
}

fn pairs(items: &[(&str, i64)]) -> Vec<(String, i64)> {
    items
        .iter()
        .map(|(title, order)| (title.to_string(), *order))
        .collect()
}

#[test]
fn add_appends_with_next_order_and_emits_insert() {
    let (mut store, receiver, _) = new_store();
    let first = add(&mut store, "  First  ", ColumnId::Todo);
    let second = store
        .add(
            "Second",
            ColumnId::Todo,
            Some("  details "),
            Priority::Urgent,
            Some(1_700_100_000_000),
        )
        .unwrap();

    assert_eq!(first.title, "First");
    assert_eq!(first.order, 0);
    assert_eq!(second.order, 1);
    assert_eq!(second.description.as_deref(), Some("details"));
    assert_eq!(second.created_at, second.updated_at);
    assert_eq!(store.column_len(ColumnId::Todo), 2);

    let intents: Vec<SyncIntent> = receiver.try_iter().collect();
    assert_eq!(intents.len(), 2);
    assert_eq!(intents[1].owner_id, "owner-1");
    match &intents[1].op {
        SyncOp::Insert { row } => {
            assert_eq!(row["sort_order"], json!(1));
            assert_eq!(row["column_id"], json!("todo"));
            assert_eq!(row["priority"], json!("urgent"));
            assert_eq!(row["due_date"], json!("2023-11-16T02:00:00.000Z"));
        }
        other => panic!("unexpected op {other:?}"),
    }
}

#[test]
fn add_with_blank_title_is_a_noop() {
    let (mut store, receiver, _) = new_store();
    add(&mut store, "Keep", ColumnId::Todo);
    receiver.try_iter().count();

    assert!(store
        .add("", ColumnId::Todo, None, Priority::Medium, None)
        .is_none());
    assert!(store
        .add("   \t", ColumnId::Todo, None, Priority::Medium, None)
        .is_none());
    assert_eq!(store.column_len(ColumnId::Todo), 1);
    assert_eq!(receiver.try_iter().count(), 0);
}

#[test]
fn add_order_follows_max_not_count() {
    let (mut store, _receiver, _) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    add(&mut store, "B", ColumnId::Todo);
    add(&mut store, "C", ColumnId::Todo);
    assert!(store.move_to_column(&a.id, ColumnId::Completed, 0));

    // Source column keeps B1 C2, so the next append is 3.
    let d = add(&mut store, "D", ColumnId::Todo);
    assert_eq!(d.order, 3);
}

#[test]
fn reorder_moves_last_task_to_front() {
    let (mut store, receiver, _) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    add(&mut store, "B", ColumnId::Todo);
    let c = add(&mut store, "C", ColumnId::Todo);
    receiver.try_iter().count();

    assert!(store.reorder_within_column(ColumnId::Todo, &c.id, &a.id));
    assert_eq!(
        titles_with_order(&store, ColumnId::Todo),
        pairs(&[("C", 0), ("A", 1), ("B", 2)])
    );

    let updated: Vec<SyncIntent> = receiver.try_iter().collect();
    assert_eq!(updated.len(), 3);
    assert!(updated
        .iter()
        .all(|intent| matches!(intent.op, SyncOp::Update { .. })));
}

#[test]
fn reorder_only_writes_tasks_whose_order_changed() {
    let (mut store, receiver, _) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    let b = add(&mut store, "B", ColumnId::Todo);
    add(&mut store, "C", ColumnId::Todo);
    receiver.try_iter().count();

    assert!(store.reorder_within_column(ColumnId::Todo, &a.id, &b.id));
    assert_eq!(
        titles_with_order(&store, ColumnId::Todo),
        pairs(&[("B", 0), ("A", 1), ("C", 2)])
    );
    let written: Vec<String> = receiver
        .try_iter()
        .filter_map(|intent| intent.target_id().map(str::to_string))
        .collect();
    assert_eq!(written.len(), 2);
    assert!(written.contains(&a.id));
    assert!(written.contains(&b.id));
}

#[test]
fn reorder_rejects_same_id_and_foreign_column() {
    let (mut store, receiver, _) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    let x = add(&mut store, "X", ColumnId::InProgress);
    receiver.try_iter().count();

    assert!(!store.reorder_within_column(ColumnId::Todo, &a.id, &a.id));
    assert!(!store.reorder_within_column(ColumnId::Todo, &a.id, &x.id));
    assert!(!store.reorder_within_column(ColumnId::Todo, "missing", &a.id));
    assert_eq!(receiver.try_iter().count(), 0);
}

#[test]
fn move_to_column_inserts_at_index_and_renumbers_target() {
    let (mut store, receiver, clock) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    add(&mut store, "X", ColumnId::InProgress);
    add(&mut store, "Y", ColumnId::InProgress);
    receiver.try_iter().count();
    clock.advance(5_000);

    assert!(store.move_to_column(&a.id, ColumnId::InProgress, 0));
    assert_eq!(
        titles_with_order(&store, ColumnId::InProgress),
        pairs(&[("A", 0), ("X", 1), ("Y", 2)])
    );
    let moved = store.get(&a.id).unwrap();
    assert_eq!(moved.column_id, ColumnId::InProgress);
    assert_eq!(moved.updated_at, moved.created_at + 5_000);
    assert_eq!(store.column_len(ColumnId::Todo), 0);

    let intents: Vec<SyncIntent> = receiver.try_iter().collect();
    assert_eq!(intents.len(), 3);
    let moved_write = intents
        .iter()
        .find(|intent| intent.target_id() == Some(a.id.as_str()))
        .unwrap();
    match &moved_write.op {
        SyncOp::Update { patch, .. } => {
            assert_eq!(patch["column_id"], json!("in-progress"));
            assert_eq!(patch["sort_order"], json!(0));
        }
        other => panic!("unexpected op {other:?}"),
    }
}

#[test]
fn move_to_end_of_column_writes_only_the_moved_task() {
    let (mut store, receiver, _) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    add(&mut store, "X", ColumnId::Completed);
    receiver.try_iter().count();

    assert!(store.move_to_column(&a.id, ColumnId::Completed, 99));
    assert_eq!(
        titles_with_order(&store, ColumnId::Completed),
        pairs(&[("X", 0), ("A", 1)])
    );
    assert_eq!(receiver.try_iter().count(), 1);
}

#[test]
fn move_of_unknown_task_is_a_noop() {
    let (mut store, receiver, _) = new_store();
    add(&mut store, "A", ColumnId::Todo);
    receiver.try_iter().count();

    assert!(!store.move_to_column("missing", ColumnId::Completed, 0));
    assert_eq!(receiver.try_iter().count(), 0);
}

#[test]
fn update_merges_fields_and_writes_only_changed_columns() {
    let (mut store, receiver, clock) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    receiver.try_iter().count();
    clock.advance(10);

    let patch = TaskPatch {
        title: Some("  Renamed ".to_string()),
        description: Some(Some("   ".to_string())),
        ..TaskPatch::default()
    };
    assert!(store.update(&a.id, patch));

    let task = store.get(&a.id).unwrap();
    assert_eq!(task.title, "Renamed");
    assert_eq!(task.description, None);
    assert_eq!(task.updated_at, a.created_at + 10);

    let intents: Vec<SyncIntent> = receiver.try_iter().collect();
    assert_eq!(intents.len(), 1);
    match &intents[0].op {
        SyncOp::Update { id, patch } => {
            assert_eq!(id, &a.id);
            assert_eq!(patch["title"], json!("Renamed"));
            assert_eq!(patch["description"], json!(null));
            assert!(!patch.contains_key("priority"));
            assert!(patch.contains_key("updated_at"));
        }
        other => panic!("unexpected op {other:?}"),
    }

    assert!(!store.update("missing", TaskPatch::priority(Priority::High)));
}

#[test]
fn delete_removes_task_and_emits_delete() {
    let (mut store, receiver, _) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    receiver.try_iter().count();

    assert!(store.delete(&a.id));
    assert!(!store.delete(&a.id));
    assert!(store.get(&a.id).is_none());

    let intents: Vec<SyncIntent> = receiver.try_iter().collect();
    assert_eq!(intents.len(), 1);
    assert!(matches!(&intents[0].op, SyncOp::Delete { id } if id == &a.id));
}

#[test]
fn column_projection_applies_sort_and_filter() {
    let (mut store, _receiver, _) = new_store();
    store
        .add("Low", ColumnId::Todo, None, Priority::Low, Some(3))
        .unwrap();
    store
        .add("Urgent", ColumnId::Todo, None, Priority::Urgent, None)
        .unwrap();
    store
        .add("High", ColumnId::Todo, None, Priority::High, Some(1))
        .unwrap();

    let by_priority: Vec<String> = store
        .column(ColumnId::Todo, SortBy::Priority, None)
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(by_priority, vec!["Urgent", "High", "Low"]);

    let by_due: Vec<String> = store
        .column(ColumnId::Todo, SortBy::DueDate, None)
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(by_due, vec!["High", "Low", "Urgent"]);

    let only_low = store.column(ColumnId::Todo, SortBy::Manual, Some(Priority::Low));
    assert_eq!(only_low.len(), 1);
    assert_eq!(only_low[0].title, "Low");
}
