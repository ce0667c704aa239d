use std::sync::mpsc::Receiver;
use std::sync::Arc;
use vibeboard_core::{
    ColumnId, DragController, DragOutcome, DragState, ManualClock, Priority, Session, SortBy,
    SyncIntent, SyncOutbox, Task, TaskStore, User,
};

fn new_store() -> (TaskStore, Receiver<SyncIntent>) {
    let (outbox, receiver) = SyncOutbox::channel();
    let user = User {
        id: "owner-1".to_string(),
        email: "owner@example.com".to_string(),
    };
    let session = Session::new(user, outbox, Arc::new(ManualClock::new(10_000)));
    (TaskStore::new(session), receiver)
}

fn add(store: &mut TaskStore, title: &str, column_id: ColumnId) -> Task {
    store
        .add(title, column_id, None, Priority::Medium, None)
        .unwrap()
}

fn titles(store: &TaskStore, column_id: ColumnId) -> Vec<String> {
    store
        .column(column_id, SortBy::Manual, None)
        .into_iter()
        .map(|task| task.title)
        .collect()
}

#[test]
fn drag_start_requires_known_task() {
    let (mut store, _receiver) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    let mut drag = DragController::new();

    assert!(!drag.drag_start(&store, "missing"));
    assert_eq!(drag.state(), &DragState::Idle);

    assert!(drag.drag_start(&store, &a.id));
    assert_eq!(drag.active_id(), Some(a.id.as_str()));
}

#[test]
fn drag_over_column_appends_to_that_column() {
    let (mut store, _receiver) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    add(&mut store, "X", ColumnId::InProgress);
    let mut drag = DragController::new();
    drag.drag_start(&store, &a.id);

    let outcome = drag.drag_over(&mut store, &a.id, ColumnId::InProgress.as_str());
    assert_eq!(outcome, DragOutcome::Moved);
    assert_eq!(titles(&store, ColumnId::InProgress), vec!["X", "A"]);
    assert_eq!(store.column_len(ColumnId::Todo), 0);
}

#[test]
fn drag_over_task_in_other_column_takes_its_index() {
    let (mut store, _receiver) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    add(&mut store, "X", ColumnId::Completed);
    let y = add(&mut store, "Y", ColumnId::Completed);
    let mut drag = DragController::new();
    drag.drag_start(&store, &a.id);

    assert_eq!(drag.drag_over(&mut store, &a.id, &y.id), DragOutcome::Moved);
    assert_eq!(titles(&store, ColumnId::Completed), vec!["X", "A", "Y"]);
}

#[test]
fn drag_over_same_column_or_while_idle_does_nothing() {
    let (mut store, receiver) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    let b = add(&mut store, "B", ColumnId::Todo);
    receiver.try_iter().count();
    let mut drag = DragController::new();

    assert_eq!(
        drag.drag_over(&mut store, &a.id, ColumnId::Completed.as_str()),
        DragOutcome::Ignored
    );

    drag.drag_start(&store, &a.id);
    assert_eq!(drag.drag_over(&mut store, &a.id, &b.id), DragOutcome::Ignored);
    assert_eq!(
        drag.drag_over(&mut store, &a.id, ColumnId::Todo.as_str()),
        DragOutcome::Ignored
    );
    assert_eq!(receiver.try_iter().count(), 0);
}

#[test]
fn drag_end_reorders_within_column_and_returns_to_idle() {
    let (mut store, _receiver) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    add(&mut store, "B", ColumnId::Todo);
    let c = add(&mut store, "C", ColumnId::Todo);
    let mut drag = DragController::new();
    drag.drag_start(&store, &c.id);

    let outcome = drag.drag_end(&mut store, &c.id, Some(a.id.as_str()));
    assert_eq!(outcome, DragOutcome::Reordered);
    assert_eq!(titles(&store, ColumnId::Todo), vec!["C", "A", "B"]);
    assert_eq!(drag.state(), &DragState::Idle);
}

#[test]
fn drag_end_on_self_or_nothing_never_mutates() {
    let (mut store, receiver) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    add(&mut store, "B", ColumnId::Todo);
    receiver.try_iter().count();
    let before = store.tasks().to_vec();
    let mut drag = DragController::new();

    drag.drag_start(&store, &a.id);
    assert_eq!(drag.drag_end(&mut store, &a.id, Some(a.id.as_str())), DragOutcome::Ignored);
    drag.drag_start(&store, &a.id);
    assert_eq!(drag.drag_end(&mut store, &a.id, None), DragOutcome::Ignored);

    assert_eq!(store.tasks(), before.as_slice());
    assert_eq!(receiver.try_iter().count(), 0);
    assert_eq!(drag.state(), &DragState::Idle);
}

#[test]
fn drag_end_never_moves_across_columns() {
    let (mut store, receiver) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    let x = add(&mut store, "X", ColumnId::Completed);
    receiver.try_iter().count();
    let mut drag = DragController::new();
    drag.drag_start(&store, &a.id);

    assert_eq!(drag.drag_end(&mut store, &a.id, Some(x.id.as_str())), DragOutcome::Ignored);
    assert_eq!(
        drag.drag_end(&mut store, &a.id, Some(ColumnId::Completed.as_str())),
        DragOutcome::Ignored
    );
    assert_eq!(store.get(&a.id).unwrap().column_id, ColumnId::Todo);
    assert_eq!(receiver.try_iter().count(), 0);
}

#[test]
fn full_gesture_moves_then_reorders() {
    let (mut store, _receiver) = new_store();
    let a = add(&mut store, "A", ColumnId::Todo);
    let x = add(&mut store, "X", ColumnId::InProgress);
    add(&mut store, "Y", ColumnId::InProgress);
    let mut drag = DragController::new();

    drag.drag_start(&store, &a.id);
    assert_eq!(
        drag.drag_over(&mut store, &a.id, ColumnId::InProgress.as_str()),
        DragOutcome::Moved
    );
    assert_eq!(drag.drag_end(&mut store, &a.id, Some(x.id.as_str())), DragOutcome::Reordered);
    assert_eq!(titles(&store, ColumnId::InProgress), vec!["A", "X", "Y"]);
    drag.drag_cancel();
    assert!(drag.active_id().is_none());
}
