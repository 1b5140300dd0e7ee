//! Tests for MoveService (insert-then-delete relocation of tasks)

use std::sync::Arc;

use gtask::application::services::{MoveService, MoveStep, TaskListService};
use gtask::application::ApplicationError;
use gtask::config::Settings;
use gtask::domain::DomainError;
use gtask::infrastructure::traits::Visibility;
use gtask::infrastructure::RemoteError;
use gtask::util::testing::{init_test_setup, Call, InMemoryTaskService};

fn move_service(fake: &Arc<InMemoryTaskService>, settings: Settings) -> MoveService {
    init_test_setup();
    let lists = TaskListService::new(fake.clone(), Arc::new(settings));
    MoveService::new(fake.clone(), lists)
}

fn two_lists(source_titles: &[&str]) -> Arc<InMemoryTaskService> {
    Arc::new(
        InMemoryTaskService::new()
            .with_list("X", "Inbox", source_titles)
            .with_list("Y", "Archive", &["Old"]),
    )
}

#[test]
fn given_source_with_tasks_when_moving_then_destination_receives_all_and_source_is_empty() {
    // Arrange
    let fake = two_lists(&["Buy milk", "Walk dog"]);
    let service = move_service(&fake, Settings::default());

    // Act
    let report = service.move_named("Inbox", "Archive").unwrap();

    // Assert
    assert_eq!(report.count(), 2);
    assert!(fake.titles_in("X").is_empty());
    assert_eq!(fake.titles_in("Y"), vec!["Old", "Buy milk", "Walk dog"]);
}

#[test]
fn given_source_with_tasks_when_moving_then_each_insert_precedes_its_delete() {
    let fake = two_lists(&["Buy milk", "Walk dog"]);
    let service = move_service(&fake, Settings::default());

    service.move_tasks("X", "Y").unwrap();

    let mutations: Vec<Call> = fake
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Insert { .. } | Call::Delete { .. }))
        .collect();
    assert_eq!(
        mutations,
        vec![
            Call::Insert {
                list_id: "Y".into(),
                title: "Buy milk".into()
            },
            Call::Delete {
                list_id: "X".into(),
                task_id: "X-1".into()
            },
            Call::Insert {
                list_id: "Y".into(),
                title: "Walk dog".into()
            },
            Call::Delete {
                list_id: "X".into(),
                task_id: "X-2".into()
            },
        ]
    );
}

#[test]
fn given_moved_tasks_when_reporting_then_old_and_new_ids_are_recorded() {
    let fake = two_lists(&["Buy milk"]);
    let service = move_service(&fake, Settings::default());

    let report = service.move_tasks("X", "Y").unwrap();

    let moved = &report.moved[0];
    assert_eq!(moved.title, "Buy milk");
    assert_eq!(moved.old_id, "X-1");
    assert_eq!(moved.new_id, "new-1");
}

#[test]
fn given_empty_source_when_moving_then_no_mutations_are_issued() {
    let fake = two_lists(&[]);
    let service = move_service(&fake, Settings::default());

    let report = service.move_named("Inbox", "Archive").unwrap();

    assert_eq!(report.count(), 0);
    assert_eq!(fake.mutation_count(), 0);
    assert_eq!(fake.titles_in("Y"), vec!["Old"]);
}

#[test]
fn given_task_fields_when_moving_then_fields_are_carried_over() {
    let fake = two_lists(&["Buy milk"]);
    let service = move_service(&fake, Settings::default());

    service.move_tasks("X", "Y").unwrap();

    let copied = fake.tasks_of("Y").pop().unwrap();
    assert_eq!(copied.title, "Buy milk");
    assert_eq!(copied.field_str("status"), Some("needsAction"));
    assert_ne!(copied.id.as_deref(), Some("X-1"));
}

#[test]
fn given_more_tasks_than_one_page_when_moving_then_every_task_is_moved() {
    // Arrange: 130 tasks, more than one page of the default size
    let titles: Vec<String> = (1..=130).map(|n| format!("Task {n}")).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let fake = two_lists(&refs);
    let service = move_service(&fake, Settings::default());

    // Act
    let report = service.move_tasks("X", "Y").unwrap();

    // Assert
    assert_eq!(report.count(), 130);
    assert!(fake.titles_in("X").is_empty());
    assert_eq!(fake.titles_in("Y").len(), 131);
}

#[test]
fn given_small_page_size_when_moving_then_listing_completes_before_first_delete() {
    let fake = two_lists(&["a", "b", "c", "d", "e"]);
    let settings = Settings {
        tasks_page_size: 2,
        ..Settings::default()
    };
    let service = move_service(&fake, settings);

    let report = service.move_tasks("X", "Y").unwrap();

    assert_eq!(report.count(), 5);
    let calls = fake.calls();
    let last_listing = calls
        .iter()
        .rposition(|c| matches!(c, Call::ListTasks { .. }))
        .unwrap();
    let first_mutation = calls
        .iter()
        .position(|c| matches!(c, Call::Insert { .. }))
        .unwrap();
    assert!(last_listing < first_mutation);
}

#[test]
fn given_insert_failure_when_moving_then_earlier_tasks_stay_moved_and_later_ones_stay_put() {
    // Arrange
    let fake = two_lists(&["a", "b", "c"]);
    fake.fail_insert_of("b");
    let service = move_service(&fake, Settings::default());

    // Act
    let err = service.move_tasks("X", "Y").unwrap_err();

    // Assert
    match err {
        ApplicationError::MoveInterrupted {
            moved,
            task_title,
            step,
            source,
        } => {
            assert_eq!(moved, 1);
            assert_eq!(task_title, "b");
            assert_eq!(step, MoveStep::Insert);
            assert!(matches!(source, RemoteError::Status { code: 500, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fake.titles_in("X"), vec!["b", "c"]);
    assert_eq!(fake.titles_in("Y"), vec!["Old", "a"]);
}

#[test]
fn given_delete_failure_when_moving_then_task_exists_in_both_lists() {
    let fake = two_lists(&["a", "b", "c"]);
    fake.fail_delete_of("b");
    let service = move_service(&fake, Settings::default());

    let err = service.move_tasks("X", "Y").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::MoveInterrupted {
            moved: 1,
            step: MoveStep::Delete,
            ..
        }
    ));
    assert_eq!(fake.titles_in("X"), vec!["b", "c"]);
    assert_eq!(fake.titles_in("Y"), vec!["Old", "a", "b"]);
}

#[test]
fn given_unknown_destination_when_moving_then_nothing_is_mutated() {
    let fake = two_lists(&["a"]);
    let service = move_service(&fake, Settings::default());

    let err = service.move_named("Inbox", "Nowhere").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::ListNotFound { ref name }) if name == "Nowhere"
    ));
    assert_eq!(fake.mutation_count(), 0);
    assert_eq!(fake.titles_in("X"), vec!["a"]);
}

#[test]
fn given_unknown_source_when_moving_then_destination_is_not_resolved() {
    let fake = two_lists(&["a"]);
    let service = move_service(&fake, Settings::default());

    let err = service.move_named("Nowhere", "Archive").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::ListNotFound { ref name }) if name == "Nowhere"
    ));
    assert_eq!(fake.mutation_count(), 0);
}

#[test]
fn given_same_source_and_destination_when_moving_then_same_list_error() {
    let fake = two_lists(&["a"]);
    let service = move_service(&fake, Settings::default());

    let err = service.move_named("Inbox", "Inbox").unwrap_err();

    assert!(matches!(err, ApplicationError::SameList { .. }));
    assert_eq!(fake.mutation_count(), 0);
    assert_eq!(fake.titles_in("X"), vec!["a"]);
}

#[test]
fn given_hidden_completed_task_when_moving_then_it_is_moved_too() {
    // Arrange: "Filed taxes" was completed and cleared in another app
    let fake = Arc::new(
        InMemoryTaskService::new()
            .with_list("X", "Inbox", &["Buy milk"])
            .with_hidden_task("X", "Filed taxes")
            .with_list("Y", "Archive", &[]),
    );
    let service = move_service(&fake, Settings::default());

    // Act
    let report = service.move_named("Inbox", "Archive").unwrap();

    // Assert
    assert_eq!(report.count(), 2);
    assert!(fake.titles_in("X").is_empty());
    assert_eq!(fake.titles_in("Y"), vec!["Buy milk", "Filed taxes"]);
    let copied = fake.tasks_of("Y").pop().unwrap();
    assert_eq!(copied.field_str("status"), Some("completed"));
    assert!(fake.calls().iter().all(|c| match c {
        Call::ListTasks { visibility, .. } => *visibility == Visibility::All,
        _ => true,
    }));
}
