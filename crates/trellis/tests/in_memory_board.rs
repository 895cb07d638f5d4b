//! Integration tests for in-memory board storage.
//!
//! These tests verify the full functionality of the in-memory backend:
//! initiative CRUD, dependency management with cycle rejection, blocking
//! semantics, rule evaluation, and board bootstrap.

use chrono::NaiveDate;
use std::collections::HashSet;
use trellis::domain::{
    DependencyEdge, InitiativeFilter, InitiativeId, InitiativeStatus, InitiativeUpdate,
    NewInitiative, RagStatus, RuleId, TeamId, UserId,
};
use trellis::error::Error;
use trellis::rules::{TodoRule, Trigger, TriggerKind};
use trellis::storage::{BoardStorage, LoadWarning, new_in_memory_board};

fn create_test_initiative(title: &str) -> NewInitiative {
    NewInitiative {
        title: title.to_string(),
        description: "Test description".to_string(),
        external_url: None,
        team: None,
        project: None,
        status: InitiativeStatus::Upcoming,
        rag_status: None,
        expected_date: None,
    }
}

fn create_test_initiative_for_team(title: &str, team: &str) -> NewInitiative {
    NewInitiative {
        team: Some(TeamId::new(team)),
        ..create_test_initiative(title)
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ========== Basic CRUD Tests ==========

#[tokio::test]
async fn test_create_initiative() {
    let mut board = new_in_memory_board("test".to_string());

    let initiative = board
        .create(create_test_initiative("Checkout revamp"))
        .await
        .unwrap();

    assert!(initiative.id.as_str().starts_with("test-"));
    assert_eq!(initiative.title, "Checkout revamp");
    assert_eq!(initiative.status, InitiativeStatus::Upcoming);
    assert!(initiative.rag_status.is_none());
}

#[tokio::test]
async fn test_create_rejects_blank_title() {
    let mut board = new_in_memory_board("test".to_string());

    let err = board
        .create(create_test_initiative("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}

#[tokio::test]
async fn test_get_initiative() {
    let mut board = new_in_memory_board("test".to_string());

    let created = board
        .create(create_test_initiative("Checkout revamp"))
        .await
        .unwrap();

    let retrieved = board.get(&created.id).await.unwrap();
    assert!(retrieved.is_some());
    assert_eq!(retrieved.unwrap().title, "Checkout revamp");

    let non_existing = board
        .get(&InitiativeId::new("test-nonexistent"))
        .await
        .unwrap();
    assert!(non_existing.is_none());
}

#[tokio::test]
async fn test_update_records_the_transition() {
    let mut board = new_in_memory_board("test".to_string());

    let created = board
        .create(create_test_initiative("Checkout revamp"))
        .await
        .unwrap();

    let updates = InitiativeUpdate {
        status: Some(InitiativeStatus::InProgress),
        rag_status: Some(Some(RagStatus::Green)),
        ..Default::default()
    };

    let outcome = board.update(&created.id, updates).await.unwrap();
    assert_eq!(outcome.initiative.status, InitiativeStatus::InProgress);
    assert_eq!(outcome.initiative.rag_status, Some(RagStatus::Green));

    assert_eq!(outcome.change.before.status, InitiativeStatus::Upcoming);
    assert_eq!(outcome.change.after.status, InitiativeStatus::InProgress);
    assert_eq!(outcome.change.before.rag_status, None);
    assert_eq!(outcome.change.after.rag_status, Some(RagStatus::Green));
    assert!(outcome.change.status_changed());
}

#[tokio::test]
async fn test_update_clears_optional_fields() {
    let mut board = new_in_memory_board("test".to_string());

    let mut new_initiative = create_test_initiative("Checkout revamp");
    new_initiative.expected_date = Some(date(2026, 9, 1));
    let created = board.create(new_initiative).await.unwrap();

    let updates = InitiativeUpdate {
        expected_date: Some(None),
        ..Default::default()
    };

    let outcome = board.update(&created.id, updates).await.unwrap();
    assert_eq!(outcome.initiative.expected_date, None);
    assert_eq!(outcome.change.before.expected_date, Some(date(2026, 9, 1)));
    assert_eq!(outcome.change.after.expected_date, None);
}

#[tokio::test]
async fn test_update_missing_initiative() {
    let mut board = new_in_memory_board("test".to_string());

    let err = board
        .update(
            &InitiativeId::new("test-nonexistent"),
            InitiativeUpdate::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InitiativeNotFound(_)));
}

#[tokio::test]
async fn test_delete_initiative() {
    let mut board = new_in_memory_board("test".to_string());

    let created = board
        .create(create_test_initiative("To delete"))
        .await
        .unwrap();

    board.delete(&created.id).await.unwrap();
    assert!(board.get(&created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_with_dependents() {
    let mut board = new_in_memory_board("test".to_string());

    let blocked = board.create(create_test_initiative("Blocked")).await.unwrap();
    let blocker = board.create(create_test_initiative("Blocker")).await.unwrap();
    board.add_dependency(&blocked.id, &blocker.id).await.unwrap();

    let err = board.delete(&blocker.id).await.unwrap_err();
    match err {
        Error::HasDependents {
            dependent_count,
            dependents,
            ..
        } => {
            assert_eq!(dependent_count, 1);
            assert_eq!(dependents, vec![blocked.id.clone()]);
        }
        other => panic!("expected HasDependents, got: {:?}", other),
    }

    // Removing the edge unblocks deletion
    board
        .remove_dependency(&blocked.id, &blocker.id)
        .await
        .unwrap();
    board.delete(&blocker.id).await.unwrap();
}

// ========== Dependency Tests ==========

#[tokio::test]
async fn test_add_dependency_and_queries() {
    let mut board = new_in_memory_board("test".to_string());

    let a = board.create(create_test_initiative("A")).await.unwrap();
    let b = board.create(create_test_initiative("B")).await.unwrap();

    board.add_dependency(&a.id, &b.id).await.unwrap();

    assert_eq!(board.dependencies(&a.id).await.unwrap(), vec![b.id.clone()]);
    assert_eq!(
        board.dependents(&b.id).await.unwrap(),
        HashSet::from([a.id.clone()])
    );
    assert!(board.dependents(&a.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_dependency_missing_initiative() {
    let mut board = new_in_memory_board("test".to_string());

    let a = board.create(create_test_initiative("A")).await.unwrap();

    let err = board
        .add_dependency(&a.id, &InitiativeId::new("test-ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InitiativeNotFound(_)));
}

#[tokio::test]
async fn test_self_dependency_rejected() {
    let mut board = new_in_memory_board("test".to_string());

    let a = board.create(create_test_initiative("A")).await.unwrap();

    let err = board.add_dependency(&a.id, &a.id).await.unwrap_err();
    assert!(matches!(err, Error::SelfDependency { .. }));
}

#[tokio::test]
async fn test_duplicate_dependency_rejected() {
    let mut board = new_in_memory_board("test".to_string());

    let a = board.create(create_test_initiative("A")).await.unwrap();
    let b = board.create(create_test_initiative("B")).await.unwrap();

    board.add_dependency(&a.id, &b.id).await.unwrap();
    let err = board.add_dependency(&a.id, &b.id).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateDependency { .. }));
}

#[tokio::test]
async fn test_reverse_edge_rejected_as_cycle() {
    let mut board = new_in_memory_board("test".to_string());

    let a = board.create(create_test_initiative("A")).await.unwrap();
    let b = board.create(create_test_initiative("B")).await.unwrap();

    board.add_dependency(&a.id, &b.id).await.unwrap();
    let err = board.add_dependency(&b.id, &a.id).await.unwrap_err();
    assert!(matches!(err, Error::CircularDependency { .. }));
}

#[tokio::test]
async fn test_chain_cycle_rejected_unrelated_edge_allowed() {
    let mut board = new_in_memory_board("test".to_string());

    let a = board.create(create_test_initiative("A")).await.unwrap();
    let b = board.create(create_test_initiative("B")).await.unwrap();
    let c = board.create(create_test_initiative("C")).await.unwrap();
    let d = board.create(create_test_initiative("D")).await.unwrap();

    board.add_dependency(&a.id, &b.id).await.unwrap();
    board.add_dependency(&b.id, &c.id).await.unwrap();

    let err = board.add_dependency(&c.id, &a.id).await.unwrap_err();
    assert!(matches!(err, Error::CircularDependency { .. }));

    // An initiative outside the chain can still depend on its head
    board.add_dependency(&d.id, &a.id).await.unwrap();
}

#[tokio::test]
async fn test_remove_dependency_is_idempotent() {
    let mut board = new_in_memory_board("test".to_string());

    let a = board.create(create_test_initiative("A")).await.unwrap();
    let b = board.create(create_test_initiative("B")).await.unwrap();

    board.add_dependency(&a.id, &b.id).await.unwrap();

    board.remove_dependency(&a.id, &b.id).await.unwrap();
    assert!(board.dependencies(&a.id).await.unwrap().is_empty());

    // Second removal of the same edge is a no-op, not an error
    board.remove_dependency(&a.id, &b.id).await.unwrap();
}

// ========== Blocking Tests ==========

#[tokio::test]
async fn test_is_blocked_flips_with_dependency_status() {
    let mut board = new_in_memory_board("test".to_string());

    let a = board.create(create_test_initiative("A")).await.unwrap();
    let b = board.create(create_test_initiative("B")).await.unwrap();
    board.add_dependency(&a.id, &b.id).await.unwrap();

    assert!(board.is_blocked(&a.id).await.unwrap());
    assert!(!board.is_blocked(&b.id).await.unwrap());

    // Finishing the last blocking dependency unblocks without any edge
    // mutation.
    let updates = InitiativeUpdate {
        status: Some(InitiativeStatus::Done),
        ..Default::default()
    };
    board.update(&b.id, updates).await.unwrap();

    assert!(!board.is_blocked(&a.id).await.unwrap());
}

#[tokio::test]
async fn test_blocked_initiatives_summary() {
    let mut board = new_in_memory_board("test".to_string());

    let a = board.create(create_test_initiative("A")).await.unwrap();
    let b = board.create(create_test_initiative("B")).await.unwrap();
    let c = board.create(create_test_initiative("C")).await.unwrap();
    board.add_dependency(&a.id, &b.id).await.unwrap();
    board.add_dependency(&a.id, &c.id).await.unwrap();

    let updates = InitiativeUpdate {
        status: Some(InitiativeStatus::Done),
        ..Default::default()
    };
    board.update(&b.id, updates).await.unwrap();

    let blocked = board.blocked_initiatives().await.unwrap();
    assert_eq!(blocked.len(), 1);

    let (initiative, blockers) = &blocked[0];
    assert_eq!(initiative.id, a.id);
    assert_eq!(blockers.len(), 1);
    assert_eq!(blockers[0].id, c.id);
}

// ========== List Tests ==========

#[tokio::test]
async fn test_list_filters_by_team_and_status() {
    let mut board = new_in_memory_board("test".to_string());

    board
        .create(create_test_initiative_for_team("Payments audit", "payments"))
        .await
        .unwrap();
    let growth = board
        .create(create_test_initiative_for_team("Signup flow", "growth"))
        .await
        .unwrap();
    board
        .create(create_test_initiative_for_team("Churn review", "growth"))
        .await
        .unwrap();

    let updates = InitiativeUpdate {
        status: Some(InitiativeStatus::InProgress),
        ..Default::default()
    };
    board.update(&growth.id, updates).await.unwrap();

    let filter = InitiativeFilter {
        team: Some(TeamId::new("growth")),
        ..Default::default()
    };
    assert_eq!(board.list(&filter).await.unwrap().len(), 2);

    let filter = InitiativeFilter {
        team: Some(TeamId::new("growth")),
        status: Some(InitiativeStatus::InProgress),
        ..Default::default()
    };
    let matches = board.list(&filter).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, growth.id);

    let filter = InitiativeFilter {
        limit: Some(2),
        ..Default::default()
    };
    assert_eq!(board.list(&filter).await.unwrap().len(), 2);
}

// ========== Rule Tests ==========

#[tokio::test]
async fn test_rules_end_to_end() {
    let mut board = new_in_memory_board("test".to_string());
    let owner = UserId::new("ana");

    let launch = board.create(create_test_initiative("Launch")).await.unwrap();

    board
        .add_rule(TodoRule {
            id: RuleId::new("rule-deadline"),
            owner: owner.clone(),
            trigger: Trigger::DeadlineMissing,
            suggested_body: "Set an expected date for {title}".to_string(),
            suggested_deadline_days: 2,
            is_active: true,
        })
        .await
        .unwrap();

    let updates = InitiativeUpdate {
        status: Some(InitiativeStatus::InProgress),
        ..Default::default()
    };
    let outcome = board.update(&launch.id, updates).await.unwrap();

    let today = date(2026, 8, 7);
    let suggestions = board
        .evaluate_change(&owner, &outcome.change, today)
        .await
        .unwrap();

    assert_eq!(suggestions.len(), 1);
    let suggestion = &suggestions[0];
    assert!(suggestion.body.contains("Launch"));
    assert_eq!(suggestion.body, "Set an expected date for Launch");
    assert_eq!(suggestion.deadline, date(2026, 8, 9));
    assert_eq!(suggestion.source, TriggerKind::DeadlineMissing);
    assert_eq!(suggestion.initiative_id, launch.id);
}

#[tokio::test]
async fn test_active_rules_excludes_inactive_and_foreign_owners() {
    let mut board = new_in_memory_board("test".to_string());
    let ana = UserId::new("ana");
    let bo = UserId::new("bo");

    board
        .add_rule(TodoRule {
            id: RuleId::new("rule-1"),
            owner: ana.clone(),
            trigger: Trigger::MovedToDone,
            suggested_body: "Announce {title}".to_string(),
            suggested_deadline_days: 1,
            is_active: true,
        })
        .await
        .unwrap();
    board
        .add_rule(TodoRule {
            id: RuleId::new("rule-2"),
            owner: ana.clone(),
            trigger: Trigger::DeadlineMissing,
            suggested_body: "Plan {title}".to_string(),
            suggested_deadline_days: 1,
            is_active: false,
        })
        .await
        .unwrap();

    let active = board.active_rules(&ana).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, RuleId::new("rule-1"));

    assert!(board.active_rules(&bo).await.unwrap().is_empty());

    board.remove_rule(&ana, &RuleId::new("rule-1")).await.unwrap();
    assert!(board.active_rules(&ana).await.unwrap().is_empty());
}

// ========== Bootstrap Tests ==========

#[tokio::test]
async fn test_import_board_reconstructs_edges_and_reports_skips() {
    let mut seed = new_in_memory_board("seed".to_string());
    let a = seed.create(create_test_initiative("A")).await.unwrap();
    let b = seed.create(create_test_initiative("B")).await.unwrap();
    let c = seed.create(create_test_initiative("C")).await.unwrap();

    let edge = |from: &InitiativeId, to: &InitiativeId| DependencyEdge {
        initiative_id: from.clone(),
        dependency_id: to.clone(),
    };

    let mut board = new_in_memory_board("test".to_string());
    let warnings = board
        .import_board(
            vec![a.clone(), b.clone(), c.clone()],
            vec![
                edge(&a.id, &b.id),
                edge(&b.id, &c.id),
                // Each of these must be skipped with a warning:
                edge(&a.id, &b.id),
                edge(&a.id, &a.id),
                edge(&c.id, &a.id),
                edge(&a.id, &InitiativeId::new("seed-ghost")),
            ],
        )
        .await
        .unwrap();

    assert_eq!(warnings.len(), 4);
    assert!(warnings.iter().any(|w| matches!(
        w,
        LoadWarning::DuplicateDependency { .. }
    )));
    assert!(warnings
        .iter()
        .any(|w| matches!(w, LoadWarning::SelfDependency { .. })));
    assert!(warnings.iter().any(|w| matches!(
        w,
        LoadWarning::CircularDependency { .. }
    )));
    assert!(warnings.iter().any(|w| matches!(
        w,
        LoadWarning::MissingInitiative { .. }
    )));

    // The healthy part of the board loaded
    assert_eq!(board.dependencies(&a.id).await.unwrap(), vec![b.id.clone()]);
    assert_eq!(board.dependencies(&b.id).await.unwrap(), vec![c.id.clone()]);
    assert!(board.is_blocked(&a.id).await.unwrap());
}
