//! Transition matching and suggestion construction.

use super::{TodoRule, TodoSuggestion, Trigger, TriggerKind};
use crate::domain::{InitiativeChange, InitiativeStatus};
use crate::graph::DependencyGraph;
use chrono::{Days, NaiveDate};

impl Trigger {
    /// The bare kind of this trigger.
    #[must_use]
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::RagStatusChanged { .. } => TriggerKind::RagStatusChanged,
            Self::StatusChanged { .. } => TriggerKind::StatusChanged,
            Self::DeadlineChanged => TriggerKind::DeadlineChanged,
            Self::DeadlineOverdue => TriggerKind::DeadlineOverdue,
            Self::DeadlineMissing => TriggerKind::DeadlineMissing,
            Self::NoRagSet => TriggerKind::NoRagSet,
            Self::StatusChangedNotifyDependents => TriggerKind::StatusChangedNotifyDependents,
            Self::MovedToDone => TriggerKind::MovedToDone,
            Self::Unknown => TriggerKind::Unknown,
        }
    }

    /// Whether this trigger's condition holds for the recorded transition.
    ///
    /// `today` is the injected evaluation date; `graph` answers the
    /// dependent lookup for [`Trigger::StatusChangedNotifyDependents`].
    #[must_use]
    pub fn matches(
        &self,
        change: &InitiativeChange,
        today: NaiveDate,
        graph: &DependencyGraph,
    ) -> bool {
        match self {
            Self::RagStatusChanged {
                trigger_from,
                trigger_to,
            } => {
                change.rag_changed()
                    && trigger_from.is_none_or(|from| change.before.rag_status == Some(from))
                    && trigger_to.is_none_or(|to| change.after.rag_status == Some(to))
            }
            Self::StatusChanged {
                trigger_from,
                trigger_to,
            } => {
                change.status_changed()
                    && trigger_from.is_none_or(|from| change.before.status == from)
                    && trigger_to.is_none_or(|to| change.after.status == to)
            }
            Self::DeadlineChanged => {
                change.before.expected_date != change.after.expected_date
                    && change.before.expected_date.is_some()
            }
            Self::DeadlineOverdue => {
                change.after.expected_date.is_some_and(|date| date <= today)
                    && change.after.status != InitiativeStatus::Done
            }
            Self::DeadlineMissing => {
                change.entered_status(InitiativeStatus::InProgress)
                    && change.after.expected_date.is_none()
            }
            Self::NoRagSet => {
                change.entered_status(InitiativeStatus::InProgress)
                    && change.after.rag_status.is_none()
            }
            Self::StatusChangedNotifyDependents => {
                change.status_changed() && !graph.dependents(&change.initiative_id).is_empty()
            }
            Self::MovedToDone => change.entered_status(InitiativeStatus::Done),
            Self::Unknown => false,
        }
    }
}

/// Evaluate a recorded transition against a user's rules.
///
/// Returns one suggestion per matching active rule, in rule order, with no
/// deduplication. No matches yields an empty vector, never an error; the
/// function has no side effects.
#[must_use]
pub fn evaluate(
    change: &InitiativeChange,
    rules: &[TodoRule],
    today: NaiveDate,
    graph: &DependencyGraph,
) -> Vec<TodoSuggestion> {
    rules
        .iter()
        .filter(|rule| rule.is_active)
        .filter(|rule| rule.trigger.matches(change, today, graph))
        .map(|rule| build_suggestion(rule, change, today))
        .collect()
}

fn build_suggestion(rule: &TodoRule, change: &InitiativeChange, today: NaiveDate) -> TodoSuggestion {
    TodoSuggestion {
        initiative_id: change.initiative_id.clone(),
        initiative_title: change.title.clone(),
        rule_id: rule.id.clone(),
        source: rule.trigger.kind(),
        body: render_body(&rule.suggested_body, &change.title),
        deadline: deadline_from(today, rule.suggested_deadline_days),
    }
}

/// Substitute the literal token `{title}` in a body template.
fn render_body(template: &str, title: &str) -> String {
    template.replace("{title}", title)
}

/// Offset the evaluation date, saturating at the calendar bound.
fn deadline_from(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InitiativeId, InitiativeSnapshot, RagStatus};
    use crate::domain::{RuleId, UserId};

    fn snapshot(status: InitiativeStatus) -> InitiativeSnapshot {
        InitiativeSnapshot {
            status,
            rag_status: None,
            expected_date: None,
        }
    }

    fn change(before: InitiativeSnapshot, after: InitiativeSnapshot) -> InitiativeChange {
        InitiativeChange {
            initiative_id: InitiativeId::new("init-a1b2"),
            title: "Checkout".to_string(),
            before,
            after,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn render_body_substitutes_only_the_token() {
        assert_eq!(render_body("Fix {title} now", "Checkout"), "Fix Checkout now");
        assert_eq!(render_body("No token here", "Checkout"), "No token here");
        assert_eq!(
            render_body("{title} and {title}", "Checkout"),
            "Checkout and Checkout"
        );
    }

    #[test]
    fn unknown_trigger_never_matches() {
        let c = change(
            snapshot(InitiativeStatus::Upcoming),
            snapshot(InitiativeStatus::Done),
        );
        assert!(!Trigger::Unknown.matches(&c, today(), &DependencyGraph::new()));
    }

    #[test]
    fn wildcard_rag_trigger_requires_an_actual_change() {
        let trigger = Trigger::RagStatusChanged {
            trigger_from: None,
            trigger_to: None,
        };
        let mut before = snapshot(InitiativeStatus::InProgress);
        let mut after = snapshot(InitiativeStatus::InProgress);
        before.rag_status = Some(RagStatus::Green);
        after.rag_status = Some(RagStatus::Green);

        let c = change(before, after);
        assert!(!trigger.matches(&c, today(), &DependencyGraph::new()));
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let rule = TodoRule {
            id: RuleId::new("rule-1"),
            owner: UserId::new("ana"),
            trigger: Trigger::MovedToDone,
            suggested_body: "Announce {title}".to_string(),
            suggested_deadline_days: 1,
            is_active: false,
        };
        let c = change(
            snapshot(InitiativeStatus::InProgress),
            snapshot(InitiativeStatus::Done),
        );

        let suggestions = evaluate(&c, &[rule], today(), &DependencyGraph::new());
        assert!(suggestions.is_empty());
    }

    #[test]
    fn deadline_is_today_plus_offset() {
        let rule = TodoRule {
            id: RuleId::new("rule-1"),
            owner: UserId::new("ana"),
            trigger: Trigger::MovedToDone,
            suggested_body: "Announce {title}".to_string(),
            suggested_deadline_days: 7,
            is_active: true,
        };
        let c = change(
            snapshot(InitiativeStatus::InProgress),
            snapshot(InitiativeStatus::Done),
        );

        let suggestions = evaluate(&c, &[rule], today(), &DependencyGraph::new());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(
            suggestions[0].deadline,
            NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
        );
        assert_eq!(suggestions[0].source, TriggerKind::MovedToDone);
    }
}
