//! BoardStorage trait implementation for in-memory storage.

use super::InMemoryBoard;
use crate::domain::{
    DependencyEdge, Initiative, InitiativeChange, InitiativeFilter, InitiativeId, InitiativeStatus,
    InitiativeUpdate, NewInitiative, RuleId, UpdateOutcome, UserId,
};
use crate::error::{Error, Result};
use crate::rules::{self, TodoRule, TodoSuggestion};
use crate::storage::{BoardStorage, LoadWarning};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};

#[async_trait]
impl BoardStorage for InMemoryBoard {
    async fn create(&mut self, new_initiative: NewInitiative) -> Result<Initiative> {
        let mut inner = self.lock().await;

        new_initiative
            .validate()
            .map_err(|e| Error::Storage(format!("Validation failed: {}", e)))?;

        let id = inner.generate_id(&new_initiative)?;
        inner.graph.insert_node(&id);

        let now = Utc::now();
        let initiative = Initiative {
            id: id.clone(),
            title: new_initiative.title,
            description: new_initiative.description,
            external_url: new_initiative.external_url,
            team: new_initiative.team,
            project: new_initiative.project,
            status: new_initiative.status,
            rag_status: new_initiative.rag_status,
            expected_date: new_initiative.expected_date,
            created_at: now,
            updated_at: now,
        };

        inner.initiatives.insert(id, initiative.clone());

        Ok(initiative)
    }

    async fn get(&self, id: &InitiativeId) -> Result<Option<Initiative>> {
        let inner = self.lock().await;
        Ok(inner.initiatives.get(id).cloned())
    }

    async fn update(
        &mut self,
        id: &InitiativeId,
        updates: InitiativeUpdate,
    ) -> Result<UpdateOutcome> {
        let mut inner = self.lock().await;

        let current = inner
            .initiatives
            .get(id)
            .ok_or_else(|| Error::InitiativeNotFound(id.clone()))?;

        // Apply updates to a copy so a failed validation leaves the stored
        // record untouched.
        let before = current.snapshot();
        let mut updated = current.clone();

        if let Some(title) = updates.title {
            updated.title = title;
        }
        if let Some(description) = updates.description {
            updated.description = description;
        }
        if let Some(external_url) = updates.external_url {
            updated.external_url = external_url;
        }
        if let Some(team) = updates.team {
            updated.team = team;
        }
        if let Some(project) = updates.project {
            updated.project = project;
        }
        if let Some(status) = updates.status {
            updated.status = status;
        }
        if let Some(rag_status) = updates.rag_status {
            updated.rag_status = rag_status;
        }
        if let Some(expected_date) = updates.expected_date {
            updated.expected_date = expected_date;
        }

        updated
            .validate()
            .map_err(|e| Error::Storage(format!("Validation failed: {}", e)))?;
        updated.updated_at = Utc::now();

        let change = InitiativeChange {
            initiative_id: id.clone(),
            title: updated.title.clone(),
            before,
            after: updated.snapshot(),
        };

        inner.initiatives.insert(id.clone(), updated.clone());

        Ok(UpdateOutcome {
            initiative: updated,
            change,
        })
    }

    async fn delete(&mut self, id: &InitiativeId) -> Result<()> {
        let mut inner = self.lock().await;

        if !inner.initiatives.contains_key(id) {
            return Err(Error::InitiativeNotFound(id.clone()));
        }

        let mut dependents: Vec<InitiativeId> = inner.graph.dependents(id).into_iter().collect();
        if !dependents.is_empty() {
            dependents.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            return Err(Error::HasDependents {
                initiative_id: id.clone(),
                dependent_count: dependents.len(),
                dependents,
            });
        }

        inner.graph.remove_node(id);
        inner.initiatives.remove(id);

        Ok(())
    }

    async fn list(&self, filter: &InitiativeFilter) -> Result<Vec<Initiative>> {
        let inner = self.lock().await;

        let mut initiatives: Vec<Initiative> = inner
            .initiatives
            .values()
            .filter(|initiative| {
                if let Some(team) = &filter.team {
                    if initiative.team.as_ref() != Some(team) {
                        return false;
                    }
                }

                if let Some(project) = &filter.project {
                    if initiative.project.as_ref() != Some(project) {
                        return false;
                    }
                }

                if let Some(status) = &filter.status {
                    if &initiative.status != status {
                        return false;
                    }
                }

                if let Some(rag_status) = &filter.rag_status {
                    if initiative.rag_status.as_ref() != Some(rag_status) {
                        return false;
                    }
                }

                true
            })
            .cloned()
            .collect();

        // Sort by created_at (most recent first)
        initiatives.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = filter.limit {
            initiatives.truncate(limit);
        }

        Ok(initiatives)
    }

    async fn add_dependency(
        &mut self,
        initiative: &InitiativeId,
        dependency: &InitiativeId,
    ) -> Result<()> {
        let mut inner = self.lock().await;

        // Validate both initiatives exist
        if !inner.initiatives.contains_key(initiative) {
            return Err(Error::InitiativeNotFound(initiative.clone()));
        }
        if !inner.initiatives.contains_key(dependency) {
            return Err(Error::InitiativeNotFound(dependency.clone()));
        }

        inner.graph.add_dependency(initiative, dependency)?;
        debug!(%initiative, %dependency, "dependency added");

        Ok(())
    }

    async fn remove_dependency(
        &mut self,
        initiative: &InitiativeId,
        dependency: &InitiativeId,
    ) -> Result<()> {
        let mut inner = self.lock().await;

        if !inner.initiatives.contains_key(initiative) {
            return Err(Error::InitiativeNotFound(initiative.clone()));
        }
        if !inner.initiatives.contains_key(dependency) {
            return Err(Error::InitiativeNotFound(dependency.clone()));
        }

        inner.graph.remove_dependency(initiative, dependency);
        debug!(%initiative, %dependency, "dependency removed");

        Ok(())
    }

    async fn dependencies(&self, id: &InitiativeId) -> Result<Vec<InitiativeId>> {
        let inner = self.lock().await;

        if !inner.initiatives.contains_key(id) {
            return Err(Error::InitiativeNotFound(id.clone()));
        }

        Ok(inner.graph.dependencies(id))
    }

    async fn dependents(&self, id: &InitiativeId) -> Result<HashSet<InitiativeId>> {
        let inner = self.lock().await;

        if !inner.initiatives.contains_key(id) {
            return Err(Error::InitiativeNotFound(id.clone()));
        }

        Ok(inner.graph.dependents(id))
    }

    async fn is_blocked(&self, id: &InitiativeId) -> Result<bool> {
        let inner = self.lock().await;

        if !inner.initiatives.contains_key(id) {
            return Err(Error::InitiativeNotFound(id.clone()));
        }

        Ok(inner.graph.is_blocked(id, &inner.initiatives))
    }

    async fn blocked_initiatives(&self) -> Result<Vec<(Initiative, Vec<Initiative>)>> {
        let inner = self.lock().await;

        let mut blocked_list = Vec::new();

        for (id, initiative) in &inner.initiatives {
            if initiative.status == InitiativeStatus::Done {
                continue;
            }

            let blockers: Vec<Initiative> = inner
                .graph
                .blocking_dependencies(id, &inner.initiatives)
                .into_iter()
                .filter_map(|dep_id| inner.initiatives.get(&dep_id).cloned())
                .collect();

            if !blockers.is_empty() {
                blocked_list.push((initiative.clone(), blockers));
            }
        }

        Ok(blocked_list)
    }

    async fn add_rule(&mut self, rule: TodoRule) -> Result<()> {
        let mut inner = self.lock().await;
        inner.rules.entry(rule.owner.clone()).or_default().push(rule);
        Ok(())
    }

    async fn remove_rule(&mut self, owner: &UserId, rule_id: &RuleId) -> Result<()> {
        let mut inner = self.lock().await;
        if let Some(rules) = inner.rules.get_mut(owner) {
            rules.retain(|rule| &rule.id != rule_id);
        }
        Ok(())
    }

    async fn active_rules(&self, owner: &UserId) -> Result<Vec<TodoRule>> {
        let inner = self.lock().await;
        Ok(inner
            .rules
            .get(owner)
            .map(|rules| rules.iter().filter(|rule| rule.is_active).cloned().collect())
            .unwrap_or_default())
    }

    async fn evaluate_change(
        &self,
        owner: &UserId,
        change: &InitiativeChange,
        today: NaiveDate,
    ) -> Result<Vec<TodoSuggestion>> {
        let inner = self.lock().await;

        let suggestions = match inner.rules.get(owner) {
            Some(owned_rules) => rules::evaluate(change, owned_rules, today, &inner.graph),
            None => Vec::new(),
        };

        Ok(suggestions)
    }

    async fn import_board(
        &mut self,
        initiatives: Vec<Initiative>,
        edges: Vec<DependencyEdge>,
    ) -> Result<Vec<LoadWarning>> {
        let mut inner = self.lock().await;
        let mut warnings = Vec::new();

        // First pass: load all records and register their nodes, so edges
        // can be reconstructed regardless of input order.
        for initiative in initiatives {
            let id = initiative.id.clone();
            inner.graph.insert_node(&id);
            inner.id_generator.register_id(id.as_str().to_string());
            inner.initiatives.insert(id, initiative);
        }

        // Second pass: reconstruct dependency edges
        for edge in edges {
            if !inner.initiatives.contains_key(&edge.initiative_id)
                || !inner.initiatives.contains_key(&edge.dependency_id)
            {
                warn!(
                    initiative = %edge.initiative_id,
                    dependency = %edge.dependency_id,
                    "skipping edge referencing a missing initiative"
                );
                warnings.push(LoadWarning::MissingInitiative {
                    initiative_id: edge.initiative_id,
                    dependency_id: edge.dependency_id,
                });
                continue;
            }

            match inner
                .graph
                .add_dependency(&edge.initiative_id, &edge.dependency_id)
            {
                Ok(()) => {}
                Err(Error::SelfDependency { id }) => {
                    warn!(%id, "skipping self-dependency edge");
                    warnings.push(LoadWarning::SelfDependency { id });
                }
                Err(Error::DuplicateDependency { from, to }) => {
                    warn!(initiative = %from, dependency = %to, "skipping duplicate edge");
                    warnings.push(LoadWarning::DuplicateDependency {
                        initiative_id: from,
                        dependency_id: to,
                    });
                }
                Err(Error::CircularDependency { from, to }) => {
                    warn!(initiative = %from, dependency = %to, "skipping cycle-closing edge");
                    warnings.push(LoadWarning::CircularDependency {
                        initiative_id: from,
                        dependency_id: to,
                    });
                }
                Err(other) => return Err(other),
            }
        }

        Ok(warnings)
    }
}
