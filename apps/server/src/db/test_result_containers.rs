//! Database queries for test result containers.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::test_result_container::{
    self as container, ActiveModel, Entity as Container,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    ArtifactKind, ContainerLookup, NewTestResultContainer, TestResultContainer,
    UpdateTestResultContainer,
};
use crate::services::aggregation::ContainerAggregate;

use super::DbPool;

impl DbPool {
    /// Insert a container together with its nested test classes.
    ///
    /// The whole tree is written in one transaction. Returns the stored tree.
    pub async fn insert_test_result_container(
        &self,
        new: NewTestResultContainer,
    ) -> AppResult<TestResultContainer> {
        new.validate()?;

        if !new.is_consistent() {
            warn!(
                identifier = new.identifier.as_deref().unwrap_or_default(),
                failed = new.failed_tests,
                succeeded = new.succeeded_tests,
                disabled = new.disabled_tests,
                test_results = new.test_results.len(),
                "Counters or scores of new test result container do not add up"
            );
        }

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to start transaction: {}", e)))?;

        let id = insert_subtree(&txn, None, 0, &new, Utc::now()).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit container: {}", e)))?;

        let stored = self
            .get_test_result_container(id)
            .await?
            .ok_or_else(|| AppError::Database(format!("Container {} vanished after insert", id)))?;

        info!(
            id = %stored.id,
            identifier = %stored.identifier,
            test_classes = stored.subtree_len() - 1,
            "Created test result container"
        );

        Ok(stored)
    }

    /// Get a container (top-level or nested) by ID, with its subtree.
    pub async fn get_test_result_container(
        &self,
        id: Uuid,
    ) -> AppResult<Option<TestResultContainer>> {
        let model = Container::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get container: {}", e)))?;

        match model {
            Some(model) => Ok(load_trees(self.connection(), vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Top-level containers matching a lookup, oldest first.
    pub async fn find_test_result_containers(
        &self,
        lookup: &ContainerLookup,
    ) -> AppResult<Vec<TestResultContainer>> {
        let select = match lookup {
            ContainerLookup::Identifier(identifier) => {
                Container::find().filter(container::Column::Identifier.eq(identifier.as_str()))
            }
            ContainerLookup::PcapStorageId(id) => {
                Container::find().filter(container::Column::PcapStorageId.eq(*id))
            }
            ContainerLookup::KeylogfileStorageId(id) => {
                Container::find().filter(container::Column::KeylogfileStorageId.eq(*id))
            }
        };

        let roots = select
            .filter(container::Column::ParentId.is_null())
            .order_by_asc(container::Column::CreatedAt)
            .order_by_asc(container::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to look up containers: {}", e)))?;

        load_trees(self.connection(), roots).await
    }

    pub async fn find_test_result_containers_by_identifier(
        &self,
        identifier: &str,
    ) -> AppResult<Vec<TestResultContainer>> {
        self.find_test_result_containers(&ContainerLookup::Identifier(identifier.to_string()))
            .await
    }

    pub async fn find_test_result_containers_by_pcap_storage_id(
        &self,
        storage_id: Uuid,
    ) -> AppResult<Vec<TestResultContainer>> {
        self.find_test_result_containers(&ContainerLookup::PcapStorageId(storage_id))
            .await
    }

    pub async fn find_test_result_containers_by_keylogfile_storage_id(
        &self,
        storage_id: Uuid,
    ) -> AppResult<Vec<TestResultContainer>> {
        self.find_test_result_containers(&ContainerLookup::KeylogfileStorageId(storage_id))
            .await
    }

    /// List top-level containers, newest first.
    pub async fn list_test_result_containers(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<TestResultContainer>, u64)> {
        let select = Container::find().filter(container::Column::ParentId.is_null());

        // Count total before pagination
        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count containers: {}", e)))?;

        let roots = select
            .order_by_desc(container::Column::CreatedAt)
            .order_by_desc(container::Column::Id)
            .offset(offset)
            .limit(limit.clamp(1, 100))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list containers: {}", e)))?;

        Ok((load_trees(self.connection(), roots).await?, total))
    }

    /// Apply a partial update. Supplying `TestClasses` replaces the subtree.
    pub async fn update_test_result_container(
        &self,
        id: Uuid,
        update: UpdateTestResultContainer,
    ) -> AppResult<TestResultContainer> {
        update.validate()?;
        if update.is_empty() {
            return Err(AppError::InvalidInput("No fields to update".to_string()));
        }

        let now = Utc::now();
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to start transaction: {}", e)))?;

        let existing = Container::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get container: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Test result container {}", id)))?;

        let mut active: ActiveModel = existing.into();
        let test_classes = apply_update(&mut active, update)?;
        active.updated_at = Set(now);

        active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update container: {}", e)))?;

        if let Some(children) = test_classes {
            Container::delete_many()
                .filter(container::Column::ParentId.eq(id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to replace test classes: {}", e)))?;

            for (position, child) in children.iter().enumerate() {
                insert_subtree(&txn, Some(id), position as i32, child, now).await?;
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit container update: {}", e)))?;

        let stored = self
            .get_test_result_container(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test result container {}", id)))?;

        if !stored.counters_match() {
            warn!(
                id = %id,
                failed = stored.failed_tests,
                succeeded = stored.succeeded_tests,
                disabled = stored.disabled_tests,
                test_results = stored.test_results.len(),
                "Counters of updated test result container do not add up"
            );
        }

        info!(id = %id, identifier = %stored.identifier, "Updated test result container");

        Ok(stored)
    }

    /// Overwrite counters, test result references and scores from an aggregation.
    pub async fn apply_aggregate(
        &self,
        id: Uuid,
        aggregate: ContainerAggregate,
    ) -> AppResult<TestResultContainer> {
        self.update_test_result_container(id, aggregate_update(aggregate))
            .await
    }

    /// Point `PcapStorageId` or `KeylogfileStorageId` at a stored artifact.
    pub async fn set_artifact(
        &self,
        id: Uuid,
        kind: ArtifactKind,
        storage_id: Uuid,
    ) -> AppResult<TestResultContainer> {
        self.update_test_result_container(id, artifact_update(kind, storage_id))
            .await
    }

    /// Delete a container and its nested test classes.
    ///
    /// Referenced test results and artifacts are left alone.
    pub async fn delete_test_result_container(&self, id: Uuid) -> AppResult<bool> {
        let result = Container::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete container: {}", e)))?;

        if result.rows_affected > 0 {
            info!(id = %id, "Deleted test result container");
        }

        Ok(result.rows_affected > 0)
    }
}

/// Update that overwrites everything an aggregation derives.
fn aggregate_update(aggregate: ContainerAggregate) -> UpdateTestResultContainer {
    UpdateTestResultContainer {
        failed_tests: Some(aggregate.failed_tests),
        succeeded_tests: Some(aggregate.succeeded_tests),
        disabled_tests: Some(aggregate.disabled_tests),
        test_results: Some(aggregate.test_results),
        test_result_class_method_index_map: Some(aggregate.test_result_class_method_index_map),
        score: Some(aggregate.score),
        ..Default::default()
    }
}

/// Update that links one artifact column and leaves the other alone.
fn artifact_update(kind: ArtifactKind, storage_id: Uuid) -> UpdateTestResultContainer {
    let mut update = UpdateTestResultContainer::default();
    match kind {
        ArtifactKind::Pcap => update.pcap_storage_id = Some(Some(storage_id)),
        ArtifactKind::Keylog => update.keylogfile_storage_id = Some(Some(storage_id)),
    }
    update
}

/// Insert `root` and all of its descendants, parents before children.
async fn insert_subtree<C: ConnectionTrait>(
    conn: &C,
    parent_id: Option<Uuid>,
    position: i32,
    root: &NewTestResultContainer,
    now: DateTime<Utc>,
) -> AppResult<Uuid> {
    let root_id = Uuid::now_v7();
    let mut queue = VecDeque::from([(root_id, parent_id, position, root)]);

    while let Some((id, parent_id, position, node)) = queue.pop_front() {
        new_active_model(id, parent_id, position, node, now)?
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert container: {}", e)))?;

        if let Some(children) = &node.test_classes {
            for (i, child) in children.iter().enumerate() {
                queue.push_back((Uuid::now_v7(), Some(id), i as i32, child));
            }
        }
    }

    Ok(root_id)
}

fn new_active_model(
    id: Uuid,
    parent_id: Option<Uuid>,
    position: i32,
    node: &NewTestResultContainer,
    now: DateTime<Utc>,
) -> AppResult<ActiveModel> {
    let identifier = node
        .identifier
        .clone()
        .ok_or_else(|| AppError::Validation("Identifier is required".to_string()))?;
    let score = node.score.normalized();

    Ok(ActiveModel {
        id: Set(id),
        parent_id: Set(parent_id),
        position: Set(position),
        identifier: Set(identifier),
        short_identifier: Set(node.short_identifier.clone()),
        pcap_storage_id: Set(node.pcap_storage_id),
        keylogfile_storage_id: Set(node.keylogfile_storage_id),
        date: Set(node.date),
        display_name: Set(node.display_name.clone()),
        elapsed_time: Set(node.elapsed_time),
        failed_tests: Set(node.failed_tests),
        succeeded_tests: Set(node.succeeded_tests),
        disabled_tests: Set(node.disabled_tests),
        security_reached: Set(score.security.reached),
        security_total: Set(score.security.total),
        security_percentage: Set(score.security.percentage),
        interoperability_reached: Set(score.interoperability.reached),
        interoperability_total: Set(score.interoperability.total),
        interoperability_percentage: Set(score.interoperability.percentage),
        test_results: Set(serde_json::to_value(&node.test_results)?),
        test_result_class_method_index_map: Set(serde_json::to_value(
            &node.test_result_class_method_index_map,
        )?),
        created_at: Set(now),
        updated_at: Set(now),
    })
}

/// Copy the present fields of `update` onto `active`.
///
/// Returns the replacement test classes, which need their own inserts.
fn apply_update(
    active: &mut ActiveModel,
    update: UpdateTestResultContainer,
) -> AppResult<Option<Vec<NewTestResultContainer>>> {
    if let Some(identifier) = update.identifier {
        active.identifier = Set(identifier);
    }
    if let Some(short_identifier) = update.short_identifier {
        active.short_identifier = Set(short_identifier);
    }
    if let Some(pcap_storage_id) = update.pcap_storage_id {
        active.pcap_storage_id = Set(pcap_storage_id);
    }
    if let Some(keylogfile_storage_id) = update.keylogfile_storage_id {
        active.keylogfile_storage_id = Set(keylogfile_storage_id);
    }
    if let Some(date) = update.date {
        active.date = Set(date);
    }
    if let Some(display_name) = update.display_name {
        active.display_name = Set(display_name);
    }
    if let Some(elapsed_time) = update.elapsed_time {
        active.elapsed_time = Set(elapsed_time);
    }
    if let Some(failed_tests) = update.failed_tests {
        active.failed_tests = Set(failed_tests);
    }
    if let Some(succeeded_tests) = update.succeeded_tests {
        active.succeeded_tests = Set(succeeded_tests);
    }
    if let Some(disabled_tests) = update.disabled_tests {
        active.disabled_tests = Set(disabled_tests);
    }
    if let Some(test_results) = update.test_results {
        active.test_results = Set(serde_json::to_value(&test_results)?);
    }
    if let Some(index_map) = update.test_result_class_method_index_map {
        active.test_result_class_method_index_map = Set(serde_json::to_value(&index_map)?);
    }
    if let Some(score) = update.score {
        let score = score.normalized();
        active.security_reached = Set(score.security.reached);
        active.security_total = Set(score.security.total);
        active.security_percentage = Set(score.security.percentage);
        active.interoperability_reached = Set(score.interoperability.reached);
        active.interoperability_total = Set(score.interoperability.total);
        active.interoperability_percentage = Set(score.interoperability.percentage);
    }

    Ok(update.test_classes)
}

/// Load the subtrees below `roots`, one query per nesting level.
async fn load_trees<C: ConnectionTrait>(
    conn: &C,
    roots: Vec<container::Model>,
) -> AppResult<Vec<TestResultContainer>> {
    let mut seen: HashSet<Uuid> = roots.iter().map(|m| m.id).collect();
    let mut frontier: Vec<Uuid> = seen.iter().copied().collect();
    let mut children: HashMap<Uuid, Vec<container::Model>> = HashMap::new();

    while !frontier.is_empty() {
        let level = Container::find()
            .filter(container::Column::ParentId.is_in(frontier))
            .order_by_asc(container::Column::Position)
            .order_by_asc(container::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to load test classes: {}", e)))?;

        frontier = Vec::new();
        for model in level {
            let Some(parent_id) = model.parent_id else {
                continue;
            };
            if !seen.insert(model.id) {
                continue;
            }
            frontier.push(model.id);
            children.entry(parent_id).or_default().push(model);
        }
    }

    roots
        .into_iter()
        .map(|root| build_tree(root, &mut children))
        .collect()
}

fn build_tree(
    model: container::Model,
    children: &mut HashMap<Uuid, Vec<container::Model>>,
) -> AppResult<TestResultContainer> {
    let test_classes = children
        .remove(&model.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| build_tree(child, children))
        .collect::<AppResult<Vec<_>>>()?;

    TestResultContainer::from_model(model, test_classes)
}
