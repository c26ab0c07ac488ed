//! Breadth-first exploration of discovered object types.

use crate::context::ProbeContext;
use crate::discoveries::Discoveries;
use crate::error::Result;
use crate::field_probe::{probe_fields, resolve_field_type, ProbeOutcome, TypeResolution};
use crate::query::{OperationKind, SelectionPath};
use crate::settings::ProbeSettings;
use blindql_types::TypeRef;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinSet;

/// A type waiting to be explored, with the path that reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorationTask {
    pub type_name: String,
    pub path: SelectionPath,
    /// Number of fields between the root and this type.
    pub depth: usize,
}

/// Resolves field return types and walks object types level by level.
#[derive(Debug)]
pub struct TypeExplorationScheduler {
    ctx: Arc<ProbeContext>,
    discoveries: Arc<Discoveries>,
    words: Arc<[String]>,
    settings: ProbeSettings,
    queue: VecDeque<ExplorationTask>,
}

impl TypeExplorationScheduler {
    #[must_use]
    pub fn new(
        ctx: Arc<ProbeContext>,
        discoveries: Arc<Discoveries>,
        words: Arc<[String]>,
        settings: ProbeSettings,
    ) -> Self {
        Self {
            ctx,
            discoveries,
            words,
            settings,
            queue: VecDeque::new(),
        }
    }

    /// Queues a task unless its type was already explored or is waiting.
    pub fn enqueue(&mut self, task: ExplorationTask) -> bool {
        if self.discoveries.is_visited(&task.type_name)
            || self.queue.iter().any(|t| t.type_name == task.type_name)
        {
            return false;
        }
        tracing::debug!(type_name = %task.type_name, path = %task.path, depth = task.depth, "Queued type");
        self.queue.push_back(task);
        true
    }

    #[must_use]
    pub fn pending(&self) -> &VecDeque<ExplorationTask> {
        &self.queue
    }

    /// Settles the return type of each field of `type_name`.
    ///
    /// A type already named by a bucket-phase error is used directly;
    /// otherwise a typed probe is issued. Object types are queued at `depth`.
    pub async fn resolve_field_types(
        &mut self,
        type_name: &str,
        path: &SelectionPath,
        fields: &[String],
        hints: &ProbeOutcome,
        depth: usize,
    ) -> Result<()> {
        let mut tasks = JoinSet::new();
        for field in fields {
            if let Some(hint) = hints.type_hints.get(field) {
                self.apply(type_name, path, field, hint.clone(), depth);
                continue;
            }
            if self.ctx.is_cancelled() {
                break;
            }
            let ctx = Arc::clone(&self.ctx);
            let path = path.clone();
            let field = field.clone();
            tasks.spawn(async move {
                let resolution = resolve_field_type(&ctx, &path, &field).await;
                (field, resolution)
            });
        }

        // Joined in completion order; sort so queue order does not depend on
        // which probe answered first.
        let mut resolved = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            resolved.push(joined?);
        }
        resolved.sort_by(|a, b| a.0.cmp(&b.0));

        for (field, resolution) in resolved {
            match resolution {
                TypeResolution::Object(ty) | TypeResolution::Leaf(ty) => {
                    self.apply(type_name, path, &field, ty, depth);
                }
                TypeResolution::Unresolved => {
                    tracing::debug!(type_name, field = %field, "Field type unresolved");
                }
            }
        }
        Ok(())
    }

    fn apply(
        &mut self,
        type_name: &str,
        path: &SelectionPath,
        field: &str,
        ty: TypeRef,
        depth: usize,
    ) {
        let explore = ty.kind.is_composite();
        let target = ty.name.clone();
        self.discoveries.set_field_type(type_name, field, ty);
        if explore {
            self.enqueue(ExplorationTask {
                type_name: target,
                path: path.child(field),
                depth,
            });
        }
    }

    /// Drains the queue breadth-first until it is empty or the run is cancelled.
    pub async fn explore(&mut self) -> Result<()> {
        while let Some(task) = self.queue.pop_front() {
            if self.ctx.is_cancelled() {
                self.ctx.report("Exploration cancelled");
                break;
            }
            if task.depth > self.settings.max_depth {
                tracing::debug!(type_name = %task.type_name, depth = task.depth, "Skipping type beyond max depth");
                continue;
            }
            if !self.discoveries.mark_visited(&task.type_name) {
                continue;
            }

            self.ctx.report(&format!(
                "Exploring {} (depth {}, via {})",
                task.type_name, task.depth, task.path
            ));

            let outcome = probe_fields(
                &self.ctx,
                OperationKind::Query,
                &task.path,
                &self.words,
                self.settings.nested_bucket_size,
            )
            .await?;
            if outcome.is_empty() {
                continue;
            }

            outcome.record_into(&self.discoveries, &task.type_name);
            self.ctx.report(&format!(
                "Found {} fields on {}",
                outcome.fields.len(),
                task.type_name
            ));

            let fields: Vec<String> = outcome.fields.iter().cloned().collect();
            self.resolve_field_types(
                &task.type_name,
                &task.path,
                &fields,
                &outcome,
                task.depth + 1,
            )
            .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::Pacer;
    use blindql_test_utils::MockTransport;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use tokio_util::sync::CancellationToken;

    fn scheduler(transport: MockTransport, words: &[&str]) -> TypeExplorationScheduler {
        let ctx = ProbeContext::new(
            "http://localhost/graphql",
            Arc::new(transport),
            Arc::new(Semaphore::new(4)),
            Arc::new(Pacer::new(Duration::ZERO)),
            CancellationToken::new(),
        );
        let words: Vec<String> = words.iter().map(ToString::to_string).collect();
        TypeExplorationScheduler::new(
            Arc::new(ctx),
            Arc::new(Discoveries::new()),
            words.into(),
            ProbeSettings::default(),
        )
    }

    fn task(type_name: &str, depth: usize) -> ExplorationTask {
        ExplorationTask {
            type_name: type_name.to_string(),
            path: SelectionPath::root().child(type_name.to_lowercase()),
            depth,
        }
    }

    #[test]
    fn test_enqueue_dedupes_by_type_name() {
        let mut scheduler = scheduler(MockTransport::new(), &[]);
        assert!(scheduler.enqueue(task("User", 1)));
        assert!(!scheduler.enqueue(task("User", 2)));

        scheduler.discoveries.mark_visited("Post");
        assert!(!scheduler.enqueue(task("Post", 1)));
        assert_eq!(scheduler.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_object_error_on_typed_probe_enqueues_type() {
        let transport = MockTransport::new().on(
            "query { user { __typename } }",
            json!({"errors": [{"message": "Field \"user\" of type \"User\" must have a selection of subfields."}]}),
        );
        let mut scheduler = scheduler(transport, &[]);
        scheduler.discoveries.add_fields("Query", ["user"]);

        scheduler
            .resolve_field_types(
                "Query",
                &SelectionPath::root(),
                &["user".to_string()],
                &ProbeOutcome::default(),
                1,
            )
            .await
            .unwrap();

        assert_eq!(
            scheduler.discoveries.field_type("Query", "user"),
            Some(TypeRef::object("User"))
        );
        assert_eq!(
            scheduler.pending().front(),
            Some(&ExplorationTask {
                type_name: "User".to_string(),
                path: SelectionPath::root().child("user"),
                depth: 1,
            })
        );
    }

    #[tokio::test]
    async fn test_hint_skips_typed_probe() {
        let transport = MockTransport::new();
        let mut hints = ProbeOutcome::default();
        hints
            .type_hints
            .insert("id".to_string(), TypeRef::scalar("ID"));
        let mut scheduler = scheduler(transport, &[]);
        scheduler.discoveries.add_fields("Query", ["id"]);

        scheduler
            .resolve_field_types("Query", &SelectionPath::root(), &["id".to_string()], &hints, 1)
            .await
            .unwrap();

        assert_eq!(
            scheduler.discoveries.field_type("Query", "id"),
            Some(TypeRef::scalar("ID"))
        );
        assert!(scheduler.pending().is_empty());
    }

    #[tokio::test]
    async fn test_tasks_beyond_max_depth_are_skipped() {
        let mut scheduler = scheduler(MockTransport::new(), &["id"]);
        scheduler.settings.max_depth = 1;
        scheduler.enqueue(task("Deep", 2));

        scheduler.explore().await.unwrap();

        assert!(!scheduler.discoveries.is_visited("Deep"));
        assert_eq!(scheduler.ctx.stats().total, 0);
    }
}
