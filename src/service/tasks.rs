//! Task board actions: drafting, strategy analysis, subtasks and guide chat.

use tracing::info;

use super::SharedContext;
use crate::ai::prompt::{build_draft_prompt, build_subtask_prompt, build_task_analysis_prompt};
use crate::ai::validation::{DraftsPayload, SubtasksPayload, TaskAnalysisPayload};
use crate::ai::{Preamble, with_timeout};
use crate::constants::storage as collections;
use crate::mapper::{map_drafts, map_subtasks, subtask_seed};
use crate::storage::TaskRepository;
use crate::types::{
    AiAnalysis, ChatMessage, ChatRole, ChatTurn, EntityKey, HubError, Result, Subtask, Task,
    TaskPatch, TaskStatus, now_millis,
};

pub struct TaskService {
    ctx: SharedContext,
    repo: TaskRepository,
}

impl TaskService {
    pub fn new(ctx: SharedContext, repo: TaskRepository) -> Self {
        Self { ctx, repo }
    }

    pub fn repository(&self) -> &TaskRepository {
        &self.repo
    }

    /// Three alternative drafts for a free-form request. Nothing is stored.
    pub async fn draft(&self, raw_input: &str) -> Result<Vec<TaskPatch>> {
        let request = self.ctx.smart_json(build_draft_prompt(raw_input));
        let raw = self.ctx.complete(request, "task draft").await?;
        let payload: DraftsPayload = self.ctx.normalizer.normalize(&raw)?;
        Ok(map_drafts(payload))
    }

    /// Store an accepted draft as a new task
    pub fn create_from_patch(&self, patch: &TaskPatch) -> Result<Task> {
        self.repo.create(Task::from_patch(patch))
    }

    pub fn create(&self, task: Task) -> Result<Task> {
        self.repo.create(task)
    }

    pub fn list(&self) -> Result<Vec<Task>> {
        self.repo.list()
    }

    pub fn get(&self, id: &str) -> Result<Task> {
        self.repo.get(id)
    }

    pub fn update_status(&self, id: &str, status: TaskStatus) -> Result<Task> {
        self.repo.update_status(id, status)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.repo.delete(id)
    }

    /// Generate and store an execution strategy, replacing any earlier one.
    ///
    /// A newer analysis of the same task started meanwhile wins; this one
    /// then fails with `StaleResponse` and writes nothing.
    pub async fn analyze(&self, id: &str) -> Result<Task> {
        let task = self.repo.get(id)?;
        let token = self.ctx.inflight.begin(EntityKey::new(collections::TASKS, id));

        let outcome = async {
            let request = self.ctx.smart_json(build_task_analysis_prompt(&task));
            let raw = self.ctx.complete(request, "task analysis").await?;
            let payload: TaskAnalysisPayload = self.ctx.normalizer.normalize(&raw)?;
            self.ctx.inflight.ensure_current(&token)?;

            // Re-read so edits made during the call survive
            let mut current = self.repo.get(id)?;
            current.ai_analysis = Some(AiAnalysis {
                strategy: payload.strategy,
                suggested_resources: payload.suggested_resources,
                last_updated: now_millis(),
            });
            self.repo.update(current)
        }
        .await;

        self.ctx.inflight.finish(&token);
        if outcome.is_ok() {
            info!("Stored analysis for task {}", id);
        }
        outcome
    }

    /// Proposed checklist for a task. Nothing is stored until
    /// [`add_subtasks`](Self::add_subtasks).
    pub async fn suggest_subtasks(&self, id: &str) -> Result<Vec<Subtask>> {
        let task = self.repo.get(id)?;
        let request = self.ctx.smart_json(build_subtask_prompt(&task));
        let raw = self.ctx.complete(request, "subtask generation").await?;
        let payload: SubtasksPayload = self.ctx.normalizer.normalize(&raw)?;
        Ok(map_subtasks(payload.0, &subtask_seed()))
    }

    /// Append subtasks after the existing ones
    pub fn add_subtasks(&self, id: &str, subtasks: Vec<Subtask>) -> Result<Task> {
        let mut task = self.repo.get(id)?;
        task.subtasks.extend(subtasks);
        self.repo.update(task)
    }

    /// Flip one subtask's completion flag
    pub fn toggle_subtask(&self, id: &str, subtask_id: &str) -> Result<Task> {
        let mut task = self.repo.get(id)?;
        let subtask = task
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| HubError::not_found("Subtask", subtask_id))?;
        subtask.completed = !subtask.completed;
        self.repo.update(task)
    }

    /// Guide chat anchored to a task. Returns the model's reply as a new
    /// message; the caller owns the log.
    pub async fn chat(
        &self,
        id: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<ChatMessage> {
        let task = self.repo.get(id)?;
        let preamble = Preamble::for_task(&task);
        let turns: Vec<ChatTurn> = history.iter().map(ChatMessage::to_turn).collect();

        let reply = with_timeout(
            self.ctx.timeouts.completion,
            self.ctx.client.chat(&turns, message, &preamble),
            "task chat",
        )
        .await?;
        Ok(ChatMessage::new(ChatRole::Model, reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::scripted::ScriptedClient;
    use crate::service::test_support::{context, memory_store};
    use crate::types::{ErrorCategory, LlmError, Priority};
    use std::sync::Arc;
    use std::time::Duration;

    fn service(client: Arc<ScriptedClient>) -> TaskService {
        TaskService::new(context(client), TaskRepository::new(memory_store()))
    }

    #[tokio::test]
    async fn test_draft_three_patches_with_default_priority() {
        let client = Arc::new(ScriptedClient::new().reply(
            r#"```json
[
  {"title": "프로모션 랜딩 페이지 기획", "description": "기본안", "priority": "HIGH", "product": "Web", "type": "Planning", "styleTag": "standard"},
  {"title": "랜딩 페이지 상세 기획", "description": "상세안", "product": "Web", "type": "Planning", "styleTag": "detailed"},
  {"title": "랜딩 페이지", "description": "요약안", "priority": "asap", "styleTag": "concise"}
]
```"#,
        ));
        let tasks = service(client.clone());

        let patches = tasks.draft("write a promo landing page plan").await.unwrap();

        assert_eq!(patches.len(), 3);
        assert_eq!(patches[0].priority, Some(Priority::High));
        assert_eq!(patches[1].priority, Some(Priority::Medium));
        assert_eq!(patches[2].priority, Some(Priority::Medium));
        assert!(patches.iter().all(|p| p.title.is_some()));

        let requests = client.requests();
        assert!(requests[0].prompt.contains("write a promo landing page plan"));
        assert!(requests[0].response_mime_type.is_some());
        assert!(tasks.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accepted_draft_is_stored() {
        let tasks = service(Arc::new(ScriptedClient::new()));
        let patch = TaskPatch {
            title: Some("Ship v2".into()),
            priority: Some(Priority::Low),
            ..Default::default()
        };

        let task = tasks.create_from_patch(&patch).unwrap();
        assert!(!task.id.is_empty());
        assert_eq!(tasks.get(&task.id).unwrap().priority, Priority::Low);
    }

    #[tokio::test]
    async fn test_analyze_stores_strategy() {
        let client = Arc::new(ScriptedClient::new().reply(
            r###"{"strategy": "## 먼저 알아야 할 것", "suggestedResources": [{"title": "MDN", "url": "https://developer.mozilla.org"}]}"###,
        ));
        let tasks = service(client);
        let task = tasks.create(Task::new("Landing page")).unwrap();

        let analyzed = tasks.analyze(&task.id).await.unwrap();
        let analysis = analyzed.ai_analysis.unwrap();
        assert!(analysis.strategy.starts_with("##"));
        assert_eq!(analysis.suggested_resources.len(), 1);
        assert!(tasks.get(&task.id).unwrap().ai_analysis.is_some());
    }

    #[tokio::test]
    async fn test_analyze_model_failure_writes_nothing() {
        let client = Arc::new(ScriptedClient::new().fail(
            LlmError::new(ErrorCategory::Unavailable, "503").into(),
        ));
        let tasks = service(client);
        let task = tasks.create(Task::new("t")).unwrap();

        let err = tasks.analyze(&task.id).await.unwrap_err();
        assert!(matches!(err, HubError::ModelUnavailable(_)));
        assert!(tasks.get(&task.id).unwrap().ai_analysis.is_none());
    }

    #[tokio::test]
    async fn test_superseded_analysis_is_discarded() {
        let client = Arc::new(
            ScriptedClient::new()
                .reply_after(
                    Duration::from_millis(200),
                    r#"{"strategy": "old plan", "suggestedResources": []}"#,
                )
                .reply(r#"{"strategy": "new plan", "suggestedResources": []}"#),
        );
        let tasks = service(client);
        let task = tasks.create(Task::new("t")).unwrap();

        let (slow, fast) = tokio::join!(tasks.analyze(&task.id), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tasks.analyze(&task.id).await
        });

        assert!(matches!(slow, Err(HubError::StaleResponse { .. })));
        assert_eq!(fast.unwrap().ai_analysis.unwrap().strategy, "new plan");
        assert_eq!(
            tasks.get(&task.id).unwrap().ai_analysis.unwrap().strategy,
            "new plan"
        );
    }

    #[tokio::test]
    async fn test_subtasks_suggest_then_add() {
        let client = Arc::new(ScriptedClient::new().reply(
            r#"{"subtasks": [{"title": "a"}, {"title": "b"}, {"title": "c"}, {"title": "d"}]}"#,
        ));
        let tasks = service(client);
        let task = tasks.create(Task::new("t")).unwrap();

        let suggested = tasks.suggest_subtasks(&task.id).await.unwrap();
        assert_eq!(suggested.len(), 4);
        assert!(tasks.get(&task.id).unwrap().subtasks.is_empty());

        let first_id = suggested[0].id.clone();
        let updated = tasks.add_subtasks(&task.id, suggested).unwrap();
        assert_eq!(updated.subtasks.len(), 4);

        let toggled = tasks.toggle_subtask(&task.id, &first_id).unwrap();
        assert_eq!(toggled.completed_subtasks(), 1);
    }

    #[tokio::test]
    async fn test_chat_seeds_task_preamble() {
        let client = Arc::new(ScriptedClient::new().reply("먼저 범위를 정하세요."));
        let tasks = service(client.clone());
        let task = tasks.create(Task::new("Landing page")).unwrap();
        let history = vec![ChatMessage::new(ChatRole::User, "hi")];

        let reply = tasks.chat(&task.id, &history, "어디서 시작할까요?").await.unwrap();
        assert_eq!(reply.role, ChatRole::Model);

        let (turns, new_turn, preamble) = client.chats().remove(0);
        assert_eq!(turns.len(), 1);
        assert_eq!(new_turn, "어디서 시작할까요?");
        assert!(preamble.instruction.contains("Landing page"));
    }

    #[tokio::test]
    async fn test_missing_task() {
        let tasks = service(Arc::new(ScriptedClient::new()));
        assert!(matches!(
            tasks.analyze("ghost").await,
            Err(HubError::EntityNotFound { .. })
        ));
    }
}
