use console::style;

use crate::types::{
    AnalysisHistoryItem, KnowledgeResource, Priority, ResourceStatus, Subtask, Task, TaskPatch,
    TaskStatus, enum_to_str, format_seconds,
};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    fn field(&self, label: &str, value: &str) {
        if !value.is_empty() {
            println!("  {:<12} {}", style(label).dim(), value);
        }
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// One line per task
    pub fn task_row(&self, task: &Task) {
        let progress = if task.subtasks.is_empty() {
            String::new()
        } else {
            format!(" [{}/{}]", task.completed_subtasks(), task.subtasks.len())
        };
        println!(
            "{}  {:<9} {:<6} {}{}",
            style(&task.id).dim(),
            status_label(task.status),
            priority_label(task.priority),
            task.title,
            style(progress).cyan()
        );
    }

    pub fn task(&self, task: &Task) {
        self.header(&task.title);
        self.field("id", &task.id);
        self.field("status", &status_label(task.status));
        self.field("priority", &priority_label(task.priority));
        self.field("product", &task.product);
        self.field("type", &task.task_type);
        self.field("due", task.due_date.as_deref().unwrap_or_default());
        if !task.description.is_empty() {
            println!("\n{}", task.description);
        }

        if !task.subtasks.is_empty() {
            self.section("Subtasks");
            self.subtasks(&task.subtasks);
        }

        if let Some(analysis) = &task.ai_analysis {
            self.section("Strategy");
            println!("{}", analysis.strategy);
            if !analysis.suggested_resources.is_empty() {
                self.section("Suggested resources");
                for resource in &analysis.suggested_resources {
                    println!("  • {} {}", resource.title, style(&resource.url).dim());
                }
            }
        }
    }

    pub fn subtasks(&self, subtasks: &[Subtask]) {
        for subtask in subtasks {
            let mark = if subtask.completed {
                style("[x]").green()
            } else {
                style("[ ]").dim()
            };
            println!("  {} {} {}", mark, subtask.title, style(&subtask.id).dim());
        }
    }

    /// A numbered draft candidate
    pub fn draft(&self, index: usize, patch: &TaskPatch) {
        let title = patch.title.as_deref().unwrap_or("(untitled)");
        let tag = patch.style_tag.as_deref().unwrap_or("");
        println!(
            "\n{} {} {}",
            style(format!("{}.", index)).bold(),
            style(title).bold(),
            style(tag).dim()
        );
        if let Some(priority) = patch.priority {
            self.field("priority", &priority_label(priority));
        }
        self.field("product", patch.product.as_deref().unwrap_or_default());
        self.field("type", patch.task_type.as_deref().unwrap_or_default());
        if let Some(description) = patch.description.as_deref()
            && !description.is_empty()
        {
            println!("  {}", description);
        }
    }

    // =========================================================================
    // Knowledge
    // =========================================================================

    pub fn resource_row(&self, resource: &KnowledgeResource) {
        let status = match resource.management_info.status {
            ResourceStatus::Active => style("active").green(),
            ResourceStatus::Draft => style("draft").yellow(),
            ResourceStatus::Archived => style("archived").dim(),
        };
        println!(
            "{}  {:<8} {:<8} {}",
            style(&resource.id).dim(),
            status,
            enum_to_str(&resource.basic_info.content_type),
            resource.title()
        );
    }

    pub fn resource(&self, resource: &KnowledgeResource) {
        let info = &resource.basic_info;
        self.header(resource.title());
        self.field("id", &resource.id);
        self.field("status", &enum_to_str(&resource.management_info.status));
        self.field("level", &enum_to_str(&info.level));
        self.field("type", &enum_to_str(&info.content_type));
        self.field("author", info.author.as_deref().unwrap_or_default());
        self.field("url", resource.original_url().unwrap_or_default());
        if let Some(duration) = resource.metadata.duration {
            self.field("duration", &format_seconds(duration));
        }
        self.field(
            "category",
            resource.metadata.category.as_deref().unwrap_or_default(),
        );
        self.field("tags", &info.tags.join(", "));
        self.field("keywords", &resource.search_optimization.keywords.join(", "));

        if resource.is_failed() {
            self.warning("Analysis failed; run `nexushub resource retry` to try again");
        }
        if !info.summary.is_empty() {
            println!("\n{}", info.summary);
        }

        if !resource.search_optimization.chapters.is_empty() {
            self.section("Chapters");
            for chapter in &resource.search_optimization.chapters {
                println!("  {} {}", style(&chapter.timestamp).cyan(), chapter.title);
                if !chapter.summary.is_empty() {
                    println!("      {}", style(&chapter.summary).dim());
                }
            }
        }
    }

    // =========================================================================
    // Video analysis
    // =========================================================================

    pub fn history_row(&self, item: &AnalysisHistoryItem) {
        println!(
            "{}  {}  {}",
            style(&item.analyzed_at).dim(),
            item.title,
            style(&item.source).dim()
        );
    }

    pub fn analysis(&self, item: &AnalysisHistoryItem) {
        self.header(&item.title);
        self.field("id", &item.id);
        self.field("source", &item.source);
        self.field("analyzed", &item.analyzed_at);
        self.field("keywords", &item.keywords.join(", "));
        println!("\n{}", item.overall_summary);

        if !item.scenes.is_empty() {
            self.section("Scenes");
            for scene in &item.scenes {
                println!(
                    "  {} {}",
                    style(format!(
                        "{}-{}",
                        format_seconds(scene.start_time),
                        format_seconds(scene.end_time)
                    ))
                    .cyan(),
                    scene.title
                );
                if !scene.summary.is_empty() {
                    println!("      {}", style(&scene.summary).dim());
                }
            }
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

fn status_label(status: TaskStatus) -> String {
    let text = status.as_str();
    match status {
        TaskStatus::Done => style(text).green().to_string(),
        TaskStatus::Wip => style(text).cyan().to_string(),
        TaskStatus::Cancelled => style(text).dim().to_string(),
        TaskStatus::Feedback => style(text).yellow().to_string(),
        _ => text.to_string(),
    }
}

fn priority_label(priority: Priority) -> String {
    let text = priority.as_str();
    match priority {
        Priority::High => style(text).red().to_string(),
        Priority::Medium => style(text).yellow().to_string(),
        Priority::Low => style(text).dim().to_string(),
    }
}
