//! Prompt Builder System
//!
//! Standardized prompt construction for completion requests.
//! Every template in [`templates`] is assembled from the same sections so the
//! output contract always sits at the end of the prompt.
//!
//! ## Section Order
//!
//! 1. **Role**: who the model is for this request
//! 2. **Objectives**: numbered goals
//! 3. **Context**: the caller's data, in insertion order
//! 4. **Rules**: hard constraints (locale, no fabrication, sentinel)
//! 5. **Output Schema**: the exact JSON shape plus the "JSON only" contract

pub mod templates;

pub use templates::{
    build_assistant_preamble, build_chat_system_prompt, build_draft_prompt,
    build_quick_summary_prompt, build_resource_analysis_prompt, build_subtask_prompt,
    build_task_analysis_prompt, build_video_frames_prompt, extract_youtube_video_id,
};

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Ordered key-value pairs
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Hard constraints
    Rules(Vec<String>),
    /// JSON output schema with the "JSON only" contract
    OutputSchema(String),
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    /// Add objectives section
    pub fn objectives<S: AsRef<str>>(mut self, objectives: &[S]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|o| o.as_ref().to_string()).collect(),
        ));
        self
    }

    /// Add a context item, appending to the first context section
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let existing = self.sections.iter_mut().find_map(|section| match section {
            PromptSection::Context(items) => Some(items),
            _ => None,
        });
        match existing {
            Some(items) => items.push((key.to_string(), value.to_string())),
            None => self.sections.push(PromptSection::Context(vec![(
                key.to_string(),
                value.to_string(),
            )])),
        }
        self
    }

    /// Add text section
    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add hard rules
    pub fn rules<S: AsRef<str>>(mut self, rules: &[S]) -> Self {
        self.sections.push(PromptSection::Rules(
            rules.iter().map(|r| r.as_ref().to_string()).collect(),
        ));
        self
    }

    /// Add the JSON output contract
    pub fn output_schema(mut self, schema: &str) -> Self {
        self.sections
            .push(PromptSection::OutputSchema(schema.trim().to_string()));
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!("You are {} specializing in {}.\n", expertise, task));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(items) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in items {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Rules(rules) => {
                    prompt.push_str("<RULES>\n");
                    for rule in rules {
                        prompt.push_str(&format!("- {}\n", rule));
                    }
                    prompt.push_str("</RULES>\n\n");
                }
                PromptSection::OutputSchema(schema) => {
                    prompt.push_str("# Output Format\n\n");
                    prompt.push_str(
                        "Respond STRICTLY with valid JSON matching this structure. \
                         Return JSON only: no markdown fences, no notes, no text before or after it.\n\n",
                    );
                    prompt.push_str(&schema);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("a project manager", "task breakdown")
            .objectives(&["Read the task", "Write a checklist"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("a project manager"));
        assert!(prompt.contains("1. Read the task"));
        assert!(prompt.contains("2. Write a checklist"));
    }

    #[test]
    fn test_context_items_keep_order() {
        let prompt = PromptBuilder::new()
            .context_item("Title", "Landing page")
            .context_item("Product", "Web")
            .build();

        let title = prompt.find("**Title**: Landing page").unwrap();
        let product = prompt.find("**Product**: Web").unwrap();
        assert!(title < product);
        assert_eq!(prompt.matches("# Context").count(), 1);
    }

    #[test]
    fn test_output_schema_states_json_only() {
        let prompt = PromptBuilder::new()
            .rules(&["Write in Korean"])
            .output_schema(r#"[{"title": "string"}]"#)
            .build();

        assert!(prompt.contains("- Write in Korean"));
        assert!(prompt.contains("JSON only"));
        assert!(prompt.ends_with(r#"[{"title": "string"}]"#));
    }
}
