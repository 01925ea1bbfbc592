//! Prompt templates, one per user action.
//!
//! Each builder is a pure function of its inputs. JSON templates end with the
//! output contract that the matching payload in `ai::validation::contracts`
//! checks.

use regex::Regex;
use std::sync::LazyLock;

use super::PromptBuilder;
use crate::constants::prompt::{
    DRAFT_COUNT, MAX_SUBTASKS, MAX_SUGGESTED_RESOURCES, MIN_SUBTASKS, MIN_SUGGESTED_RESOURCES,
    SENTINEL_ERROR, SENTINEL_REASON_FRAMES, SENTINEL_REASON_URL, SHORT_VIDEO_THRESHOLD_SECS,
    TARGET_LANGUAGE,
};
use crate::types::Task;

static YOUTUBE_ID: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").ok()
});

/// Extract an 11-character YouTube video id from the common URL forms.
pub fn extract_youtube_video_id(url: &str) -> Option<String> {
    let re = YOUTUBE_ID.as_ref()?;
    let id = re.captures(url)?.get(2)?.as_str();
    (id.len() == 11).then(|| id.to_string())
}

fn locale_rule() -> String {
    format!(
        "All generated text (titles, summaries, tags, keywords, chapters) MUST be written in {}.",
        TARGET_LANGUAGE
    )
}

fn sentinel_rule(reason: &str) -> String {
    format!(
        "If you cannot confidently analyze the content, DO NOT GUESS or invent content. \
         Respond with exactly this JSON object instead: \
         {{\"error\": \"{}\", \"reason\": \"{}\"}}",
        SENTINEL_ERROR, reason
    )
}

/// Three alternative task drafts (standard, detailed, concise) from a rough idea.
pub fn build_draft_prompt(raw_input: &str) -> String {
    PromptBuilder::new()
        .role(
            "a principal product manager at a leading IT company",
            "turning rough work requests into professional task specifications",
        )
        .objectives(&[
            "Read the rough request and infer the underlying goal",
            "Write a specification a development or design team could start on immediately",
            &format!("Propose exactly {} drafts, one per style below", DRAFT_COUNT),
        ])
        .context_item("Request", &format!("\"{}\"", raw_input.trim()))
        .section(
            "Styles",
            "1. standard: balanced, professional tone.\n\
             2. detailed: background, concrete requirements and expected impact.\n\
             3. concise: only the essentials, quick to scan.",
        )
        .rules(&[
            locale_rule().as_str(),
            "priority MUST be one of HIGH, MEDIUM, LOW",
            "product is the inferred product line",
            "type is the kind of work (bug, feature, UX, planning, ...)",
            "styleTag names the style of the draft: standard, detailed or concise",
        ])
        .output_schema(
            r#"[
  {
    "title": "Clear, professional title",
    "description": "Description written in the draft's style, line breaks allowed",
    "priority": "HIGH | MEDIUM | LOW",
    "product": "Product line",
    "type": "Work type",
    "styleTag": "standard | detailed | concise"
  }
]
The array MUST contain exactly 3 objects."#,
        )
        .build()
}

/// Execution strategy and learning resources for an existing task.
pub fn build_task_analysis_prompt(task: &Task) -> String {
    PromptBuilder::new()
        .role(
            "a senior project manager and technical tutor",
            "preparing practitioners to execute a task",
        )
        .objectives(&[
            "Identify what the assignee must understand before starting",
            "Lay out a concrete, action-based execution plan",
            &format!(
                "Recommend {}-{} high-quality learning resources (docs, articles, videos)",
                MIN_SUGGESTED_RESOURCES, MAX_SUGGESTED_RESOURCES
            ),
        ])
        .context_item("Title", &task.title)
        .context_item("Product", &task.product)
        .context_item("Description", &task.description)
        .section(
            "Strategy Sections",
            "Write the strategy field as markdown with these sections:\n\
             - **What to know first**: concepts, tech stack or business context to grasp before starting\n\
             - **Stepwise execution**: concrete action items in order\n\
             - **Tips**: expected difficulties and ways to work efficiently\n\
             - **Risks**: potential problems and how to respond",
        )
        .rules(&[locale_rule().as_str(), "Resource URLs must be real, public links"])
        .output_schema(
            r#"{
  "strategy": "Markdown text with the four sections",
  "suggestedResources": [
    { "title": "Resource title", "url": "https://..." }
  ]
}"#,
        )
        .build()
}

/// Checklist decomposition of a task.
pub fn build_subtask_prompt(task: &Task) -> String {
    PromptBuilder::new()
        .role("a delivery lead", "breaking work into checklists")
        .objectives(&[&format!(
            "Break the task into {}-{} actionable checklist items",
            MIN_SUBTASKS, MAX_SUBTASKS
        )])
        .context_item("Task", &task.title)
        .context_item("Context", &task.description)
        .rules(&[locale_rule().as_str(), "Each item is one concrete, verifiable step"])
        .output_schema(r#"[{ "title": "Checklist item" }]"#)
        .build()
}

/// System turn for the per-task guide chat. Free text output.
pub fn build_chat_system_prompt(task: &Task) -> String {
    format!(
        "System: You are a helpful assistant guiding the user through the following task. \
         Title: {}. Description: {}. \
         Help the user complete it by giving context, answering questions and offering suggestions. \
         Be concise. Always answer in {}.",
        task.title, task.description, TARGET_LANGUAGE
    )
}

/// Persona that seeds the general streaming assistant.
pub fn build_assistant_preamble() -> String {
    format!(
        "You are Gemini, the intelligent assistant of the Nexus AI platform. \
         Raise the user's work productivity, offer creative ideas, and converse in a kind, \
         professional manner. Answer in {}.",
        TARGET_LANGUAGE
    )
}

/// Structured knowledge extraction for a URL, grounded with search.
pub fn build_resource_analysis_prompt(url: &str, video_id: Option<&str>) -> String {
    let search_target = match video_id {
        Some(id) => format!("site:youtube.com \"{}\"", id),
        None => url.to_string(),
    };
    let short_minutes = SHORT_VIDEO_THRESHOLD_SECS / 60;

    let mut builder = PromptBuilder::new()
        .role(
            "a content analysis AI for an internal knowledge management system",
            "extracting structured, storable knowledge from videos and documents",
        )
        .objectives(&[
            "Analyze the content (video or document) at the target URL",
            "For video, divide the material into logical, time-stamped chapters",
            "Extract full metadata suitable for search and cataloguing",
        ])
        .context_item("Target URL", url)
        .context_item("Search Query", &search_target)
        .context_item("Video ID", video_id.unwrap_or("N/A"));

    if let Some(id) = video_id {
        builder = builder.text(&format!(
            "This is a YouTube video with ID {}. Prioritize its transcript if available; \
             otherwise rely on its title, channel and description found through search.",
            id
        ));
    }

    builder
        .rules(&[
            locale_rule().as_str(),
            "Ground the analysis with Google Search to verify facts",
            &format!(
                "If the video is shorter than {} minutes, leave chapters as an empty array",
                short_minutes
            ),
            &format!(
                "If the video is {} minutes or longer, split it into 3-5 meaningful chapters",
                short_minutes
            ),
            "When information is thin, enrich keywords instead of inventing chapters",
            &sentinel_rule(SENTINEL_REASON_URL),
        ])
        .output_schema(&format!(
            r#"{{
  "basicInfo": {{
    "title": "Clear, concise title (max 50 chars, use the URL if not found)",
    "summary": "Core content in 1-2 sentences",
    "level": "BEGINNER | INTERMEDIATE | ADVANCED (default BEGINNER)",
    "tags": ["5-7 topic tags"],
    "author": "Author or speaker, or null",
    "contentType": "video | article"
  }},
  "metadata": {{
    "duration": "Length in seconds (integer, 0 if not a video)",
    "language": "Language code such as ko or en",
    "category": "Development | Design | Marketing | Operations | Other",
    "subCategory": "Sub-category such as Frontend, Backend, UI/UX",
    "uploadedAt": "Current time in ISO 8601",
    "department": "Most relevant internal department, or null"
  }},
  "searchOptimization": {{
    "keywords": ["10-15 search keywords"],
    "searchableText": "200-300 characters covering the main topics",
    "chapters": [
      {{ "title": "Chapter title", "timestamp": "00:00-05:30", "summary": "1-2 sentence summary" }}
    ]
  }},
  "managementInfo": {{
    "status": "active",
    "visibility": "team",
    "originalFileUrl": "{url}",
    "thumbnailUrl": null,
    "fileSize": null,
    "lastUpdated": "Current time in ISO 8601"
  }}
}}"#,
            url = url
        ))
        .build()
}

/// Summary, scenes and keywords from a sequence of sampled frames.
pub fn build_video_frames_prompt(frame_count: usize, duration_secs: f64) -> String {
    let duration = duration_secs.max(0.0).round() as u64;

    PromptBuilder::new()
        .role("an AI assistant", "video content analysis")
        .objectives(&[
            "overallSummary: synthesize all frames into one summary of the whole video",
            "scenes: identify distinct scenes; give each a short title, a 1-2 sentence summary \
             and start/end times in whole seconds estimated from the frame order and total duration",
            "keywords: list the most relevant keywords or tags",
        ])
        .context_item("Frames", &frame_count.to_string())
        .context_item("Total duration (seconds)", &duration.to_string())
        .rules(&[
            locale_rule().as_str(),
            &sentinel_rule(SENTINEL_REASON_FRAMES),
        ])
        .output_schema(
            r#"{
  "overallSummary": "Concise summary of the video",
  "scenes": [
    { "title": "Scene title", "summary": "What happens", "startTime": 0, "endTime": 30 }
  ],
  "keywords": ["keyword1", "keyword2"]
}"#,
        )
        .build()
}

/// Free-text three-part markdown summary of a URL.
pub fn build_quick_summary_prompt(url: &str) -> String {
    PromptBuilder::new()
        .role("a content summarization specialist", "concise structured summaries")
        .context_item("URL", url)
        .section(
            "Format",
            "Use exactly this markdown structure:\n\
             ### 서론\n[Introduce the topic or problem the content addresses]\n\n\
             ### 본론\n[Summarize the main points, arguments or steps]\n\n\
             ### 결론\n[The key takeaway, solution or final statement]",
        )
        .rules(&[
            &format!("Write the entire response in {}", TARGET_LANGUAGE),
            "Do not add any preamble or text outside the structure",
        ])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        let mut task = Task::new("Promo landing page");
        task.description = "Plan a summer campaign page".into();
        task.product = "Web".into();
        task
    }

    #[test]
    fn test_youtube_id_forms() {
        let id = "dQw4w9WgXcQ";
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?start=10",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_youtube_video_id(url).as_deref(), Some(id), "{}", url);
        }
    }

    #[test]
    fn test_youtube_id_rejects_wrong_length() {
        assert_eq!(extract_youtube_video_id("https://youtu.be/short"), None);
        assert_eq!(extract_youtube_video_id("https://example.com/article"), None);
    }

    #[test]
    fn test_draft_prompt() {
        let prompt = build_draft_prompt("write a promo landing page plan");
        assert!(prompt.contains("\"write a promo landing page plan\""));
        assert!(prompt.contains("exactly 3 objects"));
        assert!(prompt.contains("HIGH | MEDIUM | LOW"));
        assert!(prompt.contains("styleTag"));
        assert!(prompt.contains("JSON only"));
    }

    #[test]
    fn test_task_analysis_prompt() {
        let prompt = build_task_analysis_prompt(&sample_task());
        assert!(prompt.contains("**Title**: Promo landing page"));
        assert!(prompt.contains("What to know first"));
        assert!(prompt.contains("Risks"));
        assert!(prompt.contains("2-5"));
        assert!(prompt.contains("suggestedResources"));
    }

    #[test]
    fn test_subtask_prompt() {
        let prompt = build_subtask_prompt(&sample_task());
        assert!(prompt.contains("4-6"));
        assert!(prompt.contains(r#"[{ "title": "Checklist item" }]"#));
    }

    #[test]
    fn test_chat_system_prompt_anchors_task() {
        let prompt = build_chat_system_prompt(&sample_task());
        assert!(prompt.contains("Promo landing page"));
        assert!(prompt.contains("Plan a summer campaign page"));
        assert!(prompt.contains("Korean"));
    }

    #[test]
    fn test_resource_prompt_with_video() {
        let url = "https://youtu.be/dQw4w9WgXcQ";
        let prompt = build_resource_analysis_prompt(url, Some("dQw4w9WgXcQ"));
        assert!(prompt.contains("site:youtube.com \"dQw4w9WgXcQ\""));
        assert!(prompt.contains("shorter than 5 minutes"));
        assert!(prompt.contains(r#""error": "Analysis failed""#));
        assert!(prompt.contains(&format!(r#""originalFileUrl": "{}""#, url)));
        assert!(prompt.contains("00:00-05:30"));
    }

    #[test]
    fn test_resource_prompt_without_video() {
        let prompt = build_resource_analysis_prompt("https://example.com/post", None);
        assert!(prompt.contains("**Video ID**: N/A"));
        assert!(!prompt.contains("This is a YouTube video"));
    }

    #[test]
    fn test_frames_prompt() {
        let prompt = build_video_frames_prompt(12, 95.6);
        assert!(prompt.contains("**Frames**: 12"));
        assert!(prompt.contains("**Total duration (seconds)**: 96"));
        assert!(prompt.contains("Insufficient frames to determine video content."));
    }

    #[test]
    fn test_quick_summary_is_free_text() {
        let prompt = build_quick_summary_prompt("https://example.com");
        assert!(prompt.contains("### 서론"));
        assert!(prompt.contains("### 결론"));
        assert!(!prompt.contains("JSON only"));
    }
}
