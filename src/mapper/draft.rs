use crate::ai::validation::DraftsPayload;
use crate::types::{Priority, TaskPatch};

/// Drafts become patches in model order. Priority is always set, coerced to
/// MEDIUM when missing or unrecognized.
pub fn map_drafts(payload: DraftsPayload) -> Vec<TaskPatch> {
    payload
        .0
        .into_iter()
        .map(|item| TaskPatch {
            priority: Some(Priority::coerce(item.priority.as_deref())),
            title: Some(item.title),
            description: item.description,
            product: item.product,
            task_type: item.task_type,
            style_tag: item.style_tag,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::validation::DraftItem;

    fn item(title: &str, priority: Option<&str>) -> DraftItem {
        DraftItem {
            title: title.into(),
            description: Some(format!("{} body", title)),
            priority: priority.map(String::from),
            product: None,
            task_type: Some("Marketing".into()),
            style_tag: None,
        }
    }

    #[test]
    fn test_priorities_coerced() {
        let patches = map_drafts(DraftsPayload(vec![
            item("a", Some("high")),
            item("b", None),
            item("c", Some("critical")),
        ]));

        let priorities: Vec<_> = patches.iter().map(|p| p.priority).collect();
        assert_eq!(
            priorities,
            vec![Some(Priority::High), Some(Priority::Medium), Some(Priority::Medium)]
        );
        assert_eq!(patches[0].task_type.as_deref(), Some("Marketing"));
    }
}
