use crate::types::{Subtask, now_millis};

/// Seed for one batch of generated subtasks
pub fn subtask_seed() -> String {
    format!("sub_{}", now_millis())
}

/// Unchecked subtasks with ids `{seed}-{index}`, in title order.
pub fn map_subtasks(titles: Vec<String>, seed: &str) -> Vec<Subtask> {
    titles
        .into_iter()
        .enumerate()
        .map(|(index, title)| Subtask {
            id: format!("{}-{}", seed, index),
            title,
            completed: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeds_give_distinct_ids() {
        let titles = vec!["Collect data".to_string(), "Draft copy".to_string()];
        let first = map_subtasks(titles.clone(), "sub_1");
        let second = map_subtasks(titles, "sub_2");

        assert_eq!(first[1].id, "sub_1-1");
        assert!(first.iter().zip(&second).all(|(a, b)| a.id != b.id && a.title == b.title));
        assert!(first.iter().all(|s| !s.completed));
    }
}
