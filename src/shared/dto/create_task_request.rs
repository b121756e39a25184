use serde::Deserialize;

use crate::{task::NewTask, task_priority::TaskPriority};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const TAG_MAX_CHARS: usize = 20;

/// Candidate task as posted by a client. Everything is optional here so the
/// validator, not the decoder, decides what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<Vec<String>>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Accepted and ignored: new tasks always start incomplete.
    #[serde(default)]
    pub completed: Option<bool>,
}

impl CreateTaskRequest {
    /// Check the candidate, stopping at the first broken rule.
    pub fn validate(self) -> Result<NewTask, String> {
        let title = self.title.filter(|t| !t.is_empty()).ok_or("Title is required")?;
        let description = self
            .description
            .filter(|d| !d.is_empty())
            .ok_or("Description is required")?;
        let priority = self.priority.filter(|p| !p.is_empty()).ok_or("Priority is required")?;
        let tags = self.tags.filter(|t| !t.is_empty()).ok_or("At least one tag is required")?;
        let image = self.image.filter(|i| !i.is_empty()).ok_or("At least one image is required")?;

        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(format!("Title must be at most {TITLE_MAX_CHARS} characters"));
        }
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(format!("Description must be at most {DESCRIPTION_MAX_CHARS} characters"));
        }
        let priority: TaskPriority = priority.parse().map_err(|e| format!("{e}"))?;
        if let Some(tag) = tags.iter().find(|t| t.chars().count() > TAG_MAX_CHARS) {
            return Err(format!("Tag '{tag}' must be at most {TAG_MAX_CHARS} characters"));
        }

        Ok(NewTask { title, description, image, priority, tags })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn complete() -> CreateTaskRequest {
        CreateTaskRequest {
            title: Some("A".into()),
            description: Some("B".into()),
            image: Some(vec!["y".into()]),
            priority: Some("low".into()),
            tags: Some(vec!["x".into()]),
            completed: None,
        }
    }

    #[test]
    fn complete_candidate_validates() {
        let task = complete().validate().unwrap();
        assert_eq!(task.title, "A");
        assert_eq!(task.priority, TaskPriority::Low);
    }

    #[rstest]
    #[case::title(|r: &mut CreateTaskRequest| r.title = None, "Title is required")]
    #[case::empty_title(|r: &mut CreateTaskRequest| r.title = Some(String::new()), "Title is required")]
    #[case::description(|r: &mut CreateTaskRequest| r.description = None, "Description is required")]
    #[case::priority(|r: &mut CreateTaskRequest| r.priority = None, "Priority is required")]
    #[case::tags(|r: &mut CreateTaskRequest| r.tags = Some(vec![]), "At least one tag is required")]
    #[case::null_tags(|r: &mut CreateTaskRequest| r.tags = None, "At least one tag is required")]
    #[case::image(|r: &mut CreateTaskRequest| r.image = Some(vec![]), "At least one image is required")]
    #[case::null_image(|r: &mut CreateTaskRequest| r.image = None, "At least one image is required")]
    fn missing_field_is_reported(#[case] break_it: fn(&mut CreateTaskRequest), #[case] message: &str) {
        let mut request = complete();
        break_it(&mut request);
        assert_eq!(request.validate().unwrap_err(), message);
    }

    #[test]
    fn first_violation_wins() {
        // Everything missing: title is checked first
        assert_eq!(CreateTaskRequest::default().validate().unwrap_err(), "Title is required");

        let only_title = CreateTaskRequest { title: Some("t".into()), ..Default::default() };
        assert_eq!(only_title.validate().unwrap_err(), "Description is required");

        let no_tags_no_image = CreateTaskRequest { tags: Some(vec![]), image: Some(vec![]), ..complete() };
        assert_eq!(no_tags_no_image.validate().unwrap_err(), "At least one tag is required");
    }

    #[test]
    fn null_lists_count_as_missing() {
        let body = serde_json::json!({
            "title": "A", "description": "B", "priority": "low", "tags": null, "image": ["y"]
        });
        let request: CreateTaskRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.validate().unwrap_err(), "At least one tag is required");

        let body = serde_json::json!({
            "title": "A", "description": "B", "priority": "low", "tags": ["x"], "image": null
        });
        let request: CreateTaskRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.validate().unwrap_err(), "At least one image is required");
    }

    #[test]
    fn bounds_are_enforced() {
        let long_title = CreateTaskRequest { title: Some("t".repeat(101)), ..complete() };
        assert!(long_title.validate().unwrap_err().starts_with("Title must be at most 100"));

        let max_title = CreateTaskRequest { title: Some("t".repeat(100)), ..complete() };
        assert!(max_title.validate().is_ok());

        let long_description = CreateTaskRequest { description: Some("d".repeat(1001)), ..complete() };
        assert!(long_description.validate().unwrap_err().starts_with("Description must be at most"));

        let long_tag = CreateTaskRequest { tags: Some(vec!["ok".into(), "t".repeat(21)]), ..complete() };
        assert!(long_tag.validate().unwrap_err().contains("at most 20 characters"));

        let bad_priority = CreateTaskRequest { priority: Some("urgent".into()), ..complete() };
        assert!(bad_priority.validate().unwrap_err().starts_with("Priority must be one of"));
    }
}
