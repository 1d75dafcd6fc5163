use handle_errors::{FieldError, ValidationErrors};
use serde::{Deserialize, Serialize};

use crate::types::question::QuestionId;

pub const MAX_TAG_LENGTH: usize = 50;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagId(pub i32);

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewTag {
    pub name: String,
}

impl NewTag {
    /// Trims the name and checks it is non-empty and short enough.
    pub fn clean(self) -> Result<NewTag, ValidationErrors> {
        let name = self.name.trim().to_string();
        let mut errors = ValidationErrors::new();
        if name.is_empty() {
            errors.add("name", FieldError::Required);
        } else if name.chars().count() > MAX_TAG_LENGTH {
            errors.add(
                "name",
                FieldError::TooLong {
                    max: MAX_TAG_LENGTH,
                },
            );
        }
        errors.into_result(NewTag { name })
    }
}

/// Row of the question/tag association table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuestionTag {
    pub id: i32,
    pub question_id: QuestionId,
    pub tag_id: TagId,
}

/// Body of a request attaching a tag to a question.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AttachTag {
    pub tag_id: TagId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_names_are_trimmed() {
        let tag = NewTag {
            name: "  algebra ".to_string(),
        }
        .clean()
        .unwrap();

        assert_eq!(tag.name, "algebra");
    }

    #[test]
    fn blank_tag_names_are_required() {
        let errors = NewTag {
            name: "   ".to_string(),
        }
        .clean()
        .unwrap_err();

        assert_eq!(errors.get("name"), Some(&FieldError::Required));
    }

    #[test]
    fn long_tag_names_are_rejected() {
        let errors = NewTag {
            name: "x".repeat(MAX_TAG_LENGTH + 1),
        }
        .clean()
        .unwrap_err();

        assert!(errors.contains("name"));
    }
}
