use chrono::{DateTime, Utc};
use handle_errors::{FieldError, ValidationErrors};
use serde::{Deserialize, Serialize};

use crate::types::{
    account::ProfileId,
    grade::Grade,
    subject::{BookId, SubSubjectId, SubjectId},
    tag::Tag,
};

/// Book pages must lie in `[0, MAX_BOOK_PAGE)`.
pub const MAX_BOOK_PAGE: i64 = 10_000;
pub const MAX_TITLE_LENGTH: usize = 200;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub profile_id: ProfileId,
    pub title: String,
    pub content: Option<String>,
    pub subject_id: SubjectId,
    pub sub_subject_id: Option<SubSubjectId>,
    pub grade: Grade,
    pub book_id: Option<BookId>,
    pub book_page: Option<i32>,
    pub submitted_at: DateTime<Utc>,
    pub is_edited: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub struct QuestionId(pub i32);

#[derive(Serialize, Debug, Clone)]
pub struct QuestionWithTags {
    #[serde(flatten)]
    pub question: Question,
    pub tags: Vec<Tag>,
}

/// A question that passed validation and can be inserted.
///
/// There is no `is_edited` here: every new row starts unedited.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub profile_id: ProfileId,
    pub title: String,
    pub content: Option<String>,
    pub subject_id: SubjectId,
    pub sub_subject_id: Option<SubSubjectId>,
    pub grade: Grade,
    pub book_id: Option<BookId>,
    pub book_page: Option<i32>,
    pub submitted_at: DateTime<Utc>,
}

impl NewQuestion {
    pub fn new(
        profile_id: ProfileId,
        title: impl Into<String>,
        subject_id: SubjectId,
        grade: Grade,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        NewQuestion {
            profile_id,
            title: title.into(),
            content: None,
            subject_id,
            sub_subject_id: None,
            grade,
            book_id: None,
            book_page: None,
            submitted_at,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_sub_subject(mut self, sub_subject_id: SubSubjectId) -> Self {
        self.sub_subject_id = Some(sub_subject_id);
        self
    }

    pub fn with_book(mut self, book_id: BookId) -> Self {
        self.book_id = Some(book_id);
        self
    }

    pub fn with_book_page(mut self, book_page: i32) -> Self {
        self.book_page = Some(book_page);
        self
    }
}

/// A question as submitted, before any rule has been checked.
///
/// Every field may be missing. `grade` stays a raw string so that an
/// unrecognized value can be reported as such.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct QuestionCandidate {
    pub profile_id: Option<ProfileId>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub subject_id: Option<SubjectId>,
    pub sub_subject_id: Option<SubSubjectId>,
    pub grade: Option<String>,
    pub book_id: Option<BookId>,
    pub book_page: Option<i64>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl QuestionCandidate {
    /// Checks every field rule and reports all failing fields at once.
    ///
    /// This is the only place question input is validated; the form
    /// endpoint and the update endpoint both end up here.
    pub fn clean_fields(&self) -> Result<NewQuestion, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.profile_id.is_none() {
            errors.add("profile", FieldError::Required);
        }

        let title = non_blank(&self.title);
        match title {
            None => errors.add("title", FieldError::Required),
            Some(title) if title.chars().count() > MAX_TITLE_LENGTH => errors.add(
                "title",
                FieldError::TooLong {
                    max: MAX_TITLE_LENGTH,
                },
            ),
            Some(_) => {}
        }

        if self.submitted_at.is_none() {
            errors.add("date", FieldError::Required);
        }

        if self.subject_id.is_none() {
            errors.add("subject", FieldError::Required);
        }

        let grade = match non_blank(&self.grade) {
            None => {
                errors.add("grade", FieldError::Required);
                None
            }
            Some(raw) => match raw.parse::<Grade>() {
                Ok(grade) => Some(grade),
                Err(_) => {
                    errors.add("grade", FieldError::InvalidChoice(raw.to_string()));
                    None
                }
            },
        };

        let book_page = match self.book_page {
            Some(page) if page < 0 => {
                errors.add("book_page", FieldError::BelowMinimum { min: 0 });
                None
            }
            Some(page) if page >= MAX_BOOK_PAGE => {
                errors.add(
                    "book_page",
                    FieldError::AboveMaximum { max: MAX_BOOK_PAGE },
                );
                None
            }
            // in range, so it fits an i32
            Some(page) => Some(page as i32),
            None => None,
        };

        match (self.profile_id, title, self.submitted_at, self.subject_id, grade) {
            (Some(profile_id), Some(title), Some(submitted_at), Some(subject_id), Some(grade))
                if errors.is_empty() =>
            {
                Ok(NewQuestion {
                    profile_id,
                    title: title.to_string(),
                    content: non_blank(&self.content).map(str::to_string),
                    subject_id,
                    sub_subject_id: self.sub_subject_id,
                    grade,
                    book_id: self.book_id,
                    book_page,
                    submitted_at,
                })
            }
            _ => Err(errors),
        }
    }
}

/// The new-question form exactly as posted by a browser.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct QuestionForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub subject: Option<String>,
    #[serde(rename = "sub-subject", alias = "sub_subject")]
    pub sub_subject: Option<String>,
    pub grade: Option<String>,
    pub book: Option<String>,
    pub book_page: Option<String>,
}

fn parse_number<T: std::str::FromStr>(
    field: &'static str,
    value: &Option<String>,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let raw = non_blank(value)?;
    match raw.parse::<T>() {
        Ok(number) => Some(number),
        Err(_) => {
            errors.add(field, FieldError::NotANumber);
            None
        }
    }
}

impl QuestionForm {
    /// Decodes the form into a candidate owned by `profile_id` and submitted
    /// at `now`, then validates it with [`QuestionCandidate::clean_fields`].
    pub fn clean(
        &self,
        profile_id: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<NewQuestion, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let candidate = QuestionCandidate {
            profile_id: Some(profile_id),
            title: self.title.clone(),
            content: self.content.clone(),
            submitted_at: Some(now),
            subject_id: parse_number("subject", &self.subject, &mut errors).map(SubjectId),
            sub_subject_id: parse_number("sub-subject", &self.sub_subject, &mut errors)
                .map(SubSubjectId),
            grade: self.grade.clone(),
            book_id: parse_number("book", &self.book, &mut errors).map(BookId),
            book_page: parse_number("book_page", &self.book_page, &mut errors),
        };

        match candidate.clean_fields() {
            Ok(question) if errors.is_empty() => Ok(question),
            Ok(_) => Err(errors),
            Err(rule_errors) => {
                errors.merge(rule_errors);
                Err(errors)
            }
        }
    }
}
