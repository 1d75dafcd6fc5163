use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

use crate::types::{
    account::{Profile, ProfileId},
    question::{NewQuestion, Question, QuestionId},
    subject::{BookId, SubSubjectId, SubjectId},
    tag::{NewTag, QuestionTag, Tag, TagId},
};

use handle_errors::{Error, FieldError, ValidationErrors};

const QUESTION_COLUMNS: &str = "id, profile_id, title, content, subject_id, sub_subject_id, \
     grade, book_id, book_page, submitted_at, is_edited";

#[derive(Debug, Clone)]
pub struct Store {
    pub connection: PgPool,
}

fn question_from_row(row: PgRow) -> Result<Question, sqlx::Error> {
    let grade: String = row.try_get("grade")?;
    Ok(Question {
        id: QuestionId(row.try_get("id")?),
        profile_id: ProfileId(row.try_get("profile_id")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        subject_id: SubjectId(row.try_get("subject_id")?),
        sub_subject_id: row
            .try_get::<Option<i32>, _>("sub_subject_id")?
            .map(SubSubjectId),
        grade: grade
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        book_id: row.try_get::<Option<i32>, _>("book_id")?.map(BookId),
        book_page: row.try_get("book_page")?,
        submitted_at: row.try_get("submitted_at")?,
        is_edited: row.try_get("is_edited")?,
    })
}

fn tag_from_row(row: PgRow) -> Tag {
    Tag {
        id: TagId(row.get("id")),
        name: row.get("name"),
    }
}

fn query_failed(error: sqlx::Error) -> Error {
    tracing::event!(tracing::Level::ERROR, "{:?}", error);
    Error::DatabaseQueryError(error)
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self, Error> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .map_err(Error::DatabaseQueryError)?;

        Ok(Store {
            connection: db_pool,
        })
    }

    /// A store whose connections are only opened on first use.
    pub fn lazy(db_url: &str) -> Result<Self, Error> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(db_url)
            .map_err(Error::DatabaseQueryError)?;

        Ok(Store {
            connection: db_pool,
        })
    }

    pub async fn get_questions(
        &self,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Question>, Error> {
        sqlx::query(&format!(
            "SELECT {} FROM questions ORDER BY submitted_at DESC, id DESC LIMIT $1 OFFSET $2",
            QUESTION_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .try_map(question_from_row)
        .fetch_all(&self.connection)
        .await
        .map_err(query_failed)
    }

    pub async fn get_question(&self, question_id: i32) -> Result<Question, Error> {
        match sqlx::query(&format!(
            "SELECT {} FROM questions WHERE id = $1",
            QUESTION_COLUMNS
        ))
        .bind(question_id)
        .try_map(question_from_row)
        .fetch_optional(&self.connection)
        .await
        {
            Ok(Some(question)) => Ok(question),
            Ok(None) => Err(Error::QuestionNotFound),
            Err(error) => Err(query_failed(error)),
        }
    }

    /// Reports the subject, sub-subject and book ids of `question` that do
    /// not name an existing row, keyed by their form field.
    pub async fn unknown_references(
        &self,
        question: &NewQuestion,
    ) -> Result<ValidationErrors, Error> {
        let row = sqlx::query(
            "SELECT
                EXISTS (SELECT 1 FROM subjects WHERE id = $1) AS subject,
                $2::integer IS NULL
                    OR EXISTS (SELECT 1 FROM sub_subjects WHERE id = $2) AS sub_subject,
                $3::integer IS NULL
                    OR EXISTS (SELECT 1 FROM books WHERE id = $3) AS book",
        )
        .bind(question.subject_id.0)
        .bind(question.sub_subject_id.map(|id| id.0))
        .bind(question.book_id.map(|id| id.0))
        .fetch_one(&self.connection)
        .await
        .map_err(query_failed)?;

        let mut errors = ValidationErrors::new();
        if !row.get::<bool, _>("subject") {
            errors.add(
                "subject",
                FieldError::InvalidChoice(question.subject_id.0.to_string()),
            );
        }
        if let (false, Some(id)) = (row.get::<bool, _>("sub_subject"), question.sub_subject_id) {
            errors.add("sub-subject", FieldError::InvalidChoice(id.0.to_string()));
        }
        if let (false, Some(id)) = (row.get::<bool, _>("book"), question.book_id) {
            errors.add("book", FieldError::InvalidChoice(id.0.to_string()));
        }
        Ok(errors)
    }

    pub async fn add_question(&self, new_question: NewQuestion) -> Result<Question, Error> {
        sqlx::query(&format!(
            "INSERT INTO questions
                (profile_id, title, content, subject_id, sub_subject_id,
                 grade, book_id, book_page, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}",
            QUESTION_COLUMNS
        ))
        .bind(new_question.profile_id.0)
        .bind(new_question.title)
        .bind(new_question.content)
        .bind(new_question.subject_id.0)
        .bind(new_question.sub_subject_id.map(|id| id.0))
        .bind(new_question.grade.as_str())
        .bind(new_question.book_id.map(|id| id.0))
        .bind(new_question.book_page)
        .bind(new_question.submitted_at)
        .try_map(question_from_row)
        .fetch_one(&self.connection)
        .await
        .map_err(query_failed)
    }

    /// Overwrites the editable fields and marks the question as edited.
    /// Owner and submission time are left untouched.
    pub async fn update_question(
        &self,
        question_id: i32,
        question: NewQuestion,
        profile_id: ProfileId,
    ) -> Result<Question, Error> {
        sqlx::query(&format!(
            "UPDATE questions
            SET title = $1, content = $2, subject_id = $3, sub_subject_id = $4,
                grade = $5, book_id = $6, book_page = $7, is_edited = TRUE
            WHERE id = $8 AND profile_id = $9
            RETURNING {}",
            QUESTION_COLUMNS
        ))
        .bind(question.title)
        .bind(question.content)
        .bind(question.subject_id.0)
        .bind(question.sub_subject_id.map(|id| id.0))
        .bind(question.grade.as_str())
        .bind(question.book_id.map(|id| id.0))
        .bind(question.book_page)
        .bind(question_id)
        .bind(profile_id.0)
        .try_map(question_from_row)
        .fetch_one(&self.connection)
        .await
        .map_err(query_failed)
    }

    pub async fn delete_question(
        &self,
        question_id: i32,
        profile_id: ProfileId,
    ) -> Result<bool, Error> {
        match sqlx::query("DELETE FROM questions WHERE id = $1 AND profile_id = $2")
            .bind(question_id)
            .bind(profile_id.0)
            .execute(&self.connection)
            .await
        {
            Ok(result) => Ok(result.rows_affected() > 0),
            Err(error) => Err(query_failed(error)),
        }
    }

    pub async fn is_question_owner(
        &self,
        question_id: i32,
        profile_id: &ProfileId,
    ) -> Result<bool, Error> {
        match sqlx::query("SELECT id FROM questions WHERE id = $1 AND profile_id = $2")
            .bind(question_id)
            .bind(profile_id.0)
            .fetch_optional(&self.connection)
            .await
        {
            Ok(question) => Ok(question.is_some()),
            Err(error) => Err(query_failed(error)),
        }
    }

    pub async fn get_tags(&self) -> Result<Vec<Tag>, Error> {
        sqlx::query("SELECT id, name FROM tags ORDER BY name")
            .map(tag_from_row)
            .fetch_all(&self.connection)
            .await
            .map_err(query_failed)
    }

    pub async fn add_tag(&self, new_tag: NewTag) -> Result<Tag, Error> {
        sqlx::query("INSERT INTO tags (name) VALUES ($1) RETURNING id, name")
            .bind(new_tag.name)
            .map(tag_from_row)
            .fetch_one(&self.connection)
            .await
            .map_err(query_failed)
    }

    pub async fn delete_tag(&self, tag_id: i32) -> Result<bool, Error> {
        match sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(tag_id)
            .execute(&self.connection)
            .await
        {
            Ok(result) => Ok(result.rows_affected() > 0),
            Err(error) => Err(query_failed(error)),
        }
    }

    pub async fn get_question_tags(&self, question_id: i32) -> Result<Vec<Tag>, Error> {
        sqlx::query(
            "SELECT t.id, t.name FROM tags t
            INNER JOIN question_tags qt ON t.id = qt.tag_id
            WHERE qt.question_id = $1
            ORDER BY t.name",
        )
        .bind(question_id)
        .map(tag_from_row)
        .fetch_all(&self.connection)
        .await
        .map_err(query_failed)
    }

    /// Links a tag to a question. A pair that already exists is rejected by
    /// the `question_tag` unique constraint.
    pub async fn attach_tag(&self, question_id: i32, tag_id: TagId) -> Result<QuestionTag, Error> {
        sqlx::query(
            "INSERT INTO question_tags (question_id, tag_id)
            VALUES ($1, $2)
            RETURNING id, question_id, tag_id",
        )
        .bind(question_id)
        .bind(tag_id.0)
        .map(|row: PgRow| QuestionTag {
            id: row.get("id"),
            question_id: QuestionId(row.get("question_id")),
            tag_id: TagId(row.get("tag_id")),
        })
        .fetch_one(&self.connection)
        .await
        .map_err(|error| {
            if handle_errors::is_unique_violation(&error) {
                tracing::event!(
                    tracing::Level::WARN,
                    question_id,
                    tag_id = tag_id.0,
                    "tag already attached"
                );
                Error::DatabaseQueryError(error)
            } else {
                query_failed(error)
            }
        })
    }

    pub async fn detach_tag(&self, question_id: i32, tag_id: i32) -> Result<bool, Error> {
        match sqlx::query("DELETE FROM question_tags WHERE question_id = $1 AND tag_id = $2")
            .bind(question_id)
            .bind(tag_id)
            .execute(&self.connection)
            .await
        {
            Ok(result) => Ok(result.rows_affected() > 0),
            Err(error) => Err(query_failed(error)),
        }
    }

    pub async fn add_profile(&self, profile: Profile) -> Result<ProfileId, Error> {
        match sqlx::query("INSERT INTO profiles (username, password) VALUES ($1, $2) RETURNING id")
            .bind(profile.username)
            .bind(profile.password)
            .map(|row: PgRow| ProfileId(row.get("id")))
            .fetch_one(&self.connection)
            .await
        {
            Ok(id) => Ok(id),
            Err(error) => {
                if let Some(db_error) = error.as_database_error() {
                    tracing::event!(
                        tracing::Level::ERROR,
                        code = ?db_error.code(),
                        db_message = db_error.message(),
                        constraint = ?db_error.constraint(),
                    );
                }
                Err(Error::DatabaseQueryError(error))
            }
        }
    }

    pub async fn get_profile(&self, username: String) -> Result<Profile, Error> {
        sqlx::query("SELECT id, username, password FROM profiles WHERE username = $1")
            .bind(username)
            .map(|row: PgRow| Profile {
                id: Some(ProfileId(row.get("id"))),
                username: row.get("username"),
                password: row.get("password"),
            })
            .fetch_one(&self.connection)
            .await
            .map_err(query_failed)
    }

    /// Deletes a profile together with every question it owns.
    pub async fn delete_profile(&self, profile_id: ProfileId) -> Result<bool, Error> {
        match sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(profile_id.0)
            .execute(&self.connection)
            .await
        {
            Ok(result) => Ok(result.rows_affected() > 0),
            Err(error) => Err(query_failed(error)),
        }
    }
}
