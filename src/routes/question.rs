use chrono::Utc;
use handle_errors::{FieldError, ValidationErrors};
use std::collections::HashMap;
use tracing::{Level, event, info, instrument};
use warp::Reply;
use warp::http::StatusCode;

use crate::routes::render::new_question_page;
use crate::store::Store;
use crate::types::account::Session;
use crate::types::pagination::{Pagination, extract_pagination};
use crate::types::question::{NewQuestion, QuestionCandidate, QuestionForm, QuestionWithTags};

/// Renders the empty new-question form.
pub async fn new_question_form() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::html(new_question_page(
        &QuestionForm::default(),
        None,
    )))
}

fn redisplay(form: &QuestionForm, errors: ValidationErrors) -> warp::reply::Response {
    event!(Level::INFO, "rejected new question: {}", errors);
    warp::reply::html(new_question_page(form, Some(&errors))).into_response()
}

/// Maps a foreign key violation on insert back to the form field whose
/// reference vanished after it was checked.
fn reference_errors(
    error: &handle_errors::Error,
    question: &NewQuestion,
) -> Option<ValidationErrors> {
    let db_error = match error {
        handle_errors::Error::DatabaseQueryError(e)
            if handle_errors::is_foreign_key_violation(e) =>
        {
            e.as_database_error()?
        }
        _ => return None,
    };

    let (field, id) = match db_error.constraint()? {
        "questions_subject_id_fkey" => ("subject", question.subject_id.0),
        "questions_sub_subject_id_fkey" => ("sub-subject", question.sub_subject_id?.0),
        "questions_book_id_fkey" => ("book", question.book_id?.0),
        _ => return None,
    };

    let mut errors = ValidationErrors::new();
    errors.add(field, FieldError::InvalidChoice(id.to_string()));
    Some(errors)
}

/// Validates a posted new-question form and stores it.
///
/// An invalid form, including one naming a subject, sub-subject or book
/// that does not exist, writes nothing and is sent back with its errors.
#[instrument(skip(store, form), fields(profile_id = session.profile_id.0))]
pub async fn submit_new_question(
    session: Session,
    store: Store,
    form: QuestionForm,
) -> Result<warp::reply::Response, warp::Rejection> {
    let new_question = match form.clean(session.profile_id, Utc::now()) {
        Ok(new_question) => new_question,
        Err(errors) => return Ok(redisplay(&form, errors)),
    };

    let unknown = store.unknown_references(&new_question).await?;
    if !unknown.is_empty() {
        return Ok(redisplay(&form, unknown));
    }

    match store.add_question(new_question.clone()).await {
        Ok(question) => {
            info!(question_id = question.id.0, "question posted");
            Ok(warp::reply::with_status(warp::reply::json(&question), StatusCode::CREATED)
                .into_response())
        }
        Err(e) => match reference_errors(&e, &new_question) {
            Some(errors) => Ok(redisplay(&form, errors)),
            None => Err(warp::reject::custom(e)),
        },
    }
}

#[instrument]
pub async fn get_questions(
    params: HashMap<String, String>,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    event!(target: "qna_board", Level::INFO, "querying questions");
    let mut pagination = Pagination::default();

    if !params.is_empty() {
        event!(Level::INFO, pagination = true);
        pagination = extract_pagination(params)?;
    }

    match store
        .get_questions(pagination.limit, pagination.offset)
        .await
    {
        Ok(res) => Ok(warp::reply::json(&res)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument]
pub async fn get_question(id: i32, store: Store) -> Result<impl warp::Reply, warp::Rejection> {
    let question = store.get_question(id).await?;
    let tags = store.get_question_tags(id).await?;

    Ok(warp::reply::json(&QuestionWithTags { question, tags }))
}

/// Re-validates the edited question and saves it, flagging it as edited.
///
/// The owner and the original submission time always come from the stored
/// question, never from the body.
#[instrument(skip(store))]
pub async fn update_question(
    id: i32,
    session: Session,
    store: Store,
    candidate: QuestionCandidate,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile_id = session.profile_id;
    let existing = store.get_question(id).await?;
    if existing.profile_id != profile_id {
        return Err(warp::reject::custom(handle_errors::Error::Unauthorized));
    }

    let candidate = QuestionCandidate {
        profile_id: Some(existing.profile_id),
        submitted_at: Some(existing.submitted_at),
        ..candidate
    };
    let question = candidate
        .clean_fields()
        .map_err(handle_errors::Error::ValidationError)?;

    match store.update_question(id, question, profile_id).await {
        Ok(res) => Ok(warp::reply::json(&res)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument(skip(store))]
pub async fn delete_question(
    id: i32,
    session: Session,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile_id = session.profile_id;
    store.get_question(id).await?;
    if store.is_question_owner(id, &profile_id).await? {
        match store.delete_question(id, profile_id).await {
            Ok(_) => Ok(warp::reply::with_status(
                format!("Question {} deleted", id),
                StatusCode::OK,
            )),
            Err(e) => Err(warp::reject::custom(e)),
        }
    } else {
        Err(warp::reject::custom(handle_errors::Error::Unauthorized))
    }
}
