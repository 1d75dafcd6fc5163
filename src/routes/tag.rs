use tracing::{Level, event, instrument};
use warp::http::StatusCode;

use crate::store::Store;
use crate::types::account::Session;
use crate::types::tag::{AttachTag, NewTag};

#[instrument]
pub async fn get_tags(store: Store) -> Result<impl warp::Reply, warp::Rejection> {
    match store.get_tags().await {
        Ok(tags) => Ok(warp::reply::json(&tags)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument(skip(store))]
pub async fn add_tag(
    session: Session,
    store: Store,
    new_tag: NewTag,
) -> Result<impl warp::Reply, warp::Rejection> {
    let new_tag = new_tag
        .clean()
        .map_err(handle_errors::Error::ValidationError)?;

    match store.add_tag(new_tag).await {
        Ok(tag) => Ok(warp::reply::with_status(
            warp::reply::json(&tag),
            StatusCode::CREATED,
        )),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

/// Deletes a tag and detaches it from every question.
#[instrument(skip(store))]
pub async fn delete_tag(
    id: i32,
    session: Session,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    match store.delete_tag(id).await {
        Ok(true) => Ok(warp::reply::with_status(
            format!("Tag {} deleted", id),
            StatusCode::OK,
        )),
        Ok(false) => Err(warp::reject::custom(handle_errors::Error::TagNotFound)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument(skip(store))]
pub async fn attach_tag(
    question_id: i32,
    session: Session,
    store: Store,
    attach: AttachTag,
) -> Result<impl warp::Reply, warp::Rejection> {
    let question = store.get_question(question_id).await?;
    if question.profile_id != session.profile_id {
        return Err(warp::reject::custom(handle_errors::Error::Unauthorized));
    }

    match store.attach_tag(question_id, attach.tag_id).await {
        Ok(question_tag) => Ok(warp::reply::with_status(
            warp::reply::json(&question_tag),
            StatusCode::CREATED,
        )),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument(skip(store))]
pub async fn detach_tag(
    question_id: i32,
    tag_id: i32,
    session: Session,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    let question = store.get_question(question_id).await?;
    if question.profile_id != session.profile_id {
        return Err(warp::reject::custom(handle_errors::Error::Unauthorized));
    }

    match store.detach_tag(question_id, tag_id).await {
        Ok(true) => Ok(warp::reply::with_status(
            format!("Tag {} detached from question {}", tag_id, question_id),
            StatusCode::OK,
        )),
        Ok(false) => {
            event!(Level::WARN, question_id, tag_id, "tag was not attached");
            Err(warp::reject::custom(handle_errors::Error::TagNotFound))
        }
        Err(e) => Err(warp::reject::custom(e)),
    }
}
