//! HTTP tests against a live PostgreSQL.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use sqlx::Row;
use warp::http::StatusCode;
use warp::{Filter, Reply};

use qna_board::build_routes;
use qna_board::routes::authentication::{TokenKey, issue_token};
use qna_board::store::Store;
use qna_board::types::account::{Profile, ProfileId};

const KEY: &str = "RANDOM WORDS WINTER MACINTOSH PC";

async fn store() -> Store {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = Store::new(&url).await.expect("cannot connect to database");
    sqlx::migrate!()
        .run(&store.connection)
        .await
        .expect("cannot run migrations");
    store
}

fn routes(store: Store) -> impl Filter<Extract = impl Reply> + Clone {
    build_routes(store, TokenKey::new(KEY).unwrap())
}

async fn profile(store: &Store) -> ProfileId {
    store
        .add_profile(Profile {
            id: None,
            username: format!("Lior-{}", rand::random::<u64>()),
            password: "not-a-real-hash".to_string(),
        })
        .await
        .unwrap()
}

fn token(profile_id: ProfileId) -> String {
    issue_token(profile_id, &TokenKey::new(KEY).unwrap()).unwrap()
}

async fn questions_titled(store: &Store, title: &str, profile_id: ProfileId) -> i64 {
    sqlx::query("SELECT COUNT(*) AS stored FROM questions WHERE title = $1 AND profile_id = $2")
        .bind(title)
        .bind(profile_id.0)
        .fetch_one(&store.connection)
        .await
        .unwrap()
        .get("stored")
}

#[tokio::test]
#[ignore = "needs a PostgreSQL database in DATABASE_URL"]
async fn valid_submissions_are_stored() {
    let store = store().await;
    let bodies = [
        "title=Question+in+Math&subject=1&grade=GRADE7",
        "title=Question+in+Math&content=How+much+is+it+1%2B1%3F&subject=1&grade=GRADE7",
        "title=Question+in+Math&subject=1&sub-subject=2&grade=GRADE7",
        "title=Question+in+Math&subject=1&grade=GRADE7&book=2",
        "title=Question+in+Math&subject=1&grade=GRADE7&book_page=23",
    ];

    for body in bodies {
        let owner = profile(&store).await;
        let res = warp::test::request()
            .method("POST")
            .path("/explore/new_question")
            .header("Authorization", token(owner))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body)
            .reply(&routes(store.clone()))
            .await;

        assert!(res.status().is_success(), "{}: {}", body, res.status());
        let question: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(question["is_edited"], false, "{}", body);
        assert_eq!(
            questions_titled(&store, "Question in Math", owner).await,
            1,
            "{}",
            body
        );
    }
}

#[tokio::test]
#[ignore = "needs a PostgreSQL database in DATABASE_URL"]
async fn unknown_references_redisplay_the_form() {
    let store = store().await;
    let bodies = [
        ("title=Question+in+Math&subject=999&grade=GRADE7", "subject"),
        ("title=Question+in+Math&subject=1&sub-subject=999&grade=GRADE7", "sub-subject"),
        ("title=Question+in+Math&subject=1&grade=GRADE7&book=999", "book"),
    ];

    for (body, field) in bodies {
        let owner = profile(&store).await;
        let res = warp::test::request()
            .method("POST")
            .path("/explore/new_question")
            .header("Authorization", token(owner))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body)
            .reply(&routes(store.clone()))
            .await;

        assert_eq!(res.status(), StatusCode::OK, "{}", field);
        let page = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(page.contains("id=\"new-question-form\""), "{}", field);
        assert!(
            page.contains("Select a valid choice. 999 is not one of the available choices."),
            "{}",
            field
        );
        assert_eq!(questions_titled(&store, "Question in Math", owner).await, 0);
    }
}

#[tokio::test]
#[ignore = "needs a PostgreSQL database in DATABASE_URL"]
async fn missing_questions_are_not_found_for_their_owner_routes() {
    let store = store().await;
    let owner = profile(&store).await;
    let routes = routes(store.clone());

    let update = warp::test::request()
        .method("PUT")
        .path(&format!("/questions/{}", i32::MAX))
        .header("Authorization", token(owner))
        .json(&serde_json::json!({
            "title": "Question in Math",
            "subject_id": 1,
            "grade": "GRADE7",
        }))
        .reply(&routes)
        .await;
    assert_eq!(update.status(), StatusCode::NOT_FOUND);

    let attach = warp::test::request()
        .method("POST")
        .path(&format!("/questions/{}/tags", i32::MAX))
        .header("Authorization", token(owner))
        .json(&serde_json::json!({ "tag_id": 1 }))
        .reply(&routes)
        .await;
    assert_eq!(attach.status(), StatusCode::NOT_FOUND);

    let detach = warp::test::request()
        .method("DELETE")
        .path(&format!("/questions/{}/tags/1", i32::MAX))
        .header("Authorization", token(owner))
        .reply(&routes)
        .await;
    assert_eq!(detach.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "needs a PostgreSQL database in DATABASE_URL"]
async fn strangers_cannot_update_a_question() {
    let store = store().await;
    let owner = profile(&store).await;
    let stranger = profile(&store).await;
    let routes = routes(store.clone());

    let posted = warp::test::request()
        .method("POST")
        .path("/explore/new_question")
        .header("Authorization", token(owner))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("title=Question+in+History&subject=2&grade=GRADE8")
        .reply(&routes)
        .await;
    let question: serde_json::Value = serde_json::from_slice(posted.body()).unwrap();

    let res = warp::test::request()
        .method("PUT")
        .path(&format!("/questions/{}", question["id"]))
        .header("Authorization", token(stranger))
        .json(&serde_json::json!({
            "title": "Question in Math",
            "subject_id": 1,
            "grade": "GRADE7",
        }))
        .reply(&routes)
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
