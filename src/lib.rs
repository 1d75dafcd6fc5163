#![warn(clippy::all)]

use handle_errors::return_error;
use tracing_subscriber::fmt::format::FmtSpan;
use warp::{Filter, Reply, http::Method};

pub mod config;
pub mod routes;
pub mod store;
pub mod types;

use routes::authentication::TokenKey;

/// Connects to the database and brings its schema up to date.
pub async fn setup_store(config: &config::Config) -> Result<store::Store, handle_errors::Error> {
    let store = store::Store::new(&config.database_url()).await?;

    sqlx::migrate!()
        .run(&store.clone().connection)
        .await
        .map_err(handle_errors::Error::MigrationError)?;

    Ok(store)
}

pub fn build_routes(
    store: store::Store,
    key: TokenKey,
) -> impl Filter<Extract = impl Reply> + Clone {
    let store_filter = warp::any().map(move || store.clone());
    let auth = routes::authentication::auth(key.clone());
    let key_filter = warp::any().map(move || key.clone());

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("Content-Type")
        .allow_header("Authorization")
        .allow_methods(&[Method::PUT, Method::DELETE, Method::POST, Method::GET]);

    let new_question_form = warp::get()
        .and(warp::path("explore"))
        .and(warp::path("new_question"))
        .and(warp::path::end())
        .and_then(routes::question::new_question_form);

    let submit_new_question = warp::post()
        .and(warp::path("explore"))
        .and(warp::path("new_question"))
        .and(warp::path::end())
        .and(auth.clone())
        .and(store_filter.clone())
        .and(warp::body::content_length_limit(1024 * 64))
        .and(warp::body::form())
        .and_then(routes::question::submit_new_question)
        .with(warp::trace(|info| {
            tracing::info_span!(
                "new_question request",
                method = %info.method(),
                path = %info.path(),
                id = %uuid::Uuid::new_v4(),
            )
        }));

    let get_questions = warp::get()
        .and(warp::path("questions"))
        .and(warp::path::end())
        .and(warp::query())
        .and(store_filter.clone())
        .and_then(routes::question::get_questions)
        .with(warp::trace(|info| {
            tracing::info_span!(
                "get_questions request",
                method = %info.method(),
                path = %info.path(),
                id = %uuid::Uuid::new_v4(),
            )
        }));

    let get_question = warp::get()
        .and(warp::path("questions"))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(store_filter.clone())
        .and_then(routes::question::get_question);

    let update_question = warp::put()
        .and(warp::path("questions"))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(auth.clone())
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::question::update_question);

    let delete_question = warp::delete()
        .and(warp::path("questions"))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(auth.clone())
        .and(store_filter.clone())
        .and_then(routes::question::delete_question);

    let attach_tag = warp::post()
        .and(warp::path("questions"))
        .and(warp::path::param::<i32>())
        .and(warp::path("tags"))
        .and(warp::path::end())
        .and(auth.clone())
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::tag::attach_tag);

    let detach_tag = warp::delete()
        .and(warp::path("questions"))
        .and(warp::path::param::<i32>())
        .and(warp::path("tags"))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(auth.clone())
        .and(store_filter.clone())
        .and_then(routes::tag::detach_tag);

    let get_tags = warp::get()
        .and(warp::path("tags"))
        .and(warp::path::end())
        .and(store_filter.clone())
        .and_then(routes::tag::get_tags);

    let add_tag = warp::post()
        .and(warp::path("tags"))
        .and(warp::path::end())
        .and(auth.clone())
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::tag::add_tag);

    let delete_tag = warp::delete()
        .and(warp::path("tags"))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(auth.clone())
        .and(store_filter.clone())
        .and_then(routes::tag::delete_tag);

    let registration = warp::post()
        .and(warp::path("registration"))
        .and(warp::path::end())
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::authentication::register);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(store_filter.clone())
        .and(key_filter)
        .and(warp::body::json())
        .and_then(routes::authentication::login);

    let delete_profile = warp::delete()
        .and(warp::path("profile"))
        .and(warp::path::end())
        .and(auth)
        .and(store_filter)
        .and_then(routes::authentication::delete_profile);

    new_question_form
        .or(submit_new_question)
        .or(get_questions)
        .or(get_question)
        .or(update_question)
        .or(delete_question)
        .or(attach_tag)
        .or(detach_tag)
        .or(get_tags)
        .or(add_tag)
        .or(delete_tag)
        .or(registration)
        .or(login)
        .or(delete_profile)
        .with(cors)
        .with(warp::trace::request())
        .recover(return_error)
}

pub async fn run(config: config::Config, store: store::Store) -> Result<(), handle_errors::Error> {
    let key = TokenKey::new(&config.paseto_key)?;
    let routes = build_routes(store, key);

    tracing::info!(port = config.port, "Q&A board build ID {}", env!("CARGO_PKG_VERSION"));
    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;

    Ok(())
}

/// Installs the global tracing subscriber for the configured log level.
pub fn init_tracing(config: &config::Config) {
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        format!(
            "handle_errors={},qna_board={},warp={}",
            config.log_level, config.log_level, config.log_level
        )
    });

    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_span_events(FmtSpan::CLOSE)
        .init();
}
