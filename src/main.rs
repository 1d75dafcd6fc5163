#![warn(clippy::all)]

use qna_board::{config::Config, init_tracing, run, setup_store};

#[tokio::main]
async fn main() -> Result<(), handle_errors::Error> {
    let config = Config::new()?;

    init_tracing(&config);

    let store = setup_store(&config).await?;

    tracing::info!("Q&A board starting");
    run(config, store).await
}
