#[cfg(not(target_arch = "wasm32"))]
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    board::core::logging::init_logging();

    let settings = board::config::Settings::from_env()?;
    tracing::info!(?settings, "starting bulletin board");

    board::server::run(settings).await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
