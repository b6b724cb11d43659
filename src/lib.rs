pub mod app;
pub mod auth;
pub mod config;
pub mod handlers;
pub mod posts;
pub mod router;

#[cfg(not(target_arch = "wasm32"))]
pub mod server;

pub mod core {
    pub mod db;
    pub mod errors;
    pub mod helpers;
    pub mod kv;
    pub mod logging;
    pub mod memory;
}

pub mod models {
    pub mod dto;
    pub mod models;
}

pub mod security {
    pub mod guard;
    pub mod identity;
    pub mod password;
    pub mod pipeline;
    pub mod token;
}

// Spin instantiates the component per request, so the app is rebuilt from
// the environment every time.
#[cfg(target_arch = "wasm32")]
#[spin_sdk::http_component]
fn handle(req: spin_sdk::http::Request) -> anyhow::Result<impl spin_sdk::http::IntoResponse> {
    crate::core::logging::init_logging();
    let settings = config::Settings::from_env()?;
    let app = app::App::from_settings(crate::core::kv::KvDatabase, &settings)?;
    Ok(router::route(&app, req))
}
