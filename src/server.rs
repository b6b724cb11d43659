//! Native HTTP server: actix-web in front of the same router the Spin
//! component uses.

use actix_web::{web, App as ActixApp, HttpRequest, HttpResponse, HttpServer};
use spin_sdk::http::{Method, Request};

use crate::app::App;
use crate::config::Settings;
use crate::core::memory::MemoryDatabase;
use crate::router::route;

pub type SharedApp = web::Data<App<MemoryDatabase>>;

/// The parts of an actix request the router needs, detached from actix so
/// they can be moved onto the blocking pool.
struct RawRequest {
    method: String,
    uri: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawRequest {
    fn from_actix(req: &HttpRequest, body: web::Bytes) -> Self {
        let headers = req
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                // The router looks the credential up under its canonical name.
                let name = if name.as_str().eq_ignore_ascii_case("authorization") {
                    "Authorization".to_string()
                } else {
                    name.as_str().to_string()
                };
                Some((name, value.to_string()))
            })
            .collect();

        Self {
            method: req.method().as_str().to_string(),
            uri: req.uri().to_string(),
            headers,
            body: body.to_vec(),
        }
    }

    fn into_spin(self) -> Request {
        let method = match self.method.as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            // Anything else has no route and ends up as a 404.
            _ => Method::Options,
        };

        let mut builder = Request::builder();
        builder.method(method).uri(&self.uri);
        for (name, value) in &self.headers {
            builder.header(name.as_str(), value.as_str());
        }
        builder.body(self.body).build()
    }
}

pub async fn handle_all(app: SharedApp, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let raw = RawRequest::from_actix(&req, body);
    let app = app.into_inner();

    // Argon2 blocks the thread.
    let handled = web::block(move || {
        let resp = route(&*app, raw.into_spin());
        (*resp.status(), resp.body().to_vec())
    })
    .await;

    match handled {
        Ok((status, body)) => {
            let status = actix_web::http::StatusCode::from_u16(status)
                .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
            let mut response = HttpResponse::build(status);
            if body.is_empty() {
                response.finish()
            } else {
                response.content_type("application/json").body(body)
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "request handler panicked");
            HttpResponse::InternalServerError()
                .json(serde_json::json!({"error": "Internal server error"}))
        }
    }
}

pub fn shared_app(settings: &Settings) -> anyhow::Result<SharedApp> {
    Ok(web::Data::new(App::from_settings(MemoryDatabase::new(), settings)?))
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let data = shared_app(&settings)?;

    tracing::info!(addr = %settings.bind_addr, "server listening");

    HttpServer::new(move || {
        ActixApp::new()
            .app_data(data.clone())
            .default_service(web::route().to(handle_all))
    })
    .bind(settings.bind_addr.as_str())?
    .run()
    .await?;

    Ok(())
}
