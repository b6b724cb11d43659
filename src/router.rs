use spin_sdk::http::{Method, Request, Response};
use uuid::Uuid;

use crate::app::App;
use crate::core::db::Database;
use crate::core::errors::ApiError;
use crate::core::helpers::{authorization_header, post_item_segment};
use crate::handlers;
use crate::security::identity::RequestContext;

const POSTS_PATH: &str = "/api/posts";

/// Authenticates the request, then dispatches it. Handler failures that are
/// not part of the API error taxonomy come back as a 500.
pub fn route<D: Database>(app: &App<D>, req: Request) -> Response {
    let request_id = Uuid::new_v4();
    let path = req.path().to_string();
    let span = tracing::info_span!("request", id = %request_id, method = ?req.method(), path = %path);
    let _enter = span.enter();

    let ctx = authenticate(app, &req);

    let result = match (req.method(), path.as_str()) {
        (Method::Post, "/api/auth/signup") => handlers::signup(app, &req),
        (Method::Post, "/api/auth/login") => handlers::login(app, &req),
        (Method::Get, POSTS_PATH) => handlers::list_posts(app),
        (Method::Post, POSTS_PATH) => handlers::create_post(app, &ctx, &req),
        (Method::Get, p) if post_item_segment(p).is_some() => handlers::get_post(app, &req),
        (Method::Put, p) if post_item_segment(p).is_some() => {
            handlers::edit_post(app, &ctx, &req)
        }
        (Method::Delete, p) if post_item_segment(p).is_some() => {
            handlers::delete_post(app, &ctx, &req)
        }
        _ => Ok(ApiError::NotFound("No route found".to_string()).into()),
    };

    match result {
        Ok(resp) => {
            tracing::debug!(status = *resp.status(), "request handled");
            resp
        }
        Err(e) => {
            tracing::error!(error = ?e, "request failed");
            ApiError::InternalError.into()
        }
    }
}

/// Never fails the request: any problem resolving the caller, including an
/// unavailable store, leaves it anonymous.
fn authenticate<D: Database>(app: &App<D>, req: &Request) -> RequestContext {
    let header = authorization_header(req);
    if header.is_none() {
        return RequestContext::anonymous();
    }

    // The connection is released before the handler opens its own.
    match app.db.connect() {
        Ok(conn) => app.pipeline.resolve(header, &conn),
        Err(e) => {
            tracing::warn!(error = ?e, "cannot set user authentication");
            RequestContext::anonymous()
        }
    }
}
