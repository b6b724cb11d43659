use spin_sdk::http::{Request, Response};

use crate::app::App;
use crate::core::db::Database;
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, no_content, parse_json, post_id_from_path};
use crate::models::dto::{
    LoginRequest, PostRequest, PostResponse, SignupRequest, UserResponse,
};
use crate::posts;
use crate::security::identity::RequestContext;

macro_rules! try_api {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => return Ok(ApiError::from(e).into()),
        }
    };
}

pub fn signup<D: Database>(app: &App<D>, req: &Request) -> anyhow::Result<Response> {
    let body: SignupRequest = try_api!(parse_json(req));

    let user = try_api!(app.auth.register_user(&app.db, &body.username, &body.password));
    json_response(201, &UserResponse::from(&user))
}

pub fn login<D: Database>(app: &App<D>, req: &Request) -> anyhow::Result<Response> {
    let body: LoginRequest = try_api!(parse_json(req));

    let login = try_api!(app.auth.login(&app.db, &body.username, &body.password));
    json_response(200, &login)
}

pub fn list_posts<D: Database>(app: &App<D>) -> anyhow::Result<Response> {
    let conn = app.db.connect()?;
    let posts: Vec<PostResponse> = try_api!(posts::list_posts(&conn))
        .into_iter()
        .map(PostResponse::from)
        .collect();
    json_response(200, &posts)
}

pub fn get_post<D: Database>(app: &App<D>, req: &Request) -> anyhow::Result<Response> {
    let id = try_api!(post_id_from_path(req.path()));
    let conn = app.db.connect()?;

    let post = try_api!(posts::find_post(&conn, id));
    json_response(200, &PostResponse::from(post))
}

pub fn create_post<D: Database>(
    app: &App<D>,
    ctx: &RequestContext,
    req: &Request,
) -> anyhow::Result<Response> {
    let identity = try_api!(posts::require_identity(ctx));
    let body: PostRequest = try_api!(parse_json(req));
    let mut conn = app.db.connect()?;

    let post = try_api!(posts::create_post(&mut conn, identity, &body.content));
    json_response(201, &PostResponse::from(post))
}

pub fn edit_post<D: Database>(
    app: &App<D>,
    ctx: &RequestContext,
    req: &Request,
) -> anyhow::Result<Response> {
    let identity = try_api!(posts::require_identity(ctx));
    let id = try_api!(post_id_from_path(req.path()));
    let body: PostRequest = try_api!(parse_json(req));
    let mut conn = app.db.connect()?;

    let post = try_api!(posts::update_post(&mut conn, id, &body.content, identity));
    json_response(200, &PostResponse::from(post))
}

pub fn delete_post<D: Database>(
    app: &App<D>,
    ctx: &RequestContext,
    req: &Request,
) -> anyhow::Result<Response> {
    let identity = try_api!(posts::require_identity(ctx));
    let id = try_api!(post_id_from_path(req.path()));
    let mut conn = app.db.connect()?;

    try_api!(posts::delete_post(&mut conn, id, identity));
    Ok(no_content())
}
