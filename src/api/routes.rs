use std::convert::Infallible;

use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use warp::{
    filters::{body::BodyDeserializeError, BoxedFilter},
    http::StatusCode,
    reject::{
        InvalidQuery, LengthRequired, MethodNotAllowed, PayloadTooLarge, Rejection,
        UnsupportedMediaType,
    },
    reply::{self, Reply, Response},
    Filter,
};

use crate::{
    actions::Membership,
    constants::BODY_SIZE_LIMIT,
    error::Error,
    form::FormData,
    jwt::{SessionData, SessionKey},
    middleware::{with_possible_session, with_session},
    schema::Id,
};

use super::handlers;

/// Everything a request handler needs besides the request itself.
#[derive(Clone)]
pub struct Context {
    pub pool: PgPool,
    pub key: SessionKey,
}

impl Context {
    pub fn new(pool: PgPool, key: SessionKey) -> Self {
        Self { pool, key }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    errors: &'a str,
}

fn with_pool(pool: PgPool) -> impl Filter<Extract = (PgPool,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(BODY_SIZE_LIMIT).and(warp::body::json())
}

fn query() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::query::<FormData>()
}

fn tag_routes(ctx: &Context) -> BoxedFilter<(Response,)> {
    let list = warp::path!("tags")
        .and(warp::get())
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::list_tags);
    let create = warp::path!("tags")
        .and(warp::post())
        .and(with_possible_session(ctx.key.clone()))
        .and(json_body())
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::create_tag);
    let retrieve = warp::path!("tags" / Id)
        .and(warp::get())
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::get_tag);

    list.or(create).unify().or(retrieve).unify().boxed()
}

fn ingredient_routes(ctx: &Context) -> BoxedFilter<(Response,)> {
    let list = warp::path!("ingredients")
        .and(warp::get())
        .and(query())
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::list_ingredients);
    let create = warp::path!("ingredients")
        .and(warp::post())
        .and(with_possible_session(ctx.key.clone()))
        .and(json_body())
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::create_ingredient);
    let retrieve = warp::path!("ingredients" / Id)
        .and(warp::get())
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::get_ingredient);

    list.or(create).unify().or(retrieve).unify().boxed()
}

fn membership_routes(
    ctx: &Context,
    name: &'static str,
    membership: Membership,
) -> BoxedFilter<(Response,)> {
    let add = warp::path("recipes")
        .and(warp::path::param::<Id>())
        .and(warp::path(name))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(move |id: Id, session: SessionData, pool: PgPool| {
            handlers::add_membership(membership, id, session, pool)
        });
    let remove = warp::path("recipes")
        .and(warp::path::param::<Id>())
        .and(warp::path(name))
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(move |id: Id, session: SessionData, pool: PgPool| {
            handlers::remove_membership(membership, id, session, pool)
        });

    add.or(remove).unify().boxed()
}

fn recipe_routes(ctx: &Context) -> BoxedFilter<(Response,)> {
    let list = warp::path!("recipes")
        .and(warp::get())
        .and(query())
        .and(with_possible_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::list_recipes);
    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_possible_session(ctx.key.clone()))
        .and(json_body())
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::create_recipe);
    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::download_shopping_cart);
    let retrieve = warp::path!("recipes" / Id)
        .and(warp::get())
        .and(with_possible_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::get_recipe);
    let update = warp::path!("recipes" / Id)
        .and(warp::patch())
        .and(with_possible_session(ctx.key.clone()))
        .and(json_body())
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::update_recipe);
    let delete = warp::path!("recipes" / Id)
        .and(warp::delete())
        .and(with_possible_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::delete_recipe);
    let image = warp::path!("recipes" / Id / "image")
        .and(warp::get())
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::recipe_image);

    list.or(create)
        .unify()
        .or(download)
        .unify()
        .or(retrieve)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(image)
        .unify()
        .or(membership_routes(ctx, "favorite", Membership::Favorite))
        .unify()
        .or(membership_routes(ctx, "shopping_cart", Membership::ShoppingCart))
        .unify()
        .boxed()
}

fn user_routes(ctx: &Context) -> BoxedFilter<(Response,)> {
    let list = warp::path!("users")
        .and(warp::get())
        .and(query())
        .and(with_possible_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::list_users);
    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::me);
    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(query())
        .and(with_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::subscriptions);
    let retrieve = warp::path!("users" / Id)
        .and(warp::get())
        .and(with_possible_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::get_user);
    let subscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::post())
        .and(query())
        .and(with_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::subscribe);
    let unsubscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::delete())
        .and(with_session(ctx.key.clone()))
        .and(with_pool(ctx.pool.clone()))
        .and_then(handlers::unsubscribe);

    list.or(me)
        .unify()
        .or(subscriptions)
        .unify()
        .or(retrieve)
        .unify()
        .or(subscribe)
        .unify()
        .or(unsubscribe)
        .unify()
        .boxed()
}

/// The whole API, with every rejection rendered as `{"errors": ...}`.
pub fn routes(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    tag_routes(&ctx)
        .or(ingredient_routes(&ctx))
        .unify()
        .or(recipe_routes(&ctx))
        .unify()
        .or(user_routes(&ctx))
        .unify()
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if let Some(e) = err.find::<Error>() {
        (e.status(), e.message().to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid JSON body; {e}"))
    } else if err.find::<InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, String::from("Invalid query string"))
    } else if err.find::<LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, String::from("Content-Length is required"))
    } else if err.find::<PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, String::from("Request body is too large"))
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            String::from("Expected an application/json body"),
        )
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, String::from("Method not allowed"))
    } else {
        log::error!("Unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };

    Ok(reply::with_status(reply::json(&ErrorBody { errors: &message }), status).into_response())
}
