use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::PgPool;
use warp::{
    http::{Method, StatusCode},
    reject::Rejection,
    reply::{self, Reply, Response},
};

use crate::{
    actions::{self, Membership},
    constants::SHOPPING_CART_FILENAME,
    error::{Error, HttpError},
    filters::{self, RecipeFilter},
    form::{Form, FormData},
    jwt::SessionData,
    permissions::{ActionType, Permission},
    schema::{Id, NewIngredient, NewTag, RecipeRow, UserRow},
    serializers::{assemble_follows, assemble_recipes, FollowView, RecipeShort, RecipeView},
    shopping_list::ShoppingList,
    validation::{self, KnownIds, RecipePayload},
};

fn json_response<T: Serialize>(value: &T, status: StatusCode) -> Response {
    reply::with_status(reply::json(value), status).into_response()
}

fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

fn viewer(session: &Option<SessionData>) -> Option<Id> {
    session.as_ref().map(|s| s.user_id)
}

async fn recipe_views(
    rows: Vec<RecipeRow>,
    viewer: Option<Id>,
    pool: &PgPool,
) -> Result<Vec<RecipeView>, Error> {
    let recipe_ids: Vec<Id> = rows.iter().map(|r| r.id).collect();
    let author_ids: Vec<Id> = rows
        .iter()
        .map(|r| r.author_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let tags = actions::list_recipe_tags(&recipe_ids, pool).await?;
    let ingredients = actions::list_recipe_ingredients(&recipe_ids, pool).await?;
    let authors = actions::list_user_rows(pool, &author_ids, viewer).await?;

    Ok(assemble_recipes(rows, tags, ingredients, authors))
}

async fn recipe_view(id: Id, viewer: Option<Id>, pool: &PgPool) -> Result<RecipeView, Error> {
    let row = actions::get_recipe(id, viewer, pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    recipe_views(vec![row], viewer, pool)
        .await?
        .pop()
        .ok_or_else(|| HttpError::NotFound.default())
}

async fn known_ids(payload: &RecipePayload, pool: &PgPool) -> Result<KnownIds, Error> {
    let ingredient_ids = validation::ingredient_ids(payload)?;
    let tag_ids = payload.tags.clone().unwrap_or_default();

    Ok(KnownIds {
        ingredients: actions::existing_ingredient_ids(&ingredient_ids, pool).await?,
        tags: actions::existing_tag_ids(&tag_ids, pool).await?,
    })
}

pub async fn list_tags(pool: PgPool) -> Result<Response, Rejection> {
    let tags = actions::list_tags(&pool).await?;
    Ok(json_response(&tags, StatusCode::OK))
}

pub async fn get_tag(id: Id, pool: PgPool) -> Result<Response, Rejection> {
    let tag = actions::get_tag(id, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;
    Ok(json_response(&tag, StatusCode::OK))
}

pub async fn create_tag(
    session: Option<SessionData>,
    tag: NewTag,
    pool: PgPool,
) -> Result<Response, Rejection> {
    Permission::IsAdminOrReadOnly.has_permission(&Method::POST, session.as_ref())?;
    let tag = validation::validate_new_tag(tag)?;

    let tag = actions::create_tag(&tag, &pool).await?;
    Ok(json_response(&tag, StatusCode::CREATED))
}

pub async fn list_ingredients(query: FormData, pool: PgPool) -> Result<Response, Rejection> {
    let form = Form::from_data(query);
    let ingredients = actions::list_ingredients(filters::ingredient_prefix(&form), &pool).await?;
    Ok(json_response(&ingredients, StatusCode::OK))
}

pub async fn get_ingredient(id: Id, pool: PgPool) -> Result<Response, Rejection> {
    let ingredient = actions::get_ingredient(id, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;
    Ok(json_response(&ingredient, StatusCode::OK))
}

pub async fn create_ingredient(
    session: Option<SessionData>,
    ingredient: NewIngredient,
    pool: PgPool,
) -> Result<Response, Rejection> {
    Permission::IsAdminOrReadOnly.has_permission(&Method::POST, session.as_ref())?;
    let ingredient = validation::validate_new_ingredient(ingredient)?;

    let ingredient = actions::create_ingredient(&ingredient, &pool).await?;
    Ok(json_response(&ingredient, StatusCode::CREATED))
}

pub async fn list_recipes(
    query: FormData,
    session: Option<SessionData>,
    pool: PgPool,
) -> Result<Response, Rejection> {
    let form = Form::from_data(query);
    let filter = RecipeFilter::from_form(&form);
    let viewer = viewer(&session);

    let mut page = actions::fetch_recipes(&filter, filters::page_request(&form), viewer, &pool).await?;
    let rows = std::mem::take(&mut page.results);
    let views = recipe_views(rows, viewer, &pool).await?;

    Ok(json_response(&page.map(|_| views), StatusCode::OK))
}

pub async fn get_recipe(
    id: Id,
    session: Option<SessionData>,
    pool: PgPool,
) -> Result<Response, Rejection> {
    let view = recipe_view(id, viewer(&session), &pool).await?;
    Ok(json_response(&view, StatusCode::OK))
}

pub async fn create_recipe(
    session: Option<SessionData>,
    payload: RecipePayload,
    pool: PgPool,
) -> Result<Response, Rejection> {
    Permission::IsAdminAuthorOrReadOnly.has_permission(&Method::POST, session.as_ref())?;
    let session = session.ok_or_else(|| HttpError::Unauthorized.default())?;

    let known = known_ids(&payload, &pool).await?;
    let recipe = validation::validate_new_recipe(payload, &known)?;

    let id = actions::create_recipe(session.user_id, &recipe, &pool).await?;
    let view = recipe_view(id, Some(session.user_id), &pool).await?;
    Ok(json_response(&view, StatusCode::CREATED))
}

pub async fn update_recipe(
    id: Id,
    session: Option<SessionData>,
    payload: RecipePayload,
    pool: PgPool,
) -> Result<Response, Rejection> {
    let policy = Permission::IsAdminAuthorOrReadOnly;
    policy.has_permission(&Method::PATCH, session.as_ref())?;

    let author_id = actions::get_recipe_author(id, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;
    policy.has_object_permission(&Method::PATCH, session.as_ref(), author_id)?;

    let known = known_ids(&payload, &pool).await?;
    let update = validation::validate_recipe_update(payload, &known)?;

    actions::update_recipe(id, &update, &pool).await?;
    let view = recipe_view(id, viewer(&session), &pool).await?;
    Ok(json_response(&view, StatusCode::OK))
}

pub async fn delete_recipe(
    id: Id,
    session: Option<SessionData>,
    pool: PgPool,
) -> Result<Response, Rejection> {
    let policy = Permission::IsAdminAuthorOrReadOnly;
    policy.has_permission(&Method::DELETE, session.as_ref())?;

    let author_id = actions::get_recipe_author(id, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;
    policy.has_object_permission(&Method::DELETE, session.as_ref(), author_id)?;

    actions::delete_recipe(id, &pool).await?;
    Ok(no_content())
}

pub async fn recipe_image(id: Id, pool: PgPool) -> Result<Response, Rejection> {
    let stored = actions::get_recipe_image(id, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;
    let image = stored
        .image
        .ok_or_else(|| HttpError::NotFound.new("Recipe has no image"))?;
    let mime_type = stored
        .image_type
        .unwrap_or_else(|| String::from("application/octet-stream"));

    Ok(reply::with_header(image, "content-type", mime_type).into_response())
}

pub async fn add_membership(
    membership: Membership,
    recipe_id: Id,
    session: SessionData,
    pool: PgPool,
) -> Result<Response, Rejection> {
    session.authenticate(ActionType::ManageOwnMemberships)?;
    let recipe = actions::get_recipe_short(recipe_id, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    actions::add_membership(membership, session.user_id, recipe_id, &pool).await?;
    Ok(json_response(&RecipeShort::from(recipe), StatusCode::CREATED))
}

pub async fn remove_membership(
    membership: Membership,
    recipe_id: Id,
    session: SessionData,
    pool: PgPool,
) -> Result<Response, Rejection> {
    session.authenticate(ActionType::ManageOwnMemberships)?;
    actions::get_recipe_short(recipe_id, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    actions::remove_membership(membership, session.user_id, recipe_id, &pool).await?;
    Ok(no_content())
}

pub async fn download_shopping_cart(
    session: SessionData,
    pool: PgPool,
) -> Result<Response, Rejection> {
    let rows = actions::list_shopping_cart_items(session.user_id, &pool).await?;
    let list = ShoppingList::from_rows(rows);

    let reply = reply::with_header(list.render(), "content-type", "text/plain; charset=utf-8");
    let reply = reply::with_header(
        reply,
        "content-disposition",
        format!("attachment; filename={SHOPPING_CART_FILENAME}"),
    );
    Ok(reply.into_response())
}

pub async fn list_users(
    query: FormData,
    session: Option<SessionData>,
    pool: PgPool,
) -> Result<Response, Rejection> {
    let form = Form::from_data(query);
    let page = actions::fetch_users(&pool, filters::page_request(&form), viewer(&session)).await?;
    Ok(json_response(&page, StatusCode::OK))
}

pub async fn get_user(
    id: Id,
    session: Option<SessionData>,
    pool: PgPool,
) -> Result<Response, Rejection> {
    let user = actions::get_user_row(&pool, id, viewer(&session))
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;
    Ok(json_response(&user, StatusCode::OK))
}

pub async fn me(session: SessionData, pool: PgPool) -> Result<Response, Rejection> {
    let user = actions::get_user_row(&pool, session.user_id, Some(session.user_id))
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;
    Ok(json_response(&user, StatusCode::OK))
}

async fn follow_views(
    authors: Vec<UserRow>,
    recipes_limit: Option<i64>,
    pool: &PgPool,
) -> Result<Vec<FollowView>, Error> {
    let author_ids: Vec<Id> = authors.iter().map(|a| a.id).collect();
    let recipes = actions::list_author_recipes(&author_ids, recipes_limit, pool).await?;
    let counts = actions::count_author_recipes(&author_ids, pool).await?;

    Ok(assemble_follows(authors, recipes, &counts))
}

pub async fn subscribe(
    author_id: Id,
    query: FormData,
    session: SessionData,
    pool: PgPool,
) -> Result<Response, Rejection> {
    if session.user_id == author_id {
        return Err(HttpError::InvalidRequest
            .new("You cannot subscribe to yourself")
            .into());
    }
    let recipes_limit = filters::recipes_limit(&Form::from_data(query))?;
    actions::get_user_row(&pool, author_id, Some(session.user_id))
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    actions::follow_author(session.user_id, author_id, &pool).await?;

    let author = actions::get_user_row(&pool, author_id, Some(session.user_id))
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;
    let view = follow_views(vec![author], recipes_limit, &pool)
        .await?
        .pop()
        .ok_or_else(|| HttpError::NotFound.default())?;
    Ok(json_response(&view, StatusCode::CREATED))
}

pub async fn unsubscribe(
    author_id: Id,
    session: SessionData,
    pool: PgPool,
) -> Result<Response, Rejection> {
    if session.user_id == author_id {
        return Err(HttpError::InvalidRequest
            .new("You cannot unsubscribe from yourself")
            .into());
    }
    actions::get_user_by_id(&pool, author_id)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    actions::unfollow_author(session.user_id, author_id, &pool).await?;
    Ok(no_content())
}

pub async fn subscriptions(
    query: FormData,
    session: SessionData,
    pool: PgPool,
) -> Result<Response, Rejection> {
    let form = Form::from_data(query);
    let recipes_limit = filters::recipes_limit(&form)?;

    let mut page =
        actions::fetch_subscriptions(session.user_id, filters::page_request(&form), &pool).await?;
    let authors = std::mem::take(&mut page.results);
    let views = follow_views(authors, recipes_limit, &pool).await?;

    Ok(json_response(&page.map(|_| views), StatusCode::OK))
}
