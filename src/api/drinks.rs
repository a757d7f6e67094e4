// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Drinks menu handlers.
//!
//! `GET /drinks` is public. Every other handler sits behind a permission
//! guard layer (see `api::router`) and reads the verified claims through
//! the [`Auth`] extractor.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};

use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{
        CreateDrinkRequest, DeleteDrinkResponse, Drink, DrinkId, LongDrinksResponse, NewDrink,
        ShortDrinksResponse, UpdateDrinkRequest,
    },
    state::AppState,
};

fn non_blank(title: Option<String>) -> Option<String> {
    title.filter(|t| !t.trim().is_empty())
}

/// Unparseable ids name no drink.
fn drink_id(path: Result<Path<DrinkId>, PathRejection>) -> Result<DrinkId, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::not_found())
}

fn body<T>(json: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    json.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::bad_request()
    })
}

#[utoipa::path(
    get,
    path = "/drinks",
    tag = "Drinks",
    responses(
        (status = 200, description = "Menu with colors and parts only", body = ShortDrinksResponse),
        (status = 422, body = ErrorBody)
    )
)]
pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<ShortDrinksResponse>, ApiError> {
    let drinks = state.store.list_all()?;
    Ok(Json(ShortDrinksResponse {
        success: true,
        drinks: drinks.iter().map(Drink::short).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/drinks-detail",
    tag = "Drinks",
    security(("bearer_auth" = ["get:drinks-detail"])),
    responses(
        (status = 200, description = "Menu with full recipes", body = LongDrinksResponse),
        (status = 401, body = ErrorBody),
        (status = 404, description = "Token carries no permissions", body = ErrorBody),
        (status = 422, body = ErrorBody)
    )
)]
pub async fn list_drink_details(
    State(state): State<AppState>,
    Auth(claims): Auth,
) -> Result<Json<LongDrinksResponse>, ApiError> {
    let drinks = state.store.list_all()?;
    tracing::debug!(subject = claims.subject(), count = drinks.len(), "Listed drink details");
    Ok(Json(LongDrinksResponse {
        success: true,
        drinks: drinks.iter().map(Drink::long).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/drinks",
    tag = "Drinks",
    request_body = CreateDrinkRequest,
    security(("bearer_auth" = ["post:drinks"])),
    responses(
        (status = 200, description = "Drink added", body = LongDrinksResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 422, description = "Title already on the menu", body = ErrorBody)
    )
)]
pub async fn create_drink(
    State(state): State<AppState>,
    Auth(claims): Auth,
    request: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<LongDrinksResponse>, ApiError> {
    let request = body(request)?;
    let (Some(title), Some(recipe)) = (non_blank(request.title), request.recipe) else {
        return Err(ApiError::bad_request());
    };

    let drink = state.store.insert(NewDrink {
        title,
        recipe: recipe.into(),
    })?;
    tracing::info!(subject = claims.subject(), id = drink.id, title = %drink.title, "Drink added");

    Ok(Json(LongDrinksResponse {
        success: true,
        drinks: vec![drink.long()],
    }))
}

#[utoipa::path(
    patch,
    path = "/drinks/{id}",
    tag = "Drinks",
    params(("id" = u64, Path, description = "Identifier of the drink to edit")),
    request_body = UpdateDrinkRequest,
    security(("bearer_auth" = ["patch:drinks"])),
    responses(
        (status = 200, description = "Drink edited", body = LongDrinksResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 422, description = "Title already on the menu", body = ErrorBody)
    )
)]
pub async fn update_drink(
    State(state): State<AppState>,
    Auth(claims): Auth,
    path: Result<Path<DrinkId>, PathRejection>,
    request: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<LongDrinksResponse>, ApiError> {
    let id = drink_id(path)?;
    let mut drink = state.store.get_by_id(id)?.ok_or_else(ApiError::not_found)?;

    let request = body(request)?;
    if request.title.is_none() && request.recipe.is_none() {
        return Err(ApiError::bad_request());
    }
    if let Some(title) = request.title {
        drink.title = non_blank(Some(title)).ok_or_else(ApiError::bad_request)?;
    }
    if let Some(recipe) = request.recipe {
        drink.recipe = recipe.into();
    }

    let drink = state.store.update(drink)?;
    tracing::info!(subject = claims.subject(), id, "Drink edited");

    Ok(Json(LongDrinksResponse {
        success: true,
        drinks: vec![drink.long()],
    }))
}

#[utoipa::path(
    delete,
    path = "/drinks/{id}",
    tag = "Drinks",
    params(("id" = u64, Path, description = "Identifier of the drink to delete")),
    security(("bearer_auth" = ["delete:drinks"])),
    responses(
        (status = 200, description = "Drink deleted", body = DeleteDrinkResponse),
        (status = 401, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 422, body = ErrorBody)
    )
)]
pub async fn delete_drink(
    State(state): State<AppState>,
    Auth(claims): Auth,
    path: Result<Path<DrinkId>, PathRejection>,
) -> Result<Json<DeleteDrinkResponse>, ApiError> {
    let id = drink_id(path)?;
    state.store.delete(id)?;
    tracing::info!(subject = claims.subject(), id, "Drink deleted");

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: id,
    }))
}
