// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    handler::Handler,
    http::{HeaderName, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_permission, Permission, PermissionGuard},
    error::{ErrorBody, NOT_FOUND},
    models::{
        CreateDrinkRequest, DeleteDrinkResponse, Drink, DrinkShort, Ingredient, IngredientShort,
        LongDrinksResponse, RecipeInput, ShortDrinksResponse, UpdateDrinkRequest,
    },
    state::AppState,
};

pub mod drinks;
pub mod health;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let authenticator = state.authenticator.clone();
    let guard = move |permission| {
        from_fn_with_state(
            PermissionGuard::new(authenticator.clone(), permission),
            require_permission,
        )
    };

    let drink_routes = Router::new()
        .route(
            "/drinks",
            get(drinks::list_drinks)
                .post(drinks::create_drink.layer(guard(Permission::PostDrinks))),
        )
        .route(
            "/drinks-detail",
            get(drinks::list_drink_details.layer(guard(Permission::GetDrinksDetail))),
        )
        .route(
            "/drinks/{id}",
            patch(drinks::update_drink.layer(guard(Permission::PatchDrinks)))
                .delete(drinks::delete_drink.layer(guard(Permission::DeleteDrinks))),
        )
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(drink_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(StatusCode::NOT_FOUND, NOT_FOUND)),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        drinks::list_drinks,
        drinks::list_drink_details,
        drinks::create_drink,
        drinks::update_drink,
        drinks::delete_drink,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Drink,
            DrinkShort,
            Ingredient,
            IngredientShort,
            RecipeInput,
            CreateDrinkRequest,
            UpdateDrinkRequest,
            ShortDrinksResponse,
            LongDrinksResponse,
            DeleteDrinkResponse,
            ErrorBody,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Drinks", description = "Drinks menu"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_issuer, test_state, PRIMARY_KID};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let (_server, config) = mock_issuer(&[PRIMARY_KID]).await;
        let app = router(test_state(config));

        let response = app
            .oneshot(Request::builder().uri("/coffee").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, ErrorBody::new(StatusCode::NOT_FOUND, NOT_FOUND));
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (_server, config) = mock_issuer(&[PRIMARY_KID]).await;
        let app = router(test_state(config));

        let response = app
            .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[test]
    fn openapi_lists_drink_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/drinks"));
        assert!(doc.paths.paths.contains_key("/drinks/{id}"));
        assert!(doc.paths.paths.contains_key("/drinks-detail"));
    }
}
