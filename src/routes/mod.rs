use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{auth, bookings, ratings, recommendations, rides, users};
use crate::middleware::auth::{auth_middleware, optional_auth_middleware, refresh_auth_middleware};
use crate::middleware::rate_limit::create_auth_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Login and registration get a much tighter per-IP quota
    let credential_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .layer(create_auth_governor());

    let refresh_routes = Router::new()
        .route("/auth/refresh", post(auth::refresh))
        .layer(middleware::from_fn_with_state(state.clone(), refresh_auth_middleware));

    let public_routes = Router::new()
        .route("/rides", get(rides::search))
        .route("/users/{id}", get(users::get_user_profile));

    // Anonymous callers are allowed; signed-in callers get personalised fields
    let optional_routes = Router::new()
        .route("/rides/{id}", get(rides::get_ride))
        .layer(middleware::from_fn_with_state(state.clone(), optional_auth_middleware));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        // Profile
        .route("/users/me", get(users::get_my_profile))
        .route("/users/me", put(users::update_my_profile))
        .route("/users/me/location", put(users::update_my_location))
        .route("/users/me/rides", get(users::my_rides))
        // Rides
        .route("/rides", post(rides::create_ride))
        .route("/rides/recurring", post(rides::create_recurring_ride))
        .route("/rides/{id}", put(rides::update_ride))
        .route("/rides/{id}", delete(rides::cancel_ride))
        .route("/rides/{id}/bookings", post(rides::book_seat))
        .route("/rides/{id}/driver-location", get(rides::driver_location))
        // Bookings and ratings
        .route("/bookings/{id}", delete(bookings::cancel_booking))
        .route("/ratings", post(ratings::submit_rating))
        .route("/recommendations/patterns", get(recommendations::pattern_recommendations))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .merge(credential_routes)
        .merge(refresh_routes)
        .merge(public_routes)
        .merge(optional_routes)
        .merge(protected_routes);

    Router::new().nest("/api", api).with_state(state)
}
