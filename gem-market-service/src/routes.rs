use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use service_core::middleware::{
    ip_rate_limit_middleware, metrics_middleware, request_id_middleware,
    security_headers_middleware, REQUEST_ID_HEADER,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::handlers::gemstones::MAX_IMAGES_PER_LISTING;
use crate::middleware::{ADMIN_SECRET_HEADER, USER_EMAIL_HEADER};
use crate::startup::AppState;

/// Room for text fields and part headers on top of the file payloads.
const FORM_FIELDS_ALLOWANCE: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let limiter = state.sensitive_rate_limiter.clone();
    let body_limit =
        state.config.storage.max_upload_bytes * (MAX_IMAGES_PER_LISTING + 1) + FORM_FIELDS_ALLOWANCE;

    let tickets = Router::new()
        .route(
            "/api/tickets",
            get(handlers::tickets::list_tickets).post(handlers::tickets::create_ticket),
        )
        .route(
            "/api/tickets/:id",
            get(handlers::tickets::get_ticket)
                .put(handlers::tickets::update_ticket)
                .delete(handlers::tickets::delete_ticket),
        );

    let support = Router::new()
        .route("/api/support/tickets", get(handlers::support::list_tickets))
        .route(
            "/api/support/tickets/:id",
            get(handlers::support::get_ticket).delete(handlers::support::delete_ticket),
        )
        .route(
            "/api/support/tickets/:id/status",
            patch(handlers::support::update_status),
        )
        .route(
            "/api/support/tickets/:id/response",
            post(handlers::support::add_response)
                .put(handlers::support::edit_response)
                .delete(handlers::support::delete_response),
        );

    let payments = Router::new()
        .route(
            "/api/payments",
            get(handlers::payments::list_payments).post(handlers::payments::create_payment),
        )
        .route(
            "/api/payments/:id",
            get(handlers::payments::get_payment).delete(handlers::payments::delete_payment),
        )
        .route(
            "/api/payments/:id/status",
            patch(handlers::payments::update_status),
        )
        .route("/api/payments/:id/hide", patch(handlers::payments::hide_payment));

    let online_payments = Router::new()
        .route(
            "/api/online-payments",
            get(handlers::online_payments::list_payments)
                .post(handlers::online_payments::create_payment),
        )
        .route(
            "/api/online-payments/:id",
            get(handlers::online_payments::get_payment)
                .delete(handlers::online_payments::delete_payment),
        )
        .route(
            "/api/online-payments/:id/verify",
            post(handlers::online_payments::verify_otp)
                .layer(from_fn_with_state(limiter.clone(), ip_rate_limit_middleware)),
        )
        .route(
            "/api/online-payments/:id/resend",
            post(handlers::online_payments::resend_otp)
                .layer(from_fn_with_state(limiter.clone(), ip_rate_limit_middleware)),
        );

    let gemstones = Router::new()
        .route(
            "/gemstone",
            get(handlers::gemstones::list_gemstones).post(handlers::gemstones::create_gemstone),
        )
        .route(
            "/gemstone/auctioned",
            get(handlers::gemstones::list_auctioned),
        )
        .route(
            "/gemstone/:id",
            get(handlers::gemstones::get_gemstone)
                .put(handlers::gemstones::update_gemstone)
                .delete(handlers::gemstones::delete_gemstone),
        );

    let auctions = Router::new()
        .route(
            "/api/auctions",
            get(handlers::auctions::list_auctions).post(handlers::auctions::create_auction),
        )
        .route(
            "/api/auctions/:id",
            get(handlers::auctions::get_auction).delete(handlers::auctions::delete_auction),
        )
        .route(
            "/api/auctions/:id/bids",
            post(handlers::auctions::place_bid)
                .layer(from_fn_with_state(limiter, ip_rate_limit_middleware))
                .get(handlers::auctions::list_bids),
        )
        .route(
            "/api/auctions/:id/close",
            post(handlers::auctions::close_auction),
        );

    let feedbacks = Router::new()
        .route(
            "/api/feedbacks",
            get(handlers::feedbacks::list_feedbacks).post(handlers::feedbacks::create_feedback),
        )
        .route(
            "/api/feedbacks/:id",
            get(handlers::feedbacks::get_feedback)
                .put(handlers::feedbacks::update_feedback)
                .delete(handlers::feedbacks::delete_feedback),
        );

    let cors = cors_layer(state.config.cors_allowed_origin.as_deref());

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .route("/api/admin/session", post(handlers::admin::create_session))
        .route("/uploads/*key", get(handlers::uploads::serve_upload))
        .merge(tickets)
        .merge(support)
        .merge(payments)
        .merge(online_payments)
        .merge(gemstones)
        .merge(auctions)
        .merge(feedbacks)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let origin = match allowed_origin.map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            tracing::error!("Invalid CORS origin: {}. Allowing any origin.", e);
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(ADMIN_SECRET_HEADER),
            HeaderName::from_static(USER_EMAIL_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}
