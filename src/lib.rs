pub mod config;
pub mod models;
pub mod repositories;
pub mod services;
pub mod handlers;
pub mod middleware;

use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use config::AppConfig;
use handlers::{
    dealers::{
        get_dealer_codes_and_names, get_dealer_interactions, mark_sent_to_dealer,
        reset_sent_to_dealer,
    },
    leads::{
        get_enquiries_by_date, get_enquiries_by_vehicle_model, get_historic_leads,
        get_not_purchased_leads, get_purchased_leads, get_single_record, search_enquiries,
    },
    records::{
        del_record, get_home_page, get_limited_records_by_env_variable,
        get_limited_records_by_hard_coding, get_primary_key_details, post_records, update_record,
    },
};

pub fn create_app(config: AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/get-home-page1", get(get_home_page))
        .route("/get-primary-key-details", get(get_primary_key_details))
        .route("/post-records", post(post_records))
        .route(
            "/get-limited-records-by-env-variable",
            get(get_limited_records_by_env_variable),
        )
        .route(
            "/get-limited-records-by-hard-coding",
            get(get_limited_records_by_hard_coding),
        )
        .route("/get-single-record", get(get_single_record))
        .route("/historic-leads", get(get_historic_leads))
        .route("/purchased-historic-leads", get(get_purchased_leads))
        .route(
            "/not-purchased-historic-leads",
            get(get_not_purchased_leads),
        )
        .route("/get-enquiries-by-date", get(get_enquiries_by_date))
        .route(
            "/get-enquiries-by-vehicle-model",
            get(get_enquiries_by_vehicle_model),
        )
        .route("/search-enquiries", get(search_enquiries))
        .route("/update-record", put(update_record))
        .route("/del-single-record", delete(del_record))
        .route("/mark-sent-to-dealer", put(mark_sent_to_dealer))
        .route("/reset-sent-to-dealer", put(reset_sent_to_dealer))
        .route(
            "/get-dealer-codes-and-names",
            get(get_dealer_codes_and_names),
        )
        .route("/dealer-interactions", get(get_dealer_interactions))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(config)
        .layer(axum::middleware::from_fn(
            |req: Request<Body>, next: Next| async move {
                tracing::info!("{} {}", req.method(), req.uri());
                let response = next.run(req).await;
                tracing::info!("Response status: {}", response.status());
                response
            },
        ))
}
