use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    config::AppConfig,
    handlers::{optional_param, require_param},
    middleware::error_handling::AppError,
    models::DealerInteractionFilter,
    repositories::EnquiryRepository,
    services::notification_service::{format_dealers, format_records},
};

type HandlerResult = Result<(StatusCode, Json<Value>), AppError>;

/// PUT /mark-sent-to-dealer — flips the flag for one or more mobile
/// numbers (comma-separated). Each row commits on its own, so a failure
/// mid-list leaves the earlier updates in place.
pub async fn mark_sent_to_dealer(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let raw = require_param(
        &params,
        "mobileno",
        "Missing required parameters",
        "Please provide 'mobileno'.",
    )?;
    let mobile_nos = raw
        .split(',')
        .map(|part| {
            part.trim().parse::<i64>().map_err(|_| {
                AppError::bad_request("Invalid mobileno", "Mobileno must be an integer.")
            })
        })
        .collect::<Result<Vec<i64>, _>>()?;
    info!("PUT /mark-sent-to-dealer - {:?}", mobile_nos);

    let repo = EnquiryRepository::new(config.database_pool.clone());
    let mut updated = Vec::new();
    for mobile_no in &mobile_nos {
        match repo.mark_sent_to_dealer(*mobile_no).await {
            Ok(Some(record)) => updated.push(record),
            Ok(None) => {}
            Err(e) => {
                config.notifications.notify_failure(
                    "Database Error",
                    format!(
                        "An error occurred while updating the SentToDealer flag for \
                         mobile number {}.\n\nError details:\n{}",
                        mobile_no, e
                    ),
                );
                return Err(AppError::database(
                    "An error occurred while updating the records",
                    e,
                ));
            }
        }
    }

    if updated.is_empty() {
        config.notifications.notify_failure(
            "Record Not Found",
            format!(
                "No record found for mobile number(s): {:?} in product_enquiry.",
                mobile_nos
            ),
        );
        return Err(AppError::not_found(json!({
            "message": "No record found for the given mobile number(s)."
        })));
    }

    let count = updated.len();
    config.notifications.notify_success(
        "SentToDealer Flag Updated",
        format!(
            "Total records updated: {}\n\nDetails:\n\n{}",
            count,
            format_records(&updated)
        ),
    );
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "SentToDealer flag updated successfully",
            "total_count": count,
            "records": updated,
        })),
    ))
}

/// GET /get-dealer-codes-and-names — distinct dealer contacts for a
/// state. No match is a 404 here.
pub async fn get_dealer_codes_and_names(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let state = require_param(
        &params,
        "state",
        "Missing required parameters",
        "Please provide 'state'.",
    )?;
    info!("GET /get-dealer-codes-and-names - state '{}'", state);

    let repo = EnquiryRepository::new(config.database_pool.clone());
    match repo.dealer_codes_by_state(state).await {
        Ok(dealers) if dealers.is_empty() => {
            config.notifications.notify_failure(
                "No Dealers Found",
                format!("No dealers found for state '{}'.", state),
            );
            Err(AppError::not_found(json!({
                "message": "No dealers found for the given state",
                "state": state,
            })))
        }
        Ok(dealers) => {
            let count = dealers.len();
            config.notifications.notify_success(
                "Dealer Details Retrieved Successfully",
                format!(
                    "Total dealers retrieved: {}\n\nDealer details for state '{}':\n\n{}",
                    count,
                    state,
                    format_dealers(&dealers)
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "Dealer details retrieved successfully",
                    "total_count": count,
                    "dealers": dealers,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Database Error",
                format!(
                    "An error occurred while fetching dealer details for state '{}'.\n\n\
                     Error details:\n{}",
                    state, e
                ),
            );
            Err(AppError::database(
                "An error occurred while fetching the records",
                e,
            ))
        }
    }
}

/// GET /dealer-interactions — enquiries already forwarded to a dealer,
/// optionally narrowed by dealer name, state, or town.
pub async fn get_dealer_interactions(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let filter = DealerInteractionFilter {
        dealer_name: optional_param(&params, "dealername"),
        dealer_state: optional_param(&params, "dealerstate"),
        dealer_town: optional_param(&params, "dealertown"),
    };
    info!("GET /dealer-interactions - {:?}", filter);

    let repo = EnquiryRepository::new(config.database_pool.clone());
    match repo.dealer_interactions(&filter).await {
        Ok(records) if records.is_empty() => {
            config.notifications.notify_failure(
                "No Dealer Interactions",
                format!("No dealer interactions matched the filter: {:?}", filter),
            );
            Err(AppError::not_found(json!({
                "message": "No dealer interactions found"
            })))
        }
        Ok(records) => {
            let count = records.len();
            config.notifications.notify_success(
                "Dealer Interactions Retrieved Successfully",
                format!(
                    "Total records retrieved: {}\n\nDetails:\n\n{}",
                    count,
                    format_records(&records)
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "Dealer interactions retrieved successfully",
                    "total_count": count,
                    "records": records,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Database Error",
                format!(
                    "An error occurred while fetching dealer interactions.\n\n\
                     Error details:\n{}",
                    e
                ),
            );
            Err(AppError::database(
                "An error occurred while fetching the records",
                e,
            ))
        }
    }
}

/// PUT /reset-sent-to-dealer — clears the forwarded flag for every
/// enquiry of a dealer so the batch can be re-sent.
pub async fn reset_sent_to_dealer(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let dealer_code: i64 = require_param(
        &params,
        "dealercode",
        "Missing required parameters",
        "Please provide 'dealercode'.",
    )?
    .parse()
    .map_err(|_| AppError::bad_request("Invalid dealercode", "Dealercode must be an integer."))?;
    info!("PUT /reset-sent-to-dealer - dealer {}", dealer_code);

    let repo = EnquiryRepository::new(config.database_pool.clone());
    match repo.reset_sent_flag(dealer_code).await {
        Ok(reset_count) => {
            config.notifications.notify_success(
                "SentToDealer Flags Reset",
                format!(
                    "Total records reset: {} for dealer code {}.",
                    reset_count, dealer_code
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "SentToDealer flags reset successfully",
                    "dealercode": dealer_code,
                    "reset_count": reset_count,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Database Error",
                format!(
                    "An error occurred while resetting SentToDealer flags for dealer \
                     code {}.\n\nError details:\n{}",
                    dealer_code, e
                ),
            );
            Err(AppError::database(
                "An error occurred while updating the records",
                e,
            ))
        }
    }
}
