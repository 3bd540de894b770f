use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    config::AppConfig,
    handlers::{optional_param, require_param},
    middleware::error_handling::AppError,
    models::{parse_day_first_date, parse_iso_date, SearchFilter},
    repositories::EnquiryRepository,
    services::notification_service::{format_record, format_records},
};

type HandlerResult = Result<(StatusCode, Json<Value>), AppError>;

/// GET /get-single-record — lookup by lead id. Zero rows is a 404 outcome
/// with its own body, not an error.
pub async fn get_single_record(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let raw = require_param(
        &params,
        "leadid",
        "Missing required parameters",
        "Please provide 'leadid'.",
    )?;
    let lead_id: i64 = raw
        .parse()
        .map_err(|_| AppError::bad_request("Invalid leadid", "Leadid must be an integer."))?;
    info!("GET /get-single-record - LeadId {}", lead_id);

    let repo = EnquiryRepository::new(config.database_pool.clone());
    match repo.find_by_lead_id(lead_id).await {
        Ok(records) if records.is_empty() => {
            config.notifications.notify_failure(
                "Record Not Found",
                format!("No record found for LeadId: {} in product_enquiry.", lead_id),
            );
            Err(AppError::not_found(json!({
                "message": "No record found",
                "leadid": lead_id,
            })))
        }
        Ok(records) => {
            let count = records.len();
            config.notifications.notify_success(
                "Record Retrieved Successfully",
                format!(
                    "Total records retrieved: {}\n\nRecord Details for LeadId: {}\n\n{}",
                    count,
                    lead_id,
                    format_record(&records[0])
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "Record retrieved successfully",
                    "total_count": count,
                    "record": records,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Database Error",
                format!(
                    "An error occurred while fetching the record with LeadId: {} \
                     from product_enquiry.\n\nError details:\n{}",
                    lead_id, e
                ),
            );
            Err(AppError::database(
                "An error occurred while fetching the record",
                e,
            ))
        }
    }
}

/// GET /historic-leads — created-date range, both bounds inclusive,
/// `YYYY-MM-DD`. An empty match is still a 200 with total_count 0.
pub async fn get_historic_leads(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let (start, end) = parse_date_range(
        &params,
        ("startdate", "enddate"),
        "Please provide both 'startdate' and 'enddate'.",
        DateFormat::Iso,
    )?;
    info!("GET /historic-leads - {} to {}", start, end);
    lead_history(
        &config,
        start,
        end,
        None,
        None,
        "Historic Leads Retrieved Successfully",
        "Records retrieved successfully",
    )
    .await
}

/// GET /purchased-historic-leads — same range, but only converted leads of
/// one dealer.
pub async fn get_purchased_leads(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let (start, end, dealer_code) = parse_dealer_range(&params)?;
    info!(
        "GET /purchased-historic-leads - {} to {} for dealer {}",
        start, end, dealer_code
    );
    lead_history(
        &config,
        start,
        end,
        Some(true),
        Some(dealer_code),
        "Purchased Leads Retrieved Successfully",
        "Purchased leads retrieved successfully",
    )
    .await
}

/// GET /not-purchased-historic-leads
pub async fn get_not_purchased_leads(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let (start, end, dealer_code) = parse_dealer_range(&params)?;
    info!(
        "GET /not-purchased-historic-leads - {} to {} for dealer {}",
        start, end, dealer_code
    );
    lead_history(
        &config,
        start,
        end,
        Some(false),
        Some(dealer_code),
        "Non-Purchased Leads Retrieved Successfully",
        "Non-purchased leads retrieved successfully",
    )
    .await
}

/// GET /get-enquiries-by-date — the one endpoint that takes `DD-MM-YYYY`
/// (published quirk, kept as-is). Empty matches return 200 with
/// total_count 0.
pub async fn get_enquiries_by_date(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let (start, end) = parse_date_range(
        &params,
        ("start_date", "end_date"),
        "Please provide both 'start_date' and 'end_date'.",
        DateFormat::DayFirst,
    )?;
    info!("GET /get-enquiries-by-date - {} to {}", start, end);
    lead_history(
        &config,
        start,
        end,
        None,
        None,
        "Enquiries Retrieved Successfully",
        "Enquiries retrieved successfully",
    )
    .await
}

/// GET /get-enquiries-by-vehicle-model — substring match, case sensitivity
/// under caller control (default insensitive). No match is a 404 here.
pub async fn get_enquiries_by_vehicle_model(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let model = require_param(
        &params,
        "vehicle_model",
        "Missing required parameter",
        "Please provide 'vehicle_model'.",
    )?;
    let case_sensitive = params
        .get("case_sensitive")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    info!(
        "GET /get-enquiries-by-vehicle-model - '{}' (case_sensitive={})",
        model, case_sensitive
    );

    let repo = EnquiryRepository::new(config.database_pool.clone());
    match repo.find_by_vehicle_model(model, case_sensitive).await {
        Ok(records) if records.is_empty() => {
            config.notifications.notify_failure(
                "No Enquiries Found",
                format!("No enquiries found for vehicle model '{}'.", model),
            );
            Err(AppError::not_found(json!({
                "message": "No enquiries found for the given vehicle model",
                "vehicle_model": model,
            })))
        }
        Ok(records) => {
            let count = records.len();
            config.notifications.notify_success(
                "Enquiries Retrieved Successfully",
                format!(
                    "Total records retrieved: {}\n\nDetails:\n\n{}",
                    count,
                    format_records(&records)
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "Enquiries retrieved successfully",
                    "total_count": count,
                    "records": records,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Database Error",
                format!(
                    "An error occurred while fetching enquiries for vehicle model '{}'.\n\n\
                     Error details:\n{}",
                    model, e
                ),
            );
            Err(AppError::database(
                "An error occurred while fetching the records",
                e,
            ))
        }
    }
}

/// GET /search-enquiries — any subset of customername / mobileno / email,
/// ANDed. No match is a 404 here (unlike the date-range reads).
pub async fn search_enquiries(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let mobile_no = match optional_param(&params, "mobileno") {
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            AppError::bad_request("Invalid mobileno", "Mobileno must be an integer.")
        })?),
        None => None,
    };
    let filter = SearchFilter {
        customer_name: optional_param(&params, "customername"),
        mobile_no,
        email: optional_param(&params, "email"),
    };
    info!("GET /search-enquiries - {:?}", filter);

    let repo = EnquiryRepository::new(config.database_pool.clone());
    match repo.search(&filter).await {
        Ok(records) if records.is_empty() => {
            config.notifications.notify_failure(
                "No Matching Enquiries",
                format!("No enquiries matched the search filter: {:?}", filter),
            );
            Err(AppError::not_found(json!({
                "message": "No matching enquiries found"
            })))
        }
        Ok(records) => {
            let count = records.len();
            config.notifications.notify_success(
                "Enquiries Retrieved Successfully",
                format!(
                    "Total records retrieved: {}\n\nDetails:\n\n{}",
                    count,
                    format_records(&records)
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "Enquiries retrieved successfully",
                    "total_count": count,
                    "records": records,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Database Error",
                format!(
                    "An error occurred while searching enquiries.\n\nError details:\n{}",
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

enum DateFormat {
    Iso,
    DayFirst,
}

fn parse_date_range(
    params: &HashMap<String, String>,
    (start_key, end_key): (&str, &str),
    missing_message: &'static str,
    format: DateFormat,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = params.get(start_key).filter(|v| !v.is_empty());
    let end = params.get(end_key).filter(|v| !v.is_empty());
    let (Some(start), Some(end)) = (start, end) else {
        return Err(AppError::missing_parameters(missing_message));
    };

    let (parser, label): (fn(&str) -> Result<NaiveDate, chrono::ParseError>, &str) = match format {
        DateFormat::Iso => (parse_iso_date, "YYYY-MM-DD"),
        DateFormat::DayFirst => (parse_day_first_date, "DD-MM-YYYY"),
    };
    let parse = |value: &str| {
        parser(value)
            .map_err(|_| AppError::invalid_date(format!("'{}' does not match {}", value, label)))
    };
    Ok((parse(start)?, parse(end)?))
}

fn parse_dealer_range(
    params: &HashMap<String, String>,
) -> Result<(NaiveDate, NaiveDate, i64), AppError> {
    const MISSING: &str = "Please provide 'startdate', 'enddate', and 'dealercode'.";
    let dealer_code = require_param(params, "dealercode", "Missing required parameters", MISSING)?
        .parse::<i64>()
        .map_err(|_| {
            AppError::bad_request("Invalid dealercode", "Dealercode must be an integer.")
        })?;
    let (start, end) = parse_date_range(params, ("startdate", "enddate"), MISSING, DateFormat::Iso)?;
    Ok((start, end, dealer_code))
}

async fn lead_history(
    config: &AppConfig,
    start: NaiveDate,
    end: NaiveDate,
    purchased: Option<bool>,
    dealer_code: Option<i64>,
    subject: &'static str,
    message: &'static str,
) -> HandlerResult {
    let repo = EnquiryRepository::new(config.database_pool.clone());
    match repo
        .created_between(start, end, purchased, dealer_code)
        .await
    {
        Ok(records) => {
            let count = records.len();
            config.notifications.notify_success(
                subject,
                format!(
                    "Total records retrieved: {}\n\nDetails:\n\n{}",
                    count,
                    format_records(&records)
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": message,
                    "total_count": count,
                    "records": records,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Database Error",
                format!(
                    "An error occurred while fetching records from product_enquiry.\n\n\
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

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn date_range_requires_both_bounds() {
        let err = parse_date_range(
            &params(&[("startdate", "2024-01-01")]),
            ("startdate", "enddate"),
            "Please provide both 'startdate' and 'enddate'.",
            DateFormat::Iso,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }

    #[test]
    fn date_range_rejects_wrong_format_per_endpoint() {
        // ISO endpoint rejects day-first input.
        let err = parse_date_range(
            &params(&[("startdate", "01-01-2024"), ("enddate", "2024-01-31")]),
            ("startdate", "enddate"),
            "x",
            DateFormat::Iso,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidDate { .. }));

        // Day-first endpoint rejects ISO input.
        let err = parse_date_range(
            &params(&[("start_date", "2024-01-01"), ("end_date", "31-01-2024")]),
            ("start_date", "end_date"),
            "x",
            DateFormat::DayFirst,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidDate { .. }));
    }

    #[test]
    fn date_range_parses_each_endpoints_format() {
        let (start, end) = parse_date_range(
            &params(&[("start_date", "15-03-2024"), ("end_date", "20-03-2024")]),
            ("start_date", "end_date"),
            "x",
            DateFormat::DayFirst,
        )
        .unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
    }

    #[test]
    fn dealer_range_checks_dealercode_type() {
        let err = parse_dealer_range(&params(&[
            ("startdate", "2024-01-01"),
            ("enddate", "2024-01-31"),
            ("dealercode", "abc"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }
}
