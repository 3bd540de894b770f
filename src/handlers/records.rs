use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    handlers::{display_json, require_param},
    middleware::error_handling::AppError,
    models::{parse_iso_date, Enquiry, NewEnquiry, UpdateFields},
    repositories::EnquiryRepository,
    services::{notification_service::format_records, NotificationService},
};

type HandlerResult = Result<(StatusCode, Json<Value>), AppError>;

/// GET /get-primary-key-details
pub async fn get_primary_key_details(State(config): State<AppConfig>) -> HandlerResult {
    info!("GET /get-primary-key-details - started");
    let repo = EnquiryRepository::new(config.database_pool.clone());

    match repo.primary_key_columns().await {
        Ok(keys) if keys.is_empty() => {
            warn!("No primary keys found for product_enquiry");
            Err(AppError::not_found(json!({
                "message": "No primary keys found for product_enquiry."
            })))
        }
        Ok(keys) => {
            let count = keys.len();
            config.notifications.notify_success(
                "Primary Key Details Retrieved Successfully",
                format!(
                    "Primary Key Details:\n\nTotal Primary Keys: {}\n\nKeys:\n{}",
                    count,
                    keys.join("\n")
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "Primary key details retrieved successfully",
                    "total_primary_keys": count,
                    "primary_keys": keys,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Database Error",
                format!(
                    "An error occurred while retrieving primary key details.\n\nError details:\n{}",
                    e
                ),
            );
            Err(AppError::database(
                "An error occurred while retrieving primary key details",
                e,
            ))
        }
    }
}

/// POST /post-records — batch insert; all rows land in one transaction or
/// none do.
pub async fn post_records(
    State(config): State<AppConfig>,
    Json(body): Json<Vec<Value>>,
) -> HandlerResult {
    info!("POST /post-records - processing {} record(s)", body.len());

    let mut records: Vec<NewEnquiry> = Vec::with_capacity(body.len());
    for (index, item) in body.iter().enumerate() {
        let record = serde_json::from_value(item.clone()).map_err(|e| {
            AppError::bad_request(
                "Missing or invalid field",
                format!("Record {}: {}", index + 1, e),
            )
        })?;
        records.push(record);
    }

    let repo = EnquiryRepository::new(config.database_pool.clone());
    match repo.insert_batch(&records).await {
        Ok(count) => {
            info!("Inserted {} records", count);
            let mut email_body = format!(
                "{} records were successfully inserted into the database.\n\n\
                 Details of inserted records are:\n",
                count
            );
            for (i, record) in records.iter().enumerate() {
                email_body.push_str(&format!(
                    "Record {}:\nCustomer Name: {}\nMobile No: {}\nEmail: {}\n\
                     Vehicle Model: {}\nDealer Name: {}\nExpected Date of Purchase: {}\n\n",
                    i + 1,
                    record.customer_name,
                    record.mobile_no,
                    record.email,
                    record.vehicle_model,
                    record.dealer_name,
                    record.expected_date_of_purchase,
                ));
            }
            config
                .notifications
                .notify_success("Success: Records Inserted", email_body);

            let summaries: Vec<Value> = records.iter().map(NewEnquiry::summary).collect();
            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "message": format!("{} records inserted successfully", count),
                    "inserted_records": summaries,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Failure: Database Error During Record Insertion",
                format!(
                    "An error occurred while inserting the records into the database. Error: {}",
                    e
                ),
            );
            Err(AppError::database(
                "An error occurred while inserting the records",
                e,
            ))
        }
    }
}

/// GET /get-home-page1 — every record in the table.
pub async fn get_home_page(State(config): State<AppConfig>) -> HandlerResult {
    info!("GET /get-home-page1 - started");
    let repo = EnquiryRepository::new(config.database_pool.clone());
    list_records(repo.find_all().await, &config.notifications)
}

/// GET /get-limited-records-by-env-variable — page size from the LIMIT
/// environment variable, offset fixed at 0.
pub async fn get_limited_records_by_env_variable(State(config): State<AppConfig>) -> HandlerResult {
    info!(
        "GET /get-limited-records-by-env-variable - limit {}",
        config.record_limit
    );
    let repo = EnquiryRepository::new(config.database_pool.clone());
    list_records(
        repo.find_page(config.record_limit, 0).await,
        &config.notifications,
    )
}

/// GET /get-limited-records-by-hard-coding — limit 3, offset 2, fixed.
pub async fn get_limited_records_by_hard_coding(State(config): State<AppConfig>) -> HandlerResult {
    info!("GET /get-limited-records-by-hard-coding - started");
    let repo = EnquiryRepository::new(config.database_pool.clone());
    list_records(repo.find_page(3, 2).await, &config.notifications)
}

fn list_records(
    result: Result<Vec<Enquiry>, sqlx::Error>,
    notifier: &NotificationService,
) -> HandlerResult {
    match result {
        Ok(records) => {
            let count = records.len();
            notifier.notify_success(
                "Records Retrieved Successfully",
                format!(
                    "Total records retrieved: {}\n\nDetails:\n\n{}",
                    count,
                    format_records(&records)
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "Records retrieved successfully",
                    "total_count": count,
                    "records": records,
                })),
            ))
        }
        Err(e) => {
            notifier.notify_failure(
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

/// PUT /update-record — partial update keyed by mobile number; any subset of
/// lowercase column names may be supplied, untouched columns keep their
/// values.
pub async fn update_record(
    State(config): State<AppConfig>,
    Json(body): Json<Value>,
) -> HandlerResult {
    info!("PUT /update-record - started");

    let Some(object) = body.as_object() else {
        return Err(AppError::bad_request(
            "Invalid request body",
            "Expected a JSON object with the fields to update.",
        ));
    };

    let mobile_no = match object.get("mobileno") {
        None | Some(Value::Null) => {
            return Err(AppError::bad_request(
                "Missing required field",
                "Please provide 'mobileno'.",
            ))
        }
        Some(value) => coerce_mobile_no(value)?,
    };

    let mut fields_map = object.clone();
    fields_map.remove("mobileno");
    let fields: UpdateFields =
        serde_json::from_value(Value::Object(fields_map.clone())).map_err(|e| {
            AppError::bad_request("Invalid update fields", e.to_string())
        })?;

    if fields.is_empty() {
        return Err(AppError::bad_request(
            "No fields provided",
            "At least one field other than 'mobileno' must be provided for update.",
        ));
    }

    let repo = EnquiryRepository::new(config.database_pool.clone());
    match repo.update_by_mobile_no(mobile_no, &fields).await {
        Ok(0) => Err(AppError::not_found(json!({
            "message": "No record found for the given mobile number."
        }))),
        Ok(_) => {
            info!("Updated record for mobileno {}", mobile_no);
            let updated_details = fields_map
                .iter()
                .map(|(key, value)| format!("{}: {}", key, display_json(value)))
                .collect::<Vec<_>>()
                .join("\n");
            config.notifications.notify_success(
                "Record Updated Successfully",
                format!(
                    "The record for mobile number {} was updated successfully.\n\n\
                     Here are the details of the updated fields:\n\n{}",
                    mobile_no, updated_details
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "Record updated successfully",
                    "mobileno": mobile_no,
                    "updated_fields": fields_map,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Database Error",
                format!(
                    "An error occurred while updating the record for mobile number {}. \
                     Error details: {}",
                    mobile_no, e
                ),
            );
            Err(AppError::database("Database error", e))
        }
    }
}

/// The legacy API accepted `mobileno` as either a JSON number or a numeric
/// string; both coerce to the key, anything else is an invalid type.
fn coerce_mobile_no(value: &Value) -> Result<i64, AppError> {
    let invalid = || AppError::bad_request("Invalid mobileno", "Mobileno must be an integer.");
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(invalid),
        Value::String(s) => s.trim().parse().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// DELETE /del-single-record — bulk delete of every record whose expected
/// purchase date is strictly before the cutoff. The record dated exactly on
/// the cutoff survives.
pub async fn del_record(
    State(config): State<AppConfig>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    info!("DELETE /del-single-record - started");

    let raw = require_param(
        &params,
        "expecteddateofpurchase",
        "Missing required parameter",
        "Please provide 'expecteddateofpurchase'.",
    )?;
    let cutoff = parse_iso_date(raw)
        .map_err(|_| AppError::invalid_date(format!("'{}' does not match YYYY-MM-DD", raw)))?;

    let repo = EnquiryRepository::new(config.database_pool.clone());
    match repo.delete_before_purchase_date(cutoff).await {
        Ok((records, count)) => {
            info!("Deleted {} records before {}", count, cutoff);
            config.notifications.notify_success(
                "Records Deleted Successfully",
                format!(
                    "Total records deleted: {}\n\nDate used for filtering: {}\n\n\
                     Details of deleted records:\n{}",
                    count,
                    cutoff,
                    format_records(&records)
                ),
            );
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": format!("Records deleted successfully. Total deleted: {}", count),
                    "deleted_count": count,
                    "deleted_records": records,
                })),
            ))
        }
        Err(e) => {
            config.notifications.notify_failure(
                "Database Error",
                format!(
                    "An error occurred while deleting records. Error details:\n{}",
                    e
                ),
            );
            Err(AppError::database("Database error", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_number_coercion_accepts_number_and_string() {
        assert_eq!(coerce_mobile_no(&json!(9876543210i64)).unwrap(), 9876543210);
        assert_eq!(coerce_mobile_no(&json!("9876543210")).unwrap(), 9876543210);
        assert!(coerce_mobile_no(&json!("98x")).is_err());
        assert!(coerce_mobile_no(&json!(3.5)).is_err());
        assert!(coerce_mobile_no(&json!([1])).is_err());
    }
}
