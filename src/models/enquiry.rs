use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the `product_enquiry` table.
///
/// Transport keys keep the PascalCase names callers already depend on, while
/// the store uses the flat lowercase column names. `mobileno` is the primary
/// key; every other column is nullable in the store, so reads tolerate NULLs
/// even though inserts require a full record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enquiry {
    #[serde(rename = "CustomerName")]
    #[sqlx(rename = "customername")]
    pub customer_name: Option<String>,
    #[serde(rename = "Gender")]
    #[sqlx(rename = "gender")]
    pub gender: Option<String>,
    #[serde(rename = "Age")]
    #[sqlx(rename = "age")]
    pub age: Option<i32>,
    #[serde(rename = "Occupation")]
    #[sqlx(rename = "occupation")]
    pub occupation: Option<String>,
    #[serde(rename = "MobileNo")]
    #[sqlx(rename = "mobileno")]
    pub mobile_no: i64,
    #[serde(rename = "Email")]
    #[sqlx(rename = "email")]
    pub email: Option<String>,
    #[serde(rename = "VehicleModel")]
    #[sqlx(rename = "vehiclemodel")]
    pub vehicle_model: Option<String>,
    #[serde(rename = "State")]
    #[sqlx(rename = "state")]
    pub state: Option<String>,
    #[serde(rename = "District")]
    #[sqlx(rename = "district")]
    pub district: Option<String>,
    #[serde(rename = "City")]
    #[sqlx(rename = "city")]
    pub city: Option<String>,
    #[serde(rename = "ExistingVehicle")]
    #[sqlx(rename = "existingvehicle")]
    pub existing_vehicle: Option<String>,
    #[serde(rename = "DealerState")]
    #[sqlx(rename = "dealerstate")]
    pub dealer_state: Option<String>,
    #[serde(rename = "DealerTown")]
    #[sqlx(rename = "dealertown")]
    pub dealer_town: Option<String>,
    #[serde(rename = "DealerName")]
    #[sqlx(rename = "dealername")]
    pub dealer_name: Option<String>,
    #[serde(rename = "BriefAboutEnquiry")]
    #[sqlx(rename = "briefaboutenquiry")]
    pub brief_about_enquiry: Option<String>,
    #[serde(rename = "ExpectedDateofPurchase")]
    #[sqlx(rename = "expecteddateofpurchase")]
    pub expected_date_of_purchase: Option<NaiveDate>,
    #[serde(rename = "SentToDealer")]
    #[sqlx(rename = "senttodealer")]
    pub sent_to_dealer: Option<bool>,
    #[serde(rename = "DealerCode")]
    #[sqlx(rename = "dealercode")]
    pub dealer_code: Option<i64>,
    #[serde(rename = "LeadId")]
    #[sqlx(rename = "leadid")]
    pub lead_id: Option<i64>,
    #[serde(rename = "CreatedDate")]
    #[sqlx(rename = "createddate")]
    pub created_date: Option<NaiveDate>,
    #[serde(rename = "IsPurchased")]
    #[sqlx(rename = "ispurchased")]
    pub is_purchased: Option<bool>,
}

/// Payload for one element of the batch-insert array.
///
/// Every field is required: a missing key fails the whole batch rather than
/// defaulting, so the stored rows always carry the caller's values.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEnquiry {
    #[serde(rename = "CustomerName")]
    pub customer_name: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Age")]
    pub age: i32,
    #[serde(rename = "Occupation")]
    pub occupation: String,
    #[serde(rename = "MobileNo")]
    pub mobile_no: i64,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "VehicleModel")]
    pub vehicle_model: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "ExistingVehicle")]
    pub existing_vehicle: String,
    #[serde(rename = "DealerState")]
    pub dealer_state: String,
    #[serde(rename = "DealerTown")]
    pub dealer_town: String,
    #[serde(rename = "DealerName")]
    pub dealer_name: String,
    #[serde(rename = "BriefAboutEnquiry")]
    pub brief_about_enquiry: String,
    #[serde(rename = "ExpectedDateofPurchase")]
    pub expected_date_of_purchase: NaiveDate,
    #[serde(rename = "SentToDealer")]
    pub sent_to_dealer: bool,
    #[serde(rename = "DealerCode")]
    pub dealer_code: i64,
    #[serde(rename = "LeadId")]
    pub lead_id: i64,
    #[serde(rename = "CreatedDate")]
    pub created_date: NaiveDate,
    #[serde(rename = "IsPurchased")]
    pub is_purchased: bool,
}

impl NewEnquiry {
    /// Short summary echoed in the insert response and the success email.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "CustomerName": self.customer_name,
            "MobileNo": self.mobile_no,
            "Email": self.email,
            "VehicleModel": self.vehicle_model,
            "DealerName": self.dealer_name,
            "ExpectedDateofPurchase": self.expected_date_of_purchase,
        })
    }
}

/// Updatable columns for the partial update by mobile number.
///
/// Keys are the lowercase column names the update endpoint has always
/// accepted. Unknown keys are rejected so a typo never silently drops a
/// field from the update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateFields {
    pub customername: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub occupation: Option<String>,
    pub email: Option<String>,
    pub vehiclemodel: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub existingvehicle: Option<String>,
    pub dealerstate: Option<String>,
    pub dealertown: Option<String>,
    pub dealername: Option<String>,
    pub briefaboutenquiry: Option<String>,
    pub expecteddateofpurchase: Option<NaiveDate>,
    pub senttodealer: Option<bool>,
    pub dealercode: Option<i64>,
    pub leadid: Option<i64>,
    pub createddate: Option<NaiveDate>,
    pub ispurchased: Option<bool>,
}

impl UpdateFields {
    pub fn is_empty(&self) -> bool {
        self.customername.is_none()
            && self.gender.is_none()
            && self.age.is_none()
            && self.occupation.is_none()
            && self.email.is_none()
            && self.vehiclemodel.is_none()
            && self.state.is_none()
            && self.district.is_none()
            && self.city.is_none()
            && self.existingvehicle.is_none()
            && self.dealerstate.is_none()
            && self.dealertown.is_none()
            && self.dealername.is_none()
            && self.briefaboutenquiry.is_none()
            && self.expecteddateofpurchase.is_none()
            && self.senttodealer.is_none()
            && self.dealercode.is_none()
            && self.leadid.is_none()
            && self.createddate.is_none()
            && self.ispurchased.is_none()
    }
}

/// Conjunctive filter for `/search-enquiries`; absent fields are omitted.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub customer_name: Option<String>,
    pub mobile_no: Option<i64>,
    pub email: Option<String>,
}

/// Conjunctive filter for `/dealer-interactions` (always scoped to
/// forwarded leads, `senttodealer = TRUE`).
#[derive(Debug, Clone, Default)]
pub struct DealerInteractionFilter {
    pub dealer_name: Option<String>,
    pub dealer_state: Option<String>,
    pub dealer_town: Option<String>,
}

/// Dealer code/name pair returned by `/get-dealer-codes-and-names`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DealerContact {
    pub dealercode: Option<i64>,
    pub dealername: Option<String>,
}

/// Parses the `YYYY-MM-DD` format used by the direct date filters.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
}

/// Parses the `DD-MM-YYYY` format that `/get-enquiries-by-date` has always
/// used. The mismatch with the other date endpoints is a published quirk of
/// the API, not something to unify.
pub fn parse_day_first_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, "%d-%m-%Y")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> serde_json::Value {
        json!({
            "CustomerName": "Ravi Kumar",
            "Gender": "Male",
            "Age": 34,
            "Occupation": "Engineer",
            "MobileNo": 9876543210i64,
            "Email": "ravi@example.com",
            "VehicleModel": "Thar-4X",
            "State": "Karnataka",
            "District": "Bengaluru Urban",
            "City": "Bengaluru",
            "ExistingVehicle": "Alto",
            "DealerState": "Karnataka",
            "DealerTown": "Whitefield",
            "DealerName": "Prime Motors",
            "BriefAboutEnquiry": "Interested in a test drive",
            "ExpectedDateofPurchase": "2024-03-15",
            "SentToDealer": false,
            "DealerCode": 101,
            "LeadId": 5001,
            "CreatedDate": "2024-01-10",
            "IsPurchased": false
        })
    }

    #[test]
    fn new_enquiry_requires_every_field() {
        let mut payload = sample_record();
        payload.as_object_mut().unwrap().remove("VehicleModel");

        let err = serde_json::from_value::<NewEnquiry>(payload).unwrap_err();
        assert!(err.to_string().contains("VehicleModel"));
    }

    #[test]
    fn new_enquiry_round_trips_through_enquiry_serialization() {
        let payload = sample_record();
        let new: NewEnquiry = serde_json::from_value(payload.clone()).unwrap();
        assert_eq!(new.mobile_no, 9876543210);
        assert_eq!(
            new.expected_date_of_purchase,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );

        let stored: Enquiry = serde_json::from_value(payload.clone()).unwrap();
        let rendered = serde_json::to_value(&stored).unwrap();
        assert_eq!(rendered, payload);
    }

    #[test]
    fn dates_render_as_iso_8601() {
        let stored: Enquiry = serde_json::from_value(sample_record()).unwrap();
        let rendered = serde_json::to_value(&stored).unwrap();
        assert_eq!(rendered["CreatedDate"], json!("2024-01-10"));
        assert_eq!(rendered["ExpectedDateofPurchase"], json!("2024-03-15"));
    }

    #[test]
    fn update_fields_rejects_unknown_columns() {
        let err =
            serde_json::from_value::<UpdateFields>(json!({ "customerName": "typo" })).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn update_fields_tracks_emptiness() {
        let empty: UpdateFields = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());

        let one: UpdateFields =
            serde_json::from_value(json!({ "briefaboutenquiry": "call back" })).unwrap();
        assert!(!one.is_empty());
    }

    #[test]
    fn iso_date_parser_accepts_year_first_only() {
        assert_eq!(
            parse_iso_date("2024-01-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!(parse_iso_date("01-01-2024").is_err());
        assert!(parse_iso_date("2024-13-01").is_err());
    }

    #[test]
    fn day_first_parser_accepts_day_first_only() {
        assert_eq!(
            parse_day_first_date("15-03-2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(parse_day_first_date("2024-03-15").is_err());
    }
}
