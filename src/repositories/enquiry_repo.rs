use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::models::{
    DealerContact, DealerInteractionFilter, Enquiry, NewEnquiry, SearchFilter, UpdateFields,
};

const INSERT_SQL: &str = "INSERT INTO product_enquiry \
    (customername, gender, age, occupation, mobileno, email, vehiclemodel, state, district, city, \
     existingvehicle, dealerstate, dealertown, dealername, briefaboutenquiry, \
     expecteddateofpurchase, senttodealer, dealercode, leadid, createddate, ispurchased) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)";

/// All access to the `product_enquiry` table.
///
/// Filter queries build a conjunction of the predicates the caller supplied;
/// absent inputs add no clause. No query applies an ORDER BY, so row order is
/// whatever the store returns. Every method checks its connection out of the
/// pool for the duration of one statement or one transaction and returns it
/// on every path.
pub struct EnquiryRepository {
    pool: PgPool,
}

/// Date-range filter over `createddate`, both bounds inclusive, optionally
/// narrowed by purchase outcome and dealer code.
fn lead_history_query(
    start: NaiveDate,
    end: NaiveDate,
    purchased: Option<bool>,
    dealer_code: Option<i64>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM product_enquiry WHERE createddate >= ");
    qb.push_bind(start);
    qb.push(" AND createddate <= ");
    qb.push_bind(end);
    if let Some(purchased) = purchased {
        qb.push(" AND ispurchased = ");
        qb.push_bind(purchased);
    }
    if let Some(dealer_code) = dealer_code {
        qb.push(" AND dealercode = ");
        qb.push_bind(dealer_code);
    }
    qb
}

fn search_query(filter: &SearchFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM product_enquiry WHERE 1 = 1");
    if let Some(ref name) = filter.customer_name {
        qb.push(" AND customername ILIKE ");
        qb.push_bind(format!("%{}%", name));
    }
    if let Some(mobile_no) = filter.mobile_no {
        qb.push(" AND mobileno = ");
        qb.push_bind(mobile_no);
    }
    if let Some(ref email) = filter.email {
        qb.push(" AND email = ");
        qb.push_bind(email.clone());
    }
    qb
}

fn vehicle_model_query(model: &str, case_sensitive: bool) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM product_enquiry WHERE vehiclemodel ");
    qb.push(if case_sensitive { "LIKE " } else { "ILIKE " });
    qb.push_bind(format!("%{}%", model));
    qb
}

fn dealer_interactions_query(filter: &DealerInteractionFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM product_enquiry WHERE senttodealer = TRUE");
    if let Some(ref name) = filter.dealer_name {
        qb.push(" AND dealername ILIKE ");
        qb.push_bind(format!("%{}%", name));
    }
    if let Some(ref state) = filter.dealer_state {
        qb.push(" AND dealerstate = ");
        qb.push_bind(state.clone());
    }
    if let Some(ref town) = filter.dealer_town {
        qb.push(" AND dealertown = ");
        qb.push_bind(town.clone());
    }
    qb
}

/// Partial update keyed by mobile number; only supplied columns appear in the
/// SET list. Callers must reject an empty field set before reaching here.
fn update_query(mobile_no: i64, fields: &UpdateFields) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE product_enquiry SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(ref v) = fields.customername {
            set.push("customername = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.gender {
            set.push("gender = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(v) = fields.age {
            set.push("age = ");
            set.push_bind_unseparated(v);
        }
        if let Some(ref v) = fields.occupation {
            set.push("occupation = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.email {
            set.push("email = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.vehiclemodel {
            set.push("vehiclemodel = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.state {
            set.push("state = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.district {
            set.push("district = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.city {
            set.push("city = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.existingvehicle {
            set.push("existingvehicle = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.dealerstate {
            set.push("dealerstate = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.dealertown {
            set.push("dealertown = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.dealername {
            set.push("dealername = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(ref v) = fields.briefaboutenquiry {
            set.push("briefaboutenquiry = ");
            set.push_bind_unseparated(v.clone());
        }
        if let Some(v) = fields.expecteddateofpurchase {
            set.push("expecteddateofpurchase = ");
            set.push_bind_unseparated(v);
        }
        if let Some(v) = fields.senttodealer {
            set.push("senttodealer = ");
            set.push_bind_unseparated(v);
        }
        if let Some(v) = fields.dealercode {
            set.push("dealercode = ");
            set.push_bind_unseparated(v);
        }
        if let Some(v) = fields.leadid {
            set.push("leadid = ");
            set.push_bind_unseparated(v);
        }
        if let Some(v) = fields.createddate {
            set.push("createddate = ");
            set.push_bind_unseparated(v);
        }
        if let Some(v) = fields.ispurchased {
            set.push("ispurchased = ");
            set.push_bind_unseparated(v);
        }
    }
    qb.push(" WHERE mobileno = ");
    qb.push_bind(mobile_no);
    qb
}

impl EnquiryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Primary key column names of `product_enquiry`, read from the catalog.
    pub async fn primary_key_columns(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT kcu.column_name \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
               ON kcu.constraint_name = tc.constraint_name \
              AND kcu.table_schema = tc.table_schema \
             WHERE tc.table_name = 'product_enquiry' \
               AND tc.constraint_type = 'PRIMARY KEY' \
             ORDER BY kcu.ordinal_position",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("column_name"))
            .collect()
    }

    /// Inserts the whole batch inside one transaction; any failure rolls the
    /// entire batch back and nothing is persisted.
    pub async fn insert_batch(&self, records: &[NewEnquiry]) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(INSERT_SQL)
                .bind(&record.customer_name)
                .bind(&record.gender)
                .bind(record.age)
                .bind(&record.occupation)
                .bind(record.mobile_no)
                .bind(&record.email)
                .bind(&record.vehicle_model)
                .bind(&record.state)
                .bind(&record.district)
                .bind(&record.city)
                .bind(&record.existing_vehicle)
                .bind(&record.dealer_state)
                .bind(&record.dealer_town)
                .bind(&record.dealer_name)
                .bind(&record.brief_about_enquiry)
                .bind(record.expected_date_of_purchase)
                .bind(record.sent_to_dealer)
                .bind(record.dealer_code)
                .bind(record.lead_id)
                .bind(record.created_date)
                .bind(record.is_purchased)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(records.len() as u64)
    }

    pub async fn find_all(&self) -> Result<Vec<Enquiry>, sqlx::Error> {
        sqlx::query_as::<_, Enquiry>("SELECT * FROM product_enquiry")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_page(&self, limit: i64, offset: i64) -> Result<Vec<Enquiry>, sqlx::Error> {
        sqlx::query_as::<_, Enquiry>("SELECT * FROM product_enquiry LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_by_lead_id(&self, lead_id: i64) -> Result<Vec<Enquiry>, sqlx::Error> {
        sqlx::query_as::<_, Enquiry>("SELECT * FROM product_enquiry WHERE leadid = $1")
            .bind(lead_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn created_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        purchased: Option<bool>,
        dealer_code: Option<i64>,
    ) -> Result<Vec<Enquiry>, sqlx::Error> {
        lead_history_query(start, end, purchased, dealer_code)
            .build_query_as::<Enquiry>()
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_by_vehicle_model(
        &self,
        model: &str,
        case_sensitive: bool,
    ) -> Result<Vec<Enquiry>, sqlx::Error> {
        vehicle_model_query(model, case_sensitive)
            .build_query_as::<Enquiry>()
            .fetch_all(&self.pool)
            .await
    }

    pub async fn search(&self, filter: &SearchFilter) -> Result<Vec<Enquiry>, sqlx::Error> {
        search_query(filter)
            .build_query_as::<Enquiry>()
            .fetch_all(&self.pool)
            .await
    }

    pub async fn dealer_codes_by_state(
        &self,
        state: &str,
    ) -> Result<Vec<DealerContact>, sqlx::Error> {
        sqlx::query_as::<_, DealerContact>(
            "SELECT DISTINCT dealercode, dealername FROM product_enquiry WHERE dealerstate = $1",
        )
        .bind(state)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn dealer_interactions(
        &self,
        filter: &DealerInteractionFilter,
    ) -> Result<Vec<Enquiry>, sqlx::Error> {
        dealer_interactions_query(filter)
            .build_query_as::<Enquiry>()
            .fetch_all(&self.pool)
            .await
    }

    /// Flips `senttodealer` for one mobile number in its own committed
    /// statement. Callers looping over a list get the legacy per-row-commit
    /// behavior: numbers already processed stay updated even if a later one
    /// fails.
    pub async fn mark_sent_to_dealer(
        &self,
        mobile_no: i64,
    ) -> Result<Option<Enquiry>, sqlx::Error> {
        sqlx::query_as::<_, Enquiry>(
            "UPDATE product_enquiry SET senttodealer = TRUE WHERE mobileno = $1 RETURNING *",
        )
        .bind(mobile_no)
        .fetch_optional(&self.pool)
        .await
    }

    /// Returns the number of rows affected; zero means no record carries the
    /// given mobile number, which is an outcome, not an error.
    pub async fn update_by_mobile_no(
        &self,
        mobile_no: i64,
        fields: &UpdateFields,
    ) -> Result<u64, sqlx::Error> {
        let result = update_query(mobile_no, fields)
            .build()
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes every record expected to purchase strictly before the cutoff.
    /// The doomed rows are snapshotted inside the same transaction so the
    /// response and notification can describe exactly what was removed.
    pub async fn delete_before_purchase_date(
        &self,
        cutoff: NaiveDate,
    ) -> Result<(Vec<Enquiry>, u64), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let doomed = sqlx::query_as::<_, Enquiry>(
            "SELECT * FROM product_enquiry WHERE expecteddateofpurchase < $1",
        )
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM product_enquiry WHERE expecteddateofpurchase < $1")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((doomed, result.rows_affected()))
    }

    pub async fn reset_sent_flag(&self, dealer_code: i64) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE product_enquiry SET senttodealer = FALSE WHERE dealercode = $1")
                .bind(dealer_code)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lead_history_uses_inclusive_bounds() {
        let qb = lead_history_query(date(2024, 1, 1), date(2024, 1, 31), None, None);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM product_enquiry WHERE createddate >= $1 AND createddate <= $2"
        );
    }

    #[test]
    fn lead_history_appends_optional_predicates() {
        let qb = lead_history_query(date(2024, 1, 1), date(2024, 1, 31), Some(true), Some(101));
        assert_eq!(
            qb.sql(),
            "SELECT * FROM product_enquiry WHERE createddate >= $1 AND createddate <= $2 \
             AND ispurchased = $3 AND dealercode = $4"
        );
    }

    #[test]
    fn search_omits_absent_predicates() {
        let qb = search_query(&SearchFilter::default());
        assert_eq!(qb.sql(), "SELECT * FROM product_enquiry WHERE 1 = 1");

        let qb = search_query(&SearchFilter {
            customer_name: Some("ravi".into()),
            mobile_no: None,
            email: Some("ravi@example.com".into()),
        });
        assert_eq!(
            qb.sql(),
            "SELECT * FROM product_enquiry WHERE 1 = 1 AND customername ILIKE $1 AND email = $2"
        );
    }

    #[test]
    fn vehicle_model_honors_case_sensitivity_flag() {
        let insensitive = vehicle_model_query("thar", false);
        assert_eq!(
            insensitive.sql(),
            "SELECT * FROM product_enquiry WHERE vehiclemodel ILIKE $1"
        );

        let sensitive = vehicle_model_query("thar", true);
        assert_eq!(
            sensitive.sql(),
            "SELECT * FROM product_enquiry WHERE vehiclemodel LIKE $1"
        );
    }

    #[test]
    fn dealer_interactions_always_filter_forwarded_leads() {
        let qb = dealer_interactions_query(&DealerInteractionFilter {
            dealer_name: Some("prime".into()),
            dealer_state: None,
            dealer_town: Some("Whitefield".into()),
        });
        assert_eq!(
            qb.sql(),
            "SELECT * FROM product_enquiry WHERE senttodealer = TRUE \
             AND dealername ILIKE $1 AND dealertown = $2"
        );
    }

    #[test]
    fn update_sets_only_supplied_columns() {
        let fields = UpdateFields {
            briefaboutenquiry: Some("call back".into()),
            ispurchased: Some(true),
            ..UpdateFields::default()
        };
        let qb = update_query(9876543210, &fields);
        assert_eq!(
            qb.sql(),
            "UPDATE product_enquiry SET briefaboutenquiry = $1, ispurchased = $2 \
             WHERE mobileno = $3"
        );
    }
}
