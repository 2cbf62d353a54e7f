//! Database repository for the one-to-one user profile.

use crate::db::{
    errors::Result,
    models::user_profiles::{UserProfileDBRequest, UserProfileDBResponse},
};
use crate::types::UserId;
use sqlx::PgConnection;
use tracing::instrument;

pub struct UserProfiles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> UserProfiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_for_user(&mut self, user_id: UserId) -> Result<Option<UserProfileDBResponse>> {
        let profile = sqlx::query_as::<_, UserProfileDBResponse>("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(profile)
    }

    /// Create the profile, or overwrite the given fields of the existing one.
    #[instrument(skip(self, request), err)]
    pub async fn upsert(&mut self, user_id: UserId, request: &UserProfileDBRequest) -> Result<UserProfileDBResponse> {
        let profile = sqlx::query_as::<_, UserProfileDBResponse>(
            r#"
            INSERT INTO user_profiles (
                user_id, user_type, account_type, company, address, tax_number, contract_codes,
                date_of_birth, id_number, id_issue_date, id_issue_location,
                rep_name, rep_phone, rep_email, ref_name, ref_phone, ref_email
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (user_id) DO UPDATE SET
                user_type = COALESCE(EXCLUDED.user_type, user_profiles.user_type),
                account_type = COALESCE(EXCLUDED.account_type, user_profiles.account_type),
                company = COALESCE(EXCLUDED.company, user_profiles.company),
                address = COALESCE(EXCLUDED.address, user_profiles.address),
                tax_number = COALESCE(EXCLUDED.tax_number, user_profiles.tax_number),
                contract_codes = COALESCE(EXCLUDED.contract_codes, user_profiles.contract_codes),
                date_of_birth = COALESCE(EXCLUDED.date_of_birth, user_profiles.date_of_birth),
                id_number = COALESCE(EXCLUDED.id_number, user_profiles.id_number),
                id_issue_date = COALESCE(EXCLUDED.id_issue_date, user_profiles.id_issue_date),
                id_issue_location = COALESCE(EXCLUDED.id_issue_location, user_profiles.id_issue_location),
                rep_name = COALESCE(EXCLUDED.rep_name, user_profiles.rep_name),
                rep_phone = COALESCE(EXCLUDED.rep_phone, user_profiles.rep_phone),
                rep_email = COALESCE(EXCLUDED.rep_email, user_profiles.rep_email),
                ref_name = COALESCE(EXCLUDED.ref_name, user_profiles.ref_name),
                ref_phone = COALESCE(EXCLUDED.ref_phone, user_profiles.ref_phone),
                ref_email = COALESCE(EXCLUDED.ref_email, user_profiles.ref_email),
                updated_on = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&request.user_type)
        .bind(&request.account_type)
        .bind(&request.company)
        .bind(&request.address)
        .bind(&request.tax_number)
        .bind(&request.contract_codes)
        .bind(request.date_of_birth)
        .bind(&request.id_number)
        .bind(request.id_issue_date)
        .bind(&request.id_issue_location)
        .bind(&request.rep_name)
        .bind(&request.rep_phone)
        .bind(&request.rep_email)
        .bind(&request.ref_name)
        .bind(&request.ref_phone)
        .bind(&request.ref_email)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(profile)
    }
}
