//! Entity row definitions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityRecord, RecordId};

/// Employer company placing job orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: RecordId,
    pub company_name: String,
    #[serde(default)]
    pub focal_person_name: Option<String>,
    /// Licence or transaction reference issued for the client.
    #[serde(default)]
    pub lt_number: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl EntityRecord for Client {
    const TABLE: &'static str = "clients";
    const DEFAULT_PAGE_SIZE: u32 = 15;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.company_name.as_str()];
        fields.extend(self.focal_person_name.as_deref());
        fields
    }
}

/// Applicant tracked through lineups and deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: RecordId,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub passport_no: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl EntityRecord for Candidate {
    const TABLE: &'static str = "candidates";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.given_name.as_str(), self.family_name.as_str()];
        fields.extend(self.passport_no.as_deref());
        fields.extend(self.national_id.as_deref());
        fields
    }
}

/// Client columns joined onto a job row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobClient {
    pub company_name: String,
    #[serde(default)]
    pub lt_number: Option<String>,
}

/// Open position raised by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: RecordId,
    pub job_title: String,
    #[serde(default)]
    pub client_id: Option<RecordId>,
    /// Joined client; absent on raw feed payloads.
    #[serde(default, rename = "clients")]
    pub client: Option<JobClient>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl EntityRecord for Job {
    const TABLE: &'static str = "jobs";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.job_title.as_str()]
    }
}

/// Display name of the staff member who registered a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffName {
    pub full_name: String,
}

/// Walk-in visitor logged at the front desk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: RecordId,
    pub full_name: String,
    #[serde(default)]
    pub purpose_of_visit: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub visit_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub converted_to_candidate_id: Option<RecordId>,
    /// Joined registering staff member.
    #[serde(default, rename = "profiles")]
    pub registered_by: Option<StaffName>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl EntityRecord for Visitor {
    const TABLE: &'static str = "visitors";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.full_name.as_str()];
        fields.extend(self.phone_number.as_deref());
        fields
    }
}

/// Person or agency referring candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Referrer {
    pub id: RecordId,
    pub full_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl EntityRecord for Referrer {
    const TABLE: &'static str = "referrers";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.full_name.as_str()];
        fields.extend(self.phone_number.as_deref());
        fields.extend(self.email.as_deref());
        fields
    }
}

/// Role column joined from `user_roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRole {
    pub role_name: String,
}

/// Back-office user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: RecordId,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "user_roles")]
    pub role: Option<StaffRole>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl StaffMember {
    /// Raw role name, suitable for [`crate::domain::PermissionContext::from_profile_role`].
    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|role| role.role_name.as_str())
    }
}

impl EntityRecord for StaffMember {
    const TABLE: &'static str = "profiles";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.full_name.as_str()];
        fields.extend(self.email.as_deref());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn raw_job_payload_has_no_joined_client() {
        let job: Job = serde_json::from_value(json!({
            "id": 3,
            "job_title": "Welder",
            "client_id": "c-1",
        }))
        .expect("raw job decodes");
        assert_eq!(job.client, None);
        assert_eq!(job.client_id, Some(RecordId::new("c-1").expect("id")));
    }

    #[rstest]
    fn joined_job_payload_carries_client_columns() {
        let job: Job = serde_json::from_value(json!({
            "id": 3,
            "job_title": "Welder",
            "clients": { "company_name": "Acme", "lt_number": "LT-9" },
        }))
        .expect("joined job decodes");
        let client = job.client.expect("client joined");
        assert_eq!(client.company_name, "Acme");
        assert_eq!(client.lt_number.as_deref(), Some("LT-9"));
    }

    #[rstest]
    fn staff_member_exposes_joined_role_name() {
        let member: StaffMember = serde_json::from_value(json!({
            "id": "u-1",
            "full_name": "Ana Cruz",
            "user_roles": { "role_name": "admin" },
        }))
        .expect("staff decodes");
        assert_eq!(member.role_name(), Some("admin"));
    }

    #[rstest]
    #[case("acme", true)]
    #[case("  MARIA ", true)]
    #[case("", true)]
    #[case("globex", false)]
    fn client_search_covers_company_and_focal_person(#[case] needle: &str, #[case] hit: bool) {
        let client = Client {
            id: RecordId::from(1),
            company_name: "Acme Manpower".into(),
            focal_person_name: Some("Maria Santos".into()),
            lt_number: None,
            country: None,
            created_at: None,
        };
        assert_eq!(client.matches_search(needle), hit);
    }

    #[rstest]
    fn candidate_search_covers_passport() {
        let candidate = Candidate {
            id: RecordId::from(1),
            given_name: "Jose".into(),
            family_name: "Rizal".into(),
            passport_no: Some("P1234567".into()),
            national_id: None,
            mobile_number: Some("0917".into()),
            created_at: None,
        };
        assert!(candidate.matches_search("p123"));
        assert!(!candidate.matches_search("0917"));
    }

    #[rstest]
    fn page_sizes_follow_entity_defaults() {
        assert_eq!(Client::DEFAULT_PAGE_SIZE, 15);
        assert_eq!(Candidate::DEFAULT_PAGE_SIZE, 20);
        assert_eq!(Job::DEFAULT_PAGE_SIZE, 20);
        assert_eq!(StaffMember::TABLE, "profiles");
    }
}
