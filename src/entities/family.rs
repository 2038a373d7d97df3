// 👪 Family Members - registered under an existing host person

use serde::{Deserialize, Serialize};

/// Body of `POST /api/add-family-member`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub host_person_id: i64,
    pub name: String,
    pub cnic: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub emergency_contact: String,
    pub relation: String,
}
