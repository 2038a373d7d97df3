// 🛂 Operators - gate staff accounts

use serde::{Deserialize, Serialize};

use super::number_or_string;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    #[serde(deserialize_with = "number_or_string")]
    pub id: i64,
    pub name: String,
    pub cnic: String,
}

/// Form body of `POST /dashboard/operator/update/:id` (urlencoded)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorUpdate {
    pub name: String,
    pub cnic: String,
}

/// Body of `POST /dashboard/operator/delete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorDeletion {
    #[serde(rename = "selectedIds")]
    pub selected_ids: Vec<i64>,
}
