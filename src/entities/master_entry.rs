// 👥 Master Entries - a group admitted together under one description

use serde::{Deserialize, Serialize};

use super::number_or_string;
use crate::search::Searchable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterEntry {
    #[serde(deserialize_with = "number_or_string")]
    pub id: i64,
    pub description: String,
    #[serde(deserialize_with = "number_or_string")]
    pub people_count: i64,
    #[serde(default)]
    pub check_in_time: String,
}

impl Searchable for MasterEntry {
    fn search_key(&self) -> String {
        format!("{} {}", self.description, self.people_count)
    }
}

/// Body of `POST /api/master-entries`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMasterEntry {
    pub description: String,
    pub people_count: u32,
}
