// 🚪 Guest Visits - one row per checked-in guest

use serde::{Deserialize, Serialize};

use super::string_or_number;
use crate::search::Searchable;

/// A guest currently inside, as listed by `GET /api/guests/checked-in`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestVisit {
    #[serde(deserialize_with = "string_or_number")]
    pub transaction_id: String,
    pub guest_name: String,
    pub guest_cnic: String,
    #[serde(default)]
    pub host_name: String,
    #[serde(default)]
    pub host_cnic: String,
    #[serde(default)]
    pub check_in_time: String,
}

impl Searchable for GuestVisit {
    fn search_key(&self) -> String {
        format!(
            "{} {} {} {}",
            self.guest_name, self.host_name, self.guest_cnic, self.host_cnic
        )
    }
}

/// Body of `POST /api/guests/register`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestRegistration {
    pub first_name: String,
    pub last_name: String,
    pub cnic_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_transaction_id_becomes_string() {
        let visit: GuestVisit = serde_json::from_str(
            r#"{"transaction_id":981,"guest_name":"Bilal","guest_cnic":"6110112345679",
                "host_name":"Maj. Tariq","host_cnic":"3520212345671","check_in_time":"09:14"}"#,
        )
        .unwrap();

        assert_eq!(visit.transaction_id, "981");
    }

    #[test]
    fn test_search_key_covers_guest_host_and_cnic() {
        let visit = GuestVisit {
            transaction_id: "t-1".to_string(),
            guest_name: "Bilal".to_string(),
            guest_cnic: "6110112345679".to_string(),
            host_name: "Maj. Tariq".to_string(),
            host_cnic: "3520212345671".to_string(),
            check_in_time: String::new(),
        };

        let key = visit.search_key();
        assert!(key.contains("Bilal"));
        assert!(key.contains("Tariq"));
        assert!(key.contains("6110112345679"));
    }
}
