use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scholarship {
    pub id: u32,
    pub title: &'static str,
    pub deadline: &'static str,
    pub description: &'static str,
}

pub static SCHOLARSHIPS: [Scholarship; 3] = [
    Scholarship {
        id: 101,
        title: "Mayor Liza Scholarship",
        deadline: "2026-01-15",
        description: "For high-performing local students.",
    },
    Scholarship {
        id: 102,
        title: "Gov. Vilma Scholarship",
        deadline: "2026-02-10",
        description: "Financial assistance for qualified students.",
    },
    Scholarship {
        id: 103,
        title: "Athlete Scholarship",
        deadline: "2026-03-12",
        description: "Supports student athletes.",
    },
];

pub fn find_scholarship(id: u32) -> Option<&'static Scholarship> {
    SCHOLARSHIPS.iter().find(|s| s.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Approved,
    Rejected,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Approved => "Approved",
            Status::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub app_id: u32,
    /// Title at the time of applying, not a reference into the catalogue.
    pub scholarship: String,
    pub date: NaiveDate,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "type")]
    pub kind: String,
    pub type_label: String,
    pub file_name: String,
    pub status: Status,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSession {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birthdate: String,
    pub username: String,
}
