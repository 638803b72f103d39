use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{Lifecycle, Tracked};
use crate::{de, id::RecordId, query::Direction, records::Entity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    New,
    Processing,
    Completed,
    Rejected,
}

impl Lifecycle for ApplicationStatus {
    fn stage(self) -> u8 {
        match self {
            ApplicationStatus::New => 0,
            ApplicationStatus::Processing => 1,
            ApplicationStatus::Completed | ApplicationStatus::Rejected => 2,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Completed | ApplicationStatus::Rejected
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::Processing => "processing",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Inbound quote or call-back request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub phone: String,
    #[serde(default)]
    pub details: Option<String>,
    pub status: ApplicationStatus,
}

impl Entity for Application {
    const TABLE: &'static str = "applications";
    const ORDER_BY: (&'static str, Direction) = ("created_at", Direction::Descending);
}

impl Tracked for Application {
    type Status = ApplicationStatus;

    fn status(&self) -> ApplicationStatus {
        self.status
    }
}
