use serde::{Deserialize, Serialize};

/// A university as the service describes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: u64,
    pub name: String,
    pub city: String,
    pub state: String,
}
