use serde::{Deserialize, Serialize};

use super::ids::Id;

/// A ministry area members can serve in (worship, ushers, kids...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Id<Service>,
    pub name: String,
}

impl Service {
    pub fn create(name: String) -> Self {
        Self {
            id: Id::generate(),
            name,
        }
    }
}
