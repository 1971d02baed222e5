use serde::{Deserialize, Serialize};

use super::Contact;

/// Mechanic ids are supplied by the caller; there is no minted prefix for
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanic {
    pub mechanic_id: String,
    pub mechanic_name: String,
    pub contact: Contact,
    #[serde(default)]
    pub specialties: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MechanicPatch {
    pub mechanic_name: Option<String>,
    pub contact: Option<Contact>,
    pub specialties: Option<Vec<String>>,
}
