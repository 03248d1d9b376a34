// Record trait for anything kept in a blob collection

use serde::{Serialize, de::DeserializeOwned};

/// Core trait that any storable record must implement
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Unique identifier for this record
    fn id(&self) -> &str;

    /// Storage key the whole collection of this record type is written under
    fn storage_key() -> &'static str
    where
        Self: Sized;
}
