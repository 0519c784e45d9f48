//! Local store port - durable named slots

use crate::domain::result::Result;

/// Slot holding the serialized account collection
pub const ACCOUNTS_SLOT: &str = "accounts";

/// Slot holding the serialized transaction collection
pub const TRANSACTIONS_SLOT: &str = "transactions";

/// Durable key-value persistence for serialized collections
///
/// Values are opaque JSON text. A missing slot reads as `None`.
pub trait SlotStore: Send + Sync {
    /// Read a slot's value
    fn read_slot(&self, key: &str) -> Result<Option<String>>;

    /// Write several slots atomically
    fn write_slots(&self, slots: &[(&str, String)]) -> Result<()>;

    /// Remove every slot
    fn clear(&self) -> Result<()>;
}
