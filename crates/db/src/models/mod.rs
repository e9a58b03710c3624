//! Row structs for the Floodwatch tables.
//!
//! Each submodule holds a `FromRow` + `Serialize` entity matching the table
//! and, where a feed writes to it, a `Deserialize` create DTO.

pub mod location;
pub mod reading;
pub mod system_setting;
