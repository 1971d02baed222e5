//! Sequential id ranges.
//!
//! Every human-readable id (`CUST-1042`, `JOB-57`, ...) comes out of a shared
//! counter keyed by entity-type prefix. A range defines the numeric window a
//! prefix may mint from; once `running_number` reaches `range_end` the range
//! is exhausted and allocation fails instead of wrapping or colliding.
//!
//! The increment itself lives in the backends so it can be atomic there: a
//! guarded single-statement `UPDATE` on SQLite, a server-side script on
//! Redis. A failed mint never consumes a number.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub id_type: String,
    pub prefix: String,
    pub range_start: u64,
    pub range_end: u64,
    pub running_number: u64,
}

impl NumberRange {
    pub fn new(id_type: &str, prefix: &str, range_start: u64, range_end: u64) -> Self {
        Self {
            id_type: id_type.to_owned(),
            prefix: prefix.to_owned(),
            range_start,
            range_end,
            running_number: range_start,
        }
    }
}

/// Render a minted counter value as a wire id.
pub fn format_id(prefix: &str, number: u64) -> String {
    format!("{prefix}-{number}")
}

/// Ranges registered on first boot. Vehicles are keyed by plate number and
/// mechanics supply their own ids, so neither gets a range.
pub fn default_ranges() -> Vec<NumberRange> {
    vec![
        NumberRange::new("Customer", "CUST", 1000, 9999),
        NumberRange::new("Appointment", "APMT", 0, 99999),
        NumberRange::new("Service", "SER", 0, 99999),
        NumberRange::new("Inventory", "INV", 0, 99999),
        NumberRange::new("JobCard", "JOB", 0, 99999),
        NumberRange::new("User", "USER", 0, 99999),
        NumberRange::new("Procurement", "PROC", 0, 99999),
        NumberRange::new("Supplier", "SUP", 0, 9999),
        NumberRange::new("Invoice", "INVC", 0, 99999),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_prefix_dash_number() {
        assert_eq!(format_id("CUST", 1042), "CUST-1042");
    }

    #[test]
    fn new_range_starts_at_range_start() {
        let range = NumberRange::new("Customer", "CUST", 1000, 9999);
        assert_eq!(range.running_number, 1000);
    }

    #[test]
    fn default_ranges_have_unique_prefixes() {
        let ranges = default_ranges();
        let mut prefixes: Vec<&str> = ranges.iter().map(|r| r.prefix.as_str()).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), ranges.len());
    }
}
