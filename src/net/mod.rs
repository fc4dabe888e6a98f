//! Address math for fixture networks.

pub mod ip_range;

pub use ip_range::generate_ips;
