//! Build script for cadence-storage.
//!
//! Rebuild when database migrations change so `sqlx::migrate!` embeds them.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
