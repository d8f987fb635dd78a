//! Asset directory access.
//!
//! CheckIO owns no business data: users, categories, hardware, and checkout
//! state all live in a Snipe-IT compatible asset-management API. This crate
//! provides:
//! - [`AssetDirectory`]: the operations CheckIO needs from that API
//! - [`SnipeItClient`]: the HTTP implementation
//! - Response types ([`User`], [`Category`], [`HardwarePage`], [`ActionOutcome`])

mod client;
mod types;

use checkio_shared::Result;
use serde_json::Value;

pub use client::SnipeItClient;
pub use types::{ActionOutcome, Category, HardwarePage, HardwareQuery, User};

/// Operations against the upstream asset directory.
///
/// Assets are handed around as raw JSON: their shape belongs to the upstream
/// and is only ever read through dotted paths.
pub trait AssetDirectory: Send + Sync {
    /// Cheap authenticated request that proves the credentials work.
    fn verify(&self) -> impl Future<Output = Result<()>> + Send;

    /// One page of hardware filtered by category.
    fn list_hardware_by_category(
        &self,
        query: &HardwareQuery,
    ) -> impl Future<Output = Result<HardwarePage>> + Send;

    fn get_categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send;

    /// Find a user by employee number. `Ok(None)` when nobody matches.
    fn get_user(&self, employee_number: &str) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Assets currently checked out to `user_id`.
    fn get_user_assets(&self, user_id: i64) -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// Find an asset by its tag. `Ok(None)` when no asset carries the tag.
    fn get_asset_by_tag(&self, tag: &str) -> impl Future<Output = Result<Option<Value>>> + Send;

    fn checkout(
        &self,
        asset_id: i64,
        user_id: i64,
        note: &str,
    ) -> impl Future<Output = Result<ActionOutcome>> + Send;

    fn checkin(&self, asset_id: i64, note: &str)
    -> impl Future<Output = Result<ActionOutcome>> + Send;
}
