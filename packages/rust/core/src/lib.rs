//! Core domain logic for CheckIO.
//!
//! This crate ties the featured category store and the asset directory
//! together into the operations the front-end exposes:
//! - [`aggregate`]: the featured asset listing across the configured categories
//! - [`assets`]: employee lookup, checkout/checkin by tag, category administration
//! - [`path`]: dotted-path lookup into upstream records
//! - [`projection`]: flattening records into display rows

pub mod aggregate;
pub mod assets;
pub mod path;
pub mod projection;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{
    AggregationPipeline, AggregationProgress, CategoryWarning, FeaturedAssetList, ListNotice,
    SilentProgress,
};
pub use assets::{
    ActionReceipt, CategoryRow, CheckoutRequest, EmployeeAssets, category_overview,
    checkin_by_tag, checkout_by_tag, configure_featured_categories, enforce_assignment_mode,
    lookup_employee,
};
