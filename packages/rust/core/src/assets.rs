//! Employee lookup, checkout/checkin by asset tag, and featured-category administration.
//!
//! Checkout and checkin are two upstream calls (find the asset by tag, then
//! act on its id) with nothing tying them together; the asset can change
//! in between.

use checkio_directory::{ActionOutcome, AssetDirectory, Category, User};
use checkio_shared::{
    AssignmentMode, CategoryId, CheckIoError, DisplayPropertySpec, FeaturedCategoryConfig,
    ProjectedAsset, Result, Session,
};
use checkio_storage::CategoryConfigStore;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::path::{display_at, resolve};
use crate::projection::{asset_id, column_headers, project_asset};

// ---------------------------------------------------------------------------
// Employee lookup
// ---------------------------------------------------------------------------

/// A user and the assets checked out to them.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeAssets {
    pub user: User,
    pub columns: Vec<String>,
    pub rows: Vec<ProjectedAsset>,
    pub skipped_without_id: usize,
}

/// Find the user with `employee_number` and project their assets.
#[instrument(skip_all, fields(employee_number = %employee_number))]
pub async fn lookup_employee<D: AssetDirectory>(
    directory: &D,
    employee_number: &str,
    display: &[DisplayPropertySpec],
) -> Result<EmployeeAssets> {
    let employee_number = employee_number.trim();
    if employee_number.is_empty() {
        return Err(CheckIoError::validation("employee number is required"));
    }

    let user = directory
        .get_user(employee_number)
        .await?
        .ok_or_else(|| CheckIoError::NotFound(format!("no user with employee number {employee_number}")))?;

    let records = directory.get_user_assets(user.id).await?;
    let rows: Vec<ProjectedAsset> = records
        .iter()
        .filter_map(|record| project_asset(record, display))
        .collect();
    let skipped_without_id = records.len() - rows.len();

    info!(user_id = user.id, assets = rows.len(), "employee assets loaded");
    Ok(EmployeeAssets {
        user,
        columns: column_headers(display),
        rows,
        skipped_without_id,
    })
}

// ---------------------------------------------------------------------------
// Checkout / checkin
// ---------------------------------------------------------------------------

/// Inputs for [`checkout_by_tag`].
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub asset_tag: String,
    pub employee_number: String,
    pub note: String,
    /// Category picked by the operator; only meaningful in `select` mode.
    pub category: Option<CategoryId>,
}

/// What happened to an asset after a checkout or checkin.
#[derive(Debug, Clone)]
pub struct ActionReceipt {
    pub asset_id: i64,
    pub asset_tag: String,
    pub asset_name: String,
    pub user: Option<User>,
    pub outcome: ActionOutcome,
}

/// Check an asset out to an employee, honoring the assignment mode.
///
/// Mode violations and unknown tags or employees fail before any write is sent.
/// An upstream refusal comes back in the receipt's outcome.
#[instrument(skip_all, fields(asset_tag = %request.asset_tag, employee_number = %request.employee_number))]
pub async fn checkout_by_tag<S, D>(
    directory: &D,
    store: &S,
    request: &CheckoutRequest,
) -> Result<ActionReceipt>
where
    S: CategoryConfigStore,
    D: AssetDirectory,
{
    let (asset, id, tag) = find_asset(directory, &request.asset_tag).await?;

    let config = store.load().await?;
    enforce_assignment_mode(&config, &asset, request.category)?;

    let employee_number = request.employee_number.trim();
    if employee_number.is_empty() {
        return Err(CheckIoError::validation("employee number is required"));
    }
    let user = directory
        .get_user(employee_number)
        .await?
        .ok_or_else(|| CheckIoError::NotFound(format!("no user with employee number {employee_number}")))?;

    let outcome = directory.checkout(id, user.id, &request.note).await?;
    if outcome.is_success() {
        info!(asset_id = id, user_id = user.id, "asset checked out");
    } else {
        warn!(asset_id = id, user_id = user.id, message = %outcome.message, "checkout refused");
    }

    Ok(ActionReceipt {
        asset_id: id,
        asset_tag: tag,
        asset_name: display_at(&asset, "name"),
        user: Some(user),
        outcome,
    })
}

/// Check an asset back in by tag.
#[instrument(skip_all, fields(asset_tag = %asset_tag))]
pub async fn checkin_by_tag<D: AssetDirectory>(
    directory: &D,
    asset_tag: &str,
    note: &str,
) -> Result<ActionReceipt> {
    let (asset, id, tag) = find_asset(directory, asset_tag).await?;

    let outcome = directory.checkin(id, note).await?;
    if outcome.is_success() {
        info!(asset_id = id, "asset checked in");
    } else {
        warn!(asset_id = id, message = %outcome.message, "checkin refused");
    }

    Ok(ActionReceipt {
        asset_id: id,
        asset_tag: tag,
        asset_name: display_at(&asset, "name"),
        user: None,
        outcome,
    })
}

/// Look an asset up by tag; returns the record, its id, and its tag as stored upstream.
async fn find_asset<D: AssetDirectory>(directory: &D, asset_tag: &str) -> Result<(Value, i64, String)> {
    let asset_tag = asset_tag.trim();
    if asset_tag.is_empty() {
        return Err(CheckIoError::validation("asset tag is required"));
    }

    let asset = directory
        .get_asset_by_tag(asset_tag)
        .await?
        .ok_or_else(|| CheckIoError::NotFound(format!("no asset with tag {asset_tag}")))?;
    let id = asset_id(&asset).ok_or_else(|| {
        CheckIoError::upstream(200, format!("asset {asset_tag} came back without an id"))
    })?;

    let stored_tag = match display_at(&asset, "asset_tag") {
        t if t.is_empty() => asset_tag.to_string(),
        t => t,
    };
    Ok((asset, id, stored_tag))
}

/// Check that `asset` may be assigned under `config`.
///
/// - `fixed`: the asset's category must be one of the featured categories.
/// - `select`: if the operator picked a category, the asset must belong to it.
pub fn enforce_assignment_mode(
    config: &FeaturedCategoryConfig,
    asset: &Value,
    chosen: Option<CategoryId>,
) -> Result<()> {
    let asset_category = resolve(asset, "category.id")
        .and_then(Value::as_i64)
        .map(CategoryId);

    match config.mode {
        AssignmentMode::Fixed => match asset_category {
            Some(category) if config.allows(category) => Ok(()),
            Some(category) => Err(CheckIoError::validation(format!(
                "category {category} is not one of the allowed categories ({})",
                join_ids(&config.allowed_category_ids)
            ))),
            None => Err(CheckIoError::validation(
                "asset has no category; fixed assignment mode requires one of the allowed categories",
            )),
        },
        AssignmentMode::Select => match (chosen, asset_category) {
            (None, _) => Ok(()),
            (Some(picked), Some(actual)) if picked == actual => Ok(()),
            (Some(picked), Some(actual)) => Err(CheckIoError::validation(format!(
                "asset belongs to category {actual}, not the selected category {picked}"
            ))),
            (Some(picked), None) => Err(CheckIoError::validation(format!(
                "asset has no category, cannot assign it under category {picked}"
            ))),
        },
    }
}

fn join_ids(ids: &[CategoryId]) -> String {
    if ids.is_empty() {
        return "none".into();
    }
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Categories and featured configuration
// ---------------------------------------------------------------------------

/// An upstream category and whether it is featured.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRow {
    pub category: Category,
    pub featured: bool,
}

/// List upstream categories, flagging the featured ones.
pub async fn category_overview<S, D>(directory: &D, store: &S) -> Result<Vec<CategoryRow>>
where
    S: CategoryConfigStore,
    D: AssetDirectory,
{
    let config = store.load().await?;
    let categories = directory.get_categories().await?;

    let known: Vec<CategoryId> = categories.iter().map(|c| c.id).collect();
    for id in config.distinct_category_ids() {
        if !known.contains(&id) {
            warn!(category_id = %id, "featured category does not exist upstream");
        }
    }

    Ok(categories
        .into_iter()
        .map(|category| CategoryRow {
            featured: config.allows(category.id),
            category,
        })
        .collect())
}

/// Replace the featured configuration. Admin only.
#[instrument(skip_all, fields(mode = %config.mode, categories = config.allowed_category_ids.len()))]
pub async fn configure_featured_categories<S: CategoryConfigStore>(
    store: &S,
    session: &Session,
    config: FeaturedCategoryConfig,
) -> Result<FeaturedCategoryConfig> {
    session.require_admin()?;

    if config.mode == AssignmentMode::Fixed && config.allowed_category_ids.is_empty() {
        warn!("fixed mode with no allowed categories blocks every checkout");
    }

    store.save(&config).await?;
    info!("featured category configuration updated");
    store.load().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDirectory, temp_storage, user};
    use serde_json::json;

    fn admin() -> Session {
        Session {
            authenticated: true,
            is_admin: true,
        }
    }

    fn laptop() -> Value {
        json!({
            "id": 30,
            "asset_tag": "LAP-30",
            "name": "Grace's laptop",
            "category": {"id": 2, "name": "Laptops"}
        })
    }

    fn directory() -> FakeDirectory {
        let mut directory = FakeDirectory::default();
        directory.users.push(user(9, "Grace Hopper", "1007"));
        directory.assets_by_tag.insert("LAP-30".into(), laptop());
        directory.user_assets.insert(
            9,
            vec![
                json!({"id": 30, "serial": "SN30", "category": {"name": "Laptops"},
                       "assigned_to": {"name": "Grace Hopper", "type": "user"}}),
                json!({"serial": "orphan"}),
            ],
        );
        directory
    }

    #[tokio::test]
    async fn employee_lookup_projects_assets() {
        let directory = directory();
        let display = vec![DisplayPropertySpec::new("Serial", "serial")];

        let found = lookup_employee(&directory, " 1007 ", &display).await.expect("lookup");
        assert_eq!(found.user.id, 9);
        assert_eq!(found.columns, vec!["Assigned To", "Category", "Serial"]);
        assert_eq!(found.rows.len(), 1);
        assert_eq!(found.rows[0].properties[0].value, "SN30");
        assert_eq!(found.skipped_without_id, 1);
    }

    #[tokio::test]
    async fn unknown_employee_is_not_found() {
        let directory = directory();
        let err = lookup_employee(&directory, "4040", &[]).await.unwrap_err();
        assert!(matches!(err, CheckIoError::NotFound(_)));

        let err = lookup_employee(&directory, "  ", &[]).await.unwrap_err();
        assert!(matches!(err, CheckIoError::Validation { .. }));
    }

    #[tokio::test]
    async fn checkout_in_select_mode() {
        let directory = directory();
        let storage = temp_storage().await;
        let request = CheckoutRequest {
            asset_tag: "LAP-30".into(),
            employee_number: "1007".into(),
            note: "new hire".into(),
            category: None,
        };

        let receipt = checkout_by_tag(&directory, &storage, &request).await.expect("checkout");
        assert!(receipt.outcome.is_success());
        assert_eq!(receipt.asset_id, 30);
        assert_eq!(receipt.asset_tag, "LAP-30");
        assert_eq!(receipt.user.as_ref().map(|u| u.id), Some(9));
        assert_eq!(directory.calls(), vec!["bytag:LAP-30", "user:1007", "checkout:30:9"]);
    }

    #[tokio::test]
    async fn fixed_mode_blocks_other_categories_before_writing() {
        let directory = directory();
        let storage = temp_storage().await;
        storage
            .save(&FeaturedCategoryConfig {
                mode: AssignmentMode::Fixed,
                allowed_category_ids: vec![CategoryId(5)],
            })
            .await
            .unwrap();
        let request = CheckoutRequest {
            asset_tag: "LAP-30".into(),
            employee_number: "1007".into(),
            ..Default::default()
        };

        let err = checkout_by_tag(&directory, &storage, &request).await.unwrap_err();
        assert!(err.to_string().contains("not one of the allowed categories (5)"));
        assert!(!directory.calls().iter().any(|c| c.starts_with("checkout")));
    }

    #[tokio::test]
    async fn checkout_refusal_is_reported_in_receipt() {
        let mut directory = directory();
        directory.action_response = Some(json!({
            "status": "error",
            "messages": "That asset is not available for checkout!"
        }));
        let storage = temp_storage().await;
        let request = CheckoutRequest {
            asset_tag: "LAP-30".into(),
            employee_number: "1007".into(),
            ..Default::default()
        };

        let receipt = checkout_by_tag(&directory, &storage, &request).await.expect("receipt");
        assert!(!receipt.outcome.is_success());
        assert!(receipt.outcome.message.contains("not available"));
    }

    #[tokio::test]
    async fn unknown_tag_is_not_found() {
        let directory = directory();
        let err = checkin_by_tag(&directory, "MISSING", "").await.unwrap_err();
        assert!(matches!(err, CheckIoError::NotFound(_)));

        let receipt = checkin_by_tag(&directory, "LAP-30", "returned").await.expect("checkin");
        assert_eq!(receipt.asset_id, 30);
        assert!(receipt.user.is_none());
    }

    #[test]
    fn assignment_mode_rules() {
        let asset = laptop();
        let fixed = FeaturedCategoryConfig {
            mode: AssignmentMode::Fixed,
            allowed_category_ids: vec![CategoryId(2), CategoryId(3)],
        };
        assert!(enforce_assignment_mode(&fixed, &asset, None).is_ok());
        assert!(enforce_assignment_mode(&fixed, &json!({"id": 1}), None).is_err());

        let select = FeaturedCategoryConfig::default();
        assert!(enforce_assignment_mode(&select, &asset, None).is_ok());
        assert!(enforce_assignment_mode(&select, &asset, Some(CategoryId(2))).is_ok());
        let err = enforce_assignment_mode(&select, &asset, Some(CategoryId(7))).unwrap_err();
        assert!(err.to_string().contains("not the selected category 7"));
    }

    #[tokio::test]
    async fn category_overview_flags_featured() {
        let mut directory = directory();
        directory.categories = vec![
            Category { id: CategoryId(2), name: "Laptops".into(), category_type: Some("asset".into()) },
            Category { id: CategoryId(3), name: "Monitors".into(), category_type: Some("asset".into()) },
        ];
        let storage = temp_storage().await;
        storage
            .save(&FeaturedCategoryConfig {
                mode: AssignmentMode::Select,
                allowed_category_ids: vec![CategoryId(3), CategoryId(99)],
            })
            .await
            .unwrap();

        let rows = category_overview(&directory, &storage).await.expect("overview");
        let flags: Vec<(i64, bool)> = rows.iter().map(|r| (r.category.id.0, r.featured)).collect();
        assert_eq!(flags, vec![(2, false), (3, true)]);
    }

    #[tokio::test]
    async fn configuring_requires_admin() {
        let storage = temp_storage().await;
        let wanted = FeaturedCategoryConfig {
            mode: AssignmentMode::Fixed,
            allowed_category_ids: vec![CategoryId(4)],
        };

        let staff = Session {
            authenticated: true,
            is_admin: false,
        };
        let err = configure_featured_categories(&storage, &staff, wanted.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckIoError::PermissionDenied(_)));
        assert_eq!(storage.load().await.unwrap(), FeaturedCategoryConfig::default());

        let saved = configure_featured_categories(&storage, &admin(), wanted.clone())
            .await
            .expect("configure");
        assert_eq!(saved, wanted);
    }
}
