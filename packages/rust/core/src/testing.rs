//! In-process stand-ins for the asset directory and the config store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use checkio_directory::{ActionOutcome, AssetDirectory, Category, HardwarePage, HardwareQuery, User};
use checkio_shared::{CategoryId, CheckIoError, FeaturedCategoryConfig, Result};
use checkio_storage::{CategoryConfigStore, Storage};
use serde_json::Value;
use uuid::Uuid;

pub(crate) async fn temp_storage() -> Storage {
    let path: PathBuf = std::env::temp_dir().join(format!("checkio_core_test_{}.db", Uuid::now_v7()));
    Storage::open(&path).await.expect("open test db")
}

/// Canned upstream. Categories without an entry answer with an empty page.
#[derive(Default)]
pub(crate) struct FakeDirectory {
    pub hardware: HashMap<CategoryId, std::result::Result<Vec<Value>, String>>,
    pub users: Vec<User>,
    pub user_assets: HashMap<i64, Vec<Value>>,
    pub assets_by_tag: HashMap<String, Value>,
    pub categories: Vec<Category>,
    /// Envelope returned by checkout/checkin; success when unset.
    pub action_response: Option<Value>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn with_hardware(mut self, category: i64, rows: Vec<Value>) -> Self {
        self.hardware.insert(CategoryId(category), Ok(rows));
        self
    }

    pub fn with_failure(mut self, category: i64, message: &str) -> Self {
        self.hardware.insert(CategoryId(category), Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn action_outcome(&self) -> ActionOutcome {
        let body = self.action_response.clone().unwrap_or_else(|| {
            serde_json::json!({"status": "success", "messages": "ok", "payload": null})
        });
        ActionOutcome {
            status: body["status"].as_str().unwrap_or("error").to_string(),
            message: body["messages"].as_str().unwrap_or_default().to_string(),
            payload: None,
        }
    }
}

impl AssetDirectory for FakeDirectory {
    async fn verify(&self) -> Result<()> {
        self.record("verify".into());
        Ok(())
    }

    async fn list_hardware_by_category(&self, query: &HardwareQuery) -> Result<HardwarePage> {
        self.record(format!("hardware:{}", query.category_id));
        match self.hardware.get(&query.category_id) {
            Some(Ok(rows)) => Ok(HardwarePage {
                total: rows.len() as u64,
                rows: rows.clone(),
            }),
            Some(Err(message)) => Err(CheckIoError::Network(message.clone())),
            None => Ok(HardwarePage::default()),
        }
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        self.record("categories".into());
        Ok(self.categories.clone())
    }

    async fn get_user(&self, employee_number: &str) -> Result<Option<User>> {
        self.record(format!("user:{employee_number}"));
        Ok(self
            .users
            .iter()
            .find(|u| u.employee_num.as_deref() == Some(employee_number))
            .cloned())
    }

    async fn get_user_assets(&self, user_id: i64) -> Result<Vec<Value>> {
        self.record(format!("user_assets:{user_id}"));
        Ok(self.user_assets.get(&user_id).cloned().unwrap_or_default())
    }

    async fn get_asset_by_tag(&self, tag: &str) -> Result<Option<Value>> {
        self.record(format!("bytag:{tag}"));
        Ok(self.assets_by_tag.get(tag).cloned())
    }

    async fn checkout(&self, asset_id: i64, user_id: i64, _note: &str) -> Result<ActionOutcome> {
        self.record(format!("checkout:{asset_id}:{user_id}"));
        Ok(self.action_outcome())
    }

    async fn checkin(&self, asset_id: i64, _note: &str) -> Result<ActionOutcome> {
        self.record(format!("checkin:{asset_id}"));
        Ok(self.action_outcome())
    }
}

/// A store whose backing storage is always unavailable.
pub(crate) struct BrokenStore;

impl CategoryConfigStore for BrokenStore {
    async fn load(&self) -> Result<FeaturedCategoryConfig> {
        Err(CheckIoError::Storage("disk I/O error".into()))
    }

    async fn save(&self, _config: &FeaturedCategoryConfig) -> Result<()> {
        Err(CheckIoError::Storage("disk I/O error".into()))
    }
}

pub(crate) fn user(id: i64, name: &str, employee_num: &str) -> User {
    User {
        id,
        name: name.into(),
        username: None,
        employee_num: Some(employee_num.into()),
        email: None,
    }
}
