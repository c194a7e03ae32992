use crate::admin::AdminUserService;
use crate::auth::AuthService;
use crate::batch::{BatchService, BatchUpload};
use crate::config::ClientConfig;
use crate::http::{ApiClient, MemoryNavigator, Navigator};
use crate::products::{ProductListing, ProductService};
use crate::session::{FileSessionStore, MemorySessionStore, SessionContext, SessionStore};
use crate::suppliers::SupplierService;
use std::sync::Arc;

/// Everything a front-end needs, wired once per process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClientConfig>,
    pub session: SessionContext,
    pub api: ApiClient,
    pub navigator: Arc<dyn Navigator>,
}

impl AppState {
    /// File-backed session, in-memory navigator.
    pub async fn init(config: ClientConfig) -> anyhow::Result<Self> {
        let store = Arc::new(FileSessionStore::new(config.session_file.clone())) as Arc<dyn SessionStore>;
        let navigator = Arc::new(MemoryNavigator::default()) as Arc<dyn Navigator>;
        Ok(Self::from_parts(Arc::new(config), store, navigator).await?)
    }

    pub async fn from_parts(
        config: Arc<ClientConfig>,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, crate::error::ApiError> {
        let session = SessionContext::load(store).await?;
        let api = ApiClient::new(&config, session.clone(), Arc::clone(&navigator))?;
        Ok(Self {
            config,
            session,
            api,
            navigator,
        })
    }

    /// Memory-backed state pointed at `base_url`; used by tests.
    pub async fn in_memory(base_url: &str) -> Result<Self, crate::error::ApiError> {
        let config = Arc::new(ClientConfig::for_base_url(base_url));
        let store = Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>;
        let navigator = Arc::new(MemoryNavigator::default()) as Arc<dyn Navigator>;
        Self::from_parts(config, store, navigator).await
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self.api.clone())
    }

    pub fn product_listing(&self) -> ProductListing {
        ProductListing::new(self.products())
    }

    pub fn batch(&self) -> BatchService {
        BatchService::new(self.api.clone(), self.config.batch.max_upload_bytes)
    }

    pub fn batch_upload(&self) -> BatchUpload<BatchService> {
        BatchUpload::new(
            Arc::new(self.batch()),
            self.config.batch.poll_interval,
            self.config.batch.max_upload_bytes,
        )
    }

    pub fn suppliers(&self) -> SupplierService {
        SupplierService::new(self.api.clone())
    }

    pub fn admin_users(&self) -> AdminUserService {
        AdminUserService::new(self.api.clone())
    }
}
