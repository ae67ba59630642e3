use std::sync::Arc;

use minibill_auth::{Argon2Verifier, CredentialVerifier, TokenService};
use minibill_infra::{
    AccountService, BillingService, CatalogService, PermissionService, Repositories, ServiceResult, UserService,
    seed,
};

use crate::config::AppConfig;

/// Application services shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub accounts: AccountService,
    pub users: UserService,
    pub permissions: PermissionService,
    pub catalog: CatalogService,
    pub billing: BillingService,
}

/// Wire the in-memory store, seed it and build the services.
pub fn build_services(config: &AppConfig, tokens: Arc<TokenService>) -> ServiceResult<AppServices> {
    let repos = Repositories::in_memory();
    let credentials: Arc<dyn CredentialVerifier> = Arc::new(Argon2Verifier);

    seed::seed_default_permissions(&repos)?;
    if let Some(password) = config.admin_password.as_deref() {
        seed::seed_admin(&repos, credentials.as_ref(), password)?;
    }

    Ok(AppServices {
        accounts: AccountService::new(repos.clone(), credentials.clone(), tokens),
        users: UserService::new(repos.clone(), credentials),
        permissions: PermissionService::new(repos.clone()),
        catalog: CatalogService::new(repos.clone()),
        billing: BillingService::new(repos, config.billing),
    })
}
