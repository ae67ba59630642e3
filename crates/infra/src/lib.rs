//! Infrastructure layer: storage adapters and the application services that
//! sit on top of them.

pub mod seed;
pub mod services;
pub mod store;

pub use services::{
    AccountService, BillingService, CatalogService, PermissionRef, PermissionService, ProfileUpdate, ServiceError,
    ServiceResult, SignUp, SignedIn, TransactionRequest, TransactionView, UserAssignment, UserService,
};
pub use store::{Repositories, StoreError, StoreResult};
