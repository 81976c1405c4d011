use async_trait::async_trait;
use std::io;

/// Platform storage permission requests for the full-access tier.
///
/// Outcomes are plain grants; telling the user what to do about a denial is
/// left to the caller.
#[async_trait]
pub trait PermissionBroker: Send + Sync {
    async fn request_storage(&self) -> io::Result<bool>;
}

/// Broker for hosts without a permission model; every request is granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantedPermissions;

#[async_trait]
impl PermissionBroker for GrantedPermissions {
    async fn request_storage(&self) -> io::Result<bool> {
        Ok(true)
    }
}
