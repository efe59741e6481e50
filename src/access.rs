//! Access roles
//!
//! Admins see every center's rows. A center user only ever sees rows of their
//! own lead vendor; the scope is applied by the query layer, not by callers.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::CenterDirectory;

/// Path center users are confined to.
pub const CENTER_HOME_PATH: &str = "/daily-deal-flow";
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AccessRole {
    #[default]
    Unknown,
    Admin,
    Center { lead_vendor: String },
}

impl AccessRole {
    pub fn scope(&self) -> AccessScope {
        match self {
            AccessRole::Center { lead_vendor } => AccessScope::LeadVendor(lead_vendor.clone()),
            AccessRole::Admin | AccessRole::Unknown => AccessScope::Unrestricted,
        }
    }

    pub fn lead_vendor(&self) -> Option<&str> {
        match self {
            AccessRole::Center { lead_vendor } => Some(lead_vendor),
            _ => None,
        }
    }
}

/// Row filter a role imposes on every deal flow query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    Unrestricted,
    LeadVendor(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// Where a navigation to `path` should end up.
pub fn route_guard(path: &str, has_session: bool, role: &AccessRole) -> RouteDecision {
    if path == LOGIN_PATH || !has_session {
        return RouteDecision::Allow;
    }

    match role {
        AccessRole::Center { .. } if path != CENTER_HOME_PATH => RouteDecision::Redirect(CENTER_HOME_PATH),
        _ => RouteDecision::Allow,
    }
}

#[derive(Debug, Default)]
struct AccessState {
    role: AccessRole,
    loading: bool,
}

/// Resolves and caches the signed-in user's role
pub struct AccessRoleResolver {
    directory: Arc<dyn CenterDirectory>,
    state: RwLock<AccessState>,
}

impl AccessRoleResolver {
    pub fn new(directory: Arc<dyn CenterDirectory>) -> Self {
        Self {
            directory,
            state: RwLock::new(AccessState::default()),
        }
    }

    pub async fn role(&self) -> AccessRole {
        self.state.read().await.role.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn reset(&self) {
        *self.state.write().await = AccessState::default();
    }

    /// Cached role, refreshed first if it is still unknown.
    pub async fn ensure_resolved(&self) -> AccessRole {
        let current = self.role().await;
        if current != AccessRole::Unknown || self.is_loading().await {
            return current;
        }
        self.refresh().await
    }

    /// Look the role up again.
    ///
    /// A failed center lookup resolves to admin so navigation is never
    /// blocked; a missing session resets to unknown.
    pub async fn refresh(&self) -> AccessRole {
        self.state.write().await.loading = true;

        let role = match self.directory.current_user_id().await {
            Ok(Some(user_id)) => match self.directory.lead_vendor_for_user(&user_id).await {
                Ok(Some(lead_vendor)) if !lead_vendor.is_empty() => {
                    info!("🔐 User {} resolved as center user for {}", user_id, lead_vendor);
                    AccessRole::Center { lead_vendor }
                }
                Ok(_) => {
                    debug!("User {} has no center, treating as admin", user_id);
                    AccessRole::Admin
                }
                Err(e) => {
                    warn!("Center lookup failed for {}, treating as admin: {}", user_id, e);
                    AccessRole::Admin
                }
            },
            Ok(None) => {
                debug!("No signed-in user, access role reset");
                AccessRole::Unknown
            }
            Err(e) => {
                warn!("Could not load the signed-in user: {}", e);
                AccessRole::Unknown
            }
        };

        let mut state = self.state.write().await;
        state.role = role.clone();
        state.loading = false;
        role
    }
}
