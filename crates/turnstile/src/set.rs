//! Name-keyed permission registries.
//!
//! A [`PermissionSet`] collects permissions under their names so callers
//! can address them as data (from route tables, config, or an admin UI)
//! instead of holding typed handles. Binding a set to a context yields a
//! [`BoundSet`] whose verbs take the permission *name*; lookups that miss
//! fail with [`PermissionError::UnknownPermission`] rather than panicking,
//! since names are frequently runtime input.
//!
//! # Example
//!
//! ```
//! use turnstile::prelude::*;
//!
//! struct Ctx { role: &'static str }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), PermissionError> {
//! let set: PermissionSet<Ctx> = [
//!     Permission::new("isAdmin", |ctx: &Ctx, _: &()| ctx.role == "admin"),
//!     Permission::new("isEditor", |ctx: &Ctx, _: &()| ctx.role == "editor"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let ctx = Ctx { role: "editor" };
//! let authz = set.bind(&ctx);
//!
//! assert!(authz.granted("isEditor").await?);
//! assert!(!authz.granted("isAdmin").await?);
//! assert!(matches!(
//!     authz.granted("isOwner").await,
//!     Err(PermissionError::UnknownPermission(_))
//! ));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::PermissionError;
use crate::explain::Explanation;
use crate::permission::Permission;

/// A registry of permissions keyed by name
///
/// Registering a permission with an already-registered name replaces the
/// previous entry. Composite permissions register under their derived
/// names unless wrapped in an explicitly named leaf.
pub struct PermissionSet<C, R = ()> {
    permissions: HashMap<String, Permission<C, R>>,
}

impl<C, R> PermissionSet<C, R> {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a permission under its name, replacing any previous entry
    pub fn register(&mut self, permission: Permission<C, R>) {
        self.permissions
            .insert(permission.name().to_string(), permission);
    }

    /// Look up a permission by name
    pub fn get(&self, name: &str) -> Option<&Permission<C, R>> {
        self.permissions.get(name)
    }

    /// The registered names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.permissions.keys().map(String::as_str)
    }

    /// The number of registered permissions
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Bind the registry to a context for name-addressed calls
    pub fn bind<'a>(&'a self, ctx: &'a C) -> BoundSet<'a, C, R> {
        BoundSet { set: self, ctx }
    }
}

impl<C, R> Default for PermissionSet<C, R> {
    fn default() -> Self {
        Self {
            permissions: HashMap::new(),
        }
    }
}

impl<C, R> FromIterator<Permission<C, R>> for PermissionSet<C, R> {
    fn from_iter<I: IntoIterator<Item = Permission<C, R>>>(iter: I) -> Self {
        let mut set = Self::new();
        for permission in iter {
            set.register(permission);
        }
        set
    }
}

impl<C, R> fmt::Debug for PermissionSet<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("PermissionSet")
            .field("names", &names)
            .finish()
    }
}

/// A [`PermissionSet`] bound to a context, addressed by permission name
///
/// Every verb resolves the name first and fails with
/// [`PermissionError::UnknownPermission`] on a miss.
pub struct BoundSet<'a, C, R = ()> {
    set: &'a PermissionSet<C, R>,
    ctx: &'a C,
}

impl<C, R> BoundSet<'_, C, R> {
    fn lookup(&self, name: &str) -> Result<&Permission<C, R>, PermissionError> {
        self.set.get(name).ok_or_else(|| {
            debug!("permission '{}' is not registered", name);
            PermissionError::UnknownPermission(name.to_string())
        })
    }
}

impl<C, R> BoundSet<'_, C, R>
where
    C: Sync,
    R: Sync,
{
    /// Evaluate the named permission against the bound context
    pub async fn can(&self, name: &str, resource: &R) -> Result<bool, PermissionError> {
        self.lookup(name)?.evaluate(self.ctx, resource).await
    }

    /// Authorize against the named permission
    pub async fn authorize(&self, name: &str, resource: &R) -> Result<(), PermissionError> {
        self.lookup(name)?.authorize(self.ctx, resource).await
    }

    /// Filter resources through the named permission
    pub async fn filter<I>(&self, name: &str, resources: I) -> Result<Vec<R>, PermissionError>
    where
        R: Send,
        I: IntoIterator<Item = R>,
    {
        self.lookup(name)?.filter(self.ctx, resources).await
    }

    /// Explain an evaluation of the named permission
    pub async fn explain(&self, name: &str, resource: &R) -> Result<Explanation, PermissionError> {
        self.lookup(name)?.explain(self.ctx, resource).await
    }
}

impl<C> BoundSet<'_, C, ()>
where
    C: Sync,
{
    /// [`can`](Self::can) without the unit resource argument
    pub async fn granted(&self, name: &str) -> Result<bool, PermissionError> {
        self.lookup(name)?.granted(self.ctx).await
    }

    /// [`authorize`](Self::authorize) without the unit resource argument
    pub async fn require(&self, name: &str) -> Result<(), PermissionError> {
        self.lookup(name)?.require(self.ctx).await
    }
}
