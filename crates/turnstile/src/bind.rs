//! Binding a context once instead of threading it through every call.
//!
//! A request handler typically makes several permission decisions against
//! the same context. [`bind`] wraps the context in a [`BoundContext`] whose
//! verbs take only the permission (and resource), so the call sites read as
//! questions about the current caller:
//!
//! ```
//! use turnstile::prelude::*;
//!
//! struct Ctx { user_id: u64 }
//! struct Post { author_id: u64 }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), PermissionError> {
//! let is_owner = Permission::new("isOwner", |ctx: &Ctx, p: &Post| p.author_id == ctx.user_id);
//!
//! let ctx = Ctx { user_id: 3 };
//! let authz = bind(&ctx);
//!
//! assert!(authz.can(&is_owner, &Post { author_id: 3 }).await?);
//! authz.authorize(&is_owner, &Post { author_id: 3 }).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Binding adds nothing beyond the pre-applied argument: no caching, no
//! state, identical semantics to calling the permission directly.

use crate::error::{Denial, PermissionError};
use crate::explain::Explanation;
use crate::permission::Permission;

/// Bind `ctx` for repeated permission calls
///
/// Shorthand for [`BoundContext::new`].
pub fn bind<C>(ctx: &C) -> BoundContext<'_, C> {
    BoundContext::new(ctx)
}

/// A context with the permission verbs pre-applied to it
///
/// Borrow-only: the wrapper holds `&C` and lives at most as long as the
/// context it wraps.
pub struct BoundContext<'a, C> {
    ctx: &'a C,
}

impl<'a, C> BoundContext<'a, C> {
    /// Wrap a borrowed context
    pub fn new(ctx: &'a C) -> Self {
        Self { ctx }
    }

    /// The bound context
    pub fn context(&self) -> &C {
        self.ctx
    }
}

impl<C> BoundContext<'_, C>
where
    C: Sync,
{
    /// [`Permission::evaluate`] against the bound context
    pub async fn can<R: Sync>(
        &self,
        permission: &Permission<C, R>,
        resource: &R,
    ) -> Result<bool, PermissionError> {
        permission.evaluate(self.ctx, resource).await
    }

    /// [`Permission::granted`] against the bound context
    pub async fn granted(&self, permission: &Permission<C, ()>) -> Result<bool, PermissionError> {
        permission.granted(self.ctx).await
    }

    /// [`Permission::authorize`] against the bound context
    pub async fn authorize<R: Sync>(
        &self,
        permission: &Permission<C, R>,
        resource: &R,
    ) -> Result<(), PermissionError> {
        permission.authorize(self.ctx, resource).await
    }

    /// [`Permission::authorize_or`] against the bound context
    pub async fn authorize_or<R: Sync>(
        &self,
        permission: &Permission<C, R>,
        resource: &R,
        denial: impl Into<Denial>,
    ) -> Result<(), PermissionError> {
        permission.authorize_or(self.ctx, resource, denial).await
    }

    /// [`Permission::require`] against the bound context
    pub async fn require(&self, permission: &Permission<C, ()>) -> Result<(), PermissionError> {
        permission.require(self.ctx).await
    }

    /// [`Permission::require_or`] against the bound context
    pub async fn require_or(
        &self,
        permission: &Permission<C, ()>,
        denial: impl Into<Denial>,
    ) -> Result<(), PermissionError> {
        permission.require_or(self.ctx, denial).await
    }

    /// [`Permission::filter`] against the bound context
    pub async fn filter<R, I>(
        &self,
        permission: &Permission<C, R>,
        resources: I,
    ) -> Result<Vec<R>, PermissionError>
    where
        R: Send + Sync,
        I: IntoIterator<Item = R>,
    {
        permission.filter(self.ctx, resources).await
    }

    /// [`Permission::explain`] against the bound context
    pub async fn explain<R: Sync>(
        &self,
        permission: &Permission<C, R>,
        resource: &R,
    ) -> Result<Explanation, PermissionError> {
        permission.explain(self.ctx, resource).await
    }
}
