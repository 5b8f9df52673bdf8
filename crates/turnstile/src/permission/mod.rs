//! Named, composable permission units.
//!
//! [`Permission`] wraps a boolean check over a context `C` and a resource `R`
//! under a human-readable name. Permissions combine with the operators in
//! [`crate::ops`] into arbitrarily nested trees, and every node of such a
//! tree, leaf or composite, offers the same surface: evaluate to a
//! verdict, authorize-or-error, filter a collection of resources, or produce
//! a structured [`Explanation`] of what ran.
//!
//! A `Permission` is a cheap clone: the check tree lives behind an `Arc` and
//! composition shares children instead of copying them. Cloning a handle or
//! composing it into ten different trees costs a reference count, not a
//! rebuild.
//!
//! # Example
//!
//! ```
//! use turnstile::prelude::*;
//!
//! struct Ctx {
//!     user_id: u64,
//!     is_admin: bool,
//! }
//!
//! struct Post {
//!     author_id: u64,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), PermissionError> {
//! let is_owner = Permission::new("isOwner", |ctx: &Ctx, post: &Post| {
//!     post.author_id == ctx.user_id
//! });
//! let is_admin = Permission::new("isAdmin", |ctx: &Ctx, _post: &Post| ctx.is_admin);
//!
//! let can_edit = is_owner.or(is_admin);
//! assert_eq!(can_edit.name(), "(isOwner OR isAdmin)");
//!
//! let alice = Ctx { user_id: 7, is_admin: false };
//! assert!(can_edit.evaluate(&alice, &Post { author_id: 7 }).await?);
//! assert!(!can_edit.evaluate(&alice, &Post { author_id: 9 }).await?);
//! # Ok(())
//! # }
//! ```

mod check;
mod eval;

pub use check::Check;

use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, join_all};
use tracing::debug;

use crate::error::{Denial, PermissionError};
use crate::explain::Explanation;

use check::{AsyncFnCheck, FallibleFnCheck, FnCheck};

/// A named, composable permission over a context `C` and a resource `R`
///
/// Resource-less permissions use the default `R = ()` and get the
/// [`granted`](Self::granted) / [`require`](Self::require) sugar that drops
/// the unit argument.
///
/// Handles are `Send + Sync` and clone in O(1); see the
/// [module docs](self) for the composition model.
pub struct Permission<C, R = ()> {
    inner: Arc<Inner<C, R>>,
}

struct Inner<C, R> {
    name: String,
    node: Node<C, R>,
}

/// The check tree. Composites hold `Permission` handles, so subtrees are
/// shared between every composition that uses them.
pub(crate) enum Node<C, R> {
    /// A leaf check.
    Leaf(Arc<dyn Check<C, R>>),
    /// True iff all children are true.
    All {
        parallel: bool,
        children: Vec<Permission<C, R>>,
    },
    /// True iff at least one child is true.
    Any {
        parallel: bool,
        children: Vec<Permission<C, R>>,
    },
    /// Inverts its child.
    Not(Permission<C, R>),
    /// A context-only permission lifted into a resource-aware tree; the
    /// resource is ignored.
    ContextOnly(Permission<C, ()>),
}

impl<C, R> Permission<C, R> {
    /// A leaf permission from a synchronous predicate
    ///
    /// # Arguments
    ///
    /// * `name` - The permission's name, used in derived composite names,
    ///   denial messages, and explain traces
    /// * `check` - The predicate; `true` grants, `false` denies
    ///
    /// # Examples
    ///
    /// ```
    /// use turnstile::Permission;
    ///
    /// struct Ctx { age: u32 }
    ///
    /// let adult = Permission::new("isAdult", |ctx: &Ctx, _: &()| ctx.age >= 18);
    /// assert_eq!(adult.name(), "isAdult");
    /// ```
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        C: Sync,
        R: Sync,
        F: Fn(&C, &R) -> bool + Send + Sync + 'static,
    {
        Self::from_check(name, FnCheck(check))
    }

    /// A leaf permission from a synchronous predicate that can fail
    ///
    /// An `Err` from the predicate is a fault, not a denial: it aborts the
    /// evaluation of any tree containing this permission and propagates to
    /// the caller unchanged.
    pub fn new_fallible<F>(name: impl Into<String>, check: F) -> Self
    where
        C: Sync,
        R: Sync,
        F: Fn(&C, &R) -> Result<bool, PermissionError> + Send + Sync + 'static,
    {
        Self::from_check(name, FallibleFnCheck(check))
    }

    /// A leaf permission from an async function
    ///
    /// The function returns a boxed future borrowing both arguments, which
    /// is what a plain `async fn` with reference parameters cannot express
    /// as an `Fn` bound. Written by hand it looks like this (the
    /// [`#[permission]`](macro@crate::permission) attribute generates the
    /// same shape without the ceremony):
    ///
    /// ```
    /// use futures::future::BoxFuture;
    /// use turnstile::{Permission, PermissionError};
    ///
    /// struct Ctx { user_id: u64 }
    ///
    /// fn owns_account<'a>(
    ///     ctx: &'a Ctx,
    ///     account_id: &'a u64,
    /// ) -> BoxFuture<'a, Result<bool, PermissionError>> {
    ///     Box::pin(async move { Ok(ctx.user_id == *account_id) })
    /// }
    ///
    /// let owns = Permission::new_async("ownsAccount", owns_account);
    /// assert_eq!(owns.name(), "ownsAccount");
    /// ```
    pub fn new_async<F>(name: impl Into<String>, check: F) -> Self
    where
        C: Sync,
        R: Sync,
        F: for<'a> Fn(&'a C, &'a R) -> BoxFuture<'a, Result<bool, PermissionError>>
            + Send
            + Sync
            + 'static,
    {
        Self::from_check(name, AsyncFnCheck(check))
    }

    /// A leaf permission from any [`Check`] implementor
    ///
    /// The seam for checks that carry their own state (connection pools,
    /// allow lists, clocks).
    pub fn from_check(name: impl Into<String>, check: impl Check<C, R> + 'static) -> Self {
        Self::from_node(name.into(), Node::Leaf(Arc::new(check)))
    }

    pub(crate) fn from_node(name: String, node: Node<C, R>) -> Self {
        Self {
            inner: Arc::new(Inner { name, node }),
        }
    }

    /// The permission's name
    ///
    /// Leaf names are caller-chosen; composite names are derived, e.g.
    /// `"(isOwner OR isAdmin)"` or `"NOT isBanned"`.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Both this permission and `other`, short-circuiting
    ///
    /// Binary sugar for [`ops::and`](crate::ops::and); see it for the exact
    /// evaluation rules.
    pub fn and(self, other: Permission<C, R>) -> Permission<C, R> {
        crate::ops::and([self, other])
    }

    /// Either this permission or `other`, short-circuiting
    ///
    /// Binary sugar for [`ops::or`](crate::ops::or).
    pub fn or(self, other: Permission<C, R>) -> Permission<C, R> {
        crate::ops::or([self, other])
    }
}

impl<C, R> Permission<C, R>
where
    C: Sync,
    R: Sync,
{
    /// Evaluate the permission to a verdict
    ///
    /// `Ok(true)` grants, `Ok(false)` denies, `Err` means some check in the
    /// tree failed to produce a verdict. Every invocation re-runs the tree;
    /// nothing is cached.
    pub async fn evaluate(&self, ctx: &C, resource: &R) -> Result<bool, PermissionError> {
        self.eval(ctx, resource).await
    }

    /// Evaluate and fail with a forbidden error on denial
    ///
    /// The error message names the permission:
    /// `"Access forbidden: (isOwner OR isAdmin)"`. Check faults propagate
    /// unchanged, so a broken check never masquerades as a denial.
    pub async fn authorize(&self, ctx: &C, resource: &R) -> Result<(), PermissionError> {
        if self.eval(ctx, resource).await? {
            Ok(())
        } else {
            debug!("permission '{}' denied", self.name());
            Err(PermissionError::forbidden_with(format!(
                "Access forbidden: {}",
                self.name()
            )))
        }
    }

    /// Evaluate and fail with a caller-supplied error on denial
    ///
    /// `denial` accepts a message, a ready [`PermissionError`], or a lazy
    /// [`Denial::with`] factory:
    ///
    /// ```
    /// use turnstile::prelude::*;
    ///
    /// struct Ctx { is_admin: bool }
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let admin = Permission::new("isAdmin", |ctx: &Ctx, _: &()| ctx.is_admin);
    /// let guest = Ctx { is_admin: false };
    ///
    /// let err = admin.authorize_or(&guest, &(), "admins only").await.unwrap_err();
    /// assert_eq!(err.to_string(), "admins only");
    ///
    /// let err = admin
    ///     .authorize_or(&guest, &(), PermissionError::unauthorized())
    ///     .await
    ///     .unwrap_err();
    /// assert!(err.is_unauthorized());
    /// # }
    /// ```
    pub async fn authorize_or(
        &self,
        ctx: &C,
        resource: &R,
        denial: impl Into<Denial>,
    ) -> Result<(), PermissionError> {
        let denial = denial.into();
        if self.eval(ctx, resource).await? {
            Ok(())
        } else {
            debug!("permission '{}' denied", self.name());
            Err(denial.resolve())
        }
    }

    /// Keep the resources this permission grants
    ///
    /// All elements are checked concurrently and every element is always
    /// checked; the result preserves input order (it is a subsequence of
    /// the input). An empty input returns an empty `Vec` without invoking
    /// any check. If any check faults the whole call fails with the first
    /// fault in input order.
    ///
    /// ```
    /// use turnstile::prelude::*;
    ///
    /// struct Ctx { user_id: u64 }
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), PermissionError> {
    /// let mine = Permission::new("isMine", |ctx: &Ctx, owner: &u64| *owner == ctx.user_id);
    ///
    /// let ctx = Ctx { user_id: 1 };
    /// let visible = mine.filter(&ctx, vec![1, 2, 1, 3, 1]).await?;
    /// assert_eq!(visible, vec![1, 1, 1]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn filter<I>(&self, ctx: &C, resources: I) -> Result<Vec<R>, PermissionError>
    where
        R: Send,
        I: IntoIterator<Item = R>,
    {
        let resources: Vec<R> = resources.into_iter().collect();
        let verdicts = join_all(resources.iter().map(|resource| self.eval(ctx, resource))).await;

        let mut granted = Vec::with_capacity(resources.len());
        for (resource, verdict) in resources.into_iter().zip(verdicts) {
            if verdict? {
                granted.push(resource);
            }
        }
        Ok(granted)
    }

    /// Evaluate while recording which checks ran, their verdicts, and
    /// their timings
    ///
    /// The trace mirrors the real evaluation exactly: short-circuited
    /// children are absent, parallel children are all present, `NOT` shows
    /// its single child. See [`Explanation`] for the node shape.
    pub async fn explain(&self, ctx: &C, resource: &R) -> Result<Explanation, PermissionError> {
        self.eval_traced(ctx, resource).await
    }
}

impl<C> Permission<C, ()> {
    /// Lift a context-only permission into a resource-aware one
    ///
    /// The lifted permission keeps its name, ignores the resource, and
    /// composes freely with `Permission<C, R>` trees:
    ///
    /// ```
    /// use turnstile::prelude::*;
    ///
    /// struct Ctx { authenticated: bool, user_id: u64 }
    /// struct Post { author_id: u64 }
    ///
    /// let signed_in = Permission::new("signedIn", |ctx: &Ctx, _: &()| ctx.authenticated);
    /// let owns = Permission::new("isOwner", |ctx: &Ctx, p: &Post| p.author_id == ctx.user_id);
    ///
    /// let can_edit = signed_in.for_resource::<Post>().and(owns);
    /// assert_eq!(can_edit.name(), "(signedIn AND isOwner)");
    /// ```
    pub fn for_resource<R>(&self) -> Permission<C, R> {
        Permission::from_node(self.inner.name.clone(), Node::ContextOnly(self.clone()))
    }
}

impl<C> Permission<C, ()>
where
    C: Sync,
{
    /// [`evaluate`](Self::evaluate) without the unit resource argument
    pub async fn granted(&self, ctx: &C) -> Result<bool, PermissionError> {
        self.evaluate(ctx, &()).await
    }

    /// [`authorize`](Self::authorize) without the unit resource argument
    pub async fn require(&self, ctx: &C) -> Result<(), PermissionError> {
        self.authorize(ctx, &()).await
    }

    /// [`authorize_or`](Self::authorize_or) without the unit resource argument
    pub async fn require_or(
        &self,
        ctx: &C,
        denial: impl Into<Denial>,
    ) -> Result<(), PermissionError> {
        self.authorize_or(ctx, &(), denial).await
    }
}

impl<C, R> Clone for Permission<C, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, R> fmt::Debug for Permission<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permission")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        user_id: u64,
        is_admin: bool,
    }

    struct Post {
        author_id: u64,
    }

    fn is_owner() -> Permission<Ctx, Post> {
        Permission::new("isOwner", |ctx: &Ctx, post: &Post| {
            post.author_id == ctx.user_id
        })
    }

    fn is_admin() -> Permission<Ctx, Post> {
        Permission::new("isAdmin", |ctx: &Ctx, _post: &Post| ctx.is_admin)
    }

    fn alice() -> Ctx {
        Ctx {
            user_id: 1,
            is_admin: false,
        }
    }

    fn root() -> Ctx {
        Ctx {
            user_id: 99,
            is_admin: true,
        }
    }

    #[tokio::test]
    async fn test_leaf_evaluation() {
        let owner = is_owner();
        let mine = Post { author_id: 1 };
        let theirs = Post { author_id: 2 };

        assert!(owner.evaluate(&alice(), &mine).await.unwrap());
        assert!(!owner.evaluate(&alice(), &theirs).await.unwrap());
    }

    #[tokio::test]
    async fn test_clone_shares_the_tree() {
        let owner = is_owner();
        let copy = owner.clone();
        let mine = Post { author_id: 1 };

        assert_eq!(copy.name(), owner.name());
        assert!(copy.evaluate(&alice(), &mine).await.unwrap());
    }

    #[tokio::test]
    async fn test_new_fallible_propagates_errors() {
        let flaky = Permission::new_fallible("flaky", |_: &Ctx, _: &Post| {
            Err(PermissionError::check_failed("backend down"))
        });

        let err = flaky
            .evaluate(&alice(), &Post { author_id: 1 })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("backend down"));
    }

    #[tokio::test]
    async fn test_binary_and_or_names() {
        let can_edit = is_owner().or(is_admin());
        assert_eq!(can_edit.name(), "(isOwner OR isAdmin)");

        let both = is_owner().and(is_admin());
        assert_eq!(both.name(), "(isOwner AND isAdmin)");
    }

    #[tokio::test]
    async fn test_binary_or_truth() {
        let can_edit = is_owner().or(is_admin());
        let theirs = Post { author_id: 2 };

        assert!(!can_edit.evaluate(&alice(), &theirs).await.unwrap());
        assert!(can_edit.evaluate(&root(), &theirs).await.unwrap());
    }

    #[tokio::test]
    async fn test_authorize_names_the_permission() {
        let owner = is_owner();
        let theirs = Post { author_id: 2 };

        assert!(owner.authorize(&alice(), &Post { author_id: 1 }).await.is_ok());

        let err = owner.authorize(&alice(), &theirs).await.unwrap_err();
        assert!(err.is_forbidden());
        assert_eq!(err.to_string(), "Access forbidden: isOwner");
    }

    #[tokio::test]
    async fn test_authorize_or_message_override() {
        let owner = is_owner();
        let err = owner
            .authorize_or(&alice(), &Post { author_id: 2 }, "not your post")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "not your post");
    }

    #[tokio::test]
    async fn test_authorize_or_not_resolved_on_grant() {
        let owner = is_owner();
        let result = owner
            .authorize_or(
                &alice(),
                &Post { author_id: 1 },
                Denial::with(|| panic!("factory must not run on grant")),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_filter_keeps_input_order() {
        let owner = is_owner();
        let posts = vec![
            Post { author_id: 1 },
            Post { author_id: 2 },
            Post { author_id: 1 },
        ];

        let mine = owner.filter(&alice(), posts).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|post| post.author_id == 1));
    }

    #[tokio::test]
    async fn test_resource_less_sugar() {
        let admin = Permission::new("isAdmin", |ctx: &Ctx, _: &()| ctx.is_admin);

        assert!(admin.granted(&root()).await.unwrap());
        assert!(!admin.granted(&alice()).await.unwrap());

        assert!(admin.require(&root()).await.is_ok());
        let err = admin.require(&alice()).await.unwrap_err();
        assert_eq!(err.to_string(), "Access forbidden: isAdmin");

        let err = admin
            .require_or(&alice(), PermissionError::unauthorized())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_for_resource_ignores_the_resource() {
        let admin = Permission::new("isAdmin", |ctx: &Ctx, _: &()| ctx.is_admin);
        let lifted: Permission<Ctx, Post> = admin.for_resource();

        assert_eq!(lifted.name(), "isAdmin");
        assert!(lifted.evaluate(&root(), &Post { author_id: 5 }).await.unwrap());
        assert!(!lifted.evaluate(&alice(), &Post { author_id: 1 }).await.unwrap());
    }

    #[tokio::test]
    async fn test_for_resource_composes_with_resourceful() {
        let signed_in = Permission::new("signedIn", |ctx: &Ctx, _: &()| ctx.user_id != 0);
        let can_edit = signed_in.for_resource::<Post>().and(is_owner());

        assert_eq!(can_edit.name(), "(signedIn AND isOwner)");
        assert!(can_edit.evaluate(&alice(), &Post { author_id: 1 }).await.unwrap());
        assert!(!can_edit.evaluate(&alice(), &Post { author_id: 2 }).await.unwrap());
    }

    #[test]
    fn test_debug_shows_the_name() {
        let owner = is_owner();
        assert!(format!("{owner:?}").contains("isOwner"));
    }
}
