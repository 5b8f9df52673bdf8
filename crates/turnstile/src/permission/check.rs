//! The check trait implemented by leaf permissions.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::PermissionError;

/// Trait for permission checks
///
/// A check answers one question about a context and a resource: granted or
/// not. `Ok(true)` grants, `Ok(false)` denies, and `Err` means the check
/// itself failed and the verdict is unknown. Errors are never folded into
/// a denial.
///
/// Most checks are written as plain `async fn`s with the
/// [`#[permission]`](macro@crate::permission) attribute, or passed as
/// closures to [`Permission::new`](crate::Permission::new). Implement this
/// trait directly when a check carries its own state.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use turnstile::prelude::*;
///
/// struct Session {
///     user_id: u64,
/// }
///
/// /// Grants users whose id is on the allow list.
/// struct AllowList {
///     ids: Vec<u64>,
/// }
///
/// #[async_trait]
/// impl Check<Session> for AllowList {
///     async fn check(&self, ctx: &Session, _resource: &()) -> Result<bool, PermissionError> {
///         Ok(self.ids.contains(&ctx.user_id))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), PermissionError> {
/// let allowed = Permission::from_check("onAllowList", AllowList { ids: vec![7] });
/// assert!(allowed.granted(&Session { user_id: 7 }).await?);
/// assert!(!allowed.granted(&Session { user_id: 8 }).await?);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Check<C, R = ()>: Send + Sync {
    /// Run the check against a context and resource
    ///
    /// # Arguments
    ///
    /// * `ctx` - The caller's context (identity plus whatever data access
    ///   the check needs)
    /// * `resource` - The resource being acted on; `&()` for context-only
    ///   checks
    async fn check(&self, ctx: &C, resource: &R) -> Result<bool, PermissionError>;
}

/// Adapter for synchronous infallible predicates.
pub(crate) struct FnCheck<F>(pub(crate) F);

#[async_trait]
impl<C, R, F> Check<C, R> for FnCheck<F>
where
    C: Sync,
    R: Sync,
    F: Fn(&C, &R) -> bool + Send + Sync,
{
    async fn check(&self, ctx: &C, resource: &R) -> Result<bool, PermissionError> {
        Ok((self.0)(ctx, resource))
    }
}

/// Adapter for synchronous fallible predicates.
pub(crate) struct FallibleFnCheck<F>(pub(crate) F);

#[async_trait]
impl<C, R, F> Check<C, R> for FallibleFnCheck<F>
where
    C: Sync,
    R: Sync,
    F: Fn(&C, &R) -> Result<bool, PermissionError> + Send + Sync,
{
    async fn check(&self, ctx: &C, resource: &R) -> Result<bool, PermissionError> {
        (self.0)(ctx, resource)
    }
}

/// Adapter for async functions returning a boxed future borrowing both
/// arguments.
pub(crate) struct AsyncFnCheck<F>(pub(crate) F);

#[async_trait]
impl<C, R, F> Check<C, R> for AsyncFnCheck<F>
where
    C: Sync,
    R: Sync,
    F: for<'a> Fn(&'a C, &'a R) -> BoxFuture<'a, Result<bool, PermissionError>> + Send + Sync,
{
    async fn check(&self, ctx: &C, resource: &R) -> Result<bool, PermissionError> {
        (self.0)(ctx, resource).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimumAge {
        minimum: u32,
    }

    #[async_trait]
    impl Check<u32> for MinimumAge {
        async fn check(&self, ctx: &u32, _resource: &()) -> Result<bool, PermissionError> {
            Ok(*ctx >= self.minimum)
        }
    }

    #[tokio::test]
    async fn test_struct_implementation() {
        let check = MinimumAge { minimum: 18 };
        assert!(check.check(&21, &()).await.unwrap());
        assert!(!check.check(&17, &()).await.unwrap());
    }

    #[tokio::test]
    async fn test_fn_check_wraps_predicate() {
        let check = FnCheck(|ctx: &u32, _resource: &()| *ctx > 10);
        assert!(check.check(&11, &()).await.unwrap());
        assert!(!check.check(&10, &()).await.unwrap());
    }

    #[tokio::test]
    async fn test_fallible_fn_check_propagates_errors() {
        let check = FallibleFnCheck(|ctx: &u32, _resource: &()| {
            if *ctx == 0 {
                Err(PermissionError::check_failed("zero is not a user id"))
            } else {
                Ok(*ctx < 100)
            }
        });

        assert!(check.check(&5, &()).await.unwrap());
        let err = check.check(&0, &()).await.unwrap_err();
        assert!(err.to_string().contains("zero is not a user id"));
    }

    fn is_even<'a>(ctx: &'a u32, _resource: &'a ()) -> BoxFuture<'a, Result<bool, PermissionError>> {
        Box::pin(async move { Ok(*ctx % 2 == 0) })
    }

    #[tokio::test]
    async fn test_async_fn_check_awaits_future() {
        let check = AsyncFnCheck(is_even);
        assert!(check.check(&4, &()).await.unwrap());
        assert!(!check.check(&5, &()).await.unwrap());
    }
}
