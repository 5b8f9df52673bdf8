//! Integration tests for the #[permission] macro
//!
//! These tests verify that the macro correctly generates permission
//! builders from annotated functions.

use turnstile::prelude::*;
use turnstile_macros::permission;

struct Ctx {
    user_id: u64,
    role: &'static str,
}

struct Post {
    author_id: u64,
}

async fn lookup_role(ctx: &Ctx) -> &'static str {
    ctx.role
}

/// Test permission name inferred from the function name
#[test]
fn test_permission_name_from_function() {
    #[permission]
    async fn owns_post(ctx: &Ctx, post: &Post) -> bool {
        post.author_id == ctx.user_id
    }

    let permission = owns_post();
    assert_eq!(permission.name(), "owns_post");
}

/// Test explicit name override
#[test]
fn test_permission_name_override() {
    #[permission(name = "isOwner")]
    async fn owns_post(ctx: &Ctx, post: &Post) -> bool {
        post.author_id == ctx.user_id
    }

    let permission = owns_post();
    assert_eq!(permission.name(), "isOwner");
}

/// Test a context-and-resource permission end to end
#[tokio::test]
async fn test_resource_permission_evaluation() {
    #[permission]
    async fn owns_post(ctx: &Ctx, post: &Post) -> bool {
        post.author_id == ctx.user_id
    }

    let permission = owns_post();
    let ctx = Ctx {
        user_id: 7,
        role: "member",
    };

    assert!(
        permission
            .evaluate(&ctx, &Post { author_id: 7 })
            .await
            .unwrap()
    );
    assert!(
        !permission
            .evaluate(&ctx, &Post { author_id: 8 })
            .await
            .unwrap()
    );
}

/// Test a context-only permission (single parameter)
#[tokio::test]
async fn test_context_only_permission() {
    #[permission]
    async fn is_admin(ctx: &Ctx) -> bool {
        ctx.role == "admin"
    }

    let permission = is_admin();

    let admin = Ctx {
        user_id: 1,
        role: "admin",
    };
    let member = Ctx {
        user_id: 2,
        role: "member",
    };

    assert!(permission.granted(&admin).await.unwrap());
    assert!(!permission.granted(&member).await.unwrap());
}

/// Test that the check body may await
#[tokio::test]
async fn test_async_body_awaits() {
    #[permission]
    async fn is_moderator(ctx: &Ctx) -> bool {
        lookup_role(ctx).await == "moderator"
    }

    let permission = is_moderator();
    let moderator = Ctx {
        user_id: 3,
        role: "moderator",
    };

    assert!(permission.granted(&moderator).await.unwrap());
}

/// Test a fallible check body (Result return type)
#[tokio::test]
async fn test_result_return_type() {
    #[permission]
    async fn has_account(ctx: &Ctx) -> Result<bool, PermissionError> {
        if ctx.user_id == 0 {
            return Err(PermissionError::check_failed("anonymous user has no account"));
        }
        Ok(ctx.user_id < 1000)
    }

    let permission = has_account();

    let known = Ctx {
        user_id: 5,
        role: "member",
    };
    assert!(permission.granted(&known).await.unwrap());

    let anonymous = Ctx {
        user_id: 0,
        role: "member",
    };
    let err = permission.granted(&anonymous).await.unwrap_err();
    assert!(err.to_string().contains("no account"));
}

/// Test that generated builders compose with the operators
#[tokio::test]
async fn test_generated_builders_compose() {
    #[permission(name = "isOwner")]
    async fn is_owner(ctx: &Ctx, post: &Post) -> bool {
        post.author_id == ctx.user_id
    }

    #[permission(name = "isAdmin")]
    async fn is_admin(ctx: &Ctx, _post: &Post) -> bool {
        ctx.role == "admin"
    }

    let can_edit = is_owner().or(is_admin());
    assert_eq!(can_edit.name(), "(isOwner OR isAdmin)");

    let admin = Ctx {
        user_id: 1,
        role: "admin",
    };
    let someone_elses = Post { author_id: 42 };
    assert!(can_edit.evaluate(&admin, &someone_elses).await.unwrap());
}

/// Test authorize through a macro-built permission
#[tokio::test]
async fn test_authorize_uses_permission_name() {
    #[permission(name = "isOwner")]
    async fn is_owner(ctx: &Ctx, post: &Post) -> bool {
        post.author_id == ctx.user_id
    }

    let member = Ctx {
        user_id: 2,
        role: "member",
    };
    let err = is_owner()
        .authorize(&member, &Post { author_id: 9 })
        .await
        .unwrap_err();

    assert!(err.is_forbidden());
    assert_eq!(err.to_string(), "Access forbidden: isOwner");
}

/// Test that each builder call returns a fresh, working handle
#[tokio::test]
async fn test_builder_returns_fresh_handles() {
    #[permission]
    async fn is_admin(ctx: &Ctx) -> bool {
        ctx.role == "admin"
    }

    let first = is_admin();
    let second = is_admin();
    let admin = Ctx {
        user_id: 1,
        role: "admin",
    };

    assert_eq!(first.name(), second.name());
    assert!(first.granted(&admin).await.unwrap());
    assert!(second.granted(&admin).await.unwrap());
}
