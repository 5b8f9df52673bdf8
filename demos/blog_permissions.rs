//! Composable permissions: the simplest way to use turnstile.
//!
//! This example defines three permission checks for a small blog, combines
//! them into an editing policy, and runs the policy against a few users.
//! Start here to see the core flow, then look at `explain_trace` for
//! debugging composed policies or `filter_batching` for batch checks.
//!
//! ## What happens under the hood
//!
//! 1. `#[permission]` turns each async function into a builder returning a
//!    named `Permission` handle.
//! 2. `.or()` / `not()` nest the handles into a check tree; the composite
//!    name is derived from the leaf names.
//! 3. `evaluate` walks the tree left to right, short-circuiting as soon as
//!    the verdict is decided.
//! 4. `authorize` turns a `false` verdict into a `Forbidden` error that
//!    names the denied policy.
//!
//! ## Run
//!
//! ```sh
//! cargo run -p demos --example blog_permissions
//!
//! # With debug logging (shows which checks denied)
//! RUST_LOG=turnstile=debug cargo run -p demos --example blog_permissions
//! ```

use turnstile::prelude::*;

struct User {
    id: u64,
    is_admin: bool,
    suspended: bool,
}

struct Post {
    title: &'static str,
    author_id: u64,
}

/// The post belongs to the current user.
#[permission(name = "isOwner")]
async fn is_owner(user: &User, post: &Post) -> bool {
    post.author_id == user.id
}

/// The current user is a site administrator.
#[permission(name = "isAdmin")]
async fn is_admin(user: &User, _post: &Post) -> bool {
    user.is_admin
}

/// The current user's account is suspended.
#[permission(name = "isSuspended")]
async fn is_suspended(user: &User, _post: &Post) -> bool {
    user.suspended
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable tracing so denied checks are visible with RUST_LOG=turnstile=debug.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnstile=warn".parse().unwrap()),
        )
        .with_target(false)
        .init();

    // Owners and admins may edit, suspended accounts never may.
    let can_edit = and([or([is_owner(), is_admin()]), not(is_suspended())]);
    println!("policy: {}\n", can_edit.name());

    let post = Post {
        title: "Borrow checker field notes",
        author_id: 1,
    };

    let author = User {
        id: 1,
        is_admin: false,
        suspended: false,
    };
    let moderator = User {
        id: 2,
        is_admin: true,
        suspended: false,
    };
    let stranger = User {
        id: 3,
        is_admin: false,
        suspended: false,
    };

    for (label, user) in [
        ("author", &author),
        ("moderator", &moderator),
        ("stranger", &stranger),
    ] {
        let verdict = can_edit.evaluate(user, &post).await?;
        println!("{label:>10} may edit {:?}: {verdict}", post.title);
    }

    // authorize produces a ready-to-surface error for the denied case.
    match can_edit.authorize(&stranger, &post).await {
        Ok(()) => println!("\nunexpected grant"),
        Err(err) => println!("\nstranger got: {err}"),
    }

    // authorize_or swaps in a caller-chosen denial.
    let err = can_edit
        .authorize_or(&stranger, &post, "only the author or an admin may edit")
        .await
        .unwrap_err();
    println!("with custom denial: {err}");

    Ok(())
}
