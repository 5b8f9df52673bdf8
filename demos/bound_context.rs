//! Context binding: fix the context once, check many permissions.
//!
//! This example plays through a request lifecycle: an application builds a
//! `PermissionSet` at startup, then each request binds its user once and
//! asks questions by permission name. `bind` does the same for code that
//! holds `Permission` handles directly.
//!
//! ## What happens under the hood
//!
//! 1. `PermissionSet::register` stores each handle under its name,
//!    composite names included.
//! 2. `set.bind(&ctx)` and `bind(&ctx)` capture only a borrow; nothing is
//!    cloned and no evaluation happens until a verb is called.
//! 3. Name lookups that miss return an `UnknownPermission` error instead
//!    of a silent deny.
//!
//! ## Run
//!
//! ```sh
//! cargo run -p demos --example bound_context
//! ```

use turnstile::prelude::*;

struct Session {
    user_id: u64,
    role: &'static str,
    mfa_verified: bool,
}

#[permission(name = "signedIn")]
async fn signed_in(session: &Session) -> bool {
    session.user_id != 0
}

#[permission(name = "isAdmin")]
async fn is_admin(session: &Session) -> bool {
    session.role == "admin"
}

#[permission(name = "hasMfa")]
async fn has_mfa(session: &Session) -> bool {
    session.mfa_verified
}

/// Built once at startup, shared by every request.
fn registry() -> PermissionSet<Session> {
    let mut set = PermissionSet::new();
    set.register(signed_in());
    set.register(is_admin());
    set.register(and([is_admin(), has_mfa()]));
    set
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnstile=warn".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let set = registry();
    println!("registered: {set:?}\n");

    let operator = Session {
        user_id: 12,
        role: "admin",
        mfa_verified: false,
    };

    // One bind per request, then every check reads naturally.
    let session = set.bind(&operator);
    println!("signedIn          -> {}", session.granted("signedIn").await?);
    println!("isAdmin           -> {}", session.granted("isAdmin").await?);
    println!(
        "(isAdmin AND hasMfa) -> {}",
        session.granted("(isAdmin AND hasMfa)").await?
    );

    // A typo is an error, not a deny.
    match session.granted("isRoot").await {
        Ok(_) => println!("unexpected verdict"),
        Err(err) => println!("isRoot            -> {err}"),
    }

    // bind() gives the same fluent surface over plain handles.
    let checks = bind(&operator);
    let dangerous = and([is_admin(), has_mfa()]);

    if let Err(err) = checks
        .require_or(&dangerous, "re-verify MFA to touch production")
        .await
    {
        println!("\nproduction gate: {err}");
    }

    let trace = checks.explain(&dangerous, &()).await?;
    println!("\n{trace}");

    Ok(())
}
