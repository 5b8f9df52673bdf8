//! Explain traces: see exactly why a policy granted or denied.
//!
//! This example builds a nested document-access policy and prints the
//! explain trace for users that take different paths through it. The trace
//! mirrors the real evaluation: short-circuited checks are absent, and
//! every node carries its verdict and timing.
//!
//! ## What happens under the hood
//!
//! 1. `explain` runs the same walk as `evaluate`, recording an
//!    `Explanation` node per permission that actually ran.
//! 2. `Display` renders the trace as an indented tree for quick reading.
//! 3. `Explanation` is `Serialize`, so the same trace can ship to a log
//!    pipeline or an admin UI as JSON.
//!
//! ## Run
//!
//! ```sh
//! cargo run -p demos --example explain_trace
//!
//! # With per-check tracing
//! RUST_LOG=turnstile=trace cargo run -p demos --example explain_trace
//! ```

use turnstile::prelude::*;

struct User {
    id: u64,
    role: &'static str,
    clearance: u8,
}

struct Document {
    owner_id: u64,
    classification: u8,
}

#[permission(name = "isOwner")]
async fn is_owner(user: &User, doc: &Document) -> bool {
    doc.owner_id == user.id
}

#[permission(name = "isAuditor")]
async fn is_auditor(user: &User, _doc: &Document) -> bool {
    user.role == "auditor"
}

#[permission(name = "hasClearance")]
async fn has_clearance(user: &User, doc: &Document) -> bool {
    user.clearance >= doc.classification
}

#[permission(name = "isExternal")]
async fn is_external(user: &User, _doc: &Document) -> bool {
    user.role == "contractor"
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

    let can_read = and([
        or([is_owner(), is_auditor()]),
        has_clearance(),
        not(is_external()),
    ]);

    let doc = Document {
        owner_id: 7,
        classification: 2,
    };

    let owner = User {
        id: 7,
        role: "engineer",
        clearance: 3,
    };
    let auditor = User {
        id: 20,
        role: "auditor",
        clearance: 1,
    };

    // The owner grants on the first OR branch; the auditor reaches the
    // second branch but fails the clearance check.
    for (label, user) in [("owner", &owner), ("auditor", &auditor)] {
        let trace = can_read.explain(user, &doc).await?;
        println!("--- {label} ---");
        println!("{trace}\n");
    }

    // The same trace as JSON, ready for structured logging.
    let trace = can_read.explain(&auditor, &doc).await?;
    println!("--- auditor, as JSON ---");
    println!("{}", serde_json::to_string_pretty(&trace)?);

    Ok(())
}
