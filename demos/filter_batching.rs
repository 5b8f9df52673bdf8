//! Batch filtering: check a whole collection concurrently.
//!
//! This example filters a list of projects down to the ones the current
//! user may see. Each check simulates a slow backend lookup, so the demo
//! also shows what the concurrency buys: `filter` runs every element's
//! check at once, and `and_parallel` overlaps the branches of a single
//! policy the same way.
//!
//! ## What happens under the hood
//!
//! 1. `filter` collects the input, starts one evaluation per element, and
//!    awaits them all together.
//! 2. The result preserves input order regardless of which checks finish
//!    first.
//! 3. A failed check (an `Err`, not a `false`) fails the whole call; a
//!    denial just drops the element.
//!
//! ## Run
//!
//! ```sh
//! cargo run -p demos --example filter_batching
//! ```

use std::time::{Duration, Instant};

use turnstile::prelude::*;

struct User {
    id: u64,
    team: &'static str,
}

#[derive(Debug)]
struct Project {
    name: &'static str,
    team: &'static str,
    archived: bool,
    member_ids: Vec<u64>,
}

/// Membership lookup with a simulated round trip to a backend.
#[permission(name = "isMember")]
async fn is_member(user: &User, project: &Project) -> bool {
    tokio::time::sleep(Duration::from_millis(50)).await;
    project.member_ids.contains(&user.id)
}

/// Team match with the same simulated latency.
#[permission(name = "sameTeam")]
async fn same_team(user: &User, project: &Project) -> bool {
    tokio::time::sleep(Duration::from_millis(50)).await;
    project.team == user.team
}

#[permission(name = "isArchived")]
async fn is_archived(_user: &User, project: &Project) -> bool {
    project.archived
}

fn project(name: &'static str, team: &'static str, archived: bool, members: &[u64]) -> Project {
    Project {
        name,
        team,
        archived,
        member_ids: members.to_vec(),
    }
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

    let user = User {
        id: 3,
        team: "platform",
    };

    // Both slow lookups run at once for each project.
    let can_view = and_parallel([or_parallel([is_member(), same_team()]), not(is_archived())]);

    let projects = vec![
        project("atlas", "platform", false, &[1, 2]),
        project("borealis", "search", false, &[3, 4]),
        project("cascade", "search", false, &[8, 9]),
        project("durable", "platform", true, &[3]),
        project("ember", "platform", false, &[3, 5]),
    ];

    let started = Instant::now();
    let visible = can_view.filter(&user, projects).await?;
    let elapsed = started.elapsed();

    // Ten 50ms lookups finish together, not back to back.
    println!("filtered 5 projects in {elapsed:.0?}");
    println!("visible to user {}:", user.id);
    for project in &visible {
        println!("  {} (team {})", project.name, project.team);
    }

    Ok(())
}
