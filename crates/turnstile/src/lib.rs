//! Turnstile - composable authorization for async Rust
//!
//! Authorization rules rarely stay simple: "may edit" starts as "is the
//! author", then grows "or is an admin", "and the post is not locked",
//! "and the account is not suspended". Turnstile keeps each of those rules
//! a small named check and makes the growth compositional.
//!
//! # Overview
//!
//! - Named permission units over a caller context and an optional resource
//! - `AND` / `OR` / `NOT` composition, sequential short-circuit or fully
//!   parallel, arbitrarily nested
//! - One invocation surface everywhere: evaluate, authorize, filter a
//!   collection, or explain what ran with verdicts and timings
//! - Denials and check faults kept strictly apart, with 401/403-shaped
//!   error kinds
//! - A `#[permission]` attribute that turns a plain `async fn` into a
//!   permission builder
//!
//! # Architecture
//!
//! The crate is organized into focused modules:
//! - `permission`: the [`Permission`] unit, its constructors and the
//!   [`Check`] trait implemented by leaf checks
//! - `ops`: the combinators ([`and`](ops::and), [`or`](ops::or),
//!   [`not`](ops::not) and their parallel variants)
//! - `explain`: structured [`Explanation`] traces of an evaluation
//! - `bind`: a context with the permission verbs pre-applied
//! - `set`: name-keyed registries for data-driven permission lookup
//! - `error`: [`PermissionError`] and the [`Denial`] override carrier
//!
//! # Example
//!
//! ```rust
//! use turnstile::prelude::*;
//!
//! #[derive(PartialEq)]
//! enum Role {
//!     Admin,
//!     Member,
//! }
//!
//! struct Ctx {
//!     user_id: u64,
//!     role: Role,
//! }
//!
//! struct Post {
//!     author_id: u64,
//!     locked: bool,
//! }
//!
//! #[permission]
//! async fn is_owner(ctx: &Ctx, post: &Post) -> bool {
//!     post.author_id == ctx.user_id
//! }
//!
//! #[permission]
//! async fn is_admin(ctx: &Ctx, _post: &Post) -> bool {
//!     ctx.role == Role::Admin
//! }
//!
//! #[permission]
//! async fn is_locked(_ctx: &Ctx, post: &Post) -> bool {
//!     post.locked
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), PermissionError> {
//!     let can_edit = and([or([is_owner(), is_admin()]), not(is_locked())]);
//!     assert_eq!(can_edit.name(), "((is_owner OR is_admin) AND NOT is_locked)");
//!
//!     let alice = Ctx { user_id: 7, role: Role::Member };
//!     let post = Post { author_id: 7, locked: false };
//!
//!     assert!(can_edit.evaluate(&alice, &post).await?);
//!     can_edit.authorize(&alice, &post).await?;
//!
//!     let trace = can_edit.explain(&alice, &post).await?;
//!     println!("{trace}");
//!     Ok(())
//! }
//! ```
//!
//! # License
//!
//! Licensed under MIT. See LICENSE file for details.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export macros from turnstile_macros
pub use turnstile_macros::*;

/// The permission unit and the check trait behind it
///
/// [`Permission`] is a named, cheaply cloneable handle to a check tree;
/// [`Check`] is the async trait a leaf implements. Constructors cover
/// synchronous closures, fallible closures, boxed async functions, and
/// hand-written `Check` implementors.
pub mod permission;

/// Combinators for composing permissions
///
/// `and` / `or` evaluate sequentially with short-circuiting; `and_parallel`
/// / `or_parallel` start every child concurrently and await them all;
/// `not` inverts. Composites are permissions themselves and nest freely.
pub mod ops;

/// Structured evaluation traces
///
/// `Permission::explain` produces an [`Explanation`] tree recording which
/// checks ran, their verdicts, and their timings. Serializes to JSON and
/// renders as an indented text tree.
pub mod explain;

/// Context binding
///
/// [`bind`](bind::bind) pre-applies a context so repeated permission calls
/// read as questions about the current caller.
pub mod bind;

/// Name-keyed permission registries
///
/// [`PermissionSet`](set::PermissionSet) stores permissions under their
/// names for data-driven lookup; binding it to a context gives
/// name-addressed verbs with an `UnknownPermission` error on misses.
pub mod set;

/// Error types
///
/// [`PermissionError`] distinguishes missing authentication
/// (`Unauthorized`), orderly denial (`Forbidden`), broken checks
/// (`CheckFailed`), and registry misses (`UnknownPermission`).
/// [`Denial`] carries the override accepted by `authorize_or`.
pub mod error;

// Public API re-exports
pub use error::{Denial, PermissionError};
pub use explain::{Explanation, Operator};
pub use permission::{Check, Permission};

// Prelude module for common imports
pub mod prelude {
    //! Common imports for turnstile users
    //!
    //! Use `use turnstile::prelude::*;` to import commonly used types.

    pub use crate::bind::{BoundContext, bind};
    pub use crate::error::{Denial, PermissionError};
    pub use crate::explain::{Explanation, Operator};
    pub use crate::ops::{and, and_parallel, not, or, or_parallel};
    pub use crate::permission::{Check, Permission};
    pub use crate::set::{BoundSet, PermissionSet};
    pub use turnstile_macros::permission;
}
