//! Combinators for building composite permissions.
//!
//! Each combinator returns a new [`Permission`] whose children are the
//! inputs; nothing is copied or mutated, subtrees are shared. Composite
//! names are derived from the children, so traces and denial messages stay
//! readable: `or([a, b])` is named `"(a OR b)"`, `not(a)` is `"NOT a"`.
//!
//! The sequential forms ([`and`], [`or`]) evaluate children in input order
//! and stop at the first decisive verdict. The parallel forms
//! ([`and_parallel`], [`or_parallel`]) have the same truth tables but start
//! every child concurrently and await them all, which is the right trade
//! when checks are independent I/O or feed a batching data loader.
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
//! let admin = Permission::new("isAdmin", |ctx: &Ctx, _: &()| ctx.role == "admin");
//! let editor = Permission::new("isEditor", |ctx: &Ctx, _: &()| ctx.role == "editor");
//! let banned = Permission::new("isBanned", |ctx: &Ctx, _: &()| ctx.role == "banned");
//!
//! let can_publish = and([or([admin, editor]), not(banned)]);
//! assert_eq!(can_publish.name(), "((isAdmin OR isEditor) AND NOT isBanned)");
//!
//! assert!(can_publish.granted(&Ctx { role: "editor" }).await?);
//! assert!(!can_publish.granted(&Ctx { role: "banned" }).await?);
//! # Ok(())
//! # }
//! ```

use crate::permission::{Node, Permission};

fn collect<C, R>(
    permissions: impl IntoIterator<Item = Permission<C, R>>,
    operator: &str,
) -> (String, Vec<Permission<C, R>>) {
    let children: Vec<_> = permissions.into_iter().collect();
    assert!(
        !children.is_empty(),
        "{operator} requires at least one permission"
    );

    let name = format!(
        "({})",
        children
            .iter()
            .map(|child| child.name())
            .collect::<Vec<_>>()
            .join(&format!(" {operator} "))
    );
    (name, children)
}

/// All of `permissions`, evaluated sequentially with short-circuiting
///
/// True iff every child is true. Children run one at a time in input
/// order; the first false child stops the evaluation and later children
/// are never invoked. A check fault aborts the group immediately.
///
/// # Panics
///
/// Panics if `permissions` is empty.
pub fn and<C, R, I>(permissions: I) -> Permission<C, R>
where
    I: IntoIterator<Item = Permission<C, R>>,
{
    let (name, children) = collect(permissions, "AND");
    Permission::from_node(
        name,
        Node::All {
            parallel: false,
            children,
        },
    )
}

/// Any of `permissions`, evaluated sequentially with short-circuiting
///
/// True iff at least one child is true. Children run one at a time in
/// input order; the first true child stops the evaluation and later
/// children are never invoked. A check fault aborts the group immediately.
///
/// # Panics
///
/// Panics if `permissions` is empty.
pub fn or<C, R, I>(permissions: I) -> Permission<C, R>
where
    I: IntoIterator<Item = Permission<C, R>>,
{
    let (name, children) = collect(permissions, "OR");
    Permission::from_node(
        name,
        Node::Any {
            parallel: false,
            children,
        },
    )
}

/// All of `permissions`, started concurrently
///
/// Same truth table as [`and`], but every child is started at once and
/// every child is awaited, even when an early false already decides the
/// outcome. If several children fault, the first in input order wins.
///
/// # Panics
///
/// Panics if `permissions` is empty.
pub fn and_parallel<C, R, I>(permissions: I) -> Permission<C, R>
where
    I: IntoIterator<Item = Permission<C, R>>,
{
    let (name, children) = collect(permissions, "AND");
    Permission::from_node(
        name,
        Node::All {
            parallel: true,
            children,
        },
    )
}

/// Any of `permissions`, started concurrently
///
/// Same truth table as [`or`], but every child is started at once and
/// every child is awaited, even when an early true already decides the
/// outcome. If several children fault, the first in input order wins.
///
/// # Panics
///
/// Panics if `permissions` is empty.
pub fn or_parallel<C, R, I>(permissions: I) -> Permission<C, R>
where
    I: IntoIterator<Item = Permission<C, R>>,
{
    let (name, children) = collect(permissions, "OR");
    Permission::from_node(
        name,
        Node::Any {
            parallel: true,
            children,
        },
    )
}

/// The negation of `permission`
///
/// True iff the child is false. The child is always evaluated; a check
/// fault propagates unchanged (it is not negated into a verdict).
pub fn not<C, R>(permission: Permission<C, R>) -> Permission<C, R> {
    let name = format!("NOT {}", permission.name());
    Permission::from_node(name, Node::Not(permission))
}
