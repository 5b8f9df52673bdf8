//! Recursive evaluation over the check tree.
//!
//! Two mirrored walks: [`Permission::eval`] produces the bare verdict,
//! [`Permission::eval_traced`] additionally records an [`Explanation`] node
//! per evaluated permission. Keeping them in lockstep is what makes an
//! explain trace a faithful account of a real evaluation: same order, same
//! short-circuiting, same concurrency, same fault behavior.

use std::time::Instant;

use futures::future::{BoxFuture, join_all};
use tracing::trace;

use crate::error::PermissionError;
use crate::explain::{Explanation, Operator};

use super::{Node, Permission};

impl<C, R> Permission<C, R>
where
    C: Sync,
    R: Sync,
{
    /// Walk the tree to a verdict.
    ///
    /// Sequential groups evaluate children in input order and stop at the
    /// first decisive verdict. Parallel groups start every child at once
    /// and await them all; when several fault, the first in input order
    /// wins. `NOT` always evaluates its child. A fault anywhere aborts the
    /// walk.
    pub(crate) fn eval<'a>(
        &'a self,
        ctx: &'a C,
        resource: &'a R,
    ) -> BoxFuture<'a, Result<bool, PermissionError>> {
        Box::pin(async move {
            match &self.inner.node {
                Node::Leaf(check) => {
                    let verdict = check.check(ctx, resource).await?;
                    trace!("check '{}' returned {}", self.name(), verdict);
                    Ok(verdict)
                }
                Node::All {
                    parallel: false,
                    children,
                } => {
                    for child in children {
                        if !child.eval(ctx, resource).await? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                Node::All {
                    parallel: true,
                    children,
                } => {
                    let verdicts =
                        join_all(children.iter().map(|child| child.eval(ctx, resource))).await;
                    let mut all = true;
                    for verdict in verdicts {
                        if !verdict? {
                            all = false;
                        }
                    }
                    Ok(all)
                }
                Node::Any {
                    parallel: false,
                    children,
                } => {
                    for child in children {
                        if child.eval(ctx, resource).await? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                Node::Any {
                    parallel: true,
                    children,
                } => {
                    let verdicts =
                        join_all(children.iter().map(|child| child.eval(ctx, resource))).await;
                    let mut any = false;
                    for verdict in verdicts {
                        if verdict? {
                            any = true;
                        }
                    }
                    Ok(any)
                }
                Node::Not(child) => Ok(!child.eval(ctx, resource).await?),
                Node::ContextOnly(child) => child.eval(ctx, &()).await,
            }
        })
    }

    /// Walk the tree to a verdict while building the trace bottom-up.
    ///
    /// Children that were never evaluated (sequential short-circuit) do not
    /// appear in `details`. The lift over a context-only permission is
    /// transparent: it reports the inner permission's node.
    pub(crate) fn eval_traced<'a>(
        &'a self,
        ctx: &'a C,
        resource: &'a R,
    ) -> BoxFuture<'a, Result<Explanation, PermissionError>> {
        Box::pin(async move {
            let started = Instant::now();
            match &self.inner.node {
                Node::Leaf(check) => {
                    let verdict = check.check(ctx, resource).await?;
                    Ok(Explanation::leaf(self.name(), verdict, started.elapsed()))
                }
                Node::All {
                    parallel: false,
                    children,
                } => {
                    let mut details = Vec::new();
                    let mut verdict = true;
                    for child in children {
                        let node = child.eval_traced(ctx, resource).await?;
                        let passed = node.result;
                        details.push(node);
                        if !passed {
                            verdict = false;
                            break;
                        }
                    }
                    Ok(Explanation::group(
                        self.name(),
                        Operator::And,
                        verdict,
                        started.elapsed(),
                        details,
                    ))
                }
                Node::All {
                    parallel: true,
                    children,
                } => {
                    let nodes =
                        join_all(children.iter().map(|child| child.eval_traced(ctx, resource)))
                            .await;
                    let mut details = Vec::with_capacity(nodes.len());
                    let mut verdict = true;
                    for node in nodes {
                        let node = node?;
                        if !node.result {
                            verdict = false;
                        }
                        details.push(node);
                    }
                    Ok(Explanation::group(
                        self.name(),
                        Operator::And,
                        verdict,
                        started.elapsed(),
                        details,
                    ))
                }
                Node::Any {
                    parallel: false,
                    children,
                } => {
                    let mut details = Vec::new();
                    let mut verdict = false;
                    for child in children {
                        let node = child.eval_traced(ctx, resource).await?;
                        let passed = node.result;
                        details.push(node);
                        if passed {
                            verdict = true;
                            break;
                        }
                    }
                    Ok(Explanation::group(
                        self.name(),
                        Operator::Or,
                        verdict,
                        started.elapsed(),
                        details,
                    ))
                }
                Node::Any {
                    parallel: true,
                    children,
                } => {
                    let nodes =
                        join_all(children.iter().map(|child| child.eval_traced(ctx, resource)))
                            .await;
                    let mut details = Vec::with_capacity(nodes.len());
                    let mut verdict = false;
                    for node in nodes {
                        let node = node?;
                        if node.result {
                            verdict = true;
                        }
                        details.push(node);
                    }
                    Ok(Explanation::group(
                        self.name(),
                        Operator::Or,
                        verdict,
                        started.elapsed(),
                        details,
                    ))
                }
                Node::Not(child) => {
                    let node = child.eval_traced(ctx, resource).await?;
                    let verdict = !node.result;
                    Ok(Explanation::group(
                        self.name(),
                        Operator::Not,
                        verdict,
                        started.elapsed(),
                        vec![node],
                    ))
                }
                Node::ContextOnly(child) => child.eval_traced(ctx, &()).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::ops::{and, and_parallel, not, or, or_parallel};
    use crate::{Permission, PermissionError};

    struct Ctx {
        role: &'static str,
    }

    fn has_role(role: &'static str) -> Permission<Ctx> {
        Permission::new(format!("is{role}"), move |ctx: &Ctx, _: &()| {
            ctx.role == role
        })
    }

    fn broken() -> Permission<Ctx> {
        Permission::new_fallible("broken", |_: &Ctx, _: &()| {
            Err(PermissionError::check_failed("flaky backend"))
        })
    }

    fn counting(name: &str, verdict: bool, calls: &Arc<AtomicUsize>) -> Permission<Ctx> {
        let calls = Arc::clone(calls);
        Permission::new(name.to_string(), move |_: &Ctx, _: &()| {
            calls.fetch_add(1, Ordering::SeqCst);
            verdict
        })
    }

    #[tokio::test]
    async fn test_traced_verdict_matches_plain_verdict() {
        let tree = or([
            and([has_role("Admin"), not(has_role("Suspended"))]),
            has_role("Owner"),
        ]);

        for role in ["Admin", "Owner", "Suspended", "Guest"] {
            let ctx = Ctx { role };
            let plain = tree.evaluate(&ctx, &()).await.unwrap();
            let traced = tree.explain(&ctx, &()).await.unwrap();
            assert_eq!(plain, traced.result, "role {role}");
        }
    }

    #[tokio::test]
    async fn test_sequential_and_short_circuits() {
        let ctx = Ctx { role: "Guest" };
        let tree = and([has_role("Admin"), broken()]);

        // the failing check sits behind a false one and must never run
        assert!(!tree.evaluate(&ctx, &()).await.unwrap());
    }

    #[tokio::test]
    async fn test_sequential_or_short_circuits() {
        let ctx = Ctx { role: "Admin" };
        let tree = or([has_role("Admin"), broken()]);

        assert!(tree.evaluate(&ctx, &()).await.unwrap());
    }

    #[tokio::test]
    async fn test_sequential_stops_counting_at_the_verdict() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let ctx = Ctx { role: "Guest" };

        let tree = or([
            counting("a", true, &first),
            counting("b", true, &second),
        ]);
        assert!(tree.evaluate(&ctx, &()).await.unwrap());
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0, "b must never start");
    }

    #[tokio::test]
    async fn test_parallel_runs_every_child_exactly_once() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let ctx = Ctx { role: "Guest" };

        // a decisive first child must not stop the rest in parallel mode
        let any = or_parallel([counting("a", true, &a), counting("b", false, &b)]);
        assert!(any.evaluate(&ctx, &()).await.unwrap());

        let all = and_parallel([counting("a", false, &a), counting("b", true, &b)]);
        assert!(!all.evaluate(&ctx, &()).await.unwrap());

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fault_propagates_through_not() {
        let ctx = Ctx { role: "Guest" };
        let err = not(broken()).evaluate(&ctx, &()).await.unwrap_err();
        assert!(err.to_string().contains("flaky backend"));
    }

    #[tokio::test]
    async fn test_fault_aborts_explain() {
        let ctx = Ctx { role: "Guest" };
        let err = and([broken(), has_role("Admin")])
            .explain(&ctx, &())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("flaky backend"));
    }

    #[tokio::test]
    async fn test_lifted_permission_evaluates_against_context() {
        let admin = has_role("Admin");
        let lifted: Permission<Ctx, u64> = admin.for_resource();

        let ctx = Ctx { role: "Admin" };
        assert!(lifted.evaluate(&ctx, &42).await.unwrap());

        let trace = lifted.explain(&ctx, &42).await.unwrap();
        assert_eq!(trace.name, "isAdmin");
        assert!(trace.details.is_empty());
    }
}
