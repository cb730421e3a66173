//! Splitting a virtual thread body into dispatchable segments.
//!
//! A body looks like
//!
//! ```text
//! begin!();
//! A;
//! yield_now!();
//! B;
//! mark!(Retry);
//! C;
//! end!();
//! D;
//! ```
//!
//! and is cut at every top-level `yield_now!()` and `mark!(..)`. Each cut
//! becomes a resumption point, each run of statements between two cuts becomes
//! one arm of the dispatch `match`, and everything after `end!()` is the
//! epilogue that runs on every invocation.

use quote::format_ident;
use syn::{Block, Ident, Stmt};

use crate::ops::{stmt_op, Op};

/// Raw values 0x00, 0x01 and 0xFF are taken by Uninitialized, Begin and Stopped.
pub(crate) const MAX_POINTS: usize = 253;

/// One resumption point of the generated enumeration.
#[derive(Debug, Clone)]
pub(crate) struct Point {
    pub variant: Ident,
    pub is_mark: bool,
}

/// How control leaves a segment when its last statement completes.
#[derive(Debug, Clone)]
pub(crate) enum Exit {
    /// Record the point and end the slice.
    Suspend(Ident),
    /// Flow straight into the segment that starts at this mark.
    FlowInto(Ident),
    /// `end!()` was reached: the thread is stopped.
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct Segment {
    /// `None` is the implicit BEGIN point.
    pub entry: Option<Ident>,
    pub stmts: Vec<Stmt>,
    pub exit: Exit,
}

#[derive(Debug, Clone)]
pub(crate) struct Body {
    pub points: Vec<Point>,
    pub segments: Vec<Segment>,
    pub epilogue: Vec<Stmt>,
}

impl Body {
    pub(crate) fn marks(&self) -> impl Iterator<Item = &Ident> {
        self.points.iter().filter(|p| p.is_mark).map(|p| &p.variant)
    }
}

/// Split a procedure body into segments.
pub(crate) fn split(block: Block) -> syn::Result<Body> {
    let span = block.brace_token.span.join();
    let mut stmts = block.stmts.into_iter();

    match stmts.next() {
        Some(first) => {
            if stmt_op(&first)? != Some(Op::Begin) {
                return Err(syn::Error::new_spanned(
                    first,
                    "a virtual thread body must start with `begin!()`",
                ));
            }
        }
        None => {
            return Err(syn::Error::new(
                span,
                "a virtual thread body must start with `begin!()` and contain `end!()`",
            ))
        }
    }

    let mut points: Vec<Point> = Vec::new();
    let mut segments = Vec::new();
    let mut entry = None;
    let mut current = Vec::new();
    let mut yields = 0usize;
    let mut ended = false;

    for stmt in stmts.by_ref() {
        match stmt_op(&stmt)? {
            Some(Op::Yield) => {
                yields += 1;
                let variant = format_ident!("__Yield{}", yields);
                points.push(Point { variant: variant.clone(), is_mark: false });
                segments.push(Segment {
                    entry: entry.replace(variant.clone()),
                    stmts: core::mem::take(&mut current),
                    exit: Exit::Suspend(variant),
                });
            }
            Some(Op::Mark(name)) => {
                if name.to_string().starts_with("__") {
                    return Err(syn::Error::new(
                        name.span(),
                        "mark names starting with `__` are reserved for yield points",
                    ));
                }
                if points.iter().any(|p| p.variant == name) {
                    return Err(syn::Error::new(
                        name.span(),
                        format!("mark `{name}` is declared more than once"),
                    ));
                }
                points.push(Point { variant: name.clone(), is_mark: true });
                segments.push(Segment {
                    entry: entry.replace(name.clone()),
                    stmts: core::mem::take(&mut current),
                    exit: Exit::FlowInto(name),
                });
            }
            Some(Op::End) => {
                segments.push(Segment {
                    entry: entry.take(),
                    stmts: core::mem::take(&mut current),
                    exit: Exit::End,
                });
                ended = true;
                break;
            }
            Some(Op::Begin) => {
                return Err(syn::Error::new_spanned(
                    stmt,
                    "`begin!()` must appear exactly once, as the first statement",
                ));
            }
            // stop!, seek! and restart! are rewritten in place later on
            _ => current.push(stmt),
        }
    }

    if !ended {
        return Err(syn::Error::new(span, "a virtual thread body must contain `end!()`"));
    }
    if points.len() > MAX_POINTS {
        return Err(syn::Error::new(
            span,
            format!(
                "a virtual thread supports at most {MAX_POINTS} yield points and marks, found {}",
                points.len()
            ),
        ));
    }

    let epilogue: Vec<Stmt> = stmts.collect();
    for stmt in &epilogue {
        if let Some(Op::End) = stmt_op(stmt)? {
            return Err(syn::Error::new_spanned(stmt, "`end!()` must appear exactly once"));
        }
    }

    Ok(Body { points, segments, epilogue })
}
