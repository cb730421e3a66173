//! In-place rewriting of `stop!()`, `seek!(..)` and `restart!()` anywhere
//! inside a segment, and rejection of body operations where they cannot work.
//!
//! A plain `return` between `begin!()` and `end!()` ends the slice without
//! moving the continuation, so the epilogue still runs and the next
//! invocation re-enters the same segment from its start.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::visit_mut::{self, VisitMut};
use syn::{Expr, ExprAsync, ExprClosure, Ident, Item, Lifetime, Macro, Stmt};

use crate::ops::{classify, Op};

/// Everything the generated jumps need to know about the thread.
pub(crate) struct Context<'a> {
    pub thread: &'a Ident,
    pub ip: &'a Expr,
    pub exit: &'a Lifetime,
    pub marks: &'a [Ident],
}

impl Context<'_> {
    /// Store `target` into the continuation and end the slice.
    pub(crate) fn jump(&self, target: TokenStream) -> TokenStream {
        let ip = self.ip;
        let exit = self.exit;
        quote!({
            #ip = #target;
            break #exit;
        })
    }

    /// End the slice, leaving the continuation where it is.
    fn leave(&self, value: Option<Box<Expr>>) -> TokenStream {
        let exit = self.exit;
        match value {
            Some(value) => quote!({
                #value;
                break #exit;
            }),
            None => quote!({
                break #exit;
            }),
        }
    }

    fn rewrite(&self, op: Op, span: Span) -> syn::Result<TokenStream> {
        let thread = self.thread;
        match op {
            Op::Stop => Ok(self.jump(quote!(::vthreads::Continuation::Stopped))),
            Op::Restart => Ok(self.jump(quote!(::vthreads::Continuation::Begin))),
            Op::Seek(name) => {
                if !self.marks.contains(&name) {
                    return Err(syn::Error::new(
                        name.span(),
                        format!("no mark named `{name}` in virtual thread `{thread}`"),
                    ));
                }
                Ok(self.jump(quote!(::vthreads::Continuation::At(#thread::#name))))
            }
            Op::Yield | Op::Mark(_) => Err(syn::Error::new(
                span,
                format!(
                    "`{}` must be a top-level statement of the virtual thread body",
                    op.spelling()
                ),
            )),
            Op::Begin | Op::End => Err(syn::Error::new(
                span,
                format!("`{}` must be a top-level statement", op.spelling()),
            )),
        }
    }
}

/// Where the visited statements sit relative to `end!()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Region {
    Body,
    Epilogue,
}

pub(crate) struct Rewriter<'a> {
    cx: &'a Context<'a>,
    region: Region,
    errors: Vec<syn::Error>,
}

impl<'a> Rewriter<'a> {
    pub(crate) fn new(cx: &'a Context<'a>, region: Region) -> Self {
        Self { cx, region, errors: Vec::new() }
    }

    pub(crate) fn run(mut self, stmts: &mut [Stmt]) -> syn::Result<()> {
        for stmt in stmts.iter_mut() {
            self.visit_stmt_mut(stmt);
        }
        let mut errors = self.errors.into_iter();
        match errors.next() {
            None => Ok(()),
            Some(mut first) => {
                first.extend(errors);
                Err(first)
            }
        }
    }

    fn replacement(&mut self, mac: &Macro) -> Option<Expr> {
        let op = match classify(mac) {
            Ok(Some(op)) => op,
            Ok(None) => return None,
            Err(e) => {
                self.errors.push(e);
                return Some(syn::parse_quote!(()));
            }
        };

        let span = mac.path.segments.last().map_or_else(Span::call_site, |s| s.ident.span());
        let rewritten = match self.region {
            Region::Epilogue => Err(syn::Error::new(
                span,
                format!("`{}` cannot be used after `end!()`", op.spelling()),
            )),
            Region::Body => self.cx.rewrite(op, span),
        };

        match rewritten {
            Ok(tokens) => Some(Expr::Verbatim(tokens)),
            Err(e) => {
                self.errors.push(e);
                Some(syn::parse_quote!(()))
            }
        }
    }
}

impl VisitMut for Rewriter<'_> {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if let Stmt::Macro(m) = stmt {
            if let Some(expr) = self.replacement(&m.mac) {
                let semi = m.semi_token.unwrap_or_default();
                *stmt = Stmt::Expr(expr, Some(semi));
                return;
            }
        }
        visit_mut::visit_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let Expr::Macro(m) = expr {
            if let Some(replacement) = self.replacement(&m.mac) {
                *expr = replacement;
                return;
            }
        }
        if self.region == Region::Body {
            if let Expr::Return(ret) = expr {
                if let Some(value) = ret.expr.as_deref_mut() {
                    self.visit_expr_mut(value);
                }
                *expr = Expr::Verbatim(self.cx.leave(ret.expr.take()));
                return;
            }
        }
        visit_mut::visit_expr_mut(self, expr);
    }

    // A jump cannot leave a closure, an async block or a nested item. The body
    // macros left there expand to their `compile_error!` stubs.
    fn visit_expr_closure_mut(&mut self, _: &mut ExprClosure) {}

    fn visit_expr_async_mut(&mut self, _: &mut ExprAsync) {}

    fn visit_item_mut(&mut self, _: &mut Item) {}
}
