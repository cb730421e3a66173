//! Recognising body operations among the macro calls of a procedure.
//!
//! Only `name!(..)` and `vthreads::name!(..)` count; a macro of the same name
//! from any other path is user code and is left alone.

use syn::{Expr, Ident, Macro, Path, Stmt};

/// A body operation recognised by its macro name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Op {
    Begin,
    End,
    Yield,
    Stop,
    Restart,
    Mark(Ident),
    Seek(Ident),
}

impl Op {
    /// The macro spelling, used in diagnostics.
    pub(crate) fn spelling(&self) -> &'static str {
        match self {
            Op::Begin => "begin!()",
            Op::End => "end!()",
            Op::Yield => "yield_now!()",
            Op::Stop => "stop!()",
            Op::Restart => "restart!()",
            Op::Mark(_) => "mark!(..)",
            Op::Seek(_) => "seek!(..)",
        }
    }
}

/// Classify a macro invocation. `Ok(None)` means it is not a body operation
/// and must be left alone.
pub(crate) fn classify(mac: &Macro) -> syn::Result<Option<Op>> {
    let Some(name) = op_name(&mac.path) else {
        return Ok(None);
    };
    let name = name.to_string();
    let op = match name.as_str() {
        "begin" => Op::Begin,
        "end" => Op::End,
        "yield_now" => Op::Yield,
        "stop" => Op::Stop,
        "restart" => Op::Restart,
        "mark" => Op::Mark(mac.parse_body::<Ident>()?),
        "seek" => Op::Seek(mac.parse_body::<Ident>()?),
        _ => return Ok(None),
    };

    if !matches!(op, Op::Mark(_) | Op::Seek(_)) && !mac.tokens.is_empty() {
        return Err(syn::Error::new_spanned(
            &mac.tokens,
            format!("`{}` takes no arguments", op.spelling()),
        ));
    }
    Ok(Some(op))
}

/// The operation name of a bare or `vthreads::`-qualified macro path.
fn op_name(path: &Path) -> Option<&Ident> {
    let segments = &path.segments;
    match segments.len() {
        1 if path.leading_colon.is_none() => Some(&segments[0].ident),
        2 if segments[0].ident == "vthreads" => Some(&segments[1].ident),
        _ => None,
    }
}

/// The macro behind a statement, if the statement is nothing but a macro call.
pub(crate) fn stmt_macro(stmt: &Stmt) -> Option<&Macro> {
    match stmt {
        Stmt::Macro(m) => Some(&m.mac),
        Stmt::Expr(Expr::Macro(m), _) => Some(&m.mac),
        _ => None,
    }
}

/// Classify a whole statement.
pub(crate) fn stmt_op(stmt: &Stmt) -> syn::Result<Option<Op>> {
    match stmt_macro(stmt) {
        Some(mac) => classify(mac),
        None => Ok(None),
    }
}
