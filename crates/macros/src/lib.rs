//! Procedural macros for `vthreads`.
//!
//! The only entry point is [`macro@vthread`]. It turns an ordinary function
//! written as a straight sequence of segments into a re-entrant state machine
//! and generates the closed set of resumption points it dispatches on.

mod ops;
mod rewrite;
mod segment;

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Expr, Ident, ItemFn, Lifetime, ReturnType, Token};

use rewrite::{Context, Region, Rewriter};
use segment::{Body, Exit};

/// `#[vthread(Name, ip = <place>)]`
struct Args {
    thread: Ident,
    ip: Expr,
}

impl Parse for Args {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let thread: Ident = input.parse()?;
        input.parse::<Token![,]>()?;
        let key: Ident = input.parse()?;
        if key != "ip" {
            return Err(syn::Error::new(key.span(), "expected `ip = <continuation place>`"));
        }
        input.parse::<Token![=]>()?;
        let ip: Expr = input.parse()?;
        input.parse::<Option<Token![,]>>()?;
        Ok(Self { thread, ip })
    }
}

/// Turn a function into a virtual thread.
///
/// The first argument names the enumeration of resumption points generated
/// next to the function. `ip` is the place expression holding the thread's
/// `Continuation`, evaluated inside the function body (for example `*ip` for
/// a `&mut Continuation<_>` parameter, or `tcb.ip` for a field).
///
/// The body must start with `begin!()` and contain exactly one `end!()`.
/// Top-level `yield_now!()` and `mark!(Name)` statements cut it into segments.
/// `stop!()`, `seek!(Name)` and `restart!()` may appear anywhere in between.
/// Statements after `end!()` run on every invocation.
///
/// The function must be a free function returning `()`, and cannot be generic
/// or `async`. A `return` before `end!()` ends the slice without moving the
/// continuation; the epilogue still runs.
#[proc_macro_attribute]
pub fn vthread(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as Args);
    let func = parse_macro_input!(item as ItemFn);

    match expand(args, func) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(args: Args, func: ItemFn) -> syn::Result<TokenStream2> {
    check_signature(&func)?;

    let ItemFn { attrs, vis, sig, block } = func;
    let mut body = segment::split(*block)?;

    let thread = &args.thread;
    let ip = &args.ip;
    let exit = Lifetime::new("'__vthread", Span::mixed_site());
    let dispatch = Lifetime::new("'__dispatch", Span::mixed_site());
    let pc = Ident::new("__vt_pc", Span::mixed_site());

    let marks: Vec<Ident> = body.marks().cloned().collect();
    let cx = Context { thread, ip, exit: &exit, marks: &marks };

    let mut errors: Option<syn::Error> = None;
    let mut collect = |result: syn::Result<()>| {
        if let Err(e) = result {
            match errors.as_mut() {
                Some(all) => all.combine(e),
                None => errors = Some(e),
            }
        }
    };
    for segment in &mut body.segments {
        collect(Rewriter::new(&cx, Region::Body).run(&mut segment.stmts));
    }
    collect(Rewriter::new(&cx, Region::Epilogue).run(&mut body.epilogue));
    if let Some(e) = errors {
        return Err(e);
    }

    let point_enum = point_enum(thread, &vis, &sig.ident, &body);

    let arms = body.segments.iter().map(|segment| {
        let pattern = match &segment.entry {
            None => quote!(::vthreads::Continuation::Begin),
            Some(point) => quote!(::vthreads::Continuation::At(#thread::#point)),
        };
        let leave = match &segment.exit {
            Exit::Suspend(point) => cx.jump(quote!(::vthreads::Continuation::At(#thread::#point))),
            Exit::FlowInto(point) => quote!({
                #pc = ::vthreads::Continuation::At(#thread::#point);
                continue #dispatch;
            }),
            Exit::End => cx.jump(quote!(::vthreads::Continuation::Stopped)),
        };
        let stmts = &segment.stmts;
        quote! {
            #pattern => {
                #(#stmts)*
                #leave
            }
        }
    });

    // An empty point enum is uninhabited, so `At` still needs an arm.
    let uninhabited = body.points.is_empty().then(|| {
        let point = Ident::new("__vt_point", Span::mixed_site());
        quote!(::vthreads::Continuation::At(#point) => match #point {},)
    });

    let epilogue = &body.epilogue;

    Ok(quote! {
        #point_enum

        #(#attrs)*
        #[allow(unreachable_code, unused_labels, unused_mut, clippy::never_loop)]
        #vis #sig {
            #exit: {
                let mut #pc = #ip;
                #dispatch: loop {
                    match #pc {
                        ::vthreads::Continuation::Uninitialized
                        | ::vthreads::Continuation::Stopped => break #exit,
                        #(#arms)*
                        #uninhabited
                    }
                }
            }
            #(#epilogue)*
        }
    })
}

fn check_signature(func: &ItemFn) -> syn::Result<()> {
    let sig = &func.sig;
    if let ReturnType::Type(_, ty) = &sig.output {
        return Err(syn::Error::new_spanned(ty, "a virtual thread procedure returns no value"));
    }
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "a virtual thread procedure cannot be `async`"));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "a virtual thread procedure cannot be generic",
        ));
    }
    if let Some(receiver) = sig.receiver() {
        return Err(syn::Error::new_spanned(
            receiver,
            "a virtual thread procedure must be a free function; pass the state as a parameter instead of `self`",
        ));
    }
    Ok(())
}

/// The point enumeration and its `VirtualThread` implementation.
fn point_enum(thread: &Ident, vis: &syn::Visibility, procedure: &Ident, body: &Body) -> TokenStream2 {
    let name = procedure.to_string();
    let doc = format!("Resumption points of the `{name}` virtual thread.");

    let variants = body.points.iter().map(|p| {
        let v = &p.variant;
        if p.is_mark {
            quote!(#v)
        } else {
            quote!(#[doc(hidden)] #v)
        }
    });
    let all = body.points.iter().map(|p| &p.variant);
    let marks = body.marks();
    let tags = body.points.iter().zip(0u8..).map(|(p, tag)| {
        let v = &p.variant;
        quote!(Self::#v => #tag)
    });

    quote! {
        #[doc = #doc]
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #vis enum #thread {
            #(#variants,)*
        }

        impl ::vthreads::VirtualThread for #thread {
            const NAME: &'static str = #name;
            const POINTS: &'static [Self] = &[#(Self::#all),*];
            const MARKS: &'static [Self] = &[#(Self::#marks),*];

            fn tag(self) -> u8 {
                match self {
                    #(#tags,)*
                }
            }
        }
    }
}
