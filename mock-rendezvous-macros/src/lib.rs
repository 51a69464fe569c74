//! Procedural macros for mock-rendezvous
//!
//! This crate provides the `#[mock_rendezvous::test]` attribute macro for
//! writing rendezvous tests against a per-test [`Fixture`].
//!
//! [`Fixture`]: ../mock_rendezvous/struct.Fixture.html
//!
//! # Example
//!
//! ```rust,ignore
//! use mock_rendezvous::prelude::*;
//!
//! #[mock_rendezvous::test]
//! fn my_test(fx: &mut Fixture) {
//!     let launch = fx.launch(async { 1 + 1 });
//!     let result = fx.wait_for_result_from(&launch).unwrap();
//!     assert_eq!(result.value(&launch).unwrap(), 2);
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, Ident, ItemFn, Lit, ReturnType, Token,
};

/// Configuration options for the test macro.
#[derive(Default)]
struct TestConfig {
    /// Whether to verify expectation cardinalities at teardown (default: true)
    verify: Option<bool>,
    /// Whether to install the tracing subscriber (default: false)
    trace: bool,
}

impl Parse for TestConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = TestConfig::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "verify" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Bool(b) = lit {
                        config.verify = Some(b.value());
                    }
                }
                "trace" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Bool(b) = lit {
                        config.trace = b.value();
                    }
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {ident}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(config)
    }
}

/// Test attribute macro for rendezvous tests.
///
/// This macro wraps a plain function taking a `&mut Fixture` into a libtest
/// `#[test]`: it constructs the fixture, runs the body, and calls
/// `Fixture::finish` so teardown verification cannot be forgotten. The body
/// may return `mock_rendezvous::Result<()>` to propagate wait errors with
/// `?`.
///
/// # Basic Usage
///
/// ```rust,ignore
/// use mock_rendezvous::prelude::*;
///
/// #[mock_rendezvous::test]
/// fn test_basic(fx: &mut Fixture) {
///     let launch = fx.launch(async { 42 });
///     let result = fx.wait_for_result_from(&launch).unwrap();
///     assert_eq!(result.value(&launch).unwrap(), 42);
/// }
/// ```
///
/// # Configuration Options
///
/// - `verify = false` - Skip the expectation-cardinality check at teardown
///   (abandon detection still runs)
/// - `trace = true` - Install the tracing subscriber for this test
///
/// ```rust,ignore
/// #[mock_rendezvous::test(verify = false, trace = true)]
/// fn test_lenient(fx: &mut Fixture) {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as TestConfig);
    let input = parse_macro_input!(item as ItemFn);

    expand_test(&config, &input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_test(config: &TestConfig, input: &ItemFn) -> syn::Result<TokenStream2> {
    let name = &input.sig.ident;
    let body = &input.block;
    let attrs = &input.attrs;
    let vis = &input.vis;
    let inputs = &input.sig.inputs;
    let output = &input.sig.output;

    // The fixture drives launches itself; the test body stays synchronous.
    if input.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            &input.sig,
            "test function must not be async; the fixture drives launches synchronously",
        ));
    }

    if inputs.len() != 1 {
        return Err(syn::Error::new_spanned(
            &input.sig,
            "test function must take exactly one `&mut Fixture` parameter",
        ));
    }

    let trace_init = if config.trace {
        quote! { ::mock_rendezvous::trace::init(); }
    } else {
        quote! {}
    };

    let run = match output {
        ReturnType::Default => quote! { body(&mut fixture); },
        ReturnType::Type(..) => quote! {
            body(&mut fixture).expect("test body returned an error");
        },
    };

    let finish = if config.verify.unwrap_or(true) {
        quote! { fixture.finish().expect("rendezvous teardown failed"); }
    } else {
        quote! { fixture.finish_unverified().expect("rendezvous teardown failed"); }
    };

    Ok(quote! {
        #[::core::prelude::v1::test]
        #(#attrs)*
        #vis fn #name() {
            fn body(#inputs) #output #body

            #trace_init
            let mut fixture = ::mock_rendezvous::Fixture::new();
            #run
            #finish
        }
    })
}
