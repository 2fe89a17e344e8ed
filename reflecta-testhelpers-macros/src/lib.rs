#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    struct Prelude {
        tokens: Any<Cons<Except<KFn>, TokenTree>>,
    }

    struct Header {
        tokens: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct TestFn {
        prelude: Prelude,
        _fn: KFn,
        name: Ident,
        header: Header,
        body: BraceGroup,
    }
}

impl quote::ToTokens for Prelude {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.tokens.to_tokens(tokens)
    }
}

impl quote::ToTokens for Header {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.tokens.to_tokens(tokens)
    }
}

/// Marks a test and installs the reflecta test subscriber before its body.
///
/// ```ignore
/// #[reflecta_testhelpers::test]
/// fn resolves() {
///     // tracing output goes to stderr, filtered by REFLECTA_LOG
/// }
/// ```
///
/// An argument replaces the `#[test]` attribute that gets emitted, e.g.
/// `#[reflecta_testhelpers::test(some_runtime::test)]`.
#[proc_macro_attribute]
pub fn test(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let TestFn {
        prelude,
        _fn,
        name,
        header,
        body,
    } = match item.to_token_iter().parse::<TestFn>() {
        Ok(test_fn) => test_fn,
        Err(err) => {
            let message = format!("#[reflecta_testhelpers::test] expects a function: {err:?}");
            return quote::quote! { ::core::compile_error!(#message); }.into();
        }
    };

    let marker = if attr.is_empty() {
        quote::quote! { #[::core::prelude::rust_2024::test] }
    } else {
        let attr = TokenStream::from(attr);
        quote::quote! { #[#attr] }
    };
    let body = body.0.stream();

    quote::quote! {
        #marker
        #prelude fn #name #header {
            ::reflecta_testhelpers::setup();
            #body
        }
    }
    .into()
}
