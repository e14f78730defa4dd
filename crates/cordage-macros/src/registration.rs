use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Ident, ItemFn, Path, ReturnType, Token};

/// Optional `crate = path` argument naming the framework crate.
pub struct RegisterArgs {
    framework: Path,
}

impl Parse for RegisterArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            return Ok(Self {
                framework: syn::parse_quote!(::cordage::framework),
            });
        }
        input.parse::<Token![crate]>()?;
        input.parse::<Token![=]>()?;
        let framework = input.parse()?;
        if !input.is_empty() {
            return Err(input.error("expected only `crate = path`"));
        }
        Ok(Self { framework })
    }
}

/// Which link-time slice a function is appended to.
#[derive(Clone, Copy)]
pub enum Slice {
    Module,
    View,
}

impl Slice {
    fn attribute(self) -> &'static str {
        match self {
            Self::Module => "register_module",
            Self::View => "register_view",
        }
    }

    fn static_prefix(self) -> &'static str {
        match self {
            Self::Module => "_CORDAGE_MODULE_SOURCE_",
            Self::View => "_CORDAGE_VIEW_SOURCE_",
        }
    }
}

/// The factory must be a plain `fn name() -> T`.
fn check_signature(func: &ItemFn, slice: Slice) -> syn::Result<()> {
    let sig = &func.sig;
    let attribute = slice.attribute();
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig.asyncness,
            format!("`#[{attribute}]` functions must not be async"),
        ));
    }
    if !sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            format!("`#[{attribute}]` functions take no arguments"),
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            format!("`#[{attribute}]` functions must not be generic"),
        ));
    }
    if matches!(sig.output, ReturnType::Default) {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            format!("`#[{attribute}]` functions must return the registered value"),
        ));
    }
    Ok(())
}

/// Leaves the function unchanged and appends a `distributed_slice` static
/// that wires it into the collector's source list.
pub fn register(args: RegisterArgs, func: ItemFn, slice: Slice) -> syn::Result<TokenStream> {
    check_signature(&func, slice)?;

    let framework = &args.framework;
    let fn_name = &func.sig.ident;
    let static_name = Ident::new(
        &format!("{}{}", slice.static_prefix(), fn_name.to_string().to_uppercase()),
        Span::call_site(),
    );

    let registration = match slice {
        Slice::Module => quote! {
            #[#framework::linkme::distributed_slice(#framework::collector::MODULE_SOURCES)]
            #[linkme(crate = #framework::linkme)]
            static #static_name: #framework::collector::ModuleSourceFn =
                || -> ::std::sync::Arc<dyn #framework::module::ModuleSource> {
                    ::std::sync::Arc::new(#fn_name())
                };
        },
        Slice::View => quote! {
            #[#framework::linkme::distributed_slice(#framework::collector::VIEW_SOURCES)]
            #[linkme(crate = #framework::linkme)]
            static #static_name: #framework::collector::ViewSourceFn = #fn_name;
        },
    };

    Ok(quote! {
        #func

        #registration
    })
}
