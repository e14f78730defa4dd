//! Procedural macros for the Cordage bot framework.
//!
//! This crate provides:
//!
//! - `#[register_module]` - Adds a `ModuleClass` factory to automatic collection
//! - `#[register_view]` - Adds a `View` factory to automatic collection
//!
//! Both leave the function untouched and append a link-time registration, so
//! `client.collect(CollectSource::Auto)` finds every annotated factory in the
//! final binary.
//!
//! ```rust,ignore
//! use cordage::prelude::*;
//!
//! #[register_module]
//! fn moderation() -> ModuleClass<Moderation> {
//!     ModuleClass::from_default(ModuleOptions::new("moderation"))
//!         .slash_command("ban", SlashCommandOptions::new(ban_spec()), Moderation::ban)
//! }
//!
//! #[register_view]
//! fn confirm() -> View {
//!     View::builder(ViewOptions::new("moderation").author_only(true))
//!         .component(Row::First, ViewComponent::button("confirm", "Confirm"), on_confirm)
//!         .build()
//! }
//! ```
//!
//! The generated code refers to `::cordage::framework`. Crates that depend on
//! `cordage-framework` directly pass the path explicitly:
//!
//! ```rust,ignore
//! #[register_module(crate = ::cordage_framework)]
//! fn moderation() -> ModuleClass<Moderation> { /* ... */ }
//! ```

mod registration;

use proc_macro::TokenStream;
use syn::{ItemFn, parse_macro_input};

use registration::{RegisterArgs, Slice};

/// Registers a `fn() -> ModuleClass<M>` for automatic collection.
#[proc_macro_attribute]
pub fn register_module(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, Slice::Module)
}

/// Registers a `fn() -> View` for automatic collection.
#[proc_macro_attribute]
pub fn register_view(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, Slice::View)
}

fn expand(attr: TokenStream, item: TokenStream, slice: Slice) -> TokenStream {
    let args = parse_macro_input!(attr as RegisterArgs);
    let func = parse_macro_input!(item as ItemFn);

    match registration::register(args, func, slice) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
