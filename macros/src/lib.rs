mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the summary and the rest becomes the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates a `CreateX` input struct for the model `X`, and an `UpdateX` struct
/// with every field optional when used as `#[model(update)]`.
///
/// Fields with `#[serde(skip_deserializing)]` or `#[serde(skip)]` are left out, and all
/// other fields are included verbatim (including attributes).
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
