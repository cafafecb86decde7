use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Expr, ExprLit, ExprPath, ItemFn, Lit, Meta, MetaNameValue, ReturnType, Type};

/// Declares an async function as a periodic task.
///
/// The function is collected by `SchedulerBuilder::register_all()`. It may
/// return `()` or a `Result<(), E>` where `E: Into<TaskError>`.
///
/// # Examples
///
/// ```rust,ignore
/// use cadence::periodic;
///
/// #[periodic(priority = "high", interval = "2s")]
/// async fn heartbeat() {
///     println!("still alive");
/// }
///
/// #[periodic(priority = "${jobs.cleanup.priority:low}", interval = "${jobs.cleanup.interval}")]
/// async fn cleanup() -> std::io::Result<()> {
///     Ok(())
/// }
/// ```
///
/// # Parameters
///
/// - `interval`: minimum time between runs, shorthand (`"500ms"`, `"2s"`) or a
///   plain number read in `time_unit`; required
/// - `priority`: `low`, `normal`, `high` or `critical` (default `normal`), also
///   accepted as a `Priority::*` path
/// - `time_unit`: unit for plain-number intervals (default `milliseconds`),
///   also accepted as a `TimeUnit::*` path
/// - `enabled`: boolean or config placeholder (default `true`)
/// - `name`: task name (default: the function name)
///
/// Every string value may be a `${key}` or `${key:default}` config placeholder.
#[proc_macro_attribute]
pub fn periodic(args: TokenStream, input: TokenStream) -> TokenStream {
    let attr_args = syn::parse_macro_input!(args with syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated);
    let input_fn = syn::parse_macro_input!(input as ItemFn);

    match expand_periodic(&attr_args, &input_fn) {
        Ok(expanded) => expanded.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

struct PeriodicArgs {
    name: String,
    priority: String,
    interval: String,
    time_unit: String,
    enabled: String,
}

fn expand_periodic(
    attr_args: &syn::punctuated::Punctuated<Meta, syn::Token![,]>,
    input_fn: &ItemFn,
) -> syn::Result<proc_macro2::TokenStream> {
    if input_fn.sig.asyncness.is_none() {
        return Err(syn::Error::new(
            input_fn.sig.fn_token.span(),
            "#[periodic] can only be applied to async functions",
        ));
    }
    if !input_fn.sig.inputs.is_empty() {
        return Err(syn::Error::new(
            input_fn.sig.inputs.span(),
            "#[periodic] functions cannot take arguments",
        ));
    }

    let fn_name = &input_fn.sig.ident;
    let args = parse_periodic_args(attr_args, &fn_name.to_string())?;
    let PeriodicArgs {
        name,
        priority,
        interval,
        time_unit,
        enabled,
    } = args;

    // Generate unique registration function name
    let register_fn_name = syn::Ident::new(&format!("__register_periodic_{}", fn_name), fn_name.span());

    let call = if returns_unit(&input_fn.sig.output) {
        quote! {
            #fn_name().await;
            ::core::result::Result::Ok(())
        }
    } else {
        quote! {
            #fn_name().await.map_err(::core::convert::Into::into)
        }
    };

    let expanded = quote! {
        #input_fn

        // Auto-registration using linkme
        #[::cadence::cadence_runtime::linkme::distributed_slice(::cadence::cadence_runtime::PERIODIC_TASKS)]
        #[linkme(crate = ::cadence::cadence_runtime::linkme)]
        fn #register_fn_name() -> ::cadence::cadence_runtime::DeclaredTask {
            ::cadence::cadence_runtime::DeclaredTask {
                name: #name,
                priority: #priority,
                interval: #interval,
                time_unit: #time_unit,
                enabled: #enabled,
                handler: || {
                    ::std::boxed::Box::pin(async {
                        let result: ::core::result::Result<(), ::cadence::cadence_runtime::TaskError> = { #call };
                        result
                    })
                },
            }
        }
    };

    Ok(expanded)
}

fn parse_periodic_args(
    attr_args: &syn::punctuated::Punctuated<Meta, syn::Token![,]>,
    fn_name: &str,
) -> syn::Result<PeriodicArgs> {
    let mut name = None;
    let mut priority = None;
    let mut interval = None;
    let mut time_unit = None;
    let mut enabled = None;

    for arg in attr_args {
        let Meta::NameValue(MetaNameValue { path, value, .. }) = arg else {
            return Err(syn::Error::new(arg.span(), "expected `key = value`"));
        };
        let key = path.get_ident().map(|i| i.to_string()).unwrap_or_default();

        match key.as_str() {
            "name" => name = Some(string_value(value, "name must be a string")?),
            "interval" => {
                interval = Some(match value {
                    Expr::Lit(ExprLit { lit: Lit::Int(i), .. }) => i.base10_digits().to_string(),
                    Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => s.value(),
                    _ => return Err(syn::Error::new(value.span(), "interval must be int or string")),
                });
            }
            "priority" => {
                priority = Some(path_or_string(
                    value,
                    "priority must be a string or Priority::* constant (e.g., Priority::High)",
                )?);
            }
            "time_unit" => {
                time_unit = Some(path_or_string(
                    value,
                    "time_unit must be a string or TimeUnit::* constant (e.g., TimeUnit::Seconds)",
                )?);
            }
            "enabled" => {
                enabled = Some(match value {
                    Expr::Lit(ExprLit { lit: Lit::Bool(b), .. }) => b.value.to_string(),
                    Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => s.value(),
                    _ => return Err(syn::Error::new(value.span(), "enabled must be bool or string")),
                });
            }
            _ => {
                return Err(syn::Error::new(
                    path.span(),
                    format!("unknown #[periodic] parameter `{}`", key),
                ))
            }
        }
    }

    let interval = interval.ok_or_else(|| {
        syn::Error::new(
            proc_macro2::Span::call_site(),
            format!("#[periodic] on `{}` must specify an interval", fn_name),
        )
    })?;

    Ok(PeriodicArgs {
        name: name.unwrap_or_else(|| fn_name.to_string()),
        priority: priority.unwrap_or_else(|| "normal".to_string()),
        interval,
        time_unit: time_unit.unwrap_or_else(|| "milliseconds".to_string()),
        enabled: enabled.unwrap_or_else(|| "true".to_string()),
    })
}

fn string_value(value: &Expr, message: &str) -> syn::Result<String> {
    match value {
        Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(s.value()),
        _ => Err(syn::Error::new(value.span(), message)),
    }
}

/// Accepts `"seconds"` as well as `TimeUnit::Seconds`, lowercasing the last
/// path segment.
fn path_or_string(value: &Expr, message: &str) -> syn::Result<String> {
    match value {
        Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(s.value()),
        Expr::Path(ExprPath { path, .. }) => path
            .segments
            .last()
            .map(|segment| segment.ident.to_string().to_lowercase())
            .ok_or_else(|| syn::Error::new(value.span(), message)),
        _ => Err(syn::Error::new(value.span(), message)),
    }
}

/// No return type, or an explicit `-> ()`.
fn returns_unit(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => true,
        ReturnType::Type(_, ty) => matches!(&**ty, Type::Tuple(tuple) if tuple.elems.is_empty()),
    }
}
