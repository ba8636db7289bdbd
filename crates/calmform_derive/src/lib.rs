use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::{
    Attribute, Data, DeriveInput, Fields, GenericArgument, Lit, LitStr, PathArguments, Token,
    Type, parse_macro_input,
};

const NUMBER_TYPES: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize", "f32",
    "f64",
];

#[proc_macro_derive(FormModel)]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    if let Err(error) = reject_container_renames(&input.attrs) {
        return error.to_compile_error().into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let calmform = calmform_path();
    let mut key_methods = Vec::new();
    let mut kind_entries = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_name = match serde_rename(&field.attrs) {
            Ok(Some(renamed)) => renamed,
            Ok(None) => field_ident.to_string().trim_start_matches("r#").to_string(),
            Err(error) => return error.to_compile_error().into(),
        };
        let kind = kind_variant(&field.ty);

        key_methods.push(quote! {
            pub const fn #field_ident(&self) -> #calmform::form::FieldKey {
                #calmform::form::FieldKey::new(#field_name)
            }
        });
        kind_entries.push(quote! {
            (
                #calmform::form::FieldKey::new(#field_name),
                #calmform::form::FieldKind::#kind,
            )
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#key_methods)*
        }

        impl #calmform::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_kinds() -> &'static [(#calmform::form::FieldKey, #calmform::form::FieldKind)] {
                const KINDS: &[(#calmform::form::FieldKey, #calmform::form::FieldKind)] = &[
                    #(#kind_entries),*
                ];
                KINDS
            }
        }
    }
    .into()
}

/// Field keys must match the names serde uses for the model, so a
/// field-level `rename = "..."` becomes the key.
fn serde_rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut renamed = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if !meta.input.peek(Token![=]) {
                    return Err(meta.error(
                        "FormModel derive supports only `rename = \"...\"`, not separate serialize/deserialize names",
                    ));
                }
                let name: LitStr = meta.value()?.parse()?;
                renamed = Some(name.value());
                Ok(())
            } else {
                skip_nested_meta(&meta)
            }
        })?;
    }
    Ok(renamed)
}

fn reject_container_renames(attrs: &[Attribute]) -> syn::Result<()> {
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                return Err(meta.error(
                    "FormModel derive does not support `rename_all`; rename fields individually",
                ));
            }
            skip_nested_meta(&meta)
        })?;
    }
    Ok(())
}

fn skip_nested_meta(meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: Lit = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        let _: TokenStream2 = content.parse()?;
    }
    Ok(())
}

/// `bool` edits through a checkbox, primitive numbers through a number
/// input, everything else as text. `Option<T>` is judged by `T`.
fn kind_variant(ty: &Type) -> Ident {
    let variant = match last_segment_ident(ty) {
        Some((name, Some(inner))) if name == "Option" => return kind_variant(inner),
        Some((name, _)) if name == "bool" => "Checkbox",
        Some((name, _)) if NUMBER_TYPES.contains(&name.as_str()) => "Number",
        _ => "Text",
    };
    Ident::new(variant, Span::call_site())
}

fn last_segment_ident(ty: &Type) -> Option<(String, Option<&Type>)> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let first_type_arg = match &segment.arguments {
        PathArguments::AngleBracketed(arguments) => {
            arguments.args.iter().find_map(|argument| match argument {
                GenericArgument::Type(inner) => Some(inner),
                _ => None,
            })
        }
        _ => None,
    };
    Some((segment.ident.to_string(), first_type_arg))
}

fn calmform_path() -> TokenStream2 {
    match crate_name("calmform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(::calmform),
        Err(_) => quote!(::calmform),
    }
}
