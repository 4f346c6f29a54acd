use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Attribute, Data, DeriveInput, Expr, Field, Fields, Lit, LitStr, Meta, Token};

pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let attrs = extract_struct_attrs(input)?;
    let snake = to_snake_case(&name.to_string());
    let collection = attrs.collection.unwrap_or_else(|| format!("{}s", snake));
    let entity_name = attrs.name.unwrap_or(snake);

    let id = extract_id_field(input)?;
    let id_field = id.ident.clone().ok_or_else(|| {
        syn::Error::new_spanned(&input.ident, "Entity derive requires a named id field")
    })?;
    let id_ty = &id.ty;
    let id_name = serialized_name(&input.attrs, id, &id_field.to_string());

    Ok(quote! {
        impl #impl_generics optimistic_cache::Entity for #name #ty_generics #where_clause {
            const COLLECTION: &'static str = #collection;
            const NAME: &'static str = #entity_name;
            const ID_FIELD: &'static str = #id_name;

            type Id = #id_ty;

            fn id(&self) -> &Self::Id {
                &self.#id_field
            }
        }
    })
}

#[derive(Default)]
struct StructAttrs {
    collection: Option<String>,
    name: Option<String>,
}

fn extract_struct_attrs(input: &DeriveInput) -> syn::Result<StructAttrs> {
    let mut attrs = StructAttrs::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.collection = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `collection` or `name`"))
            }
        })?;
    }

    Ok(attrs)
}

fn extract_id_field(input: &DeriveInput) -> syn::Result<&Field> {
    let fields = match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields) => fields,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Entity derive requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Entity derive only supports structs",
            ))
        }
    };

    for field in &fields.named {
        for attr in &field.attrs {
            if !attr.path().is_ident("entity") {
                continue;
            }

            let mut is_id = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    is_id = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `id`"))
                }
            })?;

            if is_id {
                return Ok(field);
            }
        }
    }

    // Default: look for a field named "id"
    for field in &fields.named {
        if field.ident.as_ref().is_some_and(|ident| ident == "id") {
            return Ok(field);
        }
    }

    Err(syn::Error::new_spanned(
        &input.ident,
        "Entity derive: no field marked with #[entity(id)] and no field named `id`",
    ))
}

/// The key serde reads the field from: its `#[serde(rename)]`, else the
/// container's `rename_all` rule applied to the field name.
fn serialized_name(container: &[Attribute], field: &Field, ident: &str) -> String {
    if let Some(rename) = serde_value(&field.attrs, "rename") {
        return rename;
    }
    match serde_value(container, "rename_all") {
        Some(rule) => apply_rename_rule(&rule, ident),
        None => ident.to_string(),
    }
}

/// Value of `#[serde(key = "...")]`, or of the `deserialize` half of
/// `#[serde(key(serialize = "...", deserialize = "..."))]`.
fn serde_value(attrs: &[Attribute], key: &str) -> Option<String> {
    let mut found = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let Ok(metas) = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
        else {
            continue;
        };
        for meta in metas {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident(key) => {
                    found = lit_str(&nv.value).or(found);
                }
                Meta::List(list) if list.path.is_ident(key) => {
                    let Ok(halves) =
                        list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
                    else {
                        continue;
                    };
                    for half in halves {
                        if let Meta::NameValue(nv) = half {
                            if nv.path.is_ident("deserialize") {
                                found = lit_str(&nv.value).or(found);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    found
}

fn lit_str(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(expr) => match &expr.lit {
            Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}

/// serde's `rename_all` rules for snake_case field names.
fn apply_rename_rule(rule: &str, field: &str) -> String {
    match rule {
        "lowercase" => field.to_ascii_lowercase(),
        "UPPERCASE" | "SCREAMING_SNAKE_CASE" => field.to_ascii_uppercase(),
        "PascalCase" => pascal_case(field),
        "camelCase" => {
            let pascal = pascal_case(field);
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                None => pascal,
            }
        }
        "kebab-case" => field.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => field.replace('_', "-").to_ascii_uppercase(),
        _ => field.to_string(),
    }
}

fn pascal_case(field: &str) -> String {
    let mut result = String::new();
    let mut capitalize = true;
    for ch in field.chars() {
        if ch == '_' {
            capitalize = true;
        } else if capitalize {
            result.push(ch.to_ascii_uppercase());
            capitalize = false;
        } else {
            result.push(ch);
        }
    }
    result
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
