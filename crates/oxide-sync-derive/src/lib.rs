//! Derive macros for entity metadata.
//!
//! This crate provides the `#[derive(Entity)]` macro, which turns a struct
//! and its attributes into an `EntityDescriptor` the synchronizer consumes.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitBool, LitInt, LitStr, Meta};

/// Derives the `Entity` trait for a struct.
///
/// # Attributes
///
/// - `#[entity(table = "name")]` - SQL table name (optional, defaults to
///   snake_case of the struct name)
/// - `#[entity(primary_key = "field")]` - Primary key field (defaults to `id`)
/// - `#[entity(version = 2)]` - Schema version
/// - `#[entity(auto_sync = false)]` - Disables automatic synchronization
/// - `#[entity(comment = "...", charset = "...", collation = "...", engine = "...")]`
///
/// # Field Attributes
///
/// - `#[field(name = "column")]` - Column name (defaults to the field name)
/// - `#[field(sql_type = "VARCHAR")]` - Logical SQL type (inferred from the
///   Rust type when omitted)
/// - `#[field(length = 120)]`, `#[field(precision = 12, scale = 2)]`
/// - `#[field(nullable)]`, `#[field(not_null)]` - Override nullability
/// - `#[field(default = "literal")]`, `#[field(default_expr = "CURRENT_TIMESTAMP")]`
/// - `#[field(auto_increment)]`
/// - `#[field(comment = "...")]`
/// - `#[field(unique = "group")]` - Member of a unique group
/// - `#[field(index = "name")]` - Member of a named index
/// - `#[field(version = 2)]` - Schema version the field was added in
/// - `#[field(ignore)]` - Not persisted
#[proc_macro_derive(Entity, attributes(entity, field))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let entity = parse_entity_attrs(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity derive only supports structs",
            ));
        }
    };

    let mut field_descriptors: Vec<TokenStream2> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let field_type = &field.ty;
        let rust_type = quote!(#field_type).to_string();
        let attrs = parse_field_attrs(&field.attrs)?;
        let column_name = attrs.name.clone().unwrap_or_else(|| field_name.to_string());

        let setters = attrs.setters()?;
        field_descriptors.push(quote! {
            .field(
                ::oxide_sync::metadata::FieldDescriptor::new(#column_name)
                    .rust_type(#rust_type)
                    #(#setters)*
            )
        });
    }

    let table_name = &entity.table;
    let entity_setters = entity.setters();

    Ok(quote! {
        impl ::oxide_sync::metadata::Entity for #struct_name {
            fn descriptor() -> ::oxide_sync::metadata::EntityDescriptor {
                ::oxide_sync::metadata::EntityDescriptor::new(#table_name)
                    #(#entity_setters)*
                    #(#field_descriptors)*
            }
        }
    })
}

struct EntityAttrs {
    table: String,
    primary_key: Option<String>,
    version: Option<u32>,
    auto_sync: Option<bool>,
    comment: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
    engine: Option<String>,
}

impl EntityAttrs {
    fn setters(&self) -> Vec<TokenStream2> {
        let mut setters = Vec::new();
        if let Some(pk) = &self.primary_key {
            setters.push(quote!(.primary_key(#pk)));
        }
        if let Some(version) = self.version {
            setters.push(quote!(.schema_version(#version)));
        }
        if let Some(auto_sync) = self.auto_sync {
            setters.push(quote!(.auto_sync(#auto_sync)));
        }
        for (method, value) in [
            ("comment", &self.comment),
            ("charset", &self.charset),
            ("collation", &self.collation),
            ("engine", &self.engine),
        ] {
            if let Some(value) = value {
                let method = format_ident!("{}", method);
                setters.push(quote!(.#method(#value)));
            }
        }
        setters
    }
}

#[derive(Default)]
struct FieldAttrs {
    name: Option<String>,
    sql_type: Option<LitStr>,
    length: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
    nullable: Option<bool>,
    default_literal: Option<String>,
    default_expr: Option<String>,
    auto_increment: bool,
    comment: Option<String>,
    unique: Option<String>,
    index: Option<String>,
    version: Option<u32>,
    ignore: bool,
}

impl FieldAttrs {
    fn setters(&self) -> syn::Result<Vec<TokenStream2>> {
        let mut setters = Vec::new();
        if let Some(sql_type) = &self.sql_type {
            let variant = sql_type_variant(sql_type)?;
            setters.push(quote!(.sql_type(::oxide_sync::metadata::SqlType::#variant)));
        }
        if let Some(length) = self.length {
            setters.push(quote!(.length(#length)));
        }
        if self.precision.is_some() || self.scale.is_some() {
            let precision = self.precision.unwrap_or(0);
            let scale = self.scale.unwrap_or(0);
            setters.push(quote!(.precision(#precision, #scale)));
        }
        if let Some(nullable) = self.nullable {
            setters.push(quote!(.nullable(#nullable)));
        }
        if let Some(value) = &self.default_literal {
            setters.push(quote!(.default_literal(#value)));
        }
        if let Some(expr) = &self.default_expr {
            setters.push(quote!(.default_expression(#expr)));
        }
        if self.auto_increment {
            setters.push(quote!(.auto_increment()));
        }
        if let Some(comment) = &self.comment {
            setters.push(quote!(.comment(#comment)));
        }
        if let Some(group) = &self.unique {
            setters.push(quote!(.unique_group(#group)));
        }
        if let Some(index) = &self.index {
            setters.push(quote!(.index(#index)));
        }
        if let Some(version) = self.version {
            setters.push(quote!(.version(#version)));
        }
        if self.ignore {
            setters.push(quote!(.ignore()));
        }
        Ok(setters)
    }
}

/// Resolves a logical type name to its `SqlType` variant at compile time.
fn sql_type_variant(lit: &LitStr) -> syn::Result<Ident> {
    let variant = match lit.value().trim().to_ascii_uppercase().as_str() {
        "INT" | "INTEGER" => "Int",
        "SMALLINT" => "SmallInt",
        "TINYINT" => "TinyInt",
        "BIGINT" => "BigInt",
        "DECIMAL" | "NUMERIC" => "Decimal",
        "DOUBLE" => "Double",
        "REAL" | "FLOAT" => "Real",
        "BOOLEAN" | "BOOL" => "Boolean",
        "VARCHAR" => "Varchar",
        "TIMESTAMP" | "DATETIME" => "Timestamp",
        "DATE" => "Date",
        "TIME" => "Time",
        "TEXT" => "Text",
        other => {
            return Err(syn::Error::new_spanned(
                lit,
                format!("unknown SQL type '{}'", other),
            ))
        }
    };
    Ok(format_ident!("{}", variant))
}

fn parse_str(meta: &ParseNestedMeta) -> syn::Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    Ok(lit.value())
}

fn parse_u32(meta: &ParseNestedMeta) -> syn::Result<u32> {
    let lit: LitInt = meta.value()?.parse()?;
    lit.base10_parse()
}

fn parse_entity_attrs(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<EntityAttrs> {
    let mut result = EntityAttrs {
        table: to_snake_case(&struct_name.to_string()),
        primary_key: None,
        version: None,
        auto_sync: None,
        comment: None,
        charset: None,
        collation: None,
        engine: None,
    };

    for attr in attrs {
        if !attr.path().is_ident("entity") || matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                result.table = parse_str(&meta)?;
            } else if meta.path.is_ident("primary_key") {
                result.primary_key = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("version") {
                result.version = Some(parse_u32(&meta)?);
            } else if meta.path.is_ident("auto_sync") {
                let lit: LitBool = meta.value()?.parse()?;
                result.auto_sync = Some(lit.value);
            } else if meta.path.is_ident("comment") {
                result.comment = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("charset") {
                result.charset = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("collation") {
                result.collation = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("engine") {
                result.engine = Some(parse_str(&meta)?);
            } else {
                return Err(meta.error("unsupported entity attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        // Handle empty attribute like #[field]
        if !attr.path().is_ident("field") || matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                result.name = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("sql_type") {
                result.sql_type = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("length") {
                result.length = Some(parse_u32(&meta)?);
            } else if meta.path.is_ident("precision") {
                result.precision = Some(parse_u32(&meta)?);
            } else if meta.path.is_ident("scale") {
                result.scale = Some(parse_u32(&meta)?);
            } else if meta.path.is_ident("nullable") {
                result.nullable = Some(true);
            } else if meta.path.is_ident("not_null") {
                result.nullable = Some(false);
            } else if meta.path.is_ident("default") {
                result.default_literal = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("default_expr") {
                result.default_expr = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("auto_increment") {
                result.auto_increment = true;
            } else if meta.path.is_ident("comment") {
                result.comment = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("unique") {
                result.unique = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("index") {
                result.index = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("version") {
                result.version = Some(parse_u32(&meta)?);
            } else if meta.path.is_ident("ignore") {
                result.ignore = true;
            } else {
                return Err(meta.error("unsupported field attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
