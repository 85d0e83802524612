use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use proc_macro_crate::{crate_name, FoundCrate};
use quote::{quote, quote_spanned};
use syn::{
  parse::Parse, parse_macro_input, spanned::Spanned, Attribute, Data, DataStruct, DeriveInput,
  Error as SynError, Field, Fields, Ident, LitInt, Result as SynResult, Type
};

struct FieldInfo {
  field:           Field,
  previous_type:   Option<Type>,
  relative_offset: usize,
  absolute_offset: usize
}

struct StructInfo {
  derived: DeriveInput,
  fields:  Vec<FieldInfo>
}

impl StructInfo {
  fn get_data_struct(input: &DeriveInput) -> SynResult<&DataStruct> {
    match &input.data {
      Data::Struct(data) => Ok(data),
      Data::Enum(data) => {
        Err(SynError::new_spanned(
          data.enum_token,
          "Expected struct but found enum."
        ))
      }
      Data::Union(data) => {
        Err(SynError::new_spanned(
          data.union_token,
          "Expected struct but found union."
        ))
      }
    }
  }

  fn get_field_offset_value(attr: &Attribute) -> SynResult<usize> {
    attr
      .parse_args::<LitInt>()
      .and_then(|lit| lit.base10_parse::<usize>())
      .map_err(|_| SynError::new_spanned(attr, "Field offset must be an integer literal."))
  }

  fn get_fields(data: &DataStruct) -> SynResult<Vec<FieldInfo>> {
    let Fields::Named(named) = &data.fields else {
      return Err(SynError::new_spanned(
        &data.fields,
        "Expected a struct with named fields."
      ));
    };

    let mut result = Vec::<FieldInfo>::new();

    let mut current_offset = 0usize;
    let mut previous_type: Option<Type> = None;
    for field in &named.named {
      let field_offset = field
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("field_offset"));

      let offset = field_offset
        .ok_or_else(|| SynError::new_spanned(field, "Field is missing a field_offset."))
        .and_then(Self::get_field_offset_value)?;

      // the first field may sit at 0, every later one has to move forward
      if previous_type.is_some() && current_offset >= offset {
        return Err(SynError::new_spanned(
          field_offset,
          "Field offset can't be lower or equal to its predecessor."
        ));
      }

      result.push(FieldInfo {
        field:           field.clone(),
        previous_type:   previous_type.clone(),
        relative_offset: offset - current_offset,
        absolute_offset: offset
      });

      previous_type = Some(field.ty.clone());
      current_offset = offset
    }

    Ok(result)
  }
}

impl Parse for StructInfo {
  fn parse(input: syn::parse::ParseStream) -> SynResult<Self> {
    let input: DeriveInput = input.parse()?;

    if !input.generics.params.is_empty() {
      return Err(SynError::new_spanned(
        &input.generics,
        "Generic structs are not supported."
      ));
    }

    let data = Self::get_data_struct(&input)?;
    let fields = Self::get_fields(data)?;

    Ok(StructInfo {
      derived: input,
      fields
    })
  }
}

fn runtime_crate() -> TokenStream2 {
  match crate_name("struct-layout") {
    Ok(FoundCrate::Name(name)) => {
      let ident = Ident::new(&name, Span::call_site());
      quote!(::#ident)
    }
    Ok(FoundCrate::Itself) | Err(_) => quote!(::struct_layout)
  }
}

/// Gives a struct an explicit, checked memory layout.
///
/// All fields in the struct have to be annotated with a `field_offset` attribute holding an int
/// literal, and must be defined in-order. The optional argument is the total size of the struct;
/// the gap after the last field is filled with padding up to that size.
///
/// The struct becomes `repr(C)` with hidden `__padN` byte arrays in every gap, so it has no
/// implicit padding left (and can derive `bytemuck::Pod`). The declared offsets and size are
/// asserted at compile time, and the struct implements `struct_layout::FixedLayout`.
///
/// <p style="background:rgba(255,181,77,0.16);padding:0.75em;">
/// <strong>Warning:</strong> The attribute has to be defined before any derive attributes.
/// </p>
///
/// # Example
/// ```rust,ignore
/// use ::struct_layout::fixed_layout;
///
/// #[fixed_layout(16)]
/// pub struct Example {
///   #[field_offset(0)]
///   a: i64,
///   #[field_offset(8)]
///   b: i32
/// }
///
/// assert_eq!(::core::mem::size_of::<Example>(), 16);
/// ```
///
/// Will expand to (plus the assertions and the `FixedLayout` impl):
/// ```rust,ignore
/// #[repr(C)]
/// pub struct Example {
///   #[doc(hidden)]
///   __pad0: [u8; 0usize],
///   a:      i64,
///   #[doc(hidden)]
///   __pad1: [u8; 8usize - ::core::mem::size_of::<i64>()],
///   b:      i32,
///   #[doc(hidden)]
///   __pad2: [u8; 8usize - ::core::mem::size_of::<i32>()]
/// }
/// ```
#[proc_macro_attribute]
pub fn fixed_layout(attr: TokenStream, input: TokenStream) -> TokenStream {
  let struct_info = parse_macro_input!(input as StructInfo);

  let attr_value = parse_macro_input!(attr as Option<LitInt>);

  let desired_size = if let Some(lit) = attr_value {
    let Ok(r) = lit.base10_parse::<usize>() else {
      return quote_spanned!(
        lit.span() =>
        compile_error!("Struct size must be an integer literal.");
      )
      .into();
    };
    Some(r)
  } else {
    None
  };

  if let Some(attr) = struct_info
    .derived
    .attrs
    .iter()
    .find(|attr| attr.path().is_ident("repr"))
  {
    return quote_spanned!(
      attr.span() =>
      compile_error!("Adding `repr` manually is not supported.");
    )
    .into();
  }

  let name = &struct_info.derived.ident;
  let krate = runtime_crate();

  let mut fields = Vec::with_capacity(struct_info.fields.len() + 1);
  let mut offset_checks = Vec::with_capacity(struct_info.fields.len());
  let mut descriptors = Vec::with_capacity(struct_info.fields.len());

  for (i, f) in struct_info.fields.iter().enumerate() {
    let Some(ident) = f.field.ident.as_ref() else {
      continue;
    };
    let typename = &f.field.ty;
    let vis = &f.field.vis;
    let relative_offset = f.relative_offset;
    let absolute_offset = f.absolute_offset;
    let pad_ident = Ident::new(&format!("__pad{i}"), ident.span());
    let attrs = f
      .field
      .attrs
      .iter()
      .filter(|attr| !attr.path().is_ident("field_offset"));

    fields.push(match &f.previous_type {
      Some(ty) => {
        quote! {
          #[doc(hidden)]
          #pad_ident: [u8; #relative_offset - ::core::mem::size_of::<#ty>()],
          #(#attrs)*
          #vis #ident: #typename
        }
      }
      None => {
        quote! {
          #[doc(hidden)]
          #pad_ident: [u8; #relative_offset],
          #(#attrs)*
          #vis #ident: #typename
        }
      }
    });

    let message = format!("offset of `{name}::{ident}` is not {absolute_offset}");
    offset_checks.push(quote! {
      assert!(::core::mem::offset_of!(#name, #ident) == #absolute_offset, #message);
    });

    let field_name = ident.to_string();
    descriptors.push(quote! {
      #krate::FieldLayout {
        name:   #field_name,
        offset: #absolute_offset,
        size:   ::core::mem::size_of::<#typename>()
      }
    });
  }

  let mut size_check = None;
  if let Some(size) = desired_size {
    let pad_ident = Ident::new(
      &format!("__pad{}", struct_info.fields.len()),
      Span::call_site()
    );
    if let Some(last_field) = struct_info.fields.last() {
      let last_offset = last_field.absolute_offset;
      let prev_type = &last_field.field.ty;
      let Some(required_padding) = size.checked_sub(last_offset) else {
        return quote!(
          compile_error!("Desired struct size is lower than the highest field offset.");
        )
        .into();
      };

      fields.push(quote! {
        #[doc(hidden)]
        #pad_ident: [u8; #required_padding - ::core::mem::size_of::<#prev_type>()]
      })
    } else {
      fields.push(quote! {
        #[doc(hidden)]
        #pad_ident: [u8; #size]
      })
    }

    let message = format!("size of `{name}` is not {size}");
    size_check = Some(quote! {
      assert!(::core::mem::size_of::<#name>() == #size, #message);
    });
  }

  let vis = &struct_info.derived.vis;
  let attrs = &struct_info.derived.attrs;

  quote! {
    #[repr(C)]
    #(#attrs)*
    #vis struct #name {
      #(#fields),*
    }

    const _: () = {
      #size_check
      #(#offset_checks)*
    };

    impl #krate::FixedLayout for #name {
      const FIELDS: &'static [#krate::FieldLayout] = &[#(#descriptors),*];
    }
  }
  .into()
}
