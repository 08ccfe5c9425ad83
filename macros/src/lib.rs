//! `#[derive(RegisterBlock)]`: generates a peripheral's bus-facing
//! `read`/`write` dispatch from `#[reg(..)]`-annotated struct fields, so a
//! peripheral author writes only field declarations, not a hand-rolled match
//! over word offsets.
//!
//! ```ignore
//! #[derive(RegisterBlock)]
//! struct Gpio {
//!     #[reg(addr = 0, mode = "rw")]
//!     output: u32,
//!     #[reg(addr = 1, mode = "r")]
//!     input: u32,
//! }
//! ```
//!
//! generates an `impl crate::register_block::RegisterBlock for Gpio`. Reads
//! of a write-only register and writes to a read-only one return/discard
//! silently — same "no illegal-access trap" policy the core applies to
//! unmapped CSRs and bus addresses.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitInt, LitStr};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    R,
    W,
    Rw,
}

struct RegField {
    ident: syn::Ident,
    addr: u32,
    mode: Mode,
}

fn parse_reg_attr(field: &syn::Field) -> Option<RegField> {
    let ident = field.ident.clone()?;
    let attr = field.attrs.iter().find(|a| a.path().is_ident("reg"))?;

    let mut addr: Option<u32> = None;
    let mut mode = Mode::Rw;

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("addr") {
            let value = meta.value()?;
            let lit: LitInt = value.parse()?;
            addr = Some(lit.base10_parse()?);
        } else if meta.path.is_ident("mode") {
            let value = meta.value()?;
            let lit: LitStr = value.parse()?;
            mode = match lit.value().as_str() {
                "r" => Mode::R,
                "w" => Mode::W,
                "rw" => Mode::Rw,
                other => return Err(meta.error(format!("unknown reg mode `{other}`, expected r/w/rw"))),
            };
        } else {
            return Err(meta.error("unknown `reg` attribute key"));
        }
        Ok(())
    })
    .ok()?;

    Some(RegField { ident, addr: addr?, mode })
}

#[proc_macro_derive(RegisterBlock, attributes(reg))]
pub fn derive_register_block(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Struct(data) = &input.data else {
        return syn::Error::new_spanned(&input, "RegisterBlock can only be derived for structs")
            .to_compile_error()
            .into();
    };
    let Fields::Named(fields) = &data.fields else {
        return syn::Error::new_spanned(&input, "RegisterBlock requires named fields")
            .to_compile_error()
            .into();
    };

    let regs: Vec<RegField> = fields.named.iter().filter_map(parse_reg_attr).collect();

    let read_arms = regs.iter().map(|r| {
        let ident = &r.ident;
        let addr = r.addr;
        match r.mode {
            Mode::R | Mode::Rw => quote! { #addr => self.#ident, },
            Mode::W => quote! { #addr => 0, },
        }
    });

    let write_arms = regs.iter().map(|r| {
        let ident = &r.ident;
        let addr = r.addr;
        match r.mode {
            Mode::W | Mode::Rw => quote! { #addr => { self.#ident = value; } },
            Mode::R => quote! { #addr => {} },
        }
    });

    let expanded = quote! {
        impl crate::register_block::RegisterBlock for #name {
            fn read_register(&self, addr: u32) -> u32 {
                match addr {
                    #(#read_arms)*
                    _ => 0,
                }
            }

            fn write_register(&mut self, addr: u32, value: u32) {
                match addr {
                    #(#write_arms)*
                    _ => {}
                }
            }
        }
    };

    expanded.into()
}
