//! Static forwarding for Rust traits
//!
//! `forward_interface!` implements a Rust trait on a thin wrapper around an
//! adapter. Each trait method forwards to one named member of the proxied
//! interface, declared there or inherited from a base, and converts the
//! result with `TryFrom<Value>`. Trait methods must return
//! `interface_proxy::Result<T>`.
//!
//! ```ignore
//! pub trait Widget {
//!     fn title(&self) -> interface_proxy::Result<String>;
//!     fn set_title(&self, value: String) -> interface_proxy::Result<()>;
//!     fn resize(&self, w: i32, h: i32) -> interface_proxy::Result<i64>;
//! }
//!
//! forward_interface! {
//!     pub struct WidgetProxy: Widget = "ui.IWidget" {
//!         fn title(&self) -> String => Get "Title";
//!         fn set_title(&self, value: String) -> () => Set "Title";
//!         fn resize(&self, w: i32, h: i32) -> i64 => Call "Resize";
//!     }
//! }
//! ```

/// Implement a trait by forwarding each method through an adapter
#[macro_export]
macro_rules! forward_interface {
    (
        $(#[$meta:meta])*
        $vis:vis struct $proxy:ident : $trait_:path = $iface:literal {
            $(
                fn $method:ident(&self $(, $arg:ident : $arg_ty:ty)*) -> $ret:ty => $kind:ident $member:literal;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $proxy(::std::sync::Arc<$crate::Adapter>);

        impl $proxy {
            pub const INTERFACE: &'static str = $iface;

            /// Wrap an adapter whose type implements the interface
            pub fn new(adapter: ::std::sync::Arc<$crate::Adapter>) -> $crate::Result<Self> {
                if adapter.implements($iface) {
                    Ok(Self(adapter))
                } else {
                    Err($crate::ProxyError::marshaling(
                        $iface,
                        format!("{} does not implement {}", adapter.synthesized_type().name(), $iface),
                    ))
                }
            }

            pub fn adapter(&self) -> &::std::sync::Arc<$crate::Adapter> {
                &self.0
            }
        }

        impl $trait_ for $proxy {
            $(
                fn $method(&self $(, $arg: $arg_ty)*) -> $crate::Result<$ret> {
                    let args: ::std::vec::Vec<$crate::Value> = vec![$($crate::Value::from($arg)),*];
                    let value = self.0.invoke_as(
                        $iface,
                        $member,
                        $crate::DispatchKind::$kind,
                        &args,
                    )?;
                    <$ret as ::std::convert::TryFrom<$crate::Value>>::try_from(value).map_err(|e| {
                        $crate::ProxyError::marshaling(concat!($iface, ".", $member), e)
                    })
                }
            )*
        }
    };
}
