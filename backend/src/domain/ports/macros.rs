//! `define_port_error!` declares a `thiserror` enum for a port together with
//! snake_case constructors whose field arguments take `impl Into<T>`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SamplePortError {
            Offline => "sample source offline",
            Timeout { message: String } => "sample timed out: {message}",
            Throttled { retry_after_secs: u64 } => "sample throttled for {retry_after_secs}s",
            Rejected { status: u16, message: String } => "sample rejected ({status}): {message}",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(SamplePortError::offline(), SamplePortError::Offline);
        assert_eq!(SamplePortError::offline().to_string(), "sample source offline");
    }

    #[test]
    fn string_fields_accept_borrowed_input() {
        let err = SamplePortError::timeout("20s elapsed");
        assert_eq!(err.to_string(), "sample timed out: 20s elapsed");
    }

    #[test]
    fn mixed_fields_keep_declaration_order() {
        let err = SamplePortError::rejected(429_u16, "slow down");
        assert_eq!(err.to_string(), "sample rejected (429): slow down");
        assert_eq!(
            SamplePortError::throttled(30_u64).to_string(),
            "sample throttled for 30s"
        );
    }
}
