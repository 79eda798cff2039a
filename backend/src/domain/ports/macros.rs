//! `define_port_error!`: declares a driven-port error enum together with
//! snake_case constructors for each variant.
//!
//! Every variant carries named fields. Constructors take `impl Into<T>` for
//! each field, so adapters can write `DeviceRepositoryError::query(err.to_string())`
//! or pass a `&str` directly.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),* $(,)? } => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $($field : $ty),* },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = "Build the `" $variant "` variant."]
                    pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                        Self::$variant { $($field: $field.into()),* }
                    }
                }
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SamplePortError {
            Connection { message: String } => "connection failed: {message}",
            DuplicateSerial { serial_number: String } => "device {serial_number} exists",
            Stale { serial_number: String, behind_secs: u32 } =>
                "{serial_number} is {behind_secs}s behind",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SamplePortError::connection("refused");
        assert_eq!(err.to_string(), "connection failed: refused");
    }

    #[test]
    fn constructor_names_are_snake_case() {
        let err = SamplePortError::duplicate_serial("DEV-1");
        assert_eq!(
            err,
            SamplePortError::DuplicateSerial {
                serial_number: "DEV-1".to_owned()
            }
        );
    }

    #[test]
    fn constructors_keep_non_string_field_types() {
        let err = SamplePortError::stale("DEV-1", 42_u32);
        assert_eq!(err.to_string(), "DEV-1 is 42s behind");
    }
}
