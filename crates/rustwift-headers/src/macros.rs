/// Accessor for a read-only well-known field.
macro_rules! read_only_field {
    ($(#[$doc:meta])* $name:ident: $kind:ty = $key:literal) => {
        $(#[$doc])*
        #[must_use]
        pub fn $name(&self) -> $crate::Field<&$crate::Headers, $kind> {
            $crate::Field::new(&self.0, $key)
        }
    };
}

/// Accessor pair for a read-write well-known field.
macro_rules! read_write_field {
    ($(#[$doc:meta])* $name:ident, $name_mut:ident: $kind:ty = $key:literal) => {
        read_only_field!($(#[$doc])* $name: $kind = $key);

        $(#[$doc])*
        pub fn $name_mut(&mut self) -> $crate::Field<&mut $crate::Headers, $kind> {
            $crate::Field::new(&mut self.0, $key)
        }
    };
}

/// Shared plumbing for the per-resource header sets.
macro_rules! header_set {
    ($ty:ident, meta = $meta:literal, unsigned = [$($u:literal),* $(,)?], times = [$($t:literal),* $(,)?]) => {
        impl $ty {
            /// Create an empty header set.
            #[must_use]
            pub fn new() -> Self {
                Self($crate::Headers::new())
            }

            /// Wrap a raw header map.
            #[must_use]
            pub fn from_headers(headers: $crate::Headers) -> Self {
                Self(headers)
            }

            /// Unwrap into the raw header map.
            #[must_use]
            pub fn into_headers(self) -> $crate::Headers {
                self.0
            }

            /// Parse from an HTTP response header map.
            #[must_use]
            pub fn from_header_map(map: &::http::HeaderMap) -> Self {
                Self($crate::Headers::from_header_map(map))
            }

            /// User-defined metadata (keys below the metadata prefix).
            #[must_use]
            pub fn metadata(&self) -> $crate::Metadata<&$crate::Headers> {
                $crate::Metadata::new(&self.0, $meta)
            }

            /// Mutable access to user-defined metadata.
            pub fn metadata_mut(&mut self) -> $crate::Metadata<&mut $crate::Headers> {
                $crate::Metadata::new(&mut self.0, $meta)
            }

            /// Check that every well-known typed field parses.
            ///
            /// Returns the first malformed field.
            pub fn validate(&self) -> Result<(), $crate::HeaderError> {
                $(
                    $crate::Field::<_, $crate::Unsigned>::new(&self.0, $u).validate()?;
                )*
                $(
                    $crate::Field::<_, $crate::UnixTime>::new(&self.0, $t).validate()?;
                )*
                Ok(())
            }
        }

        impl ::std::ops::Deref for $ty {
            type Target = $crate::Headers;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::ops::DerefMut for $ty {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl From<$crate::Headers> for $ty {
            fn from(headers: $crate::Headers) -> Self {
                Self(headers)
            }
        }
    };
}
