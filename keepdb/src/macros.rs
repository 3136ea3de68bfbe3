//! Shorthands for building [`crate::error::KeepDbError`] values.

/// Creates a [`crate::error::KeepDbError`] from a kind, a static description and optional
/// detail or source.
#[macro_export]
macro_rules! keepdb_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::KeepDbError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::KeepDbError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::KeepDbError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::KeepDbError::from(($kind, $desc, $detail.to_string()))
            .with_source($source)
    };
}

/// Returns early with a [`crate::error::KeepDbError`], see [`keepdb_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::keepdb_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::keepdb_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::keepdb_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::keepdb_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
