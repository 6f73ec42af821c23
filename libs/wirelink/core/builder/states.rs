//! Type-state markers for the builder pattern
//!
//! The endpoint URL is the only required setting; `build()` exists only
//! once it has been supplied.

/// Marker trait for URL state
pub trait UrlState {}

/// URL has not been set
pub struct NoUrl;
impl UrlState for NoUrl {}

/// URL has been set
pub struct HasUrl;
impl UrlState for HasUrl {}
