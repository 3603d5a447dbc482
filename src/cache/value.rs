//! Cache Value Module
//!
//! Types that can be stored in a cache.

use std::sync::Arc;

/// A value a cache can hold.
///
/// Values for which `is_null` returns true are rejected by `put`.
pub trait CacheValue: Clone {
    fn is_null(&self) -> bool {
        false
    }
}

impl CacheValue for serde_json::Value {
    fn is_null(&self) -> bool {
        serde_json::Value::is_null(self)
    }
}

impl<T: Clone> CacheValue for Option<T> {
    fn is_null(&self) -> bool {
        self.is_none()
    }
}

macro_rules! impl_cache_value {
    ($($ty:ty),* $(,)?) => {
        $(impl CacheValue for $ty {})*
    };
}

impl_cache_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str,
);

impl<T: Clone> CacheValue for Vec<T> {}

impl<T: ?Sized> CacheValue for Arc<T> {}
