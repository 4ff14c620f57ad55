//! Element types known at compile time.

use crate::expr::ElementType;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A Rust type that elements of a query can be viewed as.
///
/// Typed handles (`Query<T>`) carry `T::element_type()` as their declared
/// element type and decode engine values into `T` with serde.
///
/// ```ignore
/// #[derive(Deserialize)]
/// struct Customer { id: u64, name: String }
///
/// impl Element for Customer {
///     const NAME: &'static str = "Customer";
/// }
/// ```
pub trait Element: DeserializeOwned + Send + Sync + 'static {
    /// Name used in trees and in the element registry
    const NAME: &'static str;

    fn element_type() -> ElementType {
        ElementType::named(Self::NAME)
    }
}

/// Raw JSON elements, for callers without a domain type
impl Element for Value {
    const NAME: &'static str = "json";
}
