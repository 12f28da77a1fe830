//! The `KmlObject` contract shared by every addressable KML element.

/// Capability shared by every element that can carry an XML `id` attribute.
///
/// `id` gives an element a stable identity inside its document; `target_id`
/// points at the `id` of an element elsewhere and is only meaningful to an
/// update/merge consumer. Neither is resolved by this crate outside of the
/// document-level validation pass.
pub trait KmlObject {
    /// The element's own identifier, if assigned.
    fn id(&self) -> Option<&str>;
    /// The identifier of the element this one targets for partial updates.
    fn target_id(&self) -> Option<&str>;
}

/// Implements [`KmlObject`] for types that carry `id`/`target_id` fields
/// directly, or through an embedded `common: FeatureCommon`.
macro_rules! impl_kml_object {
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::object::KmlObject for $ty {
            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }
            fn target_id(&self) -> Option<&str> {
                self.target_id.as_deref()
            }
        })+
    };
    (via common: $($ty:ty),+ $(,)?) => {
        $(impl $crate::object::KmlObject for $ty {
            fn id(&self) -> Option<&str> {
                self.common.id.as_deref()
            }
            fn target_id(&self) -> Option<&str> {
                self.common.target_id.as_deref()
            }
        })+
    };
}

pub(crate) use impl_kml_object;
