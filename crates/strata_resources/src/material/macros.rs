/// Generates the setter/getter pair for each modifier slot.
///
/// Every setter invalidates the finalized GPU block. Filling or clearing a
/// texture slot changes the structure and releases the identifier as well.
macro_rules! impl_modifier_api {
    (
        // (field, doc)
        $(($field:ident, $doc:expr)),* $(,)?
    ) => {
        impl $crate::material::Material {
            $(
                paste::paste! {
                    #[doc = $doc]
                    pub fn [<set_ $field _value>](&mut self, value: $crate::value::MaterialValue) {
                        self.modifiers.$field = value;
                        self.invalidate();
                    }

                    #[doc = $doc]
                    #[must_use]
                    pub fn [<$field _value>](&self) -> &$crate::value::MaterialValue {
                        &self.modifiers.$field
                    }
                }
            )*
        }
    };
}

pub(crate) use impl_modifier_api;
