//! Dependency injection infrastructure.
//!
//! Services are resolved from the application [`Context`](crate::context::Context)
//! through the `FromRef` trait: the context provides each shared
//! collaborator, and a service builds itself by resolving its fields.
//!
//! # Example
//!
//! ```ignore
//! use stackscan::di::FromRef;
//! use stackscan::services::AnalysisService;
//!
//! let analysis = AnalysisService::from_ref(&ctx);
//! let techs = analysis.analyze_url("https://github.com/acme/widgets").await?;
//! ```

/// Trait for extracting a value from a reference to another type.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Blanket implementation: any Clone type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

/// Implements `FromRef<$ctx>` for each listed field type by cloning the field.
#[macro_export]
macro_rules! provide {
    ($ctx:ty { $($field:ident: $ty:ty),* $(,)? }) => {
        $(
            impl $crate::di::FromRef<$ctx> for $ty {
                fn from_ref(ctx: &$ctx) -> Self {
                    ctx.$field.clone()
                }
            }
        )*
    };
}
