//! Boilerplate macros for declaring event types.
//!
//! An event only needs `Debug` plus an [`Event`](crate::Event)
//! implementation; these macros generate the latter so event definitions stay
//! one `derive` and one macro call.

/// Implements [`Event`](crate::Event) for a plain (non-cancellable) event
/// type.
///
/// # Usage
///
/// ```rust
/// use palisade_event_system::impl_event;
///
/// #[derive(Debug)]
/// struct WeatherChangedEvent {
///     raining: bool,
/// }
/// impl_event!(WeatherChangedEvent);
/// ```
#[macro_export]
macro_rules! impl_event {
    ($event:ty) => {
        impl $crate::Event for $event {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}

/// Implements [`Event`](crate::Event) for a cancellable event type.
///
/// The named field must be a [`CancelFlag`](crate::CancelFlag) owned by the
/// event.
///
/// # Usage
///
/// ```rust
/// use palisade_event_system::{impl_cancellable_event, CancelFlag};
///
/// #[derive(Debug)]
/// struct BlockBreakEvent {
///     y: i32,
///     cancelled: CancelFlag,
/// }
/// impl_cancellable_event!(BlockBreakEvent, cancelled);
/// ```
#[macro_export]
macro_rules! impl_cancellable_event {
    ($event:ty, $flag:ident) => {
        impl $crate::Event for $event {
            fn cancellable() -> bool
            where
                Self: Sized,
            {
                true
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn cancel_flag(&self) -> Option<&$crate::CancelFlag> {
                Some(&self.$flag)
            }
        }
    };
}
