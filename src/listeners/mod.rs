//! Listener registration and notification
//!
//! Listeners are held through `Weak` references to the [`RecognitionListener`]
//! capability, so registering never extends a listener's lifetime and no
//! runtime type checks are needed at dispatch time.

mod registry;

pub use registry::{ListenerHandle, ListenerRegistry, RecognitionListener};
