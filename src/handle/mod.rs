//! Correlation handles held by the test body
//!
//! Handles are opaque, non-owning tokens tying test-side requests to specific
//! executions: [`MockCallHandle`] for claimed call events,
//! [`SignatureHandle`] for its statically-typed refinement, [`ResultHandle`]
//! for observed completions, and [`EventHandle`] when a wait may yield either.

mod call;
mod event;
mod result;

pub use call::{MockCallHandle, SignatureHandle};
pub use event::EventHandle;
pub use result::ResultHandle;
