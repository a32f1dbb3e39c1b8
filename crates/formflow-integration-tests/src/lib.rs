//! Cross-crate integration tests for FormFlow
//!
//! The scenarios under `tests/` wire the Form Session Manager to every
//! session store backend and drive the HTTP step controller end to end.
