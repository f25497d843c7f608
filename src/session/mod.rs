//! The AR session: wires tracker, renderer, controller and capture together per tick.

/// The session type and its tap/tick results.
pub mod ar_session;
