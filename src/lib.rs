//! Magic-ink host: generation orchestration and session replay on top of the
//! `canvas` engine.
//!
//! | Module       | Role                                                     |
//! |--------------|----------------------------------------------------------|
//! | `generation` | Snapshot, request, decode and apply a generation round   |
//! | `session`    | Load recorded sessions, replay them, export the document |
//! | `error`      | Error code conventions shared by surfaced errors         |

pub mod error;
pub mod generation;
pub mod session;
