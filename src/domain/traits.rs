// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The loader reads tables through DatasetSource so it does not
// care whether the bytes came over HTTP or from a local file.
// Tests feed it in-memory tables through the same trait.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

// ─── DatasetSource ───────────────────────────────────────────────────────────
/// Anything that can hand back the full text of a delimited table.
///
/// Implementations:
///   - RemoteSource → blocking HTTP GET
///   - LocalSource  → file on disk
pub trait DatasetSource {
    /// Human readable location, used in log lines and error context.
    fn describe(&self) -> String;

    /// Return the whole table as text.
    fn read_to_string(&self) -> Result<String>;
}
