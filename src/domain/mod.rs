// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what a time-series dataset IS.
// No Burn types and no I/O in this layer.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Labelled series and the partition that holds them
pub mod series;

// Abstractions implemented by the data layer
pub mod traits;
