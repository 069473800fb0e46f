//! Data layer: table model, loading, and category filtering.
//!
//! Architecture:
//! ```text
//!  .csv / .zip
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  sniff container → encoding ladder → Dataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Dataset  │  columnar cells, category column derived
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  category selector → FilteredView (row indices)
//!   └──────────┘
//! ```

pub mod encoding;
pub mod filter;
pub mod loader;
pub mod model;
