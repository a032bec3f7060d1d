//! Input mapping types for workflow step configuration.
//!
//! An input mapping is an arbitrary JSON value. Any string inside it may be a
//! symbolic reference to the output of an earlier step; everything else is a
//! literal passed through as-is.
//!
//! # Examples
//!
//! ```json
//! {
//!   "item": "sku1",
//!   "amount": 100,
//!   "check": "$inv.result.available",
//!   "history": ["$draft.result.text", "$review.result.notes"],
//!   "price": "$$9.99"
//! }
//! ```
//!
//! - `"sku1"` and `100` are literals.
//! - `"$inv.result.available"` reads `result.available` of the state entry `inv`.
//! - `"$$9.99"` is the literal string `"$9.99"` (a doubled sigil escapes it).

/// An input mapping as written in the workflow definition.
///
/// References are only recognised when the definition is locked; at this layer
/// the mapping is still plain JSON.
pub type InputMappingDef = serde_json::Value;
