// Receipt domain: amounts, records, business profiles and request validation.
// The HTTP handlers here only parse the form and hand off to the layout engine.

pub mod handlers;
pub mod models;
pub mod money;
pub mod profile;
pub mod validation;
