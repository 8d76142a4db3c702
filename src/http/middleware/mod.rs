pub mod instrument;

pub use instrument::{endpoint_label, instrument, UNKNOWN_ENDPOINT};
