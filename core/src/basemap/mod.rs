pub mod plan;

pub use plan::{compose_base_map, DIGITAL_GLOBE_WMS};
