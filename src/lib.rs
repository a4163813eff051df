//! Mines fragment names (amines and the like) out of long, often malformed IUPAC names
//! and converts them to structure notation with an external name-to-structure converter.

mod scan;
pub use scan::*;

mod substitute;
pub use substitute::*;

mod extend;
pub use extend::*;

mod suggest;
pub use suggest::*;

mod convert;
pub use convert::*;

mod finder;
pub use finder::*;

mod presets;
pub use presets::*;

mod batch;
pub use batch::*;

/// Installs a `tracing` fmt subscriber at `level` ("trace", "debug", "info", ...).
/// Unknown levels fall back to "info". Later calls are no-ops.
pub fn init_logging(level: &str) {
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
