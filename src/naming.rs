//! Diagnostic names for synthesized injectors.
//!
//! Names come from a process-wide counter, so they are unique for the life of
//! the process. They exist for logs and debugging and never affect behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use xxhash_rust::xxh64::xxh64;

use crate::options::InjectorOptions;

static NEXT_INJECTOR: AtomicU64 = AtomicU64::new(1);

const NAME_SEED: u64 = 0x6a09e667f3bcc909;

/// Take the next injector name.
///
/// Tagged names are the prefix followed by 32 hex digits: a scrambled copy
/// of the counter, then the counter itself.
pub(crate) fn next_name(options: &InjectorOptions) -> Arc<str> {
    if !options.tag_names() {
        return Arc::from(options.name_prefix());
    }
    let serial = NEXT_INJECTOR.fetch_add(1, Ordering::Relaxed);
    let scrambled = xxh64(&serial.to_le_bytes(), NAME_SEED);
    Arc::from(format!(
        "{}{scrambled:016x}{serial:016x}",
        options.name_prefix()
    ))
}
