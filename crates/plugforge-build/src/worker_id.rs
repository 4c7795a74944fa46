//! Human-readable worker identifiers
//!
//! Each plugin build is tagged with a short id so interleaved output from
//! concurrent workers stays attributable. Ids rotate through a fixed table;
//! the starting offset is randomized per run so consecutive runs do not
//! produce identical log signatures.

use rand::Rng;

/// Identifier table, reused cyclically
pub const WORKER_IDS: &[&str] = &[
    "\u{1F435}", // monkey
    "\u{1F43C}", // panda
    "\u{1F436}", // dog
    "\u{1F430}", // rabbit
    "\u{1F98A}", // fox
    "\u{1F431}", // cat
    "\u{1F981}", // lion
    "\u{1F42F}", // tiger
    "\u{1F42E}", // cow
    "\u{1F437}", // pig
    "\u{1F42D}", // mouse
    "\u{1F428}", // koala
];

/// Id for the unit at `index` given a rotation `offset`
pub fn worker_id(ids: &[&'static str], index: usize, offset: usize) -> &'static str {
    if ids.is_empty() {
        return "worker";
    }
    ids[index.wrapping_add(offset) % ids.len()]
}

/// Draw a rotation offset for this run
pub fn random_offset(table_len: usize) -> usize {
    if table_len == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..table_len)
}
