//! Short identifiers handed out to users and external systems.

use rand::Rng;
use uuid::Uuid;

use crate::constants::{DESIGN_CODE_PREFIX, DESIGN_CODE_SUFFIX_LEN};

const BASE36_UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a shareable design code such as `DL-7K2QX`.
///
/// No uniqueness check is made here; the store's unique index turns the
/// (unlikely) collision into a conflict error.
pub fn generate_design_code() -> String {
    generate_design_code_with(&mut rand::thread_rng())
}

/// Same as [`generate_design_code`] with a caller-provided RNG.
pub fn generate_design_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..DESIGN_CODE_SUFFIX_LEN)
        .map(|_| BASE36_UPPER[rng.gen_range(0..BASE36_UPPER.len())] as char)
        .collect();
    format!("{DESIGN_CODE_PREFIX}-{suffix}")
}

/// Whether `code` has the shape of a generated design code.
pub fn is_design_code(code: &str) -> bool {
    let Some((prefix, suffix)) = code.split_once('-') else {
        return false;
    };
    prefix == DESIGN_CODE_PREFIX
        && suffix.len() == DESIGN_CODE_SUFFIX_LEN
        && suffix
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Generate an unguessable owner key for use in external-facing paths.
pub fn generate_owner_key() -> String {
    Uuid::new_v4().simple().to_string()
}
