//! Save Slot Format
//!
//! The host hands a voice a small byte slot to persist between sessions.
//! Layout:
//!
//! | byte | content                        |
//! |------|--------------------------------|
//! | 0    | [`SLOT_VERSION`]               |
//! | 1..9 | parameters in `ParamId` order  |
//!
//! An empty slot is valid and means "nothing saved".

use crate::mapper::{Parameters, PARAM_COUNT};

pub const SLOT_VERSION: u8 = 1;

/// Bytes needed to save a voice.
pub const SLOT_SIZE: usize = 1 + PARAM_COUNT;

/// Error type for save slot operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// Slot is shorter than the format needs
    SlotTooSmall { needed: usize, available: usize },
    /// Slot was written by an unknown format version
    UnsupportedVersion(u8),
}

impl core::fmt::Display for StateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StateError::SlotTooSmall { needed, available } => {
                write!(f, "Save slot too small: need {} bytes, have {}", needed, available)
            }
            StateError::UnsupportedVersion(v) => write!(f, "Unsupported save slot version: {}", v),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StateError {}

/// Write `params` into `slot`. Returns the bytes written.
pub fn pack(params: &Parameters, slot: &mut [u8]) -> Result<usize, StateError> {
    if slot.len() < SLOT_SIZE {
        return Err(StateError::SlotTooSmall {
            needed: SLOT_SIZE,
            available: slot.len(),
        });
    }
    slot[0] = SLOT_VERSION;
    slot[1..SLOT_SIZE].copy_from_slice(&params.to_bytes());
    Ok(SLOT_SIZE)
}

/// Read a slot. `Ok(None)` for an empty slot; values are clamped to range.
pub fn unpack(slot: &[u8]) -> Result<Option<Parameters>, StateError> {
    let Some((&version, body)) = slot.split_first() else {
        return Ok(None);
    };
    if version != SLOT_VERSION {
        return Err(StateError::UnsupportedVersion(version));
    }
    if body.len() < PARAM_COUNT {
        return Err(StateError::SlotTooSmall {
            needed: SLOT_SIZE,
            available: slot.len(),
        });
    }
    Ok(Some(Parameters::from_bytes(&body[..PARAM_COUNT])))
}
