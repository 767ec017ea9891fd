//! # Channel Specifier Encoding Constants and Helpers
//!
//! Field layout of a packed channel specifier (`CR_PACK` in the driver
//! headers).
//!
//! ## Format (32-bit)
//!
//! ```text
//! [flags:6][aref:2][range:8][unused:8][channel:8]
//!  31..26   25..24  23..16   15..8     7..0
//! ```

// ============================================================================
// Bit Position Constants
// ============================================================================

/// Channel field: bits 0-7
pub const CHAN_SHIFT: u32 = 0;

/// Range index field: bits 16-23
pub const RANGE_SHIFT: u32 = 16;

/// Analog reference field: bits 24-25
pub const AREF_SHIFT: u32 = 24;

// ============================================================================
// Field Masks
// ============================================================================

/// Channel mask (8 bits, unshifted)
pub const CHAN_MASK: u32 = 0xFF;

/// Range index mask (8 bits, unshifted)
pub const RANGE_MASK: u32 = 0xFF;

/// Analog reference mask (2 bits, unshifted)
pub const AREF_MASK: u32 = 0x03;

/// Flag bits (already in place)
pub const FLAGS_FIELD_MASK: u32 = 0xFC00_0000;

// ============================================================================
// Field Extraction Functions
// ============================================================================

#[inline]
pub const fn extract_chan(spec: u32) -> u32 {
    (spec >> CHAN_SHIFT) & CHAN_MASK
}

#[inline]
pub const fn extract_range(spec: u32) -> u32 {
    (spec >> RANGE_SHIFT) & RANGE_MASK
}

#[inline]
pub const fn extract_aref(spec: u32) -> u32 {
    (spec >> AREF_SHIFT) & AREF_MASK
}

/// Flag bits, restricted to `family_mask`
#[inline]
pub const fn extract_flags(spec: u32, family_mask: u32) -> u32 {
    spec & FLAGS_FIELD_MASK & family_mask
}

// ============================================================================
// Field Insertion Functions
// ============================================================================

/// Replace the channel field, leaving the others alone
#[inline]
pub const fn insert_chan(spec: u32, chan: u32) -> u32 {
    (spec & !(CHAN_MASK << CHAN_SHIFT)) | ((chan & CHAN_MASK) << CHAN_SHIFT)
}

#[inline]
pub const fn insert_range(spec: u32, range: u32) -> u32 {
    (spec & !(RANGE_MASK << RANGE_SHIFT)) | ((range & RANGE_MASK) << RANGE_SHIFT)
}

#[inline]
pub const fn insert_aref(spec: u32, aref: u32) -> u32 {
    (spec & !(AREF_MASK << AREF_SHIFT)) | ((aref & AREF_MASK) << AREF_SHIFT)
}

#[inline]
pub const fn insert_flags(spec: u32, flags: u32, family_mask: u32) -> u32 {
    (spec & !FLAGS_FIELD_MASK) | extract_flags(flags, family_mask)
}

// ============================================================================
// Packing
// ============================================================================

/// Pack a channel specifier without a flag family (`CR_PACK`)
#[inline]
pub const fn cr_pack(chan: u32, range: u32, aref: u32) -> u32 {
    ((chan & CHAN_MASK) << CHAN_SHIFT)
        | ((range & RANGE_MASK) << RANGE_SHIFT)
        | ((aref & AREF_MASK) << AREF_SHIFT)
}

/// Pack a channel specifier including flag bits (`CR_PACK_FLAGS`)
#[inline]
pub const fn cr_pack_flags(chan: u32, range: u32, aref: u32, flags: u32, family_mask: u32) -> u32 {
    cr_pack(chan, range, aref) | extract_flags(flags, family_mask)
}
