//! Property tests for channel specifier packing

use comedi_spec::encoding::*;
use comedi_spec::{ChanSpec, Constants};
use proptest::prelude::*;

/// Flag words built only from the bits CR_* assigns
fn arb_cr_flags() -> impl Strategy<Value = u32> {
    let bits: Vec<u32> = Constants::global().cr.iter().map(|m| m.value).collect();
    proptest::sample::subsequence(bits.clone(), 0..=bits.len())
        .prop_map(|picked| picked.into_iter().fold(0, |acc, b| acc | b))
}

proptest! {
    #[test]
    fn test_pack_round_trip(
        chan in 0u32..=CHAN_MASK,
        range in 0u32..=RANGE_MASK,
        aref in 0u32..=AREF_MASK,
        flags in arb_cr_flags(),
    ) {
        let cr = &Constants::global().cr;
        let spec = ChanSpec::pack(chan, range, aref, flags, cr).unwrap();
        prop_assert_eq!(spec.channel(), chan);
        prop_assert_eq!(spec.range(), range);
        prop_assert_eq!(spec.aref_value(), aref);
        prop_assert_eq!(spec.flags_value(cr), flags);
    }

    #[test]
    fn test_set_channel_isolated(
        raw in any::<u32>(),
        chan in 0u32..=CHAN_MASK,
    ) {
        let cr = &Constants::global().cr;
        let before = ChanSpec::from_raw(raw);
        let mut after = before;
        after.set_channel(chan);
        prop_assert_eq!(after.channel(), chan);
        prop_assert_eq!(after.range(), before.range());
        prop_assert_eq!(after.aref_value(), before.aref_value());
        prop_assert_eq!(after.flags_value(cr), before.flags_value(cr));
    }

    #[test]
    fn test_set_range_isolated(
        raw in any::<u32>(),
        range in 0u32..=RANGE_MASK,
    ) {
        let cr = &Constants::global().cr;
        let before = ChanSpec::from_raw(raw);
        let mut after = before;
        after.set_range(range);
        prop_assert_eq!(after.channel(), before.channel());
        prop_assert_eq!(after.range(), range);
        prop_assert_eq!(after.aref_value(), before.aref_value());
        prop_assert_eq!(after.flags_value(cr), before.flags_value(cr));
    }

    #[test]
    fn test_set_aref_isolated(
        raw in any::<u32>(),
        aref in 0u32..=AREF_MASK,
    ) {
        let cr = &Constants::global().cr;
        let before = ChanSpec::from_raw(raw);
        let mut after = before;
        after.set_aref(aref);
        prop_assert_eq!(after.channel(), before.channel());
        prop_assert_eq!(after.range(), before.range());
        prop_assert_eq!(after.aref_value(), aref);
        prop_assert_eq!(after.flags_value(cr), before.flags_value(cr));
    }

    #[test]
    fn test_set_flags_isolated(
        raw in any::<u32>(),
        flags in arb_cr_flags(),
    ) {
        let cr = &Constants::global().cr;
        let before = ChanSpec::from_raw(raw);
        let mut after = before;
        after.set_flags(flags, cr).unwrap();
        prop_assert_eq!(after.channel(), before.channel());
        prop_assert_eq!(after.range(), before.range());
        prop_assert_eq!(after.aref_value(), before.aref_value());
        prop_assert_eq!(after.flags_value(cr), flags);
    }
}

// ============================================================================
// Fixed Examples
// ============================================================================

#[test]
fn test_diff_edge_invert() {
    let c = Constants::global();
    let diff = c.aref.index_by_name("diff").unwrap();
    let flags = c.cr.index_by_name("edge").unwrap() | c.cr.index_by_name("invert").unwrap();
    let spec = ChanSpec::pack(1, 3, diff.value, flags.value(), &c.cr).unwrap();

    assert_eq!(spec.channel(), 1);
    assert_eq!(spec.range(), 3);
    assert_eq!(spec.aref(&c.aref), Some(diff));
    assert_eq!(spec.flags(&c.cr).to_string(), "edge|invert");
}

#[test]
fn test_matches_cr_pack() {
    for chan in [0, 1, 15, 255] {
        for range in [0, 4, 255] {
            for aref in 0..4 {
                assert_eq!(
                    ChanSpec::new(chan, range, aref).value(),
                    cr_pack(chan, range, aref)
                );
            }
        }
    }
}
