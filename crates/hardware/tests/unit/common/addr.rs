//! Address decomposition tests.
//!
//! The 20-bit word address splits as offset `[1:0]`, index `[7:2]`,
//! tag `[19:8]`. The eviction path rebuilds a victim's address from its
//! stored tag, so composition has to be the exact inverse of decomposition.

use mcsim_core::common::CacheAddr;
use proptest::prelude::*;

#[test]
fn fields_of_a_known_address() {
    let addr = CacheAddr::new(0x447);
    assert_eq!(addr.offset(), 3);
    assert_eq!(addr.index(), 0x11);
    assert_eq!(addr.tag(), 4);
    assert_eq!(addr.dsram_index(), 0x47);
    assert_eq!(addr.mem_index(), 0x447);
}

#[test]
fn high_bits_are_masked_to_the_20_bit_space() {
    let addr = CacheAddr::new(0xFFF0_0447);
    assert_eq!(addr.raw(), 0x0_0447);
    assert_eq!(addr.tag(), 4);
}

#[test]
fn eviction_address_rebuilds_the_block_base() {
    // Victim with tag 4 at index 0x11 lives at block base 0x444.
    let victim = CacheAddr::from_parts(4, 0x11);
    assert_eq!(victim.raw(), 0x444);
    assert_eq!(victim.offset(), 0);
}

#[test]
fn with_offset_replaces_only_the_offset_bits() {
    let addr = CacheAddr::new(0x447);
    assert_eq!(addr.with_offset(0).raw(), 0x444);
    assert_eq!(addr.with_offset(2).raw(), 0x446);
    // Offsets wider than two bits are truncated.
    assert_eq!(addr.with_offset(7).raw(), 0x447);
}

proptest! {
    /// Decomposing and recomposing any address is the identity on the
    /// 20-bit space.
    #[test]
    fn fields_recompose(raw in any::<u32>()) {
        let addr = CacheAddr::new(raw);
        let rebuilt =
            CacheAddr::from_parts(addr.tag(), addr.index()).with_offset(addr.offset() as u8);
        prop_assert_eq!(rebuilt, addr);
    }
}
