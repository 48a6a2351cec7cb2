use std::collections::BTreeSet;

use csrfield::csr::{CsrError, Design, FieldDescriptor, LayoutResolver, RegisterBuilder, Simulator};
use proptest::prelude::*;

use crate::common::{field, pinned, pulse};

/// Non-overlapping `(offset, size)` ranges built from `(gap, size)` pairs.
fn disjoint_ranges(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut cursor = 0;
    pairs
        .iter()
        .map(|&(gap, size)| {
            let offset = cursor + gap;
            cursor = offset + size;
            (offset, size)
        })
        .collect()
}

proptest! {
    /// Fields without offsets sit back to back from bit 0 in declaration order.
    #[test]
    fn implicit_fields_pack_contiguously(sizes in prop::collection::vec(1usize..24, 1..10)) {
        let fields: Vec<_> = sizes
            .iter()
            .enumerate()
            .map(|(index, &size)| field(&format!("f{index}"), size))
            .collect();
        let layout = LayoutResolver::new().resolve(fields).expect("no overlap possible");
        let mut expected = 0;
        for (placed, &size) in layout.fields().iter().zip(&sizes) {
            prop_assert_eq!(placed.offset(), expected);
            prop_assert_eq!(placed.size(), size);
            expected += size;
        }
        prop_assert_eq!(layout.width(), expected);
        prop_assert_eq!(layout.owned_bits().count(), expected, "no gaps");
    }

    /// Explicit, disjoint ranges in any declaration order own exactly their union.
    #[test]
    fn explicit_ranges_own_their_union(
        ranges in prop::collection::vec((0usize..6, 1usize..12), 1..8)
            .prop_map(|pairs| disjoint_ranges(&pairs))
            .prop_shuffle()
    ) {
        let fields: Vec<_> = ranges
            .iter()
            .enumerate()
            .map(|(index, &(offset, size))| pinned(&format!("f{index}"), size, offset))
            .collect();
        let layout = LayoutResolver::new().resolve(fields).expect("ranges are disjoint");
        let expected: BTreeSet<usize> = ranges
            .iter()
            .flat_map(|&(offset, size)| offset..offset + size)
            .collect();
        let owned: BTreeSet<usize> = layout.owned_bits().collect();
        prop_assert_eq!(&owned, &expected);
        prop_assert_eq!(layout.width(), expected.iter().max().map_or(0, |bit| bit + 1));
    }

    /// Intersecting ranges fail, naming both fields and a bit inside the intersection.
    #[test]
    fn intersecting_ranges_are_rejected(
        (a_offset, a_size, b_size, b_offset) in (0usize..32, 1usize..16, 1usize..16)
            .prop_flat_map(|(a_offset, a_size, b_size)| {
                let low = a_offset.saturating_sub(b_size - 1);
                (Just(a_offset), Just(a_size), Just(b_size), low..a_offset + a_size)
            })
    ) {
        let err = LayoutResolver::new()
            .resolve([pinned("a", a_size, a_offset), pinned("b", b_size, b_offset)])
            .expect_err("ranges intersect");
        match err {
            CsrError::Overlap { field, existing, bit } => {
                prop_assert_eq!(field, "b");
                prop_assert_eq!(existing, "a");
                prop_assert!((a_offset..a_offset + a_size).contains(&bit));
                prop_assert!((b_offset..b_offset + b_size).contains(&bit));
            }
            other => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// Values driven into the write views come back out of the read views after a copy.
    #[test]
    fn write_then_read_round_trips(
        fields in prop::collection::vec((0usize..4, 1usize..20, any::<u64>()), 1..6)
    ) {
        let ranges = disjoint_ranges(
            &fields.iter().map(|&(gap, size, _)| (gap, size)).collect::<Vec<_>>(),
        );
        let descriptors: Vec<FieldDescriptor> = ranges
            .iter()
            .enumerate()
            .map(|(index, &(offset, size))| pinned(&format!("f{index}"), size, offset))
            .collect();
        let mut design = Design::new();
        design
            .define(
                RegisterBuilder::new("rw")
                    .readable(true)
                    .writeable(true)
                    .fields(descriptors),
            )
            .expect("define");
        let mut sim = Simulator::new(design);

        let mut expected = Vec::new();
        for (index, (&(_, size), &(_, _, raw))) in ranges.iter().zip(&fields).enumerate() {
            let value = if size >= 64 { raw } else { raw & ((1u64 << size) - 1) };
            sim.drive_field("rw", &format!("f{index}"), value).expect("drive");
            expected.push(value);
        }
        let we = sim
            .design()
            .register("rw")
            .expect("rw")
            .read_enable()
            .expect("copy strobe");
        sim.drive(we, 1).expect("copy");
        sim.tick();
        for (index, value) in expected.iter().enumerate() {
            let read = sim.read_field("rw", &format!("f{index}")).expect("read view");
            prop_assert_eq!(read.to_u64(), *value);
        }
    }

    /// A pulse view equals its raw view while write-enable is high and reads zero otherwise.
    #[test]
    fn pulse_view_tracks_write_enable(writes in prop::collection::vec(prop::option::of(0u64..16), 1..20)) {
        let mut design = Design::new();
        design
            .define(
                RegisterBuilder::new("trig")
                    .writeable(true)
                    .fields([field("arm", 1), pulse("fire", 4)]),
            )
            .expect("define");
        let mut sim = Simulator::new(design);
        let register = sim.design().register("trig").expect("trig");
        let re = register.write_enable().expect("strobe");
        let fire = register.read_view("fire").expect("fire");
        let raw = register.read_view("fire_raw").expect("raw");

        for write in writes {
            if let Some(value) = write {
                sim.host_write("trig", value << 1).expect("write");
            }
            sim.tick();
            let strobe = sim.read_u64(re);
            prop_assert_eq!(strobe, write.is_some() as u64);
            if strobe == 1 {
                prop_assert_eq!(sim.read(fire), sim.read(raw));
            } else {
                prop_assert!(sim.read(fire).is_zero());
            }
        }
    }
}
