use csrfield::csr::{CsrError, Design, LayoutResolver, RegisterBuilder, Simulator};

use crate::common::{field, pinned, placements, pulse, resolve};

fn owned(name: &str, offset: usize, size: usize) -> (String, usize, usize) {
    (name.to_string(), offset, size)
}

#[test]
fn implicit_offsets_pack_from_zero() {
    let layout = resolve(vec![field("enable", 1), field("mode", 2), field("reserved", 5)]);
    assert_eq!(
        placements(&layout),
        [owned("enable", 0, 1), owned("mode", 1, 2), owned("reserved", 3, 5)]
    );
    assert_eq!(layout.width(), 8);
}

#[test]
fn explicit_offset_then_default() {
    let layout = resolve(vec![pinned("a", 4, 4), field("b", 4)]);
    assert_eq!(placements(&layout), [owned("a", 4, 4), owned("b", 8, 4)]);
    assert_eq!(layout.width(), 12);
}

#[test]
fn overlapping_fields_fail() {
    let err = LayoutResolver::new()
        .resolve(vec![pinned("x", 2, 0), pinned("y", 2, 1)])
        .expect_err("overlap");
    let text = err.to_string();
    assert!(text.contains('x') && text.contains('y') && text.contains("bit 1"), "got {text}");
    assert!(matches!(err, CsrError::Overlap { bit: 1, .. }));
}

#[test]
fn width_only_writeable_register_gets_hidden_storage_field() {
    let mut design = Design::new();
    let reg = design
        .define(RegisterBuilder::new("scratch").writeable(true).width(16))
        .expect("define");
    assert_eq!(placements(reg.layout()), [owned("storage", 0, 16)]);
    assert!(reg.layout().fields()[0].descriptor().is_hidden());
}

#[test]
fn pulse_field_reads_one_for_a_single_cycle() {
    let mut design = Design::new();
    design
        .define(RegisterBuilder::new("cmd").writeable(true).field(pulse("go", 1)))
        .expect("define");
    let mut sim = Simulator::new(design);

    sim.host_write("cmd", 1).expect("host write");
    sim.tick();
    let cycle_n = sim.cycle();
    assert_eq!(sim.read_field("cmd", "go").expect("go").to_u64(), 1, "cycle {cycle_n}");
    assert_eq!(sim.read_field("cmd", "go_raw").expect("raw").to_u64(), 1);

    sim.tick();
    assert_eq!(sim.read_field("cmd", "go").expect("go").to_u64(), 0, "pulse decays after one cycle");
    assert_eq!(
        sim.read_field("cmd", "go_raw").expect("raw").to_u64(),
        1,
        "storage bit stays set"
    );
}
