use csrfield::csr::{Bits, Design, NamingPolicy, RegisterBuilder, Simulator};

use crate::common::{field, pinned, pulse};

fn atomic_counter() -> Simulator {
    let mut design = Design::new();
    design
        .define(
            RegisterBuilder::new("reload")
                .writeable(true)
                .atomic(true)
                .field(field("low", 16))
                .field(field("high", 16)),
        )
        .expect("define");
    Simulator::new(design)
}

#[test]
fn atomic_write_is_invisible_until_final_part() {
    let mut sim = atomic_counter();
    let re = sim
        .design()
        .register("reload")
        .expect("reload")
        .write_enable()
        .expect("strobe");

    for (part, byte) in [(3, 0xDE), (2, 0xAD), (1, 0xBE)] {
        sim.host_write_part("reload", part, byte).expect("part");
        sim.tick();
        assert_eq!(sim.host_read("reload").expect("read").to_u64(), 0, "part {part} pending");
        assert_eq!(sim.read_u64(re), 0, "no strobe while the write is pending");
    }

    sim.host_write_part("reload", 0, 0xEF).expect("final part");
    sim.tick();
    assert_eq!(sim.host_read("reload").expect("read").to_u64(), 0xDEAD_BEEF);
    assert_eq!(sim.read_field("reload", "high").expect("high").to_u64(), 0xDEAD);
    assert_eq!(sim.read_u64(re), 1, "commit pulses write-enable");

    sim.tick();
    assert_eq!(sim.read_u64(re), 0, "write-enable lasts one cycle");
    assert_eq!(sim.host_read("reload").expect("read").to_u64(), 0xDEAD_BEEF);
}

#[test]
fn abandoned_atomic_write_never_lands() {
    let mut sim = atomic_counter();
    sim.host_write_part("reload", 1, 0x55).expect("part");
    sim.run(10);
    assert_eq!(sim.host_read("reload").expect("read").to_u64(), 0);
    assert!(!sim.is_write_pending("reload").expect("reload"), "part was absorbed by the shadow copy");
}

fn bidirectional(naming: NamingPolicy) -> Simulator {
    let mut design = Design::new();
    design
        .define(
            RegisterBuilder::new("mailbox")
                .readable(true)
                .writeable(true)
                .resettable(true)
                .naming(naming)
                .fields([field("flag", 1), pinned("data", 8, 4), pulse("kick", 1)]),
        )
        .expect("define");
    Simulator::new(design)
}

#[test]
fn device_update_reaches_host_after_copy_strobe() {
    let mut sim = bidirectional(NamingPolicy::Plain);
    let register = sim.design().register("mailbox").expect("mailbox");
    let we = register.read_enable().expect("copy strobe");
    let status = register.status().expect("status word");

    sim.drive_field("mailbox", "data", 0xA5).expect("drive data");
    sim.drive_field("mailbox", "flag", 1).expect("drive flag");
    assert_eq!(sim.read_u64(status), 0xA51, "status composes immediately");
    sim.tick();
    assert_eq!(sim.host_read("mailbox").expect("read").to_u64(), 0, "storage untouched without copy");

    sim.drive(we, 1).expect("request copy");
    sim.tick();
    sim.drive(we, 0).expect("release copy");
    assert_eq!(sim.host_read("mailbox").expect("read").to_u64(), 0xA51);
    assert_eq!(sim.read_field("mailbox", "data").expect("data").to_u64(), 0xA5);
}

#[test]
fn reset_clears_storage_even_on_host_write() {
    let mut sim = bidirectional(NamingPolicy::Plain);
    let reset = sim
        .design()
        .register("mailbox")
        .expect("mailbox")
        .reset()
        .expect("resettable");
    sim.host_write("mailbox", 0x0FF1).expect("write");
    sim.tick();
    assert_eq!(sim.host_read("mailbox").expect("read").to_u64(), 0x0FF1);

    sim.drive(reset, 1).expect("assert reset");
    sim.host_write("mailbox", 0x0123).expect("write during reset");
    sim.tick();
    assert!(sim.host_read("mailbox").expect("read").is_zero());
}

#[test]
fn direction_prefixes_keep_both_view_sets_apart() {
    let sim = bidirectional(NamingPolicy::DirectionPrefixed);
    let register = sim.design().register("mailbox").expect("mailbox");
    let reads: Vec<_> = register.read_views().names().collect();
    let writes: Vec<_> = register.write_views().names().collect();
    assert_eq!(reads, ["i_flag", "i_data", "i_kick_raw", "i_kick"]);
    assert_eq!(writes, ["o_flag", "o_data", "o_kick"]);
}

#[test]
fn fields_wider_than_a_machine_word() {
    let mut design = Design::new();
    design
        .define(
            RegisterBuilder::new("key")
                .writeable(true)
                .fields([field("tag", 4), field("secret", 96)]),
        )
        .expect("define");
    let mut sim = Simulator::new(design);
    let value = (0x1234_5678_9ABC_DEF0_1122_3344u128 << 4) | 0x7;
    sim.host_write_bits("key", Bits::from_u128(100, value)).expect("write");
    sim.tick();
    assert_eq!(sim.read_field("key", "tag").expect("tag").to_u64(), 0x7);
    assert_eq!(
        sim.read_field("key", "secret").expect("secret").to_u128(),
        0x1234_5678_9ABC_DEF0_1122_3344
    );
}

#[test]
fn pulse_raw_view_names_stay_unambiguous() {
    let mut design = Design::new();
    let err = design
        .define(
            RegisterBuilder::new("cmd")
                .writeable(true)
                .field(pulse("go", 1))
                .field(field("go_raw", 3)),
        )
        .expect_err("'go_raw' would shadow the pulse field's raw view");
    assert!(err.to_string().contains("collides"), "got {err}");
    assert!(design.registers().is_empty());

    design
        .define(
            RegisterBuilder::new("cmd")
                .writeable(true)
                .field(pulse("go", 1))
                .field(field("go_count", 3)),
        )
        .expect("distinct names");
    let mut sim = Simulator::new(design);
    sim.host_write("cmd", 0b1110).expect("write");
    sim.tick();
    assert_eq!(sim.read_field("cmd", "go_count").expect("go_count").to_u64(), 7);
    assert_eq!(sim.read_field("cmd", "go_raw").expect("go_raw").to_u64(), 0);
}
