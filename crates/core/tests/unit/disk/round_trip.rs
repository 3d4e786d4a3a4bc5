//! Property tests: file-contents round trips.

use proptest::prelude::*;

use osim_core::config::DiskConfig;
use osim_core::disk::DiskDriver;

proptest! {
    /// Any printable ASCII payload survives `write` then `read` exactly.
    #[test]
    fn prop_write_read_round_trip(payload in "[ -~]{0,600}") {
        let mut disk = DiskDriver::new(&DiskConfig::default());
        disk.format();
        disk.create("f").unwrap();
        disk.write("f", &payload).unwrap();
        prop_assert_eq!(disk.read("f").unwrap(), payload);
    }

    /// Rewrites converge: the last write wins regardless of what came before.
    #[test]
    fn prop_last_write_wins(first in "[ -~]{0,300}", second in "[ -~]{0,300}") {
        let mut disk = DiskDriver::new(&DiskConfig::default());
        disk.format();
        disk.create("f").unwrap();
        disk.write("f", &first).unwrap();
        disk.write("f", &second).unwrap();
        prop_assert_eq!(disk.read("f").unwrap(), second);
    }
}
