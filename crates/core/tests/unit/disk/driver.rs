//! Disk driver behavior tests.

use pretty_assertions::assert_eq;

use osim_core::common::error::DiskError;
use osim_core::config::DiskConfig;
use osim_core::disk::{BlockLink, DiskDriver, Tsb};

fn formatted_disk() -> DiskDriver {
    let mut disk = DiskDriver::new(&DiskConfig::default());
    disk.format();
    disk
}

/// All TSB addresses of a disk, in lexicographic order.
fn all_tsbs(disk: &DiskDriver) -> Vec<Tsb> {
    let geom = disk.geometry().clone();
    let mut out = Vec::new();
    let mut cur = Some(Tsb::MBR);
    while let Some(tsb) = cur {
        out.push(tsb);
        cur = tsb.next(&geom);
    }
    out
}

#[test]
fn test_file_ops_fail_before_format() {
    let mut disk = DiskDriver::new(&DiskConfig::default());
    assert_eq!(disk.create("foo"), Err(DiskError::NotFormatted));
    assert_eq!(disk.read("foo"), Err(DiskError::NotFormatted));
    assert_eq!(disk.write("foo", "x"), Err(DiskError::NotFormatted));
    assert_eq!(disk.delete("foo"), Err(DiskError::NotFormatted));
    assert_eq!(disk.ls(false), Err(DiskError::NotFormatted));
    assert_eq!(disk.format_quick(), Err(DiskError::NotFormatted));
}

#[test]
fn test_format_reserves_the_mbr() {
    let disk = formatted_disk();
    let mbr = disk.record(Tsb::MBR);
    assert!(mbr.active);
    assert_eq!(mbr.link, BlockLink::Unlinked);
    assert!(mbr.data.iter().all(|b| *b == 0));
}

#[test]
fn test_format_is_idempotent() {
    let mut disk = formatted_disk();
    disk.create("foo").unwrap();
    disk.write("foo", "contents").unwrap();
    disk.format();

    let fresh = formatted_disk();
    for tsb in all_tsbs(&disk) {
        assert_eq!(disk.record(tsb), fresh.record(tsb), "mismatch at {tsb}");
    }
}

#[test]
fn test_create_write_read_delete_round_trip() {
    let mut disk = formatted_disk();
    disk.create("foo").unwrap();
    disk.write("foo", "hello world").unwrap();
    assert_eq!(disk.ls(false).unwrap(), vec!["foo".to_string()]);
    assert_eq!(disk.read("foo").unwrap(), "hello world");
    disk.delete("foo").unwrap();
    assert_eq!(disk.ls(false).unwrap(), Vec::<String>::new());
}

#[test]
fn test_create_rejects_duplicate_names() {
    let mut disk = formatted_disk();
    disk.create("foo").unwrap();
    assert_eq!(
        disk.create("foo"),
        Err(DiskError::NameInUse("foo".to_string()))
    );
}

#[test]
fn test_read_of_missing_file_fails() {
    let disk = formatted_disk();
    assert_eq!(
        disk.read("ghost"),
        Err(DiskError::NotFound("ghost".to_string()))
    );
}

#[test]
fn test_freshly_created_file_reads_empty() {
    let mut disk = formatted_disk();
    disk.create("empty").unwrap();
    assert_eq!(disk.read("empty").unwrap(), "");
}

#[test]
fn test_multi_block_write_chains_and_terminates() {
    let mut disk = formatted_disk();
    let payload = "x".repeat(200); // four 60-byte blocks
    disk.create("big").unwrap();
    disk.write("big", &payload).unwrap();
    assert_eq!(disk.read("big").unwrap(), payload);

    // Follow the chain by hand: it must end at a terminator within the
    // disk's block count.
    let geom = disk.geometry().clone();
    let entry = all_tsbs(&disk)
        .into_iter()
        .filter(|t| t.track == 0 && *t != Tsb::MBR)
        .find(|t| disk.record(*t).active)
        .expect("directory entry");
    let mut cur = disk.record(entry).link;
    let mut blocks = 0;
    let bound = geom.tracks as usize * geom.sectors as usize * geom.blocks as usize;
    while let BlockLink::Next(tsb) = cur {
        blocks += 1;
        assert!(blocks <= bound, "chain does not terminate");
        assert!(disk.record(tsb).active);
        cur = disk.record(tsb).link;
    }
    assert_eq!(cur, BlockLink::End);
    assert_eq!(blocks, 4);
}

#[test]
fn test_shrinking_write_deactivates_the_tail() {
    let mut disk = formatted_disk();
    disk.create("f").unwrap();
    disk.write("f", &"a".repeat(200)).unwrap();
    disk.write("f", "short").unwrap();
    assert_eq!(disk.read("f").unwrap(), "short");

    // Exactly one data block may remain active for the file.
    let active_data: usize = all_tsbs(&disk)
        .into_iter()
        .filter(|t| t.track > 0 && disk.record(*t).active)
        .count();
    assert_eq!(active_data, 1);
}

#[test]
fn test_rewrite_reuses_the_existing_chain() {
    let mut disk = formatted_disk();
    disk.create("f").unwrap();
    disk.write("f", &"a".repeat(150)).unwrap();
    let active_before: usize = all_tsbs(&disk)
        .into_iter()
        .filter(|t| t.track > 0 && disk.record(*t).active)
        .count();
    disk.write("f", &"b".repeat(150)).unwrap();
    let active_after: usize = all_tsbs(&disk)
        .into_iter()
        .filter(|t| t.track > 0 && disk.record(*t).active)
        .count();
    assert_eq!(active_before, active_after);
    assert_eq!(disk.read("f").unwrap(), "b".repeat(150));
}

#[test]
fn test_write_without_space_fails() {
    let mut disk = formatted_disk();
    disk.create("f").unwrap();
    // 3 data tracks × 8 × 8 × 60 bytes = 11520; anything more cannot fit.
    let oversized = "y".repeat(11_521);
    assert_eq!(disk.write("f", &oversized), Err(DiskError::NoSpace));
}

#[test]
fn test_directory_fills_up() {
    let mut disk = formatted_disk();
    // 8 sectors × 8 blocks on track 0, minus the MBR: 63 entries.
    for i in 0..63 {
        disk.create(&format!("file{i}")).unwrap();
    }
    assert_eq!(disk.create("one-too-many"), Err(DiskError::NoSpace));
}

#[test]
fn test_rename_checks_for_collisions() {
    let mut disk = formatted_disk();
    disk.create("a").unwrap();
    disk.create("b").unwrap();
    assert_eq!(disk.rename("a", "b"), Err(DiskError::NameInUse("b".to_string())));
}

#[test]
fn test_rename_to_own_name_is_a_noop() {
    let mut disk = formatted_disk();
    disk.create("a").unwrap();
    disk.write("a", "payload").unwrap();
    disk.rename("a", "a").unwrap();
    assert_eq!(disk.read("a").unwrap(), "payload");
}

#[test]
fn test_rename_keeps_contents() {
    let mut disk = formatted_disk();
    disk.create("old").unwrap();
    disk.write("old", "payload").unwrap();
    disk.rename("old", "new").unwrap();
    assert_eq!(disk.read("new").unwrap(), "payload");
    assert_eq!(
        disk.read("old"),
        Err(DiskError::NotFound("old".to_string()))
    );
}

#[test]
fn test_copy_duplicates_contents() {
    let mut disk = formatted_disk();
    disk.create("src").unwrap();
    disk.write("src", "duplicated").unwrap();
    disk.copy("src", "dst").unwrap();
    assert_eq!(disk.read("dst").unwrap(), "duplicated");
    assert_eq!(disk.read("src").unwrap(), "duplicated");
}

#[test]
fn test_ls_hides_dotfiles_by_default() {
    let mut disk = formatted_disk();
    disk.create(".hidden").unwrap();
    disk.create("visible").unwrap();
    assert_eq!(disk.ls(false).unwrap(), vec!["visible".to_string()]);
    assert_eq!(
        disk.ls(true).unwrap(),
        vec![".hidden".to_string(), "visible".to_string()]
    );
}

#[test]
fn test_quick_format_preserves_payloads() {
    let mut disk = formatted_disk();
    disk.create("f").unwrap();
    disk.write("f", "survivor").unwrap();
    disk.format_quick().unwrap();

    // The directory is gone but the payload bytes are still on disk.
    assert_eq!(disk.ls(true).unwrap(), Vec::<String>::new());
    let salvaged = all_tsbs(&disk).into_iter().any(|t| {
        t.track > 0 && disk.record(t).data.starts_with(b"survivor")
    });
    assert!(salvaged, "quick format should keep payload bytes");
}

#[test]
fn test_deleted_contents_survive_until_overwritten() {
    let mut disk = formatted_disk();
    disk.create("f").unwrap();
    disk.write("f", "forensic").unwrap();
    disk.delete("f").unwrap();
    let retained = all_tsbs(&disk).into_iter().any(|t| {
        t.track > 0 && !disk.record(t).active && disk.record(t).data.starts_with(b"forensic")
    });
    assert!(retained, "delete must clear flags only");
}

#[test]
fn test_name_longer_than_a_block_is_rejected() {
    let mut disk = formatted_disk();
    let long = "n".repeat(61);
    assert_eq!(disk.create(&long), Err(DiskError::NameTooLong(long.clone())));
}
