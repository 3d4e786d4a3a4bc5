//! The disk device driver: a filesystem over the TSB store.
//!
//! The driver owns the record store and implements:
//! 1. **Formatting:** full format (zero every record) and quick format
//!    (reset flags and headers, keep payloads for forensic recovery).
//! 2. **The Directory:** track 0 holds one entry per file, pairing the
//!    encoded filename with a header naming the file's first data block.
//!    `0:0:0` is the reserved Master Boot Record.
//! 3. **Chained Files:** data blocks on tracks 1 and up, linked through
//!    their headers and terminated by [`BlockLink::End`].
//!
//! Successor search is forward-only in TSB order and preferentially
//! adjacent: it starts at the current block's successor and climbs upward
//! through tracks, never wrapping back to track 0. All file operations fail
//! with [`DiskError::NotFormatted`] until the disk is formatted.

/// TSB addresses, block links, and record layout.
pub mod tsb;

use crate::common::error::DiskError;
use crate::config::DiskConfig;

pub use tsb::{BlockLink, Record, Tsb};

/// The disk device driver.
#[derive(Debug, Clone)]
pub struct DiskDriver {
    geometry: DiskConfig,
    records: Vec<Record>,
    formatted: bool,
}

impl DiskDriver {
    /// Creates an unformatted disk with the given geometry.
    pub fn new(geometry: &DiskConfig) -> Self {
        let total =
            geometry.tracks as usize * geometry.sectors as usize * geometry.blocks as usize;
        Self {
            geometry: geometry.clone(),
            records: (0..total)
                .map(|_| Record::zeroed(geometry.block_data_len))
                .collect(),
            formatted: false,
        }
    }

    /// The disk geometry.
    pub const fn geometry(&self) -> &DiskConfig {
        &self.geometry
    }

    /// `true` once the disk has been formatted.
    pub const fn is_formatted(&self) -> bool {
        self.formatted
    }

    /// The record at a TSB address.
    pub fn record(&self, tsb: Tsb) -> &Record {
        &self.records[tsb.index(&self.geometry)]
    }

    fn record_mut(&mut self, tsb: Tsb) -> &mut Record {
        let i = tsb.index(&self.geometry);
        &mut self.records[i]
    }

    fn ensure_formatted(&self) -> Result<(), DiskError> {
        if self.formatted {
            Ok(())
        } else {
            Err(DiskError::NotFormatted)
        }
    }

    /// Total record count; also the walk bound that keeps chain traversal
    /// finite on a corrupted store.
    fn total_blocks(&self) -> usize {
        self.records.len()
    }

    /// Directory entries (track 0, MBR excluded) in TSB order.
    fn directory_tsbs(&self) -> impl Iterator<Item = Tsb> {
        let (sectors, blocks) = (self.geometry.sectors, self.geometry.blocks);
        (0..sectors).flat_map(move |s| {
            (0..blocks)
                .map(move |b| Tsb::new(0, s, b))
                .filter(|tsb| *tsb != Tsb::MBR)
        })
    }

    /// Data blocks (tracks 1 and up) in TSB order.
    fn data_tsbs(&self) -> impl Iterator<Item = Tsb> {
        let (tracks, sectors, blocks) = (
            self.geometry.tracks,
            self.geometry.sectors,
            self.geometry.blocks,
        );
        (1..tracks).flat_map(move |t| {
            (0..sectors).flat_map(move |s| (0..blocks).map(move |b| Tsb::new(t, s, b)))
        })
    }

    /// First inactive data block on the whole disk, in TSB order.
    fn first_free_data_block(&self) -> Option<Tsb> {
        self.data_tsbs().find(|tsb| !self.record(*tsb).active)
    }

    /// First inactive data block strictly after `from`, never wrapping.
    fn next_free_data_block(&self, from: Tsb) -> Option<Tsb> {
        let mut cur = from.next(&self.geometry)?;
        loop {
            if !self.record(cur).active {
                return Some(cur);
            }
            cur = cur.next(&self.geometry)?;
        }
    }

    /// Encodes a filename into a directory entry's data field (0x00-padded).
    fn encode_name(&self, name: &str) -> Result<Vec<u8>, DiskError> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > self.geometry.block_data_len {
            return Err(DiskError::NameTooLong(name.to_string()));
        }
        let mut data = vec![0u8; self.geometry.block_data_len];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(data)
    }

    /// Decodes a data field into text, stripping the 0x00 padding.
    fn decode_text(data: &[u8]) -> String {
        let end = data
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |last| last + 1);
        data[..end].iter().map(|b| char::from(*b)).collect()
    }

    /// Finds the active directory entry whose data equals `encoded`.
    fn find_entry(&self, encoded: &[u8]) -> Option<Tsb> {
        self.directory_tsbs().find(|tsb| {
            let rec = self.record(*tsb);
            rec.active && rec.data == encoded
        })
    }

    /// Clears the active flag along a chain; data and headers are retained
    /// so a quick format leaves deleted contents recoverable.
    fn deactivate_chain(&mut self, start: Tsb) {
        let mut cur = Some(start);
        let mut steps = 0;
        while let Some(tsb) = cur {
            steps += 1;
            if steps > self.total_blocks() {
                tracing::error!(%start, "chain walk exceeded the disk; store is corrupted");
                return;
            }
            let rec = self.record_mut(tsb);
            rec.active = false;
            cur = match rec.link {
                BlockLink::Next(next) => Some(next),
                BlockLink::Unlinked | BlockLink::End => None,
            };
        }
    }

    /// Formats the disk: zero-records everywhere, then the MBR.
    ///
    /// Idempotent; formatting twice yields a byte-identical store.
    pub fn format(&mut self) {
        for rec in &mut self.records {
            *rec = Record::zeroed(self.geometry.block_data_len);
        }
        let mbr = self.record_mut(Tsb::MBR);
        mbr.active = true;
        self.formatted = true;
        tracing::debug!("disk formatted");
    }

    /// Quick format: resets flags and headers but preserves payload bytes.
    ///
    /// Requires a previously formatted disk; there is nothing to preserve
    /// before the first full format.
    pub fn format_quick(&mut self) -> Result<(), DiskError> {
        self.ensure_formatted()?;
        for rec in &mut self.records {
            rec.active = false;
            rec.link = BlockLink::Unlinked;
        }
        let mbr = self.record_mut(Tsb::MBR);
        mbr.active = true;
        mbr.link = BlockLink::Unlinked;
        tracing::debug!("disk quick-formatted");
        Ok(())
    }

    /// Creates an empty file.
    ///
    /// Claims the first inactive data block as the file's chain head (its
    /// payload is left untouched) and the first inactive directory entry for
    /// the name.
    pub fn create(&mut self, name: &str) -> Result<(), DiskError> {
        self.ensure_formatted()?;
        let encoded = self.encode_name(name)?;
        if self.find_entry(&encoded).is_some() {
            return Err(DiskError::NameInUse(name.to_string()));
        }
        let head = self.first_free_data_block().ok_or(DiskError::NoSpace)?;
        let entry = self
            .directory_tsbs()
            .find(|tsb| !self.record(*tsb).active)
            .ok_or(DiskError::NoSpace)?;

        let dir = self.record_mut(entry);
        dir.active = true;
        dir.link = BlockLink::Next(head);
        dir.data = encoded;

        let block = self.record_mut(head);
        block.active = true;
        block.link = BlockLink::End;
        tracing::debug!(file = name, %entry, %head, "file created");
        Ok(())
    }

    /// Reads a file's contents, padding stripped.
    pub fn read(&self, name: &str) -> Result<String, DiskError> {
        self.ensure_formatted()?;
        let encoded = self.encode_name(name)?;
        let entry = self
            .find_entry(&encoded)
            .ok_or_else(|| DiskError::NotFound(name.to_string()))?;

        let mut bytes = Vec::new();
        let mut cur = self.record(entry).link;
        let mut steps = 0;
        while let BlockLink::Next(tsb) = cur {
            steps += 1;
            if steps > self.total_blocks() {
                tracing::error!(file = name, "chain walk exceeded the disk; store is corrupted");
                break;
            }
            let rec = self.record(tsb);
            bytes.extend_from_slice(&rec.data);
            cur = rec.link;
        }
        Ok(Self::decode_text(&bytes))
    }

    /// Writes a file's contents, reusing its existing chain, growing it
    /// forward when the data is longer and deactivating the stale tail when
    /// it is shorter.
    pub fn write(&mut self, name: &str, data: &str) -> Result<(), DiskError> {
        self.ensure_formatted()?;
        let encoded = self.encode_name(name)?;
        let entry = self
            .find_entry(&encoded)
            .ok_or_else(|| DiskError::NotFound(name.to_string()))?;
        let BlockLink::Next(first) = self.record(entry).link else {
            tracing::error!(file = name, "directory entry has no chain head");
            return Err(DiskError::NotFound(name.to_string()));
        };

        let bytes = data.as_bytes();
        let chunk_len = self.geometry.block_data_len;
        let chunk_count = bytes.len().div_ceil(chunk_len).max(1);

        let mut cur = first;
        for i in 0..chunk_count {
            let chunk = bytes
                .get(i * chunk_len..((i + 1) * chunk_len).min(bytes.len()))
                .unwrap_or(&[]);
            let mut payload = vec![0u8; chunk_len];
            payload[..chunk.len()].copy_from_slice(chunk);

            let old_link = self.record(cur).link;
            let rec = self.record_mut(cur);
            rec.active = true;
            rec.data = payload;

            if i + 1 < chunk_count {
                let next = match old_link {
                    BlockLink::Next(tsb) => tsb,
                    BlockLink::Unlinked | BlockLink::End => self
                        .next_free_data_block(cur)
                        .ok_or(DiskError::NoSpace)?,
                };
                self.record_mut(cur).link = BlockLink::Next(next);
                cur = next;
            } else {
                if let BlockLink::Next(tail) = old_link {
                    self.deactivate_chain(tail);
                }
                self.record_mut(cur).link = BlockLink::End;
            }
        }
        tracing::debug!(file = name, blocks = chunk_count, "file written");
        Ok(())
    }

    /// Deletes a file: directory entry and chain are deactivated, payloads
    /// retained for forensic recovery.
    pub fn delete(&mut self, name: &str) -> Result<(), DiskError> {
        self.ensure_formatted()?;
        let encoded = self.encode_name(name)?;
        let entry = self
            .find_entry(&encoded)
            .ok_or_else(|| DiskError::NotFound(name.to_string()))?;
        let head = self.record(entry).link;
        self.record_mut(entry).active = false;
        if let BlockLink::Next(tsb) = head {
            self.deactivate_chain(tsb);
        }
        tracing::debug!(file = name, "file deleted");
        Ok(())
    }

    /// Copies a file: read, create, write.
    pub fn copy(&mut self, existing: &str, new: &str) -> Result<(), DiskError> {
        let contents = self.read(existing)?;
        self.create(new)?;
        self.write(new, &contents)
    }

    /// Renames a file in place; data blocks are untouched.
    ///
    /// The new name must not collide with any other active entry. Renaming
    /// a file to its own name is a no-op.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), DiskError> {
        self.ensure_formatted()?;
        let encoded_old = self.encode_name(old)?;
        let encoded_new = self.encode_name(new)?;
        let entry = self
            .find_entry(&encoded_old)
            .ok_or_else(|| DiskError::NotFound(old.to_string()))?;
        if let Some(other) = self.find_entry(&encoded_new) {
            if other != entry {
                return Err(DiskError::NameInUse(new.to_string()));
            }
        }
        self.record_mut(entry).data = encoded_new;
        tracing::debug!(file = old, renamed = new, "file renamed");
        Ok(())
    }

    /// Lists active filenames in TSB order.
    ///
    /// Hidden files (leading `.`) are excluded unless `show_hidden` is set.
    pub fn ls(&self, show_hidden: bool) -> Result<Vec<String>, DiskError> {
        self.ensure_formatted()?;
        Ok(self
            .directory_tsbs()
            .filter(|tsb| self.record(*tsb).active)
            .map(|tsb| Self::decode_text(&self.record(tsb).data))
            .filter(|name| show_hidden || !name.starts_with('.'))
            .collect())
    }
}
