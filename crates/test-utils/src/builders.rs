#![allow(dead_code)]

use transit_bridge::DiffRecord;

/// Builder for `DiffRecord` to simplify test setup.
pub struct DiffRecordBuilder {
    record: DiffRecord,
}

impl DiffRecordBuilder {
    pub fn new(filename: &str) -> Self {
        Self {
            record: DiffRecord {
                old_commit: "a1".to_string(),
                new_commit: "b2".to_string(),
                old_filename: filename.to_string(),
                new_filename: filename.to_string(),
                origin_line: 0,
                destination_line: 0,
                num_lines: 1,
            },
        }
    }

    pub fn commits(mut self, old: &str, new: &str) -> Self {
        self.record.old_commit = old.to_string();
        self.record.new_commit = new.to_string();
        self
    }

    pub fn renamed_to(mut self, new_filename: &str) -> Self {
        self.record.new_filename = new_filename.to_string();
        self
    }

    pub fn lines(mut self, origin: u32, destination: u32, count: u32) -> Self {
        self.record.origin_line = origin;
        self.record.destination_line = destination;
        self.record.num_lines = count;
        self
    }

    pub fn build(self) -> DiffRecord {
        self.record
    }
}

/// Serialise records the way `transit --json` prints them.
pub fn records_json(records: &[DiffRecord]) -> String {
    serde_json::to_string(records).expect("diff records always serialise")
}
