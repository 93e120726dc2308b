use super::attendance::{AttendanceRecord, RecentEntry};

pub const HEADER: [&str; 3] = ["Kode", "Nama", "Waktu"];

/// In-memory copy of one partition. The header row is implicit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceTable {
    records: Vec<AttendanceRecord>,
}

impl AttendanceTable {
    pub fn new(records: Vec<AttendanceRecord>) -> Self {
        Self { records }
    }

    /// Builds a table from raw sheet rows. The first row is the header;
    /// a sheet holding only the header (or nothing) yields an empty table.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        if rows.len() <= 1 {
            return Self::default();
        }

        let mut rows = rows.into_iter();
        let header = rows.next().unwrap_or_default();
        let column = |name: &str, fallback: usize| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .unwrap_or(fallback)
        };
        let (code_idx, name_idx, time_idx) = (column(HEADER[0], 0), column(HEADER[1], 1), column(HEADER[2], 2));

        let records = rows
            .map(|row| {
                let cell = |idx: usize| row.get(idx).cloned().unwrap_or_default();
                AttendanceRecord {
                    code: cell(code_idx),
                    name: cell(name_idx),
                    time: cell(time_idx),
                }
            })
            .collect();

        Self { records }
    }

    /// Header row followed by one row per record.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(HEADER.iter().map(|h| h.to_string()).collect::<Vec<String>>())
            .chain(
                self.records
                    .iter()
                    .map(|r| vec![r.code.clone(), r.name.clone(), r.time.clone()]),
            )
            .collect()
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose `Kode` equals `code`.
    pub fn find_by_code(&self, code: &str) -> Option<&AttendanceRecord> {
        self.records.iter().find(|r| r.code == code)
    }

    pub fn push(&mut self, record: AttendanceRecord) {
        self.records.push(record);
    }

    /// Most recent `limit` records, newest first.
    ///
    /// Times are compared as `HH:MM:SS` strings. That order matches the clock
    /// only because a partition never spans midnight.
    pub fn recent(&self, limit: usize) -> Vec<RecentEntry> {
        let mut sorted: Vec<&AttendanceRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.time.cmp(&a.time));
        sorted.into_iter().take(limit).map(RecentEntry::from).collect()
    }
}
