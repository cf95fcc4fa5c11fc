//! Column declarations for the blocks table.

use crate::options::{LookupOptions, SortField, SortOrder};
use crate::types::KristBlock;
use crate::util_text::{format_thousands, format_time, short_hash};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKey {
    Height,
    Address,
    ShortHash,
    Hash,
    Difficulty,
    Time,
}

#[derive(Clone, Copy, Debug)]
pub struct Column {
    pub key: ColumnKey,
    pub title: &'static str,
    /// Field the server sorts by when this header is clicked, if sortable
    pub sort: Option<SortField>,
    /// Fixed width in cells; `None` shares the remaining space
    pub width: Option<u16>,
}

pub static BLOCK_COLUMNS: [Column; 6] = [
    Column { key: ColumnKey::Height, title: "Height", sort: Some(SortField::Height), width: Some(9) },
    Column { key: ColumnKey::Address, title: "Miner", sort: Some(SortField::Address), width: Some(12) },
    Column { key: ColumnKey::ShortHash, title: "Short Hash", sort: None, width: Some(12) },
    Column { key: ColumnKey::Hash, title: "Hash", sort: Some(SortField::Hash), width: None },
    Column { key: ColumnKey::Difficulty, title: "Difficulty", sort: Some(SortField::Difficulty), width: Some(14) },
    Column { key: ColumnKey::Time, title: "Time", sort: Some(SortField::Time), width: Some(19) },
];

/// Sortable columns in display order, used for numeric header shortcuts.
pub fn sortable() -> impl Iterator<Item = (&'static Column, SortField)> {
    BLOCK_COLUMNS.iter().filter_map(|c| c.sort.map(|f| (c, f)))
}

/// Header label with a sort marker on the active column.
pub fn header_label(column: &Column, options: &LookupOptions) -> String {
    match column.sort {
        Some(field) if field == options.order_by() => {
            let arrow = match options.order() {
                SortOrder::Ascending => '▲',
                SortOrder::Descending => '▼',
            };
            format!("{} {arrow}", column.title)
        }
        _ => column.title.to_string(),
    }
}

pub fn cell(block: &KristBlock, key: ColumnKey) -> String {
    match key {
        ColumnKey::Height => format_thousands(block.height),
        ColumnKey::Address => block.address.clone().unwrap_or_default(),
        ColumnKey::ShortHash => block
            .short_hash
            .clone()
            .or_else(|| block.hash.as_deref().map(|h| short_hash(h).to_string()))
            .unwrap_or_default(),
        ColumnKey::Hash => block.hash.clone().unwrap_or_default(),
        ColumnKey::Difficulty => format_thousands(block.difficulty),
        ColumnKey::Time => format_time(&block.time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::QueryOptionsStore;
    use chrono::TimeZone;

    fn block() -> KristBlock {
        KristBlock {
            height: 1234567,
            address: Some("kfoo000000".into()),
            hash: Some("000000000e1f2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f80910203".into()),
            short_hash: None,
            value: 25,
            time: chrono::Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap(),
            difficulty: 100000,
        }
    }

    #[test]
    fn five_sortable_columns_short_hash_is_not() {
        let fields: Vec<SortField> = sortable().map(|(_, f)| f).collect();
        assert_eq!(fields, SortField::ALL.to_vec());
        assert!(BLOCK_COLUMNS
            .iter()
            .any(|c| c.key == ColumnKey::ShortHash && c.sort.is_none()));
    }

    #[test]
    fn marker_on_active_column_only() {
        let options = QueryOptionsStore::initial();
        assert_eq!(header_label(&BLOCK_COLUMNS[0], &options), "Height ▼");
        assert_eq!(header_label(&BLOCK_COLUMNS[1], &options), "Miner");
    }

    #[test]
    fn cells_format_values() {
        let b = block();
        assert_eq!(cell(&b, ColumnKey::Height), "1,234,567");
        assert_eq!(cell(&b, ColumnKey::ShortHash), "000000000e1f");
        assert_eq!(cell(&b, ColumnKey::Difficulty), "100,000");
        assert_eq!(cell(&b, ColumnKey::Time), "2021-01-02 03:04:05");

        let genesis = KristBlock { address: None, hash: None, ..b };
        assert_eq!(cell(&genesis, ColumnKey::Address), "");
        assert_eq!(cell(&genesis, ColumnKey::ShortHash), "");
    }
}
