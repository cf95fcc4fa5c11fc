use chrono::{DateTime, Utc};

/// Group digits with commas: 5000 -> "5,000"
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Krist short hashes are the first 12 hex characters of the block hash
pub const SHORT_HASH_LEN: usize = 12;

pub fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(SHORT_HASH_LEN) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}

/// Format a block time for table display (UTC, second precision)
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn short_hash_takes_prefix() {
        assert_eq!(short_hash("0000000001a2b3c4d5e6f7"), "0000000001a2");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn time_is_utc_seconds() {
        let t = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_time(&t), "2021-03-04 05:06:07");
    }
}
