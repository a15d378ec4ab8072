//! 通用工具函数

/// 截断地址用于展示，保留 0x 前缀：0x1234...5678
pub fn truncate_address(address: &str, size: usize) -> String {
    if address.len() <= size * 2 + 2 {
        return address.to_string();
    }
    format!(
        "{}...{}",
        &address[..size + 2],
        &address[address.len() - size..]
    )
}

/// Unix毫秒时间戳转 RFC3339 字符串，非法值原样返回数字
pub fn format_timestamp_ms(timestamp_ms: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(timestamp_ms) {
        Some(dt) => dt.to_rfc3339(),
        None => timestamp_ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_prefix_and_suffix() {
        assert_eq!(
            truncate_address("0x1234567890abcdef1234567890abcdef12345678", 4),
            "0x1234...5678"
        );
    }

    #[test]
    fn truncate_leaves_short_strings_alone() {
        assert_eq!(truncate_address("0x1234", 4), "0x1234");
    }

    #[test]
    fn format_timestamp_handles_out_of_range() {
        assert_eq!(format_timestamp_ms(i64::MAX), i64::MAX.to_string());
        assert!(format_timestamp_ms(1_700_000_000_000).starts_with("2023-"));
    }
}
