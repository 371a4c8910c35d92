//! 特定服务器 ID 集合（由 IgnoredIPNotification 派生）

use std::collections::HashSet;

/// 解析逗号分隔的服务器 ID 列表
///
/// 无法解析的片段和 0 被直接丢弃，不视为错误；重复 ID 自然合并。
pub fn parse_server_ids(raw: &str) -> HashSet<u64> {
    raw.split(',')
        .filter_map(|token| {
            let token = token.trim();
            // 只接受纯十进制数字（拒绝 "+7" 之类带符号的写法）
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            token.parse::<u64>().ok()
        })
        .filter(|id| *id > 0)
        .collect()
}
