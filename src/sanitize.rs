//! 载荷清洗与解码
//!
//! 上游可能在 JSON 字符串里夹带原始控制字符，严格解析会直接失败。
//! 解码前把 0x00–0x08、0x0B、0x0C、0x0E–0x1F 替换为空格，
//! 保留 `\t`、`\n`、`\r`（它们在 JSON 结构中是合法空白）。

use std::borrow::Cow;

use serde_json::Value;

use crate::error::DecodeFailure;

/// 是否为需要替换的控制字符
fn is_stray_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}')
}

/// 把控制字符替换为空格
///
/// 干净的文本原样借用返回，因此重复清洗结果不变。
pub fn sanitize(raw: &str) -> Cow<'_, str> {
    if raw.chars().any(is_stray_control) {
        Cow::Owned(
            raw.chars()
                .map(|c| if is_stray_control(c) { ' ' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(raw)
    }
}

/// 清洗后严格解码为 JSON
pub fn decode(raw: &str) -> Result<Value, DecodeFailure> {
    let clean = sanitize(raw);
    serde_json::from_str(&clean).map_err(|e| {
        tracing::debug!("载荷解码失败: {}", e);
        DecodeFailure::Unparseable
    })
}
