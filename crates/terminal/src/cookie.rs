use std::collections::BTreeMap;

/// # Summary
/// 解析 `k1=v1; k2=v2` 形式的 Cookie 串。
///
/// # Logic
/// 1. 以 `;` 切分，逐段去除首尾空白。
/// 2. 仅在第一个 `=` 处切分名称与值，不含 `=` 的片段忽略。
/// 3. 同名 Cookie 以后出现者为准。
pub fn parse_cookie_str(raw: &str) -> BTreeMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// 将 Cookie 集合重新拼接为请求头的值，集合为空时返回 `None`。
pub fn cookie_header(cookies: &BTreeMap<String, String>) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_str() {
        let cookies = parse_cookie_str(" userid=500780707 ; u_name=abc==; broken ; =x; ticket=t1");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies["userid"], "500780707");
        assert_eq!(cookies["u_name"], "abc==");
        assert_eq!(cookies["ticket"], "t1");
    }

    #[test]
    fn test_cookie_header() {
        assert_eq!(cookie_header(&parse_cookie_str("")), None);
        assert_eq!(
            cookie_header(&parse_cookie_str("b=2; a=1")).as_deref(),
            Some("a=1; b=2")
        );
    }
}
