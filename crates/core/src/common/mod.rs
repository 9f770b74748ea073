//! 市场后缀与终端市场类型代码的双向映射。

/// # Summary
/// 市场后缀 → 终端类型代码 对照表。
///
/// # Invariants
/// - 后缀全部为大写，类型代码互不重复。
const MARKET_TABLE: &[(&str, &str)] = &[
    ("SH", "17"),    // 上海证券交易所
    ("SHETF", "20"), // 上海证券交易所 ETF
    ("ST", "22"),    // 上海证券交易所 ST
    ("SZ", "33"),    // 深圳证券交易所
    ("SZETF", "36"), // 深圳证券交易所 ETF
    ("ZS", "48"),    // 指数
    ("CYB", "38"),   // 创业板
    ("KC", "18"),    // 科创板
    ("BJ", "71"),    // 北京证券交易所
    ("HK", "55"),    // 港股
    ("US", "61"),    // 美股
    ("FT", "50"),    // 期货
    ("QH", "51"),    // 期货主力
    ("QZ", "53"),    // 期指
    ("OP", "79"),    // 期权
    ("JJ", "39"),    // 基金
    ("ZQ", "45"),    // 债券
    ("XSB", "67"),   // 新三板
];

/// # Summary
/// 将市场后缀 (如 `sz`) 映射为终端使用的类型代码 (如 `33`)。
///
/// # Arguments
/// * `abbr`: 市场后缀，大小写不敏感。
///
/// # Returns
/// 已知后缀返回类型代码，否则返回 `None`。
pub fn market_code(abbr: &str) -> Option<&'static str> {
    let upper = abbr.trim().to_ascii_uppercase();
    MARKET_TABLE
        .iter()
        .find(|(suffix, _)| *suffix == upper)
        .map(|(_, code)| *code)
}

/// # Summary
/// 将终端类型代码映射为市场后缀。
///
/// # Logic
/// 1. 在对照表中查找类型代码。
/// 2. 未知代码原样返回，保证条目不会因映射缺失而丢失。
pub fn market_abbr(type_code: &str) -> String {
    MARKET_TABLE
        .iter()
        .find(|(_, code)| *code == type_code)
        .map(|(suffix, _)| (*suffix).to_string())
        .unwrap_or_else(|| type_code.to_string())
}

/// 判断一个后缀或类型代码是否为已知市场，返回规范化后的后缀。
pub fn normalize_market(input: &str) -> Option<&'static str> {
    let upper = input.trim().to_ascii_uppercase();
    MARKET_TABLE
        .iter()
        .find(|(suffix, code)| *suffix == upper || *code == upper)
        .map(|(suffix, _)| *suffix)
}
