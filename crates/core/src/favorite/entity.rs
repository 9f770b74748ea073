use crate::common::normalize_market;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// # Summary
/// 自选分组中的单个标的。
///
/// # Invariants
/// - `(code, market)` 组合是标的的自然键。
/// - `market` 为市场后缀 (如 `SH`)；终端未给出类型代码时为 `None`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    // 纯代码，例如 600519
    pub code: String,
    // 市场后缀，例如 SH；不在对照表中的类型代码原样保存
    pub market: Option<String>,
}

impl Item {
    pub fn new(code: impl Into<String>, market: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            market: Some(market.into()),
        }
    }

    /// # Summary
    /// 解析列表中展示的标的形式，额外接受终端未给出市场的纯代码 (如 `300750`)。
    pub fn parse_listed(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        if trimmed.contains('.') {
            return trimmed.parse();
        }
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("股票代码无效: '{}'", s));
        }
        Ok(Item {
            code: trimmed.to_ascii_uppercase(),
            market: None,
        })
    }

    /// 是否指向同一标的。任一方缺少市场时只比较代码。
    pub fn matches(&self, other: &Item) -> bool {
        self.code.eq_ignore_ascii_case(&other.code)
            && match (&self.market, &other.market) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.market {
            Some(market) => write!(f, "{}.{}", self.code, market),
            None => write!(f, "{}", self.code),
        }
    }
}

impl FromStr for Item {
    type Err = String;

    /// # Summary
    /// 解析 `code.market` 形式的标的字符串。
    ///
    /// # Logic
    /// 1. 以最后一个 `.` 切分代码与市场后缀。
    /// 2. 代码必须为非空的字母数字串。
    /// 3. 已知后缀或已知类型代码统一规范化为后缀；不在对照表中的纯数字类型代码原样保留。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (code, market) = trimmed
            .rsplit_once('.')
            .ok_or_else(|| format!("股票代码格式无效: '{}'，预期格式: CODE.MARKET (例如 600519.SH)", s))?;

        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("股票代码无效: '{}'", s));
        }

        let market = match normalize_market(market) {
            Some(suffix) => suffix,
            None if !market.is_empty() && market.chars().all(|c| c.is_ascii_digit()) => market,
            None => return Err(format!("未知的市场后缀: '{}' (来自 '{}')", market, s)),
        };

        Ok(Item::new(code.to_ascii_uppercase(), market))
    }
}

/// # Summary
/// 终端分配的分组标识。
///
/// # Invariants
/// - 在账户生命周期内稳定且唯一。终端可能使用纯数字或 `0_35` 形式，因此按不透明字符串保存。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        GroupId(s.to_string())
    }
}

/// # Summary
/// 自选分组快照。
///
/// # Invariants
/// - `items` 顺序与终端一致，刷新后不保证稳定。
/// - 修改本地快照不会影响终端，必须通过变更操作提交。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub group_id: GroupId,
    pub name: String,
    pub items: Vec<Item>,
}

impl Group {
    pub fn new(group_id: impl Into<String>, name: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            group_id: GroupId(group_id.into()),
            name: name.into(),
            items,
        }
    }

    /// 分组内是否包含指定标的。
    pub fn contains(&self, item: &Item) -> bool {
        self.items.iter().any(|i| i == item)
    }

    /// 按用户输入查找分组内的标的，返回终端保存的原始形式。
    pub fn find(&self, item: &Item) -> Option<&Item> {
        self.items
            .iter()
            .find(|i| *i == item)
            .or_else(|| self.items.iter().find(|i| i.matches(item)))
    }

    /// # Summary
    /// 比较两个分组快照。
    ///
    /// # Returns
    /// `(added, removed)`：`other` 中新增的标的，以及 `self` 中被移除的标的，均保持原有顺序。
    pub fn diff(&self, other: &Group) -> (Vec<Item>, Vec<Item>) {
        let mine: HashSet<&Item> = self.items.iter().collect();
        let theirs: HashSet<&Item> = other.items.iter().collect();

        let added = other
            .items
            .iter()
            .filter(|i| !mine.contains(i))
            .cloned()
            .collect();
        let removed = self
            .items
            .iter()
            .filter(|i| !theirs.contains(i))
            .cloned()
            .collect();
        (added, removed)
    }
}

/// # Summary
/// 全量分组目录：分组名 → 分组 的映射，保留终端返回的顺序。
///
/// # Invariants
/// - 分组名在目录内唯一；终端若返回重名分组，仅保留第一个。
/// - 每次查询都会整体重建，不做增量合并。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    groups: Vec<Group>,
}

impl Catalog {
    pub fn new(groups: Vec<Group>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(groups.len());
        for group in groups {
            if seen.insert(group.name.clone()) {
                unique.push(group);
            } else {
                tracing::warn!("终端返回了重名分组 '{}'，已忽略", group.name);
            }
        }
        Self { groups: unique }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    /// 按分组名精确查找。
    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// 按分组 ID 精确查找。
    pub fn get_by_id(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.group_id == id)
    }

    /// # Summary
    /// 将用户输入解析为分组。
    ///
    /// # Logic
    /// 1. 先按分组名精确匹配。
    /// 2. 未命中时按分组 ID 匹配。
    pub fn resolve(&self, identifier: &str) -> Option<&Group> {
        let identifier = identifier.trim();
        self.get(identifier)
            .or_else(|| self.get_by_id(&GroupId(identifier.to_string())))
    }
}

/// # Summary
/// 分享有效期，单位毫秒，`0` 代表永久有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareExpiry(u64);

impl ShareExpiry {
    /// 从有符号毫秒数构建，负数视为无效输入。
    pub fn from_millis(ms: i64) -> Result<Self, String> {
        u64::try_from(ms)
            .map(ShareExpiry)
            .map_err(|_| format!("分享有效期不能为负数: {}", ms))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn is_permanent(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ShareExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_permanent() {
            write!(f, "永久")
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}

/// # Summary
/// 终端签发的分组分享结果。本地不持久化，仅转发给调用方。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    pub group_id: GroupId,
    pub group_name: String,
    pub expiry: ShareExpiry,
    // 终端返回的分享链接 (若有)
    pub url: Option<String>,
    pub issued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        Catalog::new(vec![
            Group::new("101", "白酒", vec![Item::new("600519", "SH")]),
            Group::new("102", "银行", vec![Item::new("000001", "SZ")]),
            Group::new("103", "101", vec![]),
        ])
    }

    #[test]
    fn test_item_parse() {
        let item: Item = "600519.sh".parse().unwrap();
        assert_eq!(item, Item::new("600519", "SH"));
        assert_eq!(item.to_string(), "600519.SH");

        let by_code: Item = "000001.33".parse().unwrap();
        assert_eq!(by_code.market.as_deref(), Some("SZ"));
    }

    #[test]
    fn test_item_parse_keeps_unknown_type_code() {
        let item: Item = "200011.32".parse().unwrap();
        assert_eq!(item, Item::new("200011", "32"));
        assert_eq!(item.to_string(), "200011.32");
    }

    #[test]
    fn test_parse_listed_accepts_bare_code() {
        let bare = Item::parse_listed("300750").unwrap();
        assert_eq!(bare.market, None);
        assert_eq!(bare.to_string(), "300750");
        assert_eq!(Item::parse_listed("600519.SH").unwrap(), Item::new("600519", "SH"));
        assert!(Item::parse_listed("").is_err());
        assert!(Item::parse_listed("30-750").is_err());
    }

    #[test]
    fn test_group_find_matches_missing_market() {
        let terminal_item = Item {
            code: "300750".to_string(),
            market: None,
        };
        let group = Group::new(
            "1",
            "A",
            vec![Item::new("600519", "SH"), terminal_item.clone()],
        );

        assert_eq!(group.find(&Item::new("300750", "SZ")), Some(&terminal_item));
        assert_eq!(group.find(&Item::parse_listed("300750").unwrap()), Some(&terminal_item));
        assert_eq!(group.find(&Item::new("600519", "SH")), Some(&Item::new("600519", "SH")));
        assert!(group.find(&Item::new("600519", "SZ")).is_none());
    }

    #[test]
    fn test_item_parse_rejects_malformed() {
        assert!("600519".parse::<Item>().is_err());
        assert!(".SH".parse::<Item>().is_err());
        assert!("600519.NYSE".parse::<Item>().is_err());
        assert!("60-519.SH".parse::<Item>().is_err());
    }

    #[test]
    fn test_resolve_prefers_name_over_id() {
        let catalog = sample_catalog();
        // "101" 既是分组 103 的名称，也是分组 101 的 ID，名称优先
        assert_eq!(catalog.resolve("101").unwrap().group_id, GroupId::from("103"));
        assert_eq!(catalog.resolve("102").unwrap().name, "银行");
        assert_eq!(catalog.resolve("白酒").unwrap().group_id, GroupId::from("101"));
        assert!(catalog.resolve("不存在").is_none());
    }

    #[test]
    fn test_catalog_drops_duplicate_names() {
        let catalog = Catalog::new(vec![
            Group::new("1", "A", vec![]),
            Group::new("2", "A", vec![]),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("A").unwrap().group_id, GroupId::from("1"));
    }

    #[test]
    fn test_group_diff() {
        let before = Group::new("1", "A", vec![Item::new("600519", "SH"), Item::new("000001", "SZ")]);
        let after = Group::new("1", "A", vec![Item::new("000001", "SZ"), Item::new("300750", "SZ")]);

        let (added, removed) = before.diff(&after);
        assert_eq!(added, vec![Item::new("300750", "SZ")]);
        assert_eq!(removed, vec![Item::new("600519", "SH")]);
    }

    #[test]
    fn test_share_expiry() {
        assert!(ShareExpiry::from_millis(0).unwrap().is_permanent());
        assert_eq!(ShareExpiry::from_millis(86_400_000).unwrap().as_millis(), 86_400_000);
        assert!(ShareExpiry::from_millis(-5).is_err());
    }
}
