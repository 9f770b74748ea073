use crate::cookie::{cookie_header, parse_cookie_str};
use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};
use zixuan_core::common::{market_abbr, market_code};
use zixuan_core::config::TerminalConfig;
use zixuan_core::favorite::entity::{Group, GroupId, Item, ShareExpiry};
use zixuan_core::favorite::error::TerminalError;
use zixuan_core::favorite::port::TerminalPort;

const QUERY_ENDPOINT: &str = "/optdata/selfgroup/open/api/group/v1/query";
const ADD_ITEM_ENDPOINT: &str = "/optdata/selfgroup/open/api/content/v1/add";
const DELETE_ITEM_ENDPOINT: &str = "/optdata/selfgroup/open/api/content/v1/delete";
const ADD_GROUP_ENDPOINT: &str = "/optdata/selfgroup/open/api/group/v1/add";
const DELETE_GROUP_ENDPOINT: &str = "/optdata/selfgroup/open/api/group/v1/delete";
const SHARE_GROUP_ENDPOINT: &str = "/optdata/selfgroup/open/api/group/v1/share";
// 终端要求所有请求声明来源客户端
const FROM: &str = "sjcg_gphone";

/// # Summary
/// 同花顺自选股服务的 HTTP 适配器。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端通讯，Cookie 与 User-Agent 在构造时固化为默认请求头。
/// - 每次变更都必须携带最近一次响应中的 `version`，否则终端会拒绝请求。
/// - `close` 之后所有调用返回 `TerminalError::Closed`。
pub struct ThsTerminal {
    /// 内部使用的 HTTP 客户端
    client: Client,
    base_url: String,
    timeout: Duration,
    has_cookies: bool,
    // 终端自选列表的版本号
    version: Mutex<Option<String>>,
    opened: AtomicBool,
}

impl ThsTerminal {
    /// # Summary
    /// 按配置创建适配器，此时不发起任何网络请求。
    ///
    /// # Logic
    /// 1. 安装 rustls 的 ring 加密后端 (已安装则跳过)。
    /// 2. 解析 Cookie 串并与 User-Agent 一起写入默认请求头。
    /// 3. 配置单次请求超时并构建 reqwest 客户端。
    ///
    /// # Returns
    /// 请求头非法或客户端构建失败时返回 `TerminalError::Connection`。
    pub fn new(config: &TerminalConfig) -> Result<Self, TerminalError> {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls crypto provider already installed");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| TerminalError::Connection(format!("invalid user agent: {}", e)))?,
        );

        let cookie = cookie_header(&parse_cookie_str(&config.cookies));
        let has_cookies = cookie.is_some();
        if let Some(cookie) = cookie {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&cookie)
                    .map_err(|e| TerminalError::Connection(format!("invalid cookie: {}", e)))?,
            );
        }

        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TerminalError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            has_cookies,
            version: Mutex::new(None),
            opened: AtomicBool::new(false),
        })
    }

    /// 最近一次响应给出的版本号
    pub fn current_version(&self) -> Option<String> {
        self.version_slot().clone()
    }

    fn version_slot(&self) -> MutexGuard<'_, Option<String>> {
        self.version.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remember_version(&self, version: Option<&Value>) {
        if let Some(v) = version.and_then(value_to_string) {
            *self.version_slot() = Some(v);
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn ensure_open(&self) -> Result<(), TerminalError> {
        if self.opened.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TerminalError::Closed)
        }
    }

    /// # Summary
    /// 发送请求并拆解终端的 `{status_code, status_msg, data}` 响应信封。
    ///
    /// # Logic
    /// 1. 超时映射为 `Timeout`，其它传输错误与非 2xx 状态映射为 `Network`。
    /// 2. 响应体不是合法 JSON 时返回 `Parse`。
    /// 3. 业务状态码非 0 时返回 `Rejected`。
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, TerminalError> {
        let resp = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TerminalError::Network(format!("HTTP {}", status)));
        }

        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        let envelope: ThsEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| TerminalError::Parse(e.to_string()))?;

        if envelope.status_code != 0 {
            return Err(TerminalError::Rejected {
                code: envelope.status_code,
                message: envelope.status_msg.unwrap_or_else(|| "未知错误".to_string()),
            });
        }
        Ok(envelope.data)
    }

    fn map_send_error(&self, e: reqwest::Error) -> TerminalError {
        if e.is_timeout() {
            TerminalError::Timeout(self.timeout)
        } else {
            TerminalError::Network(e.to_string())
        }
    }

    async fn query_groups(&self) -> Result<Vec<Group>, TerminalError> {
        let request = self
            .client
            .get(self.url(QUERY_ENDPOINT))
            .query(&[("from", FROM), ("types", "0,1")]);

        let data: GroupListData = self
            .send(request)
            .await?
            .ok_or_else(|| TerminalError::Parse("missing data in group query".to_string()))?;

        self.remember_version(data.version.as_ref());
        Ok(parse_group_list(data.group_list))
    }

    /// # Summary
    /// 以表单方式提交一次变更。
    ///
    /// # Logic
    /// 1. 若尚无版本号，先执行一次查询获取。
    /// 2. 在表单中追加 `version` 与 `from`。
    /// 3. 用响应中的新版本号替换本地版本号。
    async fn post_mutation(
        &self,
        endpoint: &str,
        mut form: Vec<(&'static str, String)>,
    ) -> Result<MutationData, TerminalError> {
        let version = match self.current_version() {
            Some(v) => v,
            None => {
                self.query_groups().await?;
                self.current_version().ok_or_else(|| {
                    TerminalError::Parse("terminal did not report a list version".to_string())
                })?
            }
        };

        form.push(("version", version));
        form.push(("from", FROM.to_string()));
        debug!("POST {} {:?}", endpoint, form);

        let request = self.client.post(self.url(endpoint)).form(&form);
        let data: MutationData = self.send(request).await?.unwrap_or_default();
        self.remember_version(data.version.as_ref());
        Ok(data)
    }
}

/// # Summary
/// 终端统一响应信封。
#[derive(Deserialize, Debug)]
struct ThsEnvelope<T> {
    status_code: i64,
    #[serde(default)]
    status_msg: Option<String>,
    data: Option<T>,
}

/// 分组查询的数据部分
#[derive(Deserialize, Debug)]
struct GroupListData {
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    group_list: Vec<Value>,
}

/// 单个分组的原始数据
#[derive(Deserialize, Debug)]
struct RawGroup {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    // "code1|code2|,type1|type2|"
    #[serde(default)]
    content: Option<String>,
}

/// 变更类接口的数据部分，字段均为可选
#[derive(Deserialize, Debug, Default)]
struct MutationData {
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    share_url: Option<String>,
}

// 终端的 id/version 字段可能是字符串也可能是数字
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_group_list(raw: Vec<Value>) -> Vec<Group> {
    let mut groups = Vec::with_capacity(raw.len());
    for entry in raw {
        let parsed: RawGroup = match serde_json::from_value(entry) {
            Ok(g) => g,
            Err(e) => {
                warn!("跳过无法解析的分组数据: {}", e);
                continue;
            }
        };

        let id = parsed.id.as_ref().and_then(value_to_string);
        match (id, parsed.name) {
            (Some(id), Some(name)) if !name.is_empty() => {
                let items = parsed
                    .content
                    .as_deref()
                    .map(parse_group_content)
                    .unwrap_or_default();
                groups.push(Group::new(id, name, items));
            }
            _ => warn!("跳过缺少名称或 ID 的分组数据"),
        }
    }
    groups
}

/// # Summary
/// 解析分组的 `content` 字段。
///
/// # Logic
/// 1. 在第一个 `,` 处切分为代码段与类型代码段。
/// 2. 两段分别以 `|` 切分并丢弃空片段。
/// 3. 按位置配对；缺少类型代码的标的没有市场后缀。
pub fn parse_group_content(content: &str) -> Vec<Item> {
    let (codes, types) = content.split_once(',').unwrap_or((content, ""));
    let types: Vec<&str> = types.split('|').filter(|t| !t.is_empty()).collect();

    codes
        .split('|')
        .filter(|c| !c.is_empty())
        .enumerate()
        .map(|(i, code)| Item {
            code: code.to_string(),
            market: types.get(i).map(|t| market_abbr(t)),
        })
        .collect()
}

// 终端要求的 "code,typecode" 形式
fn item_content(item: &Item) -> String {
    let type_code = match item.market.as_deref() {
        Some(m) => market_code(m).map(str::to_string).unwrap_or_else(|| m.to_string()),
        None => String::new(),
    };
    format!("{},{}", item.code, type_code)
}

#[async_trait]
impl TerminalPort for ThsTerminal {
    /// # Summary
    /// 校验会话可用。
    ///
    /// # Logic
    /// 1. 未配置 Cookie 时直接拒绝。
    /// 2. 执行一次分组查询验证 Cookie 有效，同时获取版本号。
    async fn open(&self) -> Result<(), TerminalError> {
        if !self.has_cookies {
            return Err(TerminalError::Connection(
                "未配置终端 Cookie (terminal.cookies)".to_string(),
            ));
        }

        let groups = self
            .query_groups()
            .await
            .map_err(|e| TerminalError::Connection(e.to_string()))?;

        self.opened.store(true, Ordering::SeqCst);
        info!(
            "终端会话已建立: {} ({} 个分组, 版本 {:?})",
            self.base_url,
            groups.len(),
            self.current_version()
        );
        Ok(())
    }

    fn close(&self) {
        if self.opened.swap(false, Ordering::SeqCst) {
            *self.version_slot() = None;
            info!("终端会话已关闭: {}", self.base_url);
        }
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>, TerminalError> {
        self.ensure_open()?;
        self.query_groups().await
    }

    async fn add_item(&self, group_id: &GroupId, item: &Item) -> Result<(), TerminalError> {
        self.ensure_open()?;
        self.post_mutation(
            ADD_ITEM_ENDPOINT,
            vec![
                ("id", group_id.0.clone()),
                ("content", item_content(item)),
                ("num", "1".to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn delete_item(&self, group_id: &GroupId, item: &Item) -> Result<(), TerminalError> {
        self.ensure_open()?;
        self.post_mutation(
            DELETE_ITEM_ENDPOINT,
            vec![
                ("id", group_id.0.clone()),
                ("content", item_content(item)),
                ("num", "1".to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn add_group(&self, name: &str) -> Result<GroupId, TerminalError> {
        self.ensure_open()?;
        let data = self
            .post_mutation(ADD_GROUP_ENDPOINT, vec![("name", name.to_string())])
            .await?;

        if let Some(id) = data.id.as_ref().and_then(value_to_string) {
            return Ok(GroupId(id));
        }

        // 响应未携带新 ID 时回查分组列表
        self.query_groups()
            .await?
            .into_iter()
            .find(|g| g.name == name)
            .map(|g| g.group_id)
            .ok_or_else(|| TerminalError::Parse(format!("created group '{}' not found", name)))
    }

    async fn delete_group(&self, group_id: &GroupId) -> Result<(), TerminalError> {
        self.ensure_open()?;
        self.post_mutation(DELETE_GROUP_ENDPOINT, vec![("ids", group_id.0.clone())])
            .await?;
        Ok(())
    }

    async fn share_group(
        &self,
        group_id: &GroupId,
        expiry: ShareExpiry,
    ) -> Result<Option<String>, TerminalError> {
        self.ensure_open()?;
        let data = self
            .post_mutation(
                SHARE_GROUP_ENDPOINT,
                vec![
                    ("id", group_id.0.clone()),
                    ("valid_time", expiry.as_millis().to_string()),
                ],
            )
            .await?;
        Ok(data.url.or(data.share_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group_content() {
        let items = parse_group_content("600519|000001|300750|,17|33|");
        assert_eq!(
            items,
            vec![
                Item::new("600519", "SH"),
                Item::new("000001", "SZ"),
                Item {
                    code: "300750".to_string(),
                    market: None
                },
            ]
        );
        assert!(parse_group_content("").is_empty());
        assert!(parse_group_content(",").is_empty());
    }

    #[test]
    fn test_parse_group_list_skips_incomplete_groups() {
        let raw: Vec<Value> = serde_json::from_str(
            r#"[
                {"id": "0_35", "name": "白酒", "content": "600519|,17|"},
                {"id": 12, "name": "空分组", "content": ""},
                {"name": "无ID"},
                {"id": "0_36"},
                "garbage"
            ]"#,
        )
        .unwrap();

        let groups = parse_group_list(raw);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_id, GroupId::from("0_35"));
        assert_eq!(groups[0].items, vec![Item::new("600519", "SH")]);
        assert_eq!(groups[1].group_id, GroupId::from("12"));
        assert!(groups[1].items.is_empty());
    }

    #[test]
    fn test_item_content_uses_type_code() {
        assert_eq!(item_content(&Item::new("600519", "SH")), "600519,17");
        assert_eq!(item_content(&Item::new("00700", "HK")), "00700,55");
    }

    #[tokio::test]
    async fn test_open_without_cookies_is_refused() {
        let terminal = ThsTerminal::new(&TerminalConfig::default()).unwrap();
        let result = terminal.open().await;
        assert!(matches!(result, Err(TerminalError::Connection(_))));
        assert!(matches!(terminal.fetch_groups().await, Err(TerminalError::Closed)));
    }
}
