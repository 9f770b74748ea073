//! 测试辅助：内存版交易终端。

use crate::favorite::entity::{Group, GroupId, Item, ShareExpiry};
use crate::favorite::error::TerminalError;
use crate::favorite::port::TerminalPort;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    groups: Vec<Group>,
    next_id: u64,
    is_open: bool,
    open_count: usize,
    close_count: usize,
    refuse_open: bool,
    fail_next: Option<TerminalError>,
    shares: Vec<(GroupId, ShareExpiry)>,
}

/// # Summary
/// 完全运行在内存中的 `TerminalPort` 实现，用于门面层与接口层测试。
///
/// # Invariants
/// - 行为模拟真实终端：重复添加、删除不存在的标的、重名分组都会被拒绝。
/// - 支持注入一次性失败 (`fail_next`) 与拒绝建立会话 (`refuse_open`)。
pub struct MemoryTerminal {
    state: Mutex<State>,
}

impl MemoryTerminal {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1000,
                ..State::default()
            }),
        }
    }

    /// 以给定分组初始化终端数据
    pub fn with_groups(groups: Vec<Group>) -> Self {
        let terminal = Self::new();
        terminal.lock().groups = groups;
        terminal
    }

    /// 下一次终端调用返回指定错误
    pub fn fail_next(&self, err: TerminalError) {
        self.lock().fail_next = Some(err);
    }

    /// 让 `open` 返回连接错误
    pub fn refuse_open(&self) {
        self.lock().refuse_open = true;
    }

    pub fn open_count(&self) -> usize {
        self.lock().open_count
    }

    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }

    pub fn share_count(&self) -> usize {
        self.lock().shares.len()
    }

    /// 终端侧当前的分组数据
    pub fn groups(&self) -> Vec<Group> {
        self.lock().groups.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // 每次调用前检查会话状态并消费注入的失败
    fn begin(&self) -> Result<MutexGuard<'_, State>, TerminalError> {
        let mut state = self.lock();
        if !state.is_open {
            return Err(TerminalError::Closed);
        }
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        Ok(state)
    }
}

impl Default for MemoryTerminal {
    fn default() -> Self {
        Self::new()
    }
}

fn rejected(code: i64, message: &str) -> TerminalError {
    TerminalError::Rejected {
        code,
        message: message.to_string(),
    }
}

fn find_group<'a>(groups: &'a mut [Group], id: &GroupId) -> Result<&'a mut Group, TerminalError> {
    groups
        .iter_mut()
        .find(|g| &g.group_id == id)
        .ok_or_else(|| rejected(-1, "分组不存在"))
}

#[async_trait]
impl TerminalPort for MemoryTerminal {
    async fn open(&self) -> Result<(), TerminalError> {
        let mut state = self.lock();
        if state.refuse_open {
            return Err(TerminalError::Connection("terminal refused session".to_string()));
        }
        state.is_open = true;
        state.open_count += 1;
        Ok(())
    }

    fn close(&self) {
        let mut state = self.lock();
        if state.is_open {
            state.is_open = false;
            state.close_count += 1;
        }
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>, TerminalError> {
        let state = self.begin()?;
        Ok(state.groups.clone())
    }

    async fn add_item(&self, group_id: &GroupId, item: &Item) -> Result<(), TerminalError> {
        let mut state = self.begin()?;
        let group = find_group(&mut state.groups, group_id)?;
        if group.contains(item) {
            return Err(rejected(-2, "自选股已存在"));
        }
        group.items.push(item.clone());
        Ok(())
    }

    async fn delete_item(&self, group_id: &GroupId, item: &Item) -> Result<(), TerminalError> {
        let mut state = self.begin()?;
        let group = find_group(&mut state.groups, group_id)?;
        let before = group.items.len();
        group.items.retain(|i| i != item);
        if group.items.len() == before {
            return Err(rejected(-3, "自选股不存在"));
        }
        Ok(())
    }

    async fn add_group(&self, name: &str) -> Result<GroupId, TerminalError> {
        let mut state = self.begin()?;
        if state.groups.iter().any(|g| g.name == name) {
            return Err(rejected(-4, "分组名称已存在"));
        }
        state.next_id += 1;
        let group = Group::new(state.next_id.to_string(), name, Vec::new());
        let id = group.group_id.clone();
        state.groups.push(group);
        Ok(id)
    }

    async fn delete_group(&self, group_id: &GroupId) -> Result<(), TerminalError> {
        let mut state = self.begin()?;
        let before = state.groups.len();
        state.groups.retain(|g| &g.group_id != group_id);
        if state.groups.len() == before {
            return Err(rejected(-1, "分组不存在"));
        }
        Ok(())
    }

    async fn share_group(
        &self,
        group_id: &GroupId,
        expiry: ShareExpiry,
    ) -> Result<Option<String>, TerminalError> {
        let mut state = self.begin()?;
        find_group(&mut state.groups, group_id)?;
        state.shares.push((group_id.clone(), expiry));
        let seq = state.shares.len();
        Ok(Some(format!("https://t.10jqka.com.cn/share/{}/{}", group_id, seq)))
    }
}
