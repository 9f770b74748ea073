use std::path::PathBuf;
use std::sync::OnceLock;

static ROOT_DIR: OnceLock<PathBuf> = OnceLock::new();

/// 设置本地数据根目录，进程内只生效一次。
///
/// # Returns
/// * 首次设置返回 `true`，已设置过则忽略本次设置并返回 `false`。
pub fn set_root_dir(path: PathBuf) -> bool {
    ROOT_DIR.set(path).is_ok()
}

/// 当前数据根目录，未设置时为 `data`。
pub fn get_root_dir() -> PathBuf {
    ROOT_DIR
        .get()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// 快照文件的完整路径：`<root>/<file_name>`。
pub fn snapshot_path(file_name: &str) -> PathBuf {
    get_root_dir().join(file_name)
}
