//! # `zixuan-manager` - 应用服务层
//!
//! 提供自选股分组门面 `FavoriteService`，CLI 与 HTTP 接口都只通过它访问终端。

pub mod favorite;
