//! vigil 领域核心：实体、错误枚举与端口 (Port) 定义。
//!
//! 具体实现全部位于适配器 crate 中，由 `vigil-app` 组装注入。

pub mod common;
pub mod config;
pub mod market;
pub mod notify;
pub mod signal;
pub mod store;
