//! 共享库
//!
//! 包含服务共用的配置、数据库连接、日志初始化和重试等基础设施代码。

pub mod config;
pub mod database;
pub mod observability;
pub mod retry;
