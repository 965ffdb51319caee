//! # shengci-algo - 间隔重复调度算法库
//!
//! 本 crate 提供纯 Rust 实现的闪卡复习调度:
//!
//! - **SM-2 式调度** - 评分驱动的复习间隔与 ease 因子演化
//! - **到期判定** - 卡片何时重新进入复习队列
//!
//! ## 设计理念
//!
//! - **纯函数** - 调度转移不读时钟、不碰存储，当前时间由调用方注入
//! - **全函数** - 所有数值路径对其定义域封闭，越界 ease 由钳制吸收
//! - **充分测试** - 单元测试之外附带 proptest 性质测试
//!
//! ## 模块结构
//!
//! - [`srs`] - 调度转移函数 (评分 → 下一条 SRS 状态)
//! - [`sanitize`] - 持久化状态的数值清洗
//! - [`types`] - 公共类型和常量
//!
//! ## 使用示例
//!
//! ```rust
//! use chrono::Utc;
//! use shengci_algo::{next_srs_state, ReviewScore, SrsState};
//!
//! let now = Utc::now();
//! let card = SrsState::new_card(now);
//! let after = next_srs_state(&card, ReviewScore::Easy, now);
//! assert_eq!(after.repetitions, 1);
//! assert_eq!(after.interval_days, 1);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod sanitize;
pub mod srs;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

/// 重新导出调度函数
pub use srs::{add_days, next_srs_state};
