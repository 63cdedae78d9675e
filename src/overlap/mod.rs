//! Overlap 发现与共识纠错：
//!
//! - [`interval`] — 区间对与序列坐标
//! - [`block`] — overlap block、对齐标志、次极大规约与列表分割
//! - [`search`] — 双向 FM 索引上的四趟（含分支）反向搜索
//! - [`multi`] — block 到 overlap 记录 / multi-overlap 的展开
//! - [`pileup`] — 单列 pileup 的多数票与对数域后验共识
//! - [`correct`] — 单 read 的共识纠错流程
//! - [`rmdup`] — 重复与子串 read 的判定

pub mod block;
pub mod correct;
pub mod interval;
pub mod multi;
pub mod pileup;
pub mod rmdup;
pub mod search;
