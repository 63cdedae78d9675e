//! # sga-rust
//!
//! 受 [SGA](https://github.com/jts/sga) 启发的 Rust 版 read overlapper 与纠错器。
//!
//! 本 crate 在 read 集合上提供基于双向 FM 索引的 overlap 发现与
//! 共识纠错功能，包括：
//!
//! - **索引构建**：正向与逐 read 反转文本的双 FM 索引（后缀数组 + BWT）
//! - **overlap 搜索**：后缀/前缀精确与近似匹配，覆盖两端与两条链
//! - **block 规约**：次极大 overlap 消除与 containment 分割
//! - **共识纠错**：multi-overlap pileup 上的多数票 / 对数域后验共识
//! - **去重**：完全相同（含反向互补）与子串 read 的剔除
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use sga_rust::index::ReadIndex;
//! use sga_rust::overlap::block::Diagnostics;
//! use sga_rust::overlap::multi::to_overlaps;
//! use sga_rust::overlap::search::Overlapper;
//!
//! let reads: Vec<Vec<u8>> = vec![
//!     b"ACGTTAGCAC".to_vec(),
//!     b"AGCACTTGGA".to_vec(),
//! ];
//! let index = ReadIndex::build(&reads, 128).unwrap();
//!
//! // read 0 的后缀与 read 1 的前缀至少重叠 5 bp
//! let overlapper = Overlapper::new(&index, 0.0);
//! let mut diag = Diagnostics::new();
//! let result = overlapper.overlap_read(&reads[0], 5, &mut diag).unwrap();
//! for o in to_overlaps(&index, &result.overlaps, 0, reads[0].len()) {
//!     println!("{} overlaps {} ({} bp)", o.query_id, o.target_id, o.query_coord.length());
//! }
//! ```
//!
//! ## 模块说明
//!
//! - [`io`] — FASTA / FASTQ 读写
//! - [`index`] — 双向 FM 索引构建（后缀数组、BWT、read 定位）
//! - [`overlap`] — overlap 搜索、block 规约、共识纠错与去重
//! - [`util`] — DNA 编码 / 反向互补 / 质量值转换等工具函数

pub mod io;
pub mod index;
pub mod overlap;
pub mod util;
