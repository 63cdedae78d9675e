//! Overlap block：一次反向搜索延伸路径命中的一组 read，
//! 以及把候选 block 列表规约为极大、互不相交集合的算法。

use anyhow::{bail, Result};

use crate::overlap::interval::{Interval, IntervalPair};
use crate::util::dna;

/// 比对方向标志：query 是否反转、target 是否反转、query 是否取互补。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlignFlags {
    pub query_rev: bool,
    pub target_rev: bool,
    pub query_comp: bool,
}

/// 串图中边的方向：overlap 落在 read 的 3' 端为 Sense，5' 端为 Antisense。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDir {
    Sense,
    Antisense,
}

impl AlignFlags {
    pub const FORWARD: Self = Self { query_rev: false, target_rev: false, query_comp: false };

    pub fn new(query_rev: bool, target_rev: bool, query_comp: bool) -> Self {
        Self { query_rev, target_rev, query_comp }
    }

    /// 恰有一侧以反转坐标表示时，匹配发生在反向互补链上。
    #[inline]
    pub fn is_reverse_complement(&self) -> bool {
        self.query_rev != self.target_rev
    }

    #[inline]
    pub fn edge_dir(&self) -> EdgeDir {
        if self.query_rev { EdgeDir::Antisense } else { EdgeDir::Sense }
    }
}

/// 反向搜索过程中记录的替换：第 pos 步（从搜索起点数起）用 base 代替了原碱基。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryItem {
    pub pos: usize,
    pub base: u8,
}

/// 一个 block 的字面搜索路径。精确搜索的路径为空。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHistory {
    items: Vec<HistoryItem>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pos: usize, base: u8) {
        self.items.push(HistoryItem { pos, base });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 搜索在互补空间进行时，把记录的碱基换回 read 自身的碱基空间。
    pub fn normalize(&mut self, query_comp: bool) {
        if query_comp {
            for item in &mut self.items {
                item.base = dna::complement(item.base);
            }
        }
    }

    /// 把搜索路径上的替换写回原始序列。
    /// pos 以搜索起点计：正向搜索从序列末位开始，故映射到 len-1-pos；
    /// query 反转时搜索从首位开始，pos 即下标。
    pub fn transform(&self, original: &[u8], query_rev: bool) -> Vec<u8> {
        let mut out = original.to_vec();
        let n = out.len();
        for item in &self.items {
            let idx = if query_rev { item.pos } else { n - 1 - item.pos };
            out[idx] = item.base;
        }
        out
    }
}

/// 一个候选匹配：区间对、overlap 长度、编辑距离上界、方向标志与搜索路径。
/// 由搜索步骤创建，只有 resolver 会在拆分时收缩其区间。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapBlock {
    pub ranges: IntervalPair,
    pub overlap_len: usize,
    pub num_diff: i32,
    pub flags: AlignFlags,
    pub history: SearchHistory,
}

impl OverlapBlock {
    pub fn new(
        ranges: IntervalPair,
        overlap_len: usize,
        num_diff: i32,
        flags: AlignFlags,
        mut history: SearchHistory,
    ) -> Self {
        history.normalize(flags.query_comp);
        Self { ranges, overlap_len, num_diff, flags, history }
    }

    /// 反向搜索时命中的字面 overlap 子串，已表达在 read 自身的方向与碱基空间。
    /// query 反转时搜索从序列前端开始，取前 overlap_len 个字符，否则取末尾。
    pub fn overlap_string(&self, original: &[u8]) -> Vec<u8> {
        let transformed = self.history.transform(original, self.flags.query_rev);
        if self.flags.query_rev {
            transformed[..self.overlap_len].to_vec()
        } else {
            transformed[transformed.len() - self.overlap_len..].to_vec()
        }
    }

}

pub type OverlapBlockList = Vec<OverlapBlock>;

/// resolver 的诊断通道：罕见但合法的情况（三段拆分）记录在这里，
/// 由调用方决定打印或丢弃，核心算法不持有进程级状态。
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.messages.push(msg.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// 按 interval[0] 左端点升序排序，同 lower 时按 upper。
pub fn sort_blocks_left(blocks: &mut [OverlapBlock]) {
    blocks.sort_by_key(|b| (b.ranges.interval[0].lower, b.ranges.interval[0].upper));
}

fn check_fragment(b: &OverlapBlock) -> Result<()> {
    if !b.ranges.is_valid() || !b.ranges.sizes_match() {
        bail!(
            "invalid interval pair after split: [{}, {}] / [{}, {}]",
            b.ranges.interval[0].lower,
            b.ranges.interval[0].upper,
            b.ranges.interval[1].lower,
            b.ranges.interval[1].upper
        );
    }
    Ok(())
}

/// 把两个在 interval[0] 上相交的 block 拆成至多三个极大且互不相交的 block。
///
/// overlap 更长的 block 整体保留；较短者被拆成至多两个残片。
/// 区间对两侧用同一宽度增量对称收缩，绝不按绝对位置重算，
/// 以保持 size(interval[0]) == size(interval[1])。
pub fn resolve_overlap(
    a: OverlapBlock,
    b: OverlapBlock,
    diag: &mut Diagnostics,
) -> Result<OverlapBlockList> {
    // overlap 长度相同的两个 block 必然来自不同种子的同一匹配，直接去重
    if a.overlap_len == b.overlap_len {
        if a.ranges.interval[0] == b.ranges.interval[0] {
            return Ok(vec![a]);
        }
        bail!(
            "overlap blocks with equal length {} have different coordinates: \
             [{}, {}] vs [{}, {}]",
            a.overlap_len,
            a.ranges.interval[0].lower,
            a.ranges.interval[0].upper,
            b.ranges.interval[0].lower,
            b.ranges.interval[0].upper
        );
    }

    let (higher, lower) = if a.overlap_len > b.overlap_len { (a, b) } else { (b, a) };
    let hi = higher.ranges.interval[0];
    let lo = lower.ranges.interval[0];

    let mut out = Vec::with_capacity(3);
    out.push(higher);

    // 左残片：lower 在 higher 左侧多出的部分
    if lo.lower < hi.lower {
        let mut split = lower.clone();
        split.ranges.interval[0] = Interval::new(lo.lower, hi.lower - 1);
        let diff = split.ranges.interval[0].upper - split.ranges.interval[0].lower;
        let rev_lower = lower.ranges.interval[1].lower;
        split.ranges.interval[1] = Interval::new(rev_lower, rev_lower + diff);
        check_fragment(&split)?;
        out.push(split);
    }

    // 右残片：lower 在 higher 右侧多出的部分
    if lo.upper > hi.upper {
        let mut split = lower;
        split.ranges.interval[0] = Interval::new(hi.upper + 1, lo.upper);
        let diff = split.ranges.interval[0].upper - split.ranges.interval[0].lower;
        let rev_upper = split.ranges.interval[1].upper;
        split.ranges.interval[1] = Interval::new(rev_upper - diff, rev_upper);
        check_fragment(&split)?;
        out.push(split);
    }

    if out.len() == 3 {
        diag.warn(format!(
            "overlap block [{}, {}] was split into 3 segments",
            lo.lower, lo.upper
        ));
    }

    sort_blocks_left(&mut out);
    Ok(out)
}

/// 反复扫描相邻 block 对，把 interval[0] 相交的一对交给 resolve_overlap，
/// 合并其输出后从头重扫，直到所有区间两两不相交。
/// 相交是罕见情况，正确性优先于效率。
pub fn remove_sub_maximal_blocks(
    mut blocks: OverlapBlockList,
    diag: &mut Diagnostics,
) -> Result<OverlapBlockList> {
    sort_blocks_left(&mut blocks);
    'restart: loop {
        for i in 0..blocks.len().saturating_sub(1) {
            let cur = blocks[i].ranges.interval[0];
            let next = blocks[i + 1].ranges.interval[0];
            if cur.intersects(&next) {
                let b = blocks.remove(i + 1);
                let a = blocks.remove(i);
                let resolved = resolve_overlap(a, b, diag)?;
                blocks.extend(resolved);
                sort_blocks_left(&mut blocks);
                continue 'restart;
            }
        }
        return Ok(blocks);
    }
}

/// 把完整列表按 overlap 长度划分为 containment 与 proper overlap 两个列表。
/// 稳定单趟：每个输入 block 恰好落入一个输出列表，原列表清空。
pub fn partition_block_list(
    read_len: usize,
    complete: &mut OverlapBlockList,
    overlaps: &mut OverlapBlockList,
    contains: &mut OverlapBlockList,
) {
    for block in complete.drain(..) {
        if block.overlap_len == read_len {
            contains.push(block);
        } else {
            overlaps.push(block);
        }
    }
}

/// 规约 + 划分一步式接口。列表必须来自同一趟搜索：
/// 不同趟的区间属于不同坐标系，不能放进同一次规约。
pub fn resolve_and_partition(
    blocks: OverlapBlockList,
    read_len: usize,
    diag: &mut Diagnostics,
) -> Result<(OverlapBlockList, OverlapBlockList)> {
    let mut resolved = remove_sub_maximal_blocks(blocks, diag)?;
    let mut overlaps = Vec::new();
    let mut contains = Vec::new();
    partition_block_list(read_len, &mut resolved, &mut overlaps, &mut contains);
    Ok((overlaps, contains))
}
