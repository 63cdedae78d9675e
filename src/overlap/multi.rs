//! 归一化的 pairwise overlap 记录，以及锚定在单条 read 上的多重比对。

use crate::index::ReadIndex;
use crate::overlap::block::{OverlapBlock, OverlapBlockList};
use crate::overlap::interval::SeqCoord;
use crate::overlap::pileup::Pileup;
use crate::util::dna;

/// 归一化的 pairwise 匹配。两侧坐标都已表达在各自 read 的正向方向上。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub query_id: String,
    pub query_coord: SeqCoord,
    pub target_id: String,
    pub target_coord: SeqCoord,
    pub is_reverse_complement: bool,
    pub num_diff: i32,
}

impl Overlap {
    /// 某一侧的区间覆盖整条 read 时，这是一个 containment。
    pub fn is_containment(&self) -> bool {
        self.query_coord.is_contained() || self.target_coord.is_contained()
    }

    /// 被包含的一侧：0 为 query，1 为 target。两侧都覆盖（完全相同的
    /// read）时返回 0，调用方自行用编号决定去留。
    pub fn contained_side(&self) -> usize {
        usize::from(!self.query_coord.is_contained())
    }
}

impl OverlapBlock {
    /// 把 block 转成归一化 overlap 记录。
    /// 按搜索的构造，query 的匹配是后缀（start = query_len - overlap_len），
    /// target 的匹配是前缀（start = 0）；随后按方向标志 flip 对应坐标，
    /// 使两侧坐标都落回各自 read 的正向坐标系。
    pub fn to_overlap(
        &self,
        query_id: impl Into<String>,
        target_id: impl Into<String>,
        query_len: usize,
        target_len: usize,
    ) -> Overlap {
        let ol = self.overlap_len;
        let mut qc = SeqCoord::new(query_len - ol, query_len - 1, query_len);
        let mut tc = SeqCoord::new(0, ol - 1, target_len);
        if self.flags.query_rev {
            qc.flip();
        }
        if self.flags.target_rev {
            tc.flip();
        }
        Overlap {
            query_id: query_id.into(),
            query_coord: qc,
            target_id: target_id.into(),
            target_coord: tc,
            is_reverse_complement: self.flags.is_reverse_complement(),
            num_diff: self.num_diff,
        }
    }
}

/// 把一个 block 列表展开为 query read 的全部 overlap 记录。
/// target 编号来自区间内每个 SA 位置后面的 read，自身命中被跳过。
pub fn to_overlaps(
    index: &ReadIndex,
    blocks: &OverlapBlockList,
    query_idx: usize,
    query_len: usize,
) -> Vec<Overlap> {
    let query_id = query_idx.to_string();
    let mut out = Vec::new();
    for block in blocks {
        let fm = index.primary(!block.flags.target_rev);
        let iv = block.ranges.interval[0];
        for &p in fm.sa_positions(iv.lower, iv.upper) {
            let Some(target) = fm.read_after_sentinel(p) else { continue };
            if target == query_idx {
                continue;
            }
            out.push(block.to_overlap(
                query_id.clone(),
                target.to_string(),
                query_len,
                index.read_len(target),
            ));
        }
    }
    out
}

#[derive(Debug, Clone)]
struct MoEntry {
    seq: Vec<u8>,
    overlap: Overlap,
}

/// 锚定 read 加上与之重叠的 (子串, overlap) 集合。
/// 持有字符串副本，构建后不再引用 read 存储。
#[derive(Debug)]
pub struct MultiOverlap {
    pub id: String,
    pub seq: Vec<u8>,
    entries: Vec<MoEntry>,
}

impl MultiOverlap {
    pub fn new(id: impl Into<String>, seq: Vec<u8>) -> Self {
        Self { id: id.into(), seq, entries: Vec::new() }
    }

    pub fn add(&mut self, seq: Vec<u8>, overlap: Overlap) {
        self.entries.push(MoEntry { seq, overlap });
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// 锚定位置 pos 上的 pileup：锚定 read 自身的碱基在前，
    /// 之后是所有覆盖该位置的 overlap 子串的碱基。
    fn pileup_at(&self, pos: usize, anchor_log_error: f64) -> Pileup {
        let mut p = Pileup::new();
        p.add_with_prob(self.seq[pos], anchor_log_error);
        for e in &self.entries {
            let qc = &e.overlap.query_coord;
            if pos >= qc.start && pos <= qc.end {
                let idx = e.overlap.target_coord.start + (pos - qc.start);
                p.add(e.seq[idx]);
            }
        }
        p
    }

    /// 逐位置共识：对每个位置取后验最大的碱基拼接出校正序列。
    /// 没有任何 overlap 覆盖的位置保留锚定 read 的原碱基。
    pub fn calculate_consensus_from_partition(
        &self,
        error_rate: f64,
        anchor_qual: Option<&[u8]>,
    ) -> Vec<u8> {
        let default_log_error = error_rate.ln();
        let mut out = Vec::with_capacity(self.seq.len());
        for pos in 0..self.seq.len() {
            let lp = anchor_qual
                .map_or(default_log_error, |q| dna::phred33_to_log_error(q[pos]));
            let pile = self.pileup_at(pos, lp);
            if pile.depth() <= 1 {
                out.push(self.seq[pos]);
            } else {
                match pile.consensus(error_rate) {
                    Some(b) => out.push(b),
                    None => out.push(self.seq[pos]),
                }
            }
        }
        out
    }
}

/// 把解析完的 block 列表装配成锚定 read 的多重比对。
///
/// overlap 子串通过 block 记录的搜索路径还原，已处在搜索方向上，
/// 因此这里从不把它当作反向互补比较（isRC 恒为 false）。
/// query 坐标的计算与 to_overlap 相同；覆盖整条 read 的 block
/// 属于 containment，由划分步骤处理，这里静默跳过。
pub fn block_list_to_multi_overlap(
    id: impl Into<String>,
    seq: &[u8],
    blocks: &OverlapBlockList,
) -> MultiOverlap {
    let id = id.into();
    let mut out = MultiOverlap::new(id.clone(), seq.to_vec());
    let n = seq.len();
    for block in blocks {
        let ol = block.overlap_len;
        let overlap_string = block.overlap_string(seq);

        let mut qc = SeqCoord::new(n - ol, n - 1, n);
        let mut tc = SeqCoord::new(0, ol - 1, overlap_string.len());
        if block.flags.query_rev {
            qc.flip();
        }
        if block.flags.target_rev {
            tc.flip();
        }
        if qc.is_contained() {
            continue;
        }

        // 区间内的每个 read 各记一条 overlap，target 编号即区间下标
        let iv = block.ranges.interval[0];
        for i in iv.lower..=iv.upper {
            let o = Overlap {
                query_id: id.clone(),
                query_coord: qc,
                target_id: i.to_string(),
                target_coord: tc,
                is_reverse_complement: false,
                num_diff: -1,
            };
            out.add(overlap_string.clone(), o);
        }
    }
    out
}
