//! 在双向 FM 索引上发现后缀/前缀 overlap：
//! 反向搜索 query 后缀，每到一个 >= min_overlap 的长度就做一次
//! 哨兵延伸，取出"以当前后缀为前缀"的 read 区间，生成一个 OverlapBlock。
//!
//! 搜索按分支方式进行，允许与 query 不同的碱基参与扩展并记入
//! 搜索路径，当前不匹配数受 error_rate * 已匹配长度约束；
//! error_rate 为 0 时退化为精确搜索。

use std::collections::HashMap;

use anyhow::Result;

use crate::index::ReadIndex;
use crate::overlap::block::{
    resolve_and_partition, AlignFlags, Diagnostics, OverlapBlock, OverlapBlockList, SearchHistory,
};
use crate::overlap::interval::IntervalPair;
use crate::util::dna;

/// 一条 read 的搜索结果：proper overlap 与 containment 分列两处。
/// is_substring 表示 query 完整出现在某条更长 read 的内部或一端，
/// 这类 read 不会以 proper overlap 出现。
#[derive(Debug)]
pub struct OverlapResult {
    pub overlaps: OverlapBlockList,
    pub contains: OverlapBlockList,
    pub is_substring: bool,
}

/// 搜索中的一条分支：区间对、不匹配数与替换路径。
#[derive(Debug, Clone)]
struct SearchState {
    pair: IntervalPair,
    num_diff: i32,
    history: SearchHistory,
}

/// read 集合上的 overlap 搜索器。只读共享索引，可被多个线程并发调用。
pub struct Overlapper<'a> {
    index: &'a ReadIndex,
    error_rate: f64,
}

impl<'a> Overlapper<'a> {
    /// error_rate 为每碱基允许的不匹配率；0 表示只做精确搜索。
    pub fn new(index: &'a ReadIndex, error_rate: f64) -> Self {
        Self { index, error_rate }
    }

    pub fn index(&self) -> &ReadIndex {
        self.index
    }

    #[inline]
    fn max_diff(&self, matched: usize) -> i32 {
        (self.error_rate * matched as f64).floor() as i32
    }

    /// 四趟搜索覆盖 read 两端与两条链：
    /// query 原序（sense 3' 端）、反转（sense 5' 端）、
    /// 反向互补与互补（antisense 两端）。
    /// 每趟的 block 列表各自做次极大规约后再合并，
    /// 不同趟的区间属于不同坐标系，不能交叉比较。
    pub fn overlap_read(
        &self,
        seq: &[u8],
        min_overlap: usize,
        diag: &mut Diagnostics,
    ) -> Result<OverlapResult> {
        if min_overlap == 0 {
            anyhow::bail!("min_overlap must be at least 1");
        }
        let norm = dna::normalize_seq(seq);

        let passes: [(Vec<u8>, bool, AlignFlags, bool); 4] = [
            (norm.clone(), true, AlignFlags::FORWARD, true),
            (dna::reverse_seq(&norm), false, AlignFlags::new(true, true, false), false),
            (dna::revcomp(&norm), true, AlignFlags::new(true, false, true), true),
            (dna::complement_seq(&norm), false, AlignFlags::new(false, true, true), false),
        ];

        let mut overlaps = Vec::new();
        let mut contains = Vec::new();
        let mut is_substring = false;
        for (pat, on_fwd, flags, emit_containment) in passes {
            let (pass_blocks, substring) =
                self.search_pass(&pat, on_fwd, flags, min_overlap, emit_containment)?;
            let (mut o, mut c) = resolve_and_partition(pass_blocks, norm.len(), diag)?;
            overlaps.append(&mut o);
            contains.append(&mut c);
            if substring {
                is_substring = true;
            }
        }
        Ok(OverlapResult { overlaps, contains, is_substring })
    }

    /// 单趟分支反向搜索。返回该趟的 block 与子串判定。
    fn search_pass(
        &self,
        pat: &[u8],
        on_fwd: bool,
        flags: AlignFlags,
        min_overlap: usize,
        emit_containment: bool,
    ) -> Result<(OverlapBlockList, bool)> {
        let n = pat.len();
        let mut blocks = Vec::new();
        if n == 0 {
            return Ok((blocks, false));
        }
        let encoded: Vec<u8> = pat.iter().map(|&b| dna::to_alphabet(b)).collect();
        let mut is_substring = false;

        // 初始分支：最后一个位置上每个可行的碱基
        let mut states: Vec<SearchState> = Vec::new();
        for c in 1..=4u8 {
            let diff = i32::from(c != encoded[n - 1]);
            if diff > self.max_diff(1) {
                continue;
            }
            if let Some(pair) = self.index.char_pair(c, on_fwd) {
                let mut history = SearchHistory::new();
                if diff > 0 {
                    history.add(0, dna::from_alphabet(c));
                }
                states.push(SearchState { pair, num_diff: diff, history });
            }
        }

        for i in (0..n - 1).rev() {
            let matched = n - i;
            let allowed = self.max_diff(matched);
            let mut next: Vec<SearchState> = Vec::new();
            for state in &states {
                for c in 1..=4u8 {
                    let diff = state.num_diff + i32::from(c != encoded[i]);
                    if diff > allowed {
                        continue;
                    }
                    let Some(pair) = self.index.extend_pair_left(&state.pair, c, on_fwd) else {
                        continue;
                    };
                    let mut history = state.history.clone();
                    if c != encoded[i] {
                        history.add(n - 1 - i, dna::from_alphabet(c));
                    }
                    next.push(SearchState { pair, num_diff: diff, history });
                }
            }
            dedup_states(&mut next);
            states = next;
            if states.is_empty() {
                break;
            }

            if matched < min_overlap {
                continue;
            }
            let is_full = matched == n;
            if is_full {
                if let Some(exact) = states.iter().find(|s| s.num_diff == 0) {
                    is_substring = emit_containment && self.interior_occurrence(&exact.pair, on_fwd);
                }
                if !emit_containment {
                    break;
                }
            }
            // 哨兵延伸：以当前后缀为前缀的 read 区间
            for state in &states {
                if let Some(terminal) = self.index.extend_pair_left(&state.pair, dna::SENTINEL, on_fwd) {
                    blocks.push(OverlapBlock::new(
                        terminal,
                        matched,
                        state.num_diff,
                        flags,
                        state.history.clone(),
                    ));
                }
            }
        }
        Ok((blocks, is_substring))
    }

    /// 全长匹配的区间里是否存在两侧都未锚定在哨兵上的出现。
    /// interval[0] 的 BWT 字符是出现位置的前驱，interval[1]（反转文本）
    /// 的 BWT 字符对应正向文本中的后继。
    fn interior_occurrence(&self, pair: &IntervalPair, on_fwd: bool) -> bool {
        let primary = self.index.primary(on_fwd);
        let secondary = self.index.primary(!on_fwd);
        let p = pair.interval[0];
        let s = pair.interval[1];
        let left_anchored = primary.occ(dna::SENTINEL, p.upper as usize + 1)
            - primary.occ(dna::SENTINEL, p.lower as usize);
        let right_anchored = secondary.occ(dna::SENTINEL, s.upper as usize + 1)
            - secondary.occ(dna::SENTINEL, s.lower as usize);
        let size = p.size() as u32;
        left_anchored < size || right_anchored < size
    }
}

/// 收敛到同一区间的分支只保留不匹配数最小的那条。
fn dedup_states(states: &mut Vec<SearchState>) {
    if states.len() <= 1 {
        return;
    }
    let mut best: HashMap<(i64, i64), usize> = HashMap::new();
    let mut keep = vec![false; states.len()];
    for (i, s) in states.iter().enumerate() {
        let key = (s.pair.interval[0].lower, s.pair.interval[0].upper);
        match best.get(&key) {
            Some(&j) if states[j].num_diff <= s.num_diff => {}
            _ => {
                if let Some(j) = best.insert(key, i) {
                    keep[j] = false;
                }
                keep[i] = true;
            }
        }
    }
    let mut idx = 0;
    states.retain(|_| {
        let k = keep[idx];
        idx += 1;
        k
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::multi::to_overlaps;

    fn test_index() -> ReadIndex {
        let reads: Vec<Vec<u8>> = [
            b"ACGTTAGCAC".as_ref(), // 0
            b"AGCACTTGGA",          // 1: prefix AGCAC == suffix of read 0
            b"GTTAG",               // 2: interior substring of read 0
            b"ACGTTAGCAC",          // 3: identical to read 0
        ]
        .iter()
        .map(|r| r.to_vec())
        .collect();
        ReadIndex::build(&reads, 4).expect("index")
    }

    #[test]
    fn finds_suffix_prefix_overlap() {
        let idx = test_index();
        let ov = Overlapper::new(&idx, 0.0);
        let mut diag = Diagnostics::new();
        let result = ov.overlap_read(b"ACGTTAGCAC", 5, &mut diag).unwrap();
        assert!(!result.is_substring);

        // read 0 后缀 AGCAC(5) == read 1 前缀
        let overlaps = to_overlaps(&idx, &result.overlaps, 0, 10);
        assert_eq!(overlaps.len(), 1);
        let o = &overlaps[0];
        assert_eq!(o.target_id, "1");
        assert_eq!((o.query_coord.start, o.query_coord.end), (5, 9));
        assert_eq!((o.target_coord.start, o.target_coord.end), (0, 4));
        assert!(!o.is_reverse_complement);

        // read 3 是完全重复，落在 containment 列表
        let dup = to_overlaps(&idx, &result.contains, 0, 10);
        assert_eq!(dup.len(), 1);
        assert_eq!(dup[0].target_id, "3");
        assert!(dup[0].is_containment());
    }

    #[test]
    fn interior_substring_is_flagged_without_blocks() {
        let idx = test_index();
        let ov = Overlapper::new(&idx, 0.0);
        let mut diag = Diagnostics::new();
        let result = ov.overlap_read(b"GTTAG", 4, &mut diag).unwrap();
        assert!(result.is_substring);
        // 没有锚定在 read 前缀上的 proper 匹配
        assert!(to_overlaps(&idx, &result.overlaps, 2, 5).is_empty());
    }

    #[test]
    fn reverse_complement_overlap_carries_rc_flag() {
        let reads: Vec<Vec<u8>> = [
            b"AACCTTGGCA".as_ref(),
            b"TGCCAAGGTT", // revcomp of read 0
        ]
        .iter()
        .map(|r| r.to_vec())
        .collect();
        let idx = ReadIndex::build(&reads, 4).expect("index");
        let ov = Overlapper::new(&idx, 0.0);
        let mut diag = Diagnostics::new();
        let result = ov.overlap_read(b"AACCTTGGCA", 10, &mut diag).unwrap();
        // 全长反向互补匹配是一个 RC containment
        let rc_hits: Vec<_> = to_overlaps(&idx, &result.contains, 0, 10)
            .into_iter()
            .filter(|o| o.is_reverse_complement)
            .collect();
        assert!(!rc_hits.is_empty());
        assert!(rc_hits.iter().all(|o| o.target_id == "1"));
    }

    #[test]
    fn min_overlap_is_respected() {
        let idx = test_index();
        let ov = Overlapper::new(&idx, 0.0);
        let mut diag = Diagnostics::new();
        let result = ov.overlap_read(b"ACGTTAGCAC", 6, &mut diag).unwrap();
        // AGCAC 只有 5 bp，min_overlap=6 时不再出现
        assert!(to_overlaps(&idx, &result.overlaps, 0, 10).is_empty());
        assert!(ov.overlap_read(b"ACGTTAGCAC", 0, &mut diag).is_err());
    }

    #[test]
    fn inexact_search_records_substitution_history() {
        // read 0 后缀与 read 1 前缀差一个碱基
        let reads: Vec<Vec<u8>> = [
            b"TTTTTGATTACAGGCATTACCGGAT".as_ref(), // 0
            b"GATCACAGGCATTACCGGATCCCCC",          // 1: prefix == read0[5..] 仅一处不同
        ]
        .iter()
        .map(|r| r.to_vec())
        .collect();
        let idx = ReadIndex::build(&reads, 4).expect("index");
        let mut diag = Diagnostics::new();

        // 精确搜索找不到
        let exact = Overlapper::new(&idx, 0.0)
            .overlap_read(&reads[0], 15, &mut diag)
            .unwrap();
        assert!(to_overlaps(&idx, &exact.overlaps, 0, 25).is_empty());

        // 允许 ~8% 错误率后命中，block 带上 num_diff 与替换路径
        let inexact = Overlapper::new(&idx, 0.08)
            .overlap_read(&reads[0], 15, &mut diag)
            .unwrap();
        let hits: Vec<_> = to_overlaps(&idx, &inexact.overlaps, 0, 25)
            .into_iter()
            .filter(|o| o.target_id == "1")
            .collect();
        assert!(!hits.is_empty());
        assert!(hits.iter().any(|o| o.num_diff == 1));
    }
}
