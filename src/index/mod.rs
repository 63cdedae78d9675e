pub mod bwt;
pub mod fm;
pub mod sa;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::overlap::interval::{Interval, IntervalPair};
use crate::util::dna;
use fm::{FMIndex, ReadSpan};

/// 索引构建时的元信息。
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct IndexMeta {
    pub reads_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

/// Read 集合的双向索引：正向文本与逐 read 反转文本各建一个 FM 索引。
/// 反向搜索在其中一个索引里进行时，另一个索引的区间通过
/// 小字母累计计数同步推进，保证区间对的宽度不变量。
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadIndex {
    pub fwd: FMIndex,
    pub rev: FMIndex,
    pub lens: Vec<u32>,
    pub meta: IndexMeta,
}

impl ReadIndex {
    /// 从归一化前的 read 序列集合构建双向索引。
    pub fn build(reads: &[Vec<u8>], block: usize) -> Result<Self> {
        if reads.is_empty() {
            anyhow::bail!("cannot build an index over an empty read set");
        }
        let mut lens = Vec::with_capacity(reads.len());
        for (i, r) in reads.iter().enumerate() {
            if r.is_empty() {
                anyhow::bail!("read {} is empty", i);
            }
            lens.push(r.len() as u32);
        }

        let fwd = Self::build_one(reads, block, false);
        let rev = Self::build_one(reads, block, true);
        Ok(Self { fwd, rev, lens, meta: IndexMeta::default() })
    }

    fn build_one(reads: &[Vec<u8>], block: usize, reversed: bool) -> FMIndex {
        let total: usize = reads.iter().map(|r| r.len() + 1).sum();
        let mut text: Vec<u8> = Vec::with_capacity(total + 1);
        let mut spans = Vec::with_capacity(reads.len());
        text.push(dna::SENTINEL);
        for r in reads {
            let offset = text.len() as u32;
            let norm = dna::normalize_seq(r);
            if reversed {
                text.extend(norm.iter().rev().map(|&b| dna::to_alphabet(b)));
            } else {
                text.extend(norm.iter().map(|&b| dna::to_alphabet(b)));
            }
            spans.push(ReadSpan { offset, len: r.len() as u32 });
            text.push(dna::SENTINEL);
        }
        let sa_arr = sa::build_sa(&text);
        let bwt_arr = bwt::build_bwt(&text, &sa_arr);
        FMIndex::build(bwt_arr, sa_arr, spans, dna::SIGMA as u8, block)
    }

    pub fn set_meta(&mut self, meta: IndexMeta) {
        self.meta = meta;
    }

    pub fn num_reads(&self) -> usize {
        self.lens.len()
    }

    pub fn read_len(&self, idx: usize) -> usize {
        self.lens[idx] as usize
    }

    /// 搜索所用的主索引：on_fwd 为真时在正向文本里搜索。
    pub fn primary(&self, on_fwd: bool) -> &FMIndex {
        if on_fwd { &self.fwd } else { &self.rev }
    }

    /// 单字符 c 在两个索引中的初始区间对。
    pub fn char_pair(&self, c: u8, on_fwd: bool) -> Option<IntervalPair> {
        let (pl, pu) = self.primary(on_fwd).char_interval(c)?;
        let (sl, su) = self.primary(!on_fwd).char_interval(c)?;
        // 同一字母在两个文本中出现次数相同
        debug_assert_eq!(pu - pl, su - sl);
        Some(IntervalPair::new(Interval::new(pl, pu), Interval::new(sl, su)))
    }

    /// 区间对向左扩展字符 c（模式在主索引中向前生长）。
    /// 副区间按主区间内小于 c 的字母计数整体平移，并收缩到相同宽度，
    /// 这一对称更新保持 size(interval[0]) == size(interval[1])。
    /// 扩展后不再匹配时返回 None。
    pub fn extend_pair_left(&self, pair: &IntervalPair, c: u8, on_fwd: bool) -> Option<IntervalPair> {
        let primary = self.primary(on_fwd);
        let (l, u) = (pair.interval[0].lower, pair.interval[0].upper);
        let (nl, nu) = primary.extend_interval_left(c, l, u);
        if nl > nu {
            return None;
        }
        let skipped = i64::from(primary.occ_lt(c, u as usize + 1))
            - i64::from(primary.occ_lt(c, l as usize));
        let sl = pair.interval[1].lower + skipped;
        let su = sl + (nu - nl);
        let out = IntervalPair::new(Interval::new(nl, nu), Interval::new(sl, su));
        debug_assert!(out.sizes_match());
        Some(out)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let mut f = std::fs::File::create(path)?;
        bincode::serialize_into(&mut f, self)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        let idx: Self = bincode::deserialize_from(f)?;
        Ok(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(s: &[u8]) -> Vec<u8> {
        s.iter().map(|&b| dna::to_alphabet(b)).collect()
    }

    fn test_index() -> ReadIndex {
        let reads: Vec<Vec<u8>> = [b"ACGTACGT".as_ref(), b"GTACGGTT", b"TTTTACGT"]
            .iter()
            .map(|r| r.to_vec())
            .collect();
        ReadIndex::build(&reads, 4).expect("index")
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(ReadIndex::build(&[], 4).is_err());
        assert!(ReadIndex::build(&[Vec::new()], 4).is_err());
    }

    #[test]
    fn pair_extension_preserves_sizes() {
        let idx = test_index();
        let pat = encode(b"ACGT");
        let mut pair = idx.char_pair(*pat.last().unwrap(), true).expect("init");
        for &c in pat.iter().rev().skip(1) {
            pair = idx.extend_pair_left(&pair, c, true).expect("extend");
            assert!(pair.sizes_match());
            assert!(pair.is_valid());
        }
        // ACGT occurs twice in read 0 and once in read 2
        assert_eq!(pair.interval[0].size(), 3);
    }

    #[test]
    fn extension_works_on_reverse_index_too() {
        let idx = test_index();
        // 在反转文本中搜索 reverse(prefix) 等价于查 read 前缀
        let pat = encode(b"TGCA"); // reverse of ACGT
        let mut pair = idx.char_pair(*pat.last().unwrap(), false).expect("init");
        for &c in pat.iter().rev().skip(1) {
            pair = idx.extend_pair_left(&pair, c, false).expect("extend");
            assert!(pair.sizes_match());
        }
        assert_eq!(pair.interval[0].size(), 3);
    }
}
