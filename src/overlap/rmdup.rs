//! read 集合去重：全长搜索一条 read，按 containment 关系
//! 把它判成保留、与更早 read 完全相同（含反向互补相同）、
//! 或更长 read 的子串三类。

use anyhow::Result;

use crate::overlap::block::Diagnostics;
use crate::overlap::search::Overlapper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DupStatus {
    /// 集合中的第一份拷贝，写出
    Kept,
    /// 与编号更小的 read 完全相同（或互为反向互补），丢弃
    Identical,
    /// 是某条更长 read 的子串，丢弃
    Substring,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RmdupStats {
    pub kept: usize,
    pub identical: usize,
    pub substring: usize,
}

impl RmdupStats {
    pub fn record(&mut self, status: DupStatus) {
        match status {
            DupStatus::Kept => self.kept += 1,
            DupStatus::Identical => self.identical += 1,
            DupStatus::Substring => self.substring += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.kept + self.identical + self.substring
    }
}

/// 判定编号 query_idx 的 read。相同 read 只保留编号最小的一份。
pub fn classify_read(
    overlapper: &Overlapper,
    query_idx: usize,
    seq: &[u8],
    diag: &mut Diagnostics,
) -> Result<DupStatus> {
    // min_overlap 取全长，命中只可能是 containment
    let result = overlapper.overlap_read(seq, seq.len(), diag)?;
    if result.is_substring {
        return Ok(DupStatus::Substring);
    }

    let index = overlapper.index();
    for block in &result.contains {
        let fm = index.primary(!block.flags.target_rev);
        let iv = block.ranges.interval[0];
        for &p in fm.sa_positions(iv.lower, iv.upper) {
            let Some(target) = fm.read_after_sentinel(p) else { continue };
            if target == query_idx {
                continue;
            }
            if index.read_len(target) == seq.len() && target < query_idx {
                return Ok(DupStatus::Identical);
            }
        }
    }
    Ok(DupStatus::Kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ReadIndex;

    fn classify_all(reads: &[Vec<u8>]) -> Vec<DupStatus> {
        let idx = ReadIndex::build(reads, 4).expect("index");
        let overlapper = Overlapper::new(&idx, 0.0);
        let mut diag = Diagnostics::new();
        reads
            .iter()
            .enumerate()
            .map(|(i, r)| classify_read(&overlapper, i, r, &mut diag).unwrap())
            .collect()
    }

    #[test]
    fn keeps_first_copy_drops_later_identical_and_substrings() {
        let reads = vec![
            b"ACGTTAGCAC".to_vec(),
            b"ACGTTAGCAC".to_vec(), // identical to read 0
            b"GTTAG".to_vec(),      // interior substring of read 0
            b"AGCACTTGGA".to_vec(),
        ];
        let statuses = classify_all(&reads);
        assert_eq!(
            statuses,
            vec![DupStatus::Kept, DupStatus::Identical, DupStatus::Substring, DupStatus::Kept]
        );
        let mut stats = RmdupStats::default();
        for s in statuses {
            stats.record(s);
        }
        assert_eq!((stats.kept, stats.identical, stats.substring), (2, 1, 1));
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn reverse_complement_copies_are_identical() {
        let reads = vec![
            b"AACCTTGGCA".to_vec(),
            b"TGCCAAGGTT".to_vec(), // revcomp of read 0
        ];
        let statuses = classify_all(&reads);
        assert_eq!(statuses, vec![DupStatus::Kept, DupStatus::Identical]);
    }

    #[test]
    fn prefix_copy_counts_as_substring() {
        let reads = vec![b"ACGTTAGCACTT".to_vec(), b"ACGTTAGC".to_vec()];
        let statuses = classify_all(&reads);
        assert_eq!(statuses, vec![DupStatus::Kept, DupStatus::Substring]);
    }
}
