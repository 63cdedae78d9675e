//! 基于 overlap 共识的单 read 纠错：
//! 搜索 overlap，规约并分割 block 列表，把 proper overlap
//! 铺成 multi-overlap，再按列共识改写 read。

use anyhow::Result;

use crate::overlap::block::Diagnostics;
use crate::overlap::multi::block_list_to_multi_overlap;
use crate::overlap::search::Overlapper;
use crate::util::dna;

/// 纠错结果标记。NotCorrected 表示没有任何覆盖，原序列原样返回。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectFlag {
    Corrected,
    NotCorrected,
}

#[derive(Debug)]
pub struct CorrectResult {
    pub seq: Vec<u8>,
    pub flag: CorrectFlag,
}

pub struct CorrectParams {
    /// overlap 搜索的最短长度
    pub min_overlap: usize,
    /// 共识模型的每碱基先验错误率
    pub p_error: f64,
}

impl Default for CorrectParams {
    fn default() -> Self {
        Self { min_overlap: 21, p_error: 0.01 }
    }
}

/// 对一条 read 做一轮共识纠错。qual 为可选的 Phred+33 质量串，
/// 提供时锚 read 的每个碱基按各自的质量参与共识。
pub fn correct_read(
    overlapper: &Overlapper,
    seq: &[u8],
    qual: Option<&[u8]>,
    params: &CorrectParams,
    diag: &mut Diagnostics,
) -> Result<CorrectResult> {
    let norm = dna::normalize_seq(seq);
    let result = overlapper.overlap_read(&norm, params.min_overlap, diag)?;

    // containment 对共识没有贡献，只用 proper overlap 铺 pileup
    let mo = block_list_to_multi_overlap("-1", &norm, &result.overlaps);
    if mo.depth() == 0 {
        return Ok(CorrectResult { seq: norm, flag: CorrectFlag::NotCorrected });
    }
    let corrected = mo.calculate_consensus_from_partition(params.p_error, qual);
    Ok(CorrectResult { seq: corrected, flag: CorrectFlag::Corrected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ReadIndex;

    #[test]
    fn consensus_fixes_single_error_in_overlapped_suffix() {
        // 三条 read 来自同一段序列，read 0 在重叠区带一个错误碱基，
        // 两条支持 read 的票数把它改回去
        let truth = b"GATTACAGGCATTAACCGGTTACGATCGAT".to_vec(); // 30 bp
        let mut anchor = truth.clone();
        anchor[15] = b'G'; // 真值为 C
        let mut support1 = truth[5..].to_vec();
        support1.extend_from_slice(b"GTCAA");
        let mut support2 = truth[5..].to_vec();
        support2.extend_from_slice(b"TTGCC");
        let reads = vec![anchor.clone(), support1, support2];
        let idx = ReadIndex::build(&reads, 4).expect("index");

        let overlapper = Overlapper::new(&idx, 0.08);
        let mut diag = Diagnostics::new();
        let params = CorrectParams { min_overlap: 20, p_error: 0.01 };
        let result = correct_read(&overlapper, &anchor, None, &params, &mut diag).unwrap();

        assert_eq!(result.flag, CorrectFlag::Corrected);
        assert_eq!(result.seq, truth);
    }

    #[test]
    fn read_without_coverage_is_left_alone() {
        // read 0 无周期性，自身不会产生 proper self-overlap
        let reads = vec![b"GATTACAGGCATTAACC".to_vec(), b"TTTTTTTTTTTTTTTT".to_vec()];
        let idx = ReadIndex::build(&reads, 4).expect("index");
        let overlapper = Overlapper::new(&idx, 0.0);
        let mut diag = Diagnostics::new();
        let params = CorrectParams { min_overlap: 8, p_error: 0.01 };
        let result =
            correct_read(&overlapper, &reads[0], None, &params, &mut diag).unwrap();
        assert_eq!(result.flag, CorrectFlag::NotCorrected);
        assert_eq!(result.seq, reads[0]);
    }
}
