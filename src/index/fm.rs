use serde::{Deserialize, Serialize};

/// read 在拼接文本中的位置信息。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReadSpan {
    pub offset: u32,
    pub len: u32,
}

/// 朴素 FM 索引实现：
/// - 字母以 [0..sigma) 编码（0 预留为 $，read 之间的分隔符）。
/// - 采用定长分块的 Occ 采样（块内顺扫补偿）。
/// - 保存完整 SA，方便从区间获得文本位置；后续可替换为稀疏采样。
///
/// 与参考基因组索引不同，这里的文本是一个 read 集合：
/// `$ r0 $ r1 $ ... $`，每个 read 之前有一个哨兵，末尾再补一个。
/// 这样任意 read 的前缀在文本中都以 `$` 开头的后缀形式出现，
/// 反向搜索延伸一个哨兵即可取出"以当前串为前缀"的 read 区间。
#[derive(Debug, Serialize, Deserialize)]
pub struct FMIndex {
    pub sigma: u8,
    pub block: u32,
    /// C[i] = 文本中字母 < i 的累计数量
    pub c: Vec<u32>,
    /// BWT 序列（与 SA 同长度）
    pub bwt: Vec<u8>,
    /// Occ 采样（按块存储，行优先展平）：occ_samples[block_id * sigma + c]
    pub occ_samples: Vec<u32>,
    /// 完整 SA
    pub sa: Vec<u32>,
    /// 各 read 在文本中的区段
    pub spans: Vec<ReadSpan>,
}

impl FMIndex {
    pub fn build(bwt: Vec<u8>, sa: Vec<u32>, spans: Vec<ReadSpan>, sigma: u8, block: usize) -> Self {
        let n = bwt.len();
        let sigma_us = sigma as usize;
        let mut freq = vec![0u32; sigma_us];
        for &ch in &bwt {
            let ci = ch as usize;
            if ci < sigma_us { freq[ci] += 1; }
        }
        let mut c = vec![0u32; sigma_us];
        let mut acc = 0u32;
        for i in 0..sigma_us {
            c[i] = acc;
            acc += freq[i];
        }

        let num_blocks = if n == 0 { 0 } else { (n + block - 1) / block };
        let mut occ_samples = vec![0u32; num_blocks * sigma_us];
        let mut running = vec![0u32; sigma_us];
        for bi in 0..num_blocks {
            for a in 0..sigma_us {
                occ_samples[bi * sigma_us + a] = running[a];
            }
            let start = bi * block;
            let end = ((bi + 1) * block).min(n);
            for &ch in &bwt[start..end] {
                let ci = ch as usize;
                if ci < sigma_us { running[ci] += 1; }
            }
        }

        Self { sigma, block: block as u32, c, bwt, occ_samples, sa, spans }
    }

    /// BWT[0..pos) 中 c 的出现次数
    #[inline]
    pub fn occ(&self, c: u8, pos: usize) -> u32 {
        if pos == 0 { return 0; }
        let sigma_us = self.sigma as usize;
        let block = self.block as usize;
        let bi = (pos - 1) / block;
        let base = self.occ_samples[bi * sigma_us + c as usize];
        let start = bi * block;
        let mut add = 0u32;
        for &ch in &self.bwt[start..pos] {
            if ch == c { add += 1; }
        }
        base + add
    }

    /// BWT[0..pos) 中所有严格小于 c 的字母的出现次数之和。
    /// 双 BWT 区间对的同步更新需要它（见 ReadIndex::extend_pair_left）。
    #[inline]
    pub fn occ_lt(&self, c: u8, pos: usize) -> u32 {
        let mut sum = 0u32;
        for b in 0..c {
            sum += self.occ(b, pos);
        }
        sum
    }

    /// 单字符 c 的闭区间 [lower, upper]，不存在时返回 None。
    #[inline]
    pub fn char_interval(&self, c: u8) -> Option<(i64, i64)> {
        let ci = c as usize;
        let lower = i64::from(self.c[ci]);
        let upper = if ci + 1 < self.c.len() {
            i64::from(self.c[ci + 1]) - 1
        } else {
            self.bwt.len() as i64 - 1
        };
        if lower <= upper { Some((lower, upper)) } else { None }
    }

    /// 闭区间 [l, u] 向左扩展字符 c，返回新的闭区间（可能无效，l' > u'）。
    #[inline]
    pub fn extend_interval_left(&self, c: u8, l: i64, u: i64) -> (i64, i64) {
        let c0 = i64::from(self.c[c as usize]);
        let nl = c0 + i64::from(self.occ(c, l as usize));
        let nu = c0 + i64::from(self.occ(c, u as usize + 1)) - 1;
        (nl, nu)
    }

    /// 反向搜索精确匹配，pat 已经是编码后的字母表。返回闭区间。
    pub fn backward_search(&self, pat: &[u8]) -> Option<(i64, i64)> {
        if self.bwt.is_empty() || pat.is_empty() { return None; }
        let mut iter = pat.iter().rev();
        let (mut l, mut u) = self.char_interval(*iter.next()?)?;
        for &a in iter {
            let (nl, nu) = self.extend_interval_left(a, l, u);
            if nl > nu { return None; }
            l = nl;
            u = nu;
        }
        Some((l, u))
    }

    /// 闭区间 [l, u] 对应的文本位置。
    pub fn sa_positions(&self, l: i64, u: i64) -> &[u32] {
        &self.sa[l as usize..=u as usize]
    }

    /// 哨兵位置 -> 它后面那个 read 的编号。
    /// 文本布局为 `$ r0 $ r1 ... $`，位置 p 的哨兵后接 offset == p+1 的 read；
    /// 末尾哨兵后面没有 read，返回 None。
    pub fn read_after_sentinel(&self, p: u32) -> Option<usize> {
        let start = p + 1;
        self.spans
            .binary_search_by_key(&start, |s| s.offset)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{bwt, sa};
    use crate::util::dna;

    fn build_fm(reads: &[&[u8]]) -> FMIndex {
        let mut text = vec![dna::SENTINEL];
        let mut spans = Vec::new();
        for r in reads {
            let offset = text.len() as u32;
            for &b in dna::normalize_seq(r).iter() {
                text.push(dna::to_alphabet(b));
            }
            spans.push(ReadSpan { offset, len: r.len() as u32 });
            text.push(dna::SENTINEL);
        }
        let sa_arr = sa::build_sa(&text);
        let bwt_arr = bwt::build_bwt(&text, &sa_arr);
        FMIndex::build(bwt_arr, sa_arr, spans, dna::SIGMA as u8, 4)
    }

    fn encode(s: &[u8]) -> Vec<u8> {
        s.iter().map(|&b| dna::to_alphabet(b)).collect()
    }

    #[test]
    fn backward_search_finds_substring() {
        let fm = build_fm(&[b"ACGTACGT", b"TTACGG"]);
        let (l, u) = fm.backward_search(&encode(b"ACG")).expect("interval");
        // ACG occurs twice in read 0 and once in read 1
        assert_eq!(u - l + 1, 3);
        assert!(fm.backward_search(&encode(b"AAAA")).is_none());
    }

    #[test]
    fn sentinel_extension_selects_prefix_reads() {
        let fm = build_fm(&[b"ACGTT", b"ACGAA", b"GGGGG"]);
        let (l, u) = fm.backward_search(&encode(b"ACG")).expect("interval");
        let (sl, su) = fm.extend_interval_left(dna::SENTINEL, l, u);
        // 前两个 read 以 ACG 开头
        assert_eq!(su - sl + 1, 2);
        let mut hits: Vec<usize> = fm
            .sa_positions(sl, su)
            .iter()
            .filter_map(|&p| fm.read_after_sentinel(p))
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn occ_lt_accumulates_smaller_symbols() {
        let fm = build_fm(&[b"ACGT"]);
        let n = fm.bwt.len();
        let mut expect = 0;
        for b in 0..3u8 {
            expect += fm.occ(b, n);
        }
        assert_eq!(fm.occ_lt(3, n), expect);
        assert_eq!(fm.occ_lt(0, n), 0);
    }
}
