//! Pileup：一个锚定位置上所有被观测碱基（带置信度）的集合，
//! 以及由它得到共识碱基的两种模型。

use crate::util::dna::DNA_ALPHABET;

/// 缺省的单碱基错误概率。
pub const DEFAULT_ERROR_RATE: f64 = 0.01;

/// DNA 字母计数，候选集为 {A, C, G, T}，其余符号各自计数但不参与共识。
#[derive(Debug, Default, Clone)]
pub struct AlphaCount {
    counts: [u32; 4],
    other: u32,
}

impl AlphaCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, base: u8) {
        match DNA_ALPHABET.iter().position(|&b| b == base.to_ascii_uppercase()) {
            Some(i) => self.counts[i] += 1,
            None => self.other += 1,
        }
    }

    pub fn get(&self, base: u8) -> u32 {
        DNA_ALPHABET
            .iter()
            .position(|&b| b == base.to_ascii_uppercase())
            .map_or(0, |i| self.counts[i])
    }

    /// 计数最高的碱基；并列时取字母序靠前者（确定性平局规则）。
    pub fn max_base(&self) -> u8 {
        let mut best = 0usize;
        for i in 1..4 {
            if self.counts[i] > self.counts[best] {
                best = i;
            }
        }
        DNA_ALPHABET[best]
    }
}

/// 每个候选碱基的对数后验概率。
#[derive(Debug, Clone)]
pub struct AlphaProb {
    log_probs: [f64; 4],
}

impl AlphaProb {
    pub fn get(&self, base: u8) -> f64 {
        let i = DNA_ALPHABET
            .iter()
            .position(|&b| b == base.to_ascii_uppercase())
            .unwrap_or(0);
        self.log_probs[i]
    }

    /// 后验最大的碱基，并列取字母序靠前者。
    pub fn max_base(&self) -> u8 {
        let mut best = 0usize;
        for i in 1..4 {
            if self.log_probs[i] > self.log_probs[best] {
                best = i;
            }
        }
        DNA_ALPHABET[best]
    }
}

#[derive(Debug, Clone, Copy)]
struct PileupElem {
    base: u8,
    /// log(该观测出错的概率)
    log_error: f64,
}

/// 一个位置上的全部观测。每个锚定位置新建一个，消费后即丢弃。
#[derive(Debug, Default)]
pub struct Pileup {
    data: Vec<PileupElem>,
}

impl Pileup {
    pub fn new() -> Self {
        Self::default()
    }

    /// 无质量信息的观测：错误率推迟到共识计算时由调用方给定。
    pub fn add(&mut self, base: u8) {
        self.add_with_prob(base, f64::NAN);
    }

    pub fn add_with_prob(&mut self, base: u8, log_error: f64) {
        self.data.push(PileupElem { base, log_error });
    }

    pub fn depth(&self) -> usize {
        self.data.len()
    }

    pub fn alpha_count(&self) -> AlphaCount {
        let mut ac = AlphaCount::new();
        for e in &self.data {
            ac.increment(e.base);
        }
        ac
    }

    /// 简单多数表决：所有观测等权计票。
    /// 空 pileup 没有共识可言，返回 None 由调用方回退到原碱基。
    pub fn simple_consensus(&self) -> Option<u8> {
        if self.data.is_empty() {
            return None;
        }
        Some(self.alpha_count().max_base())
    }

    /// 概率模型：对每个候选真值 b 累加逐观测的对数似然，
    /// 观测一致记 log(1 - p_err)，不一致记 log(p_err / 3)
    /// （错误概率均分到其余三个碱基），再用 log-sum-exp 边际归一化。
    /// 全程在对数空间进行，深度很大时也不会下溢。
    pub fn alpha_prob(&self, default_log_error: f64) -> Option<AlphaProb> {
        if self.data.is_empty() {
            return None;
        }
        let mut log_probs = [0.0f64; 4];
        for (i, &b) in DNA_ALPHABET.iter().enumerate() {
            let mut posterior = 0.0f64;
            for e in &self.data {
                // NaN 表示观测未携带质量，采用调用方的默认错误率
                let lp_err = if e.log_error.is_nan() { default_log_error } else { e.log_error };
                if e.base.to_ascii_uppercase() == b {
                    posterior += (-lp_err.exp()).ln_1p(); // log(1 - p_err)
                } else {
                    posterior += lp_err - 3.0f64.ln();
                }
            }
            log_probs[i] = posterior;
        }

        // log-marginal：log Σ_b exp(posterior_b)，先减最大值保持数值稳定
        let max = log_probs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let marginal = max + log_probs.iter().map(|&lp| (lp - max).exp()).sum::<f64>().ln();
        for lp in &mut log_probs {
            *lp -= marginal;
        }
        Some(AlphaProb { log_probs })
    }

    /// 概率模型下的硬共识调用。
    pub fn consensus(&self, error_rate: f64) -> Option<u8> {
        self.alpha_prob(error_rate.ln()).map(|ap| ap.max_base())
    }
}
