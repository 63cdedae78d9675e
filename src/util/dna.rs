pub const SIGMA: usize = 6; // {0:$, 1:A, 2:C, 3:G, 4:T, 5:N}
pub const SENTINEL: u8 = 0;

/// 标准 DNA 字母表（ASCII，按字典序），共识计算的候选碱基集合。
pub const DNA_ALPHABET: [u8; 4] = [b'A', b'C', b'G', b'T'];

#[inline]
pub fn to_alphabet(b: u8) -> u8 {
    if b == 0 { return 0; }
    match b.to_ascii_uppercase() {
        b'A' => 1,
        b'C' => 2,
        b'G' => 3,
        b'T' | b'U' => 4,
        b'N' => 5,
        _ => 5, // map others to N
    }
}

#[inline]
pub fn from_alphabet(a: u8) -> u8 {
    match a {
        0 => 0,
        1 => b'A',
        2 => b'C',
        3 => b'G',
        4 => b'T',
        5 => b'N',
        _ => b'N',
    }
}

pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq {
        let up = b.to_ascii_uppercase();
        let nb = match up {
            b'A' | b'C' | b'G' | b'T' | b'N' => up,
            b'U' => b'T',
            _ => b'N',
        };
        out.push(nb);
    }
    out
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn reverse_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().copied().collect()
}

pub fn complement_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| complement(b)).collect()
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq.iter().rev() {
        out.push(complement(b));
    }
    out
}

/// Phred+33 质量值转换为 log(错误概率)。
/// 质量 0（或非法字符）按错误概率 0.75 处理，避免 log(1)=0 的退化观测。
#[inline]
pub fn phred33_to_log_error(q: u8) -> f64 {
    let phred = q.saturating_sub(33) as f64;
    if phred <= 0.5 {
        0.75f64.ln()
    } else {
        -phred / 10.0 * std::f64::consts::LN_10
    }
}
