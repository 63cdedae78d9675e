/// 根据后缀数组构建 BWT。
/// text 为数值化字母表（0..SIGMA），sa 为后缀数组位置。
/// BWT[i] 为 SA[i] 前一个字符（SA[i]==0 时取文本末位，循环语义）。
pub fn build_bwt(text: &[u8], sa: &[u32]) -> Vec<u8> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }
    sa.iter()
        .map(|&p| {
            let i = p as usize;
            if i == 0 { text[n - 1] } else { text[i - 1] }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::sa::build_sa;

    #[test]
    fn bwt_is_permutation_of_text() {
        let text = [0u8, 1, 2, 3, 4, 0, 4, 3, 2, 1, 0];
        let sa = build_sa(&text);
        let mut bwt = build_bwt(&text, &sa);
        let mut sorted_text = text.to_vec();
        bwt.sort_unstable();
        sorted_text.sort_unstable();
        assert_eq!(bwt, sorted_text);
    }
}
