/// 构建后缀数组（倍增法，O(n log^2 n)）。
/// 输入为数值化文本（0:$,1:A,2:C,3:G,4:T,5:N），文本中可以包含
/// 多个 0 作为 read 之间的分隔符。
pub fn build_sa(text: &[u8]) -> Vec<u32> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }
    let mut sa: Vec<usize> = (0..n).collect();
    let mut rank: Vec<i64> = text.iter().map(|&b| i64::from(b)).collect();
    let mut next: Vec<i64> = vec![0; n];

    let mut k = 1usize;
    loop {
        let key = |i: usize| -> (i64, i64) {
            let second = if i + k < n { rank[i + k] } else { -1 };
            (rank[i], second)
        };
        sa.sort_unstable_by_key(|&i| key(i));

        next[sa[0]] = 0;
        for w in 1..n {
            let bump = i64::from(key(sa[w]) != key(sa[w - 1]));
            next[sa[w]] = next[sa[w - 1]] + bump;
        }
        rank.copy_from_slice(&next);

        if rank[sa[n - 1]] as usize == n - 1 || k >= n {
            break;
        }
        k <<= 1;
    }

    sa.into_iter().map(|x| x as u32).collect()
}
