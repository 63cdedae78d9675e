//! 区间对模型：正向/反向两个搜索空间的闭区间，必须锁步移动。

/// BWT 搜索空间上的闭区间 [lower, upper]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub lower: i64,
    pub upper: i64,
}

impl Interval {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.lower <= self.upper
    }

    /// 区间宽度；无效区间宽度为 0。
    #[inline]
    pub fn size(&self) -> i64 {
        if self.is_valid() { self.upper - self.lower + 1 } else { 0 }
    }

    #[inline]
    pub fn intersects(&self, other: &Interval) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }
}

/// 正向（index 0）与反向（index 1）搜索空间的区间对。
/// 两个区间表示同一组匹配 read 在两套坐标系下的位置，
/// 宽度必须始终相等；所有结构性修改都要对称地作用于两侧。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPair {
    pub interval: [Interval; 2],
}

impl IntervalPair {
    pub fn new(fwd: Interval, rev: Interval) -> Self {
        Self { interval: [fwd, rev] }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.interval[0].is_valid() && self.interval[1].is_valid()
    }

    /// 宽度不变量：size(interval[0]) == size(interval[1])。
    #[inline]
    pub fn sizes_match(&self) -> bool {
        self.interval[0].size() == self.interval[1].size()
    }
}

/// 一条 read 上的 0 基闭区间坐标 (start, end, seq_len)。
/// 不变量：0 <= start <= end < seq_len。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqCoord {
    pub start: usize,
    pub end: usize,
    pub seq_len: usize,
}

impl SeqCoord {
    pub fn new(start: usize, end: usize, seq_len: usize) -> Self {
        debug_assert!(start <= end && end < seq_len);
        Self { start, end, seq_len }
    }

    /// 映射到互补方向：(len-1-end, len-1-start)。自反。
    pub fn flip(&mut self) {
        let s = self.seq_len - 1 - self.end;
        let e = self.seq_len - 1 - self.start;
        self.start = s;
        self.end = e;
    }

    pub fn flipped(mut self) -> Self {
        self.flip();
        self
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.end - self.start + 1
    }

    /// 区间覆盖整条 read。
    #[inline]
    pub fn is_contained(&self) -> bool {
        self.start == 0 && self.end + 1 == self.seq_len
    }
}
