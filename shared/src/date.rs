//! 时间类型模块
//!
//! - `Timestamp`: 可序列化的毫秒时间戳，用于传输和存储
//! - `format_clock`: 倒计时显示格式化

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Sub;
use std::time::Duration;

// =========================================================
// Timestamp - 可传输的时间戳类型
// =========================================================

/// 毫秒时间戳，用于序列化传输和存储
///
/// 内部存储为 `i64`，表示自 Unix 纪元以来的毫秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    #[inline]
    pub const fn new(ms: i64) -> Self {
        Self(ms)
    }

    /// 从秒值创建（JWT 的 `exp` / `iat` 以秒为单位）
    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1000)
    }

    /// 当前时间
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn as_secs(&self) -> i64 {
        self.0 / 1000
    }

    /// 转换为 chrono 时间，超出范围时返回 None
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    /// 计算两个时间戳之间的差值，负值截断为 0
    fn sub(self, rhs: Timestamp) -> Self::Output {
        let diff_ms = (self.0 - rhs.0).max(0);
        Duration::from_millis(diff_ms as u64)
    }
}

// =========================================================
// 倒计时显示
// =========================================================

/// 将秒数格式化为 `MM:SS`，超过 99 分钟时分钟位自然扩展
pub fn format_clock(total_secs: u32) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(60), "01:00");
        assert_eq!(format_clock(300), "05:00");
        assert_eq!(format_clock(6125), "102:05");
    }

    #[test]
    fn test_timestamp_sub_saturates() {
        let a = Timestamp::new(5_000);
        let b = Timestamp::new(2_000);
        assert_eq!(a - b, Duration::from_secs(3));
        assert_eq!(b - a, Duration::ZERO);
    }

    #[test]
    fn test_timestamp_from_secs_round_trips_to_datetime() {
        let ts = Timestamp::from_secs(1_700_000_000);
        let dt = ts.to_datetime().unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert_eq!(Timestamp::from(dt), ts);
    }
}
