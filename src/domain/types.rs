// ==========================================
// 创伤急救数据导入系统 - 领域类型定义
// ==========================================
// 季节/时段/受伤原因的闭合枚举与派生规则
// ISS 身体区域闭合枚举（映射表的定义域）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 季节 (Season)
// ==========================================
// 由接诊日期的月份派生，存库为整数编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring, // 春 3-5月
    Summer, // 夏 6-9月
    Autumn, // 秋 10-12月
    Winter, // 冬 1-2月
}

impl Season {
    /// 由月份（1-12）派生季节
    pub fn from_month(month: u32) -> Option<Season> {
        match month {
            3..=5 => Some(Season::Spring),
            6..=9 => Some(Season::Summer),
            10..=12 => Some(Season::Autumn),
            1..=2 => Some(Season::Winter),
            _ => None,
        }
    }

    /// 数据库整数编码
    pub fn code(&self) -> i64 {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Autumn => 2,
            Season::Winter => 3,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Spring => write!(f, "春"),
            Season::Summer => write!(f, "夏"),
            Season::Autumn => write!(f, "秋"),
            Season::Winter => write!(f, "冬"),
        }
    }
}

// ==========================================
// 时段 (Time Period)
// ==========================================
// 由接诊时间的小时数分桶
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePeriod {
    Night,       // 夜间 0-7 时
    MorningPeak, // 早高峰 8-9 时
    NoonPeak,    // 午高峰 10-11 时
    Afternoon,   // 下午 12-16 时
    EveningPeak, // 晚高峰 17-19 时
    Evening,     // 晚上 20-23 时
}

impl TimePeriod {
    /// 由小时数（0-23）派生时段
    pub fn from_hour(hour: u32) -> Option<TimePeriod> {
        match hour {
            0..=7 => Some(TimePeriod::Night),
            8..=9 => Some(TimePeriod::MorningPeak),
            10..=11 => Some(TimePeriod::NoonPeak),
            12..=16 => Some(TimePeriod::Afternoon),
            17..=19 => Some(TimePeriod::EveningPeak),
            20..=23 => Some(TimePeriod::Evening),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            TimePeriod::Night => 0,
            TimePeriod::MorningPeak => 1,
            TimePeriod::NoonPeak => 2,
            TimePeriod::Afternoon => 3,
            TimePeriod::EveningPeak => 4,
            TimePeriod::Evening => 5,
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePeriod::Night => write!(f, "夜间"),
            TimePeriod::MorningPeak => write!(f, "早高峰"),
            TimePeriod::NoonPeak => write!(f, "午高峰"),
            TimePeriod::Afternoon => write!(f, "下午"),
            TimePeriod::EveningPeak => write!(f, "晚高峰"),
            TimePeriod::Evening => write!(f, "晚上"),
        }
    }
}

// ==========================================
// 受伤原因分类 (Injury Cause)
// ==========================================
// 由自由文本按包含关系归类，"其他"保留原文作为明细
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjuryCause {
    Traffic,   // 交通伤
    Fall,      // 高坠伤
    Machinery, // 机械伤
    Tumble,    // 跌倒
    Other,     // 其他
}

impl InjuryCause {
    /// 自由文本归类
    pub fn classify(text: &str) -> InjuryCause {
        if text.contains("交通伤") {
            InjuryCause::Traffic
        } else if text.contains("高坠伤") {
            InjuryCause::Fall
        } else if text.contains("机械伤") {
            InjuryCause::Machinery
        } else if text.contains("跌倒") {
            InjuryCause::Tumble
        } else {
            InjuryCause::Other
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            InjuryCause::Traffic => 0,
            InjuryCause::Fall => 1,
            InjuryCause::Machinery => 2,
            InjuryCause::Tumble => 3,
            InjuryCause::Other => 4,
        }
    }
}

impl fmt::Display for InjuryCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjuryCause::Traffic => write!(f, "交通伤"),
            InjuryCause::Fall => write!(f, "高坠伤"),
            InjuryCause::Machinery => write!(f, "机械伤"),
            InjuryCause::Tumble => write!(f, "跌倒"),
            InjuryCause::Other => write!(f, "其他"),
        }
    }
}

// ==========================================
// ISS 身体区域 (Body Region)
// ==========================================
// 闭合枚举，ISS 评分矩阵映射表的定义域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyRegion {
    HeadNeck, // 头颈部
    Face,     // 面部
    Chest,    // 胸部
    Abdomen,  // 腹部
    Limbs,    // 四肢
    Surface,  // 体表
}

impl BodyRegion {
    pub const ALL: [BodyRegion; 6] = [
        BodyRegion::HeadNeck,
        BodyRegion::Face,
        BodyRegion::Chest,
        BodyRegion::Abdomen,
        BodyRegion::Limbs,
        BodyRegion::Surface,
    ];

    /// 区域显示名（报错与日志用）
    pub fn label(&self) -> &'static str {
        match self {
            BodyRegion::HeadNeck => "头颈部",
            BodyRegion::Face => "面部",
            BodyRegion::Chest => "胸部",
            BodyRegion::Abdomen => "腹部",
            BodyRegion::Limbs => "四肢",
            BodyRegion::Surface => "体表",
        }
    }

    /// 详细伤情单元格中可能出现的区域前缀
    pub fn cell_prefix(&self) -> &'static str {
        match self {
            BodyRegion::HeadNeck => "头颈部损伤",
            BodyRegion::Face => "面部损伤",
            BodyRegion::Chest => "胸部损伤",
            BodyRegion::Abdomen => "腹部损伤",
            BodyRegion::Limbs => "四肢损伤",
            BodyRegion::Surface => "体表损伤",
        }
    }
}

impl fmt::Display for BodyRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_from_month() {
        assert_eq!(Season::from_month(3), Some(Season::Spring));
        assert_eq!(Season::from_month(9), Some(Season::Summer));
        assert_eq!(Season::from_month(12), Some(Season::Autumn));
        assert_eq!(Season::from_month(1), Some(Season::Winter));
        assert_eq!(Season::from_month(13), None);
    }

    #[test]
    fn test_time_period_buckets() {
        assert_eq!(TimePeriod::from_hour(0), Some(TimePeriod::Night));
        assert_eq!(TimePeriod::from_hour(9), Some(TimePeriod::MorningPeak));
        assert_eq!(TimePeriod::from_hour(11), Some(TimePeriod::NoonPeak));
        assert_eq!(TimePeriod::from_hour(16), Some(TimePeriod::Afternoon));
        assert_eq!(TimePeriod::from_hour(19), Some(TimePeriod::EveningPeak));
        assert_eq!(TimePeriod::from_hour(23), Some(TimePeriod::Evening));
        assert_eq!(TimePeriod::from_hour(24), None);
    }

    #[test]
    fn test_injury_cause_classify() {
        assert_eq!(InjuryCause::classify("交通伤（电动车）"), InjuryCause::Traffic);
        assert_eq!(InjuryCause::classify("高坠伤 3米"), InjuryCause::Fall);
        assert_eq!(InjuryCause::classify("刀刺伤"), InjuryCause::Other);
    }
}
