//! # 动作组与输出命名
//!
//! 输出文件名格式：`{group}_{stem}_Processed.png`。
//! 动作组优先取调用方指定值，否则从源文件名中的关键字推断；
//! SmartSlice 按行拆分时一张图包含多个动作，组名固定为 `multi`。

use serde::{Deserialize, Serialize};

use super::SlicingError;

/// 多动作图集使用的组名。
pub const MULTI_ACTION_GROUP: &str = "multi";

const PROCESSED_SUFFIX: &str = "_Processed";

/// 单动作精灵表所属的动作组。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionGroup {
    #[default]
    Unknown,
    Idle,
    Walk,
    Attack,
    Die,
}

impl ActionGroup {
    /// 根据文件名关键字推断动作组（大小写不敏感）。
    ///
    /// # 示例
    /// ```rust
    /// use sprite_slicer::sprite_sheet::ActionGroup;
    ///
    /// assert_eq!(ActionGroup::detect_from_file_name("Knight_Run_v2"), ActionGroup::Walk);
    /// assert_eq!(ActionGroup::detect_from_file_name("slime"), ActionGroup::Unknown);
    /// ```
    pub fn detect_from_file_name(file_name: &str) -> Self {
        let name = file_name.trim().to_lowercase();
        if name.is_empty() {
            return Self::Unknown;
        }

        if name.contains("idle") {
            Self::Idle
        } else if name.contains("walk") || name.contains("run") {
            Self::Walk
        } else if name.contains("attack") || name.contains("atk") {
            Self::Attack
        } else if name.contains("die") || name.contains("death") || name.contains("dead") {
            Self::Die
        } else {
            Self::Unknown
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Result<Self, SlicingError> {
        match value.trim().to_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "idle" => Ok(Self::Idle),
            "walk" | "run" => Ok(Self::Walk),
            "attack" | "atk" => Ok(Self::Attack),
            "die" | "death" | "dead" => Ok(Self::Die),
            other => Err(SlicingError::Validation(format!(
                "未知动作组：{}（可选：idle / walk / attack / die / unknown）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Idle => "idle",
            Self::Walk => "walk",
            Self::Attack => "attack",
            Self::Die => "die",
        }
    }
}

/// 决定本次运行的组名。
///
/// 按行拆分时固定为 `multi`；否则手动指定优先，最后回退到文件名推断。
pub fn resolve_group_name(file_stem: &str, manual: Option<ActionGroup>, splits_action_rows: bool) -> String {
    if splits_action_rows {
        return MULTI_ACTION_GROUP.to_string();
    }

    manual
        .unwrap_or_else(|| ActionGroup::detect_from_file_name(file_stem))
        .as_str()
        .to_string()
}

/// 处理结果的文件名主干：`{group}_{stem}_Processed`，同时作为帧命名前缀。
pub fn processed_stem(group: &str, file_stem: &str) -> String {
    format!("{}_{}{}", group, file_stem, PROCESSED_SUFFIX)
}

/// 处理结果的 PNG 文件名。
pub fn processed_file_name(group: &str, file_stem: &str) -> String {
    format!("{}.png", processed_stem(group, file_stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_groups_by_keyword_priority() {
        assert_eq!(ActionGroup::detect_from_file_name("hero_IDLE"), ActionGroup::Idle);
        assert_eq!(ActionGroup::detect_from_file_name("wolf_walk_cycle"), ActionGroup::Walk);
        assert_eq!(ActionGroup::detect_from_file_name("orc_atk"), ActionGroup::Attack);
        assert_eq!(ActionGroup::detect_from_file_name("orc_Death"), ActionGroup::Die);
        assert_eq!(ActionGroup::detect_from_file_name("   "), ActionGroup::Unknown);
    }

    #[test]
    fn split_rows_always_use_multi_group() {
        assert_eq!(resolve_group_name("hero_idle", Some(ActionGroup::Die), true), "multi");
        assert_eq!(resolve_group_name("hero_idle", Some(ActionGroup::Die), false), "die");
        assert_eq!(resolve_group_name("hero_idle", None, false), "idle");
    }

    #[test]
    fn processed_names_follow_group_and_stem() {
        assert_eq!(processed_stem("walk", "hero_walk"), "walk_hero_walk_Processed");
        assert_eq!(processed_file_name("multi", "hero"), "multi_hero_Processed.png");
    }

    #[test]
    fn group_strings_roundtrip() {
        for group in [
            ActionGroup::Unknown,
            ActionGroup::Idle,
            ActionGroup::Walk,
            ActionGroup::Attack,
            ActionGroup::Die,
        ] {
            assert_eq!(ActionGroup::from_str(group.as_str()), Ok(group));
        }
        assert!(ActionGroup::from_str("jump").is_err());
    }
}
