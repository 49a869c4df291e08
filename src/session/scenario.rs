use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKey {
    Cloth,
    Food,
    Life,
}

impl ScenarioKey {
    pub const ALL: [ScenarioKey; 3] = [Self::Cloth, Self::Food, Self::Life];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cloth => "cloth",
            Self::Food => "food",
            Self::Life => "life",
        }
    }

    pub fn scenario(self) -> &'static Scenario {
        match self {
            Self::Cloth => &CLOTH,
            Self::Food => &FOOD,
            Self::Life => &LIFE,
        }
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static persona definition: the system prompt sent with every request and
/// the quick replies offered under the composer.
#[derive(Debug)]
pub struct Scenario {
    pub label: &'static str,
    pub system_prompt: &'static str,
    pub quick_replies: &'static [&'static str],
}

static CLOTH: Scenario = Scenario {
    label: "穿搭 (cloth)",
    system_prompt: "你是一位親切的穿搭顧問，請依照使用者的身形、場合與天氣，用繁體中文給出具體、實用的服裝建議。",
    quick_replies: &[
        "今天天氣很冷，要怎麼穿比較保暖？",
        "面試應該穿什麼比較得體？",
        "小個子適合什麼樣的褲子？",
    ],
};

static FOOD: Scenario = Scenario {
    label: "飲食 (food)",
    system_prompt: "你是一位營養師，請用繁體中文回答飲食與營養相關的問題，建議要簡單、可執行，並提醒必要的健康注意事項。",
    quick_replies: &[
        "早餐怎麼吃比較健康？",
        "晚餐想減醣可以吃什麼？",
        "有什麼適合上班族的便當搭配？",
    ],
};

static LIFE: Scenario = Scenario {
    label: "生活 (life)",
    system_prompt: "你是一位生活小幫手，請用繁體中文針對居家、作息與日常大小事提供溫暖又實際的建議。",
    quick_replies: &[
        "怎麼養成早睡早起的習慣？",
        "週末在家可以做些什麼放鬆？",
        "租屋處要怎麼整理比較有空間？",
    ],
};

#[cfg(test)]
mod tests {
    use super::ScenarioKey;

    #[test]
    fn every_scenario_has_prompt_and_quick_replies() {
        for key in ScenarioKey::ALL {
            let scenario = key.scenario();
            assert!(!scenario.system_prompt.is_empty());
            assert!(!scenario.quick_replies.is_empty());
        }
    }

    #[test]
    fn system_prompts_are_distinct() {
        let cloth = ScenarioKey::Cloth.scenario().system_prompt;
        let food = ScenarioKey::Food.scenario().system_prompt;
        let life = ScenarioKey::Life.scenario().system_prompt;
        assert_ne!(cloth, food);
        assert_ne!(food, life);
        assert_ne!(cloth, life);
    }
}
