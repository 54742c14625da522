use std::fmt;
use std::str::FromStr;

pub const USER_PROMPT_PLACEHOLDER: &str = "{{user_prompt}}";

/// Analysis instructions, English output
pub const TEMPLATE_EN: &str = r#"You are a video director and copywriter. Watch the attached reference video carefully.

## Task
1. Describe the reference video: subject, setting, camera movement, shot sizes, lighting, color grading, pacing and mood.
2. Write a new video generation prompt for Google Veo that keeps the style of the reference and follows the user's request below.
3. Write a short title, a one-paragraph description and 3-8 tags suitable for publishing the generated video.

## User Request
{{user_prompt}}

If the user request is empty, recreate the reference video's content and style as closely as possible.

## Output Format
Return ONLY one JSON object, no explanation:

{
  "veo_prompt": "<single paragraph, concrete visual description, camera and lighting directions, under 120 words>",
  "title": "<short title>",
  "description": "<one paragraph>",
  "tags": ["<tag>", "..."],
  "style_notes": "<camera, lighting, color and pacing observations>"
}"#;

/// Analysis instructions, Chinese copy (the prompt for Veo stays in English)
pub const TEMPLATE_ZH: &str = r#"你是一名视频导演兼文案策划。请仔细观看附带的参考视频。

## 任务
1. 分析参考视频：主体、场景、运镜、景别、光线、调色、节奏与情绪。
2. 结合下方用户需求，为 Google Veo 写一段新的英文视频生成提示词，保留参考视频的风格。
3. 为生成的视频撰写中文标题、一段简介以及 3-8 个标签。

## 用户需求
{{user_prompt}}

如果用户需求为空，请尽可能还原参考视频的内容与风格。

## 输出格式
只返回一个 JSON 对象，不要任何解释：

{
  "veo_prompt": "<英文，一段具体的画面描述，包含镜头与光线指示，不超过 120 个单词>",
  "title": "<简短标题>",
  "description": "<一段简介>",
  "tags": ["<标签>", "..."],
  "style_notes": "<关于运镜、光线、色彩与节奏的观察>"
}"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptLanguage {
    #[default]
    Zh,
    En,
}

impl PromptLanguage {
    /// Anything starting with "en" is English; everything else falls back to Chinese
    pub fn parse(value: &str) -> Self {
        if value.trim().to_ascii_lowercase().starts_with("en") {
            PromptLanguage::En
        } else {
            PromptLanguage::Zh
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            PromptLanguage::Zh => TEMPLATE_ZH,
            PromptLanguage::En => TEMPLATE_EN,
        }
    }
}

impl fmt::Display for PromptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptLanguage::Zh => f.write_str("zh"),
            PromptLanguage::En => f.write_str("en"),
        }
    }
}

impl FromStr for PromptLanguage {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PromptLanguage::parse(s))
    }
}

/// Fill the language's template with the user's request
pub fn build_prompt(language: PromptLanguage, user_prompt: Option<&str>) -> String {
    language
        .template()
        .replace(USER_PROMPT_PLACEHOLDER, user_prompt.unwrap_or("").trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_selection() {
        assert_eq!(PromptLanguage::parse("en"), PromptLanguage::En);
        assert_eq!(PromptLanguage::parse("EN-us"), PromptLanguage::En);
        assert_eq!(PromptLanguage::parse("zh"), PromptLanguage::Zh);
        assert_eq!(PromptLanguage::parse(""), PromptLanguage::Zh);
        assert_eq!("english".parse::<PromptLanguage>().unwrap(), PromptLanguage::En);
    }

    #[test]
    fn test_build_prompt_substitutes_request() {
        let prompt = build_prompt(PromptLanguage::En, Some("make it snowy"));
        assert!(prompt.contains("## User Request\nmake it snowy\n"));
        assert!(!prompt.contains(USER_PROMPT_PLACEHOLDER));

        let prompt = build_prompt(PromptLanguage::Zh, None);
        assert!(prompt.starts_with("你是一名视频导演"));
        assert!(!prompt.contains(USER_PROMPT_PLACEHOLDER));
    }
}
